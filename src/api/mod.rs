// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateWalletRequest, ErrorResponse, ExternalAccountScheme, ExternalWalletType,
        WalletResponse,
    },
    state::AppState,
    wallet::{AccountScheme, WalletType},
};

pub mod health;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let wallet_routes = Router::new()
        .route(
            "/wallet",
            post(wallets::create_wallet).get(wallets::list_wallets),
        )
        .route(
            "/wallet/{id}",
            get(wallets::get_wallet).delete(wallets::delete_wallet),
        );

    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", wallet_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallets::create_wallet,
        wallets::list_wallets,
        wallets::get_wallet,
        wallets::delete_wallet,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            CreateWalletRequest,
            WalletResponse,
            ErrorResponse,
            ExternalWalletType,
            ExternalAccountScheme,
            WalletType,
            AccountScheme,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Wallets", description = "Wallet registration and lookup"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
