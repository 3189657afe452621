// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet registry endpoints.
//!
//! Thin adapters: decode the request, run the validator, call the
//! repository, and map the outcome to a status code.

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::{CreateWalletRequest, ErrorResponse, WalletListQuery, WalletResponse},
    state::AppState,
    validation::validate_wallet,
    wallet::{Wallet, WalletId},
};

/// Decode a create request. An empty or `null` body is an absent wallet.
fn decode_request(body: &[u8]) -> Result<Option<CreateWalletRequest>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed wallet request body");
        ApiError::bad_request("malformed_json", "Request body is not valid JSON")
    })
}

fn parse_id(raw: i64) -> Result<WalletId, ApiError> {
    WalletId::new(raw).ok_or_else(|| {
        ApiError::bad_request("invalid_wallet_id", "Wallet id must be a positive integer")
    })
}

/// Register a new wallet.
#[utoipa::path(
    post,
    path = "/api/wallet",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet registered", body = WalletResponse),
        (status = 400, description = "Invalid wallet", body = ErrorResponse),
        (status = 409, description = "Duplicate wallet or quota reached", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ErrorResponse)
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let request = decode_request(&body)?;

    let validated = validate_wallet(request.as_ref()).inspect_err(|reason| {
        tracing::info!(code = reason.code(), "Wallet request rejected");
    })?;

    let wallet = state.wallets.add(Wallet::from(validated)).await?;
    tracing::info!(
        wallet_id = ?wallet.id(),
        wallet_type = ?wallet.wallet_type(),
        "Wallet registered"
    );

    Ok((StatusCode::CREATED, Json(WalletResponse::from(wallet))))
}

/// List active wallets, optionally restricted to one owner.
#[utoipa::path(
    get,
    path = "/api/wallet",
    tag = "Wallets",
    params(WalletListQuery),
    responses(
        (status = 200, description = "Active wallets in creation order", body = [WalletResponse]),
        (status = 400, description = "Empty owner", body = ErrorResponse)
    )
)]
pub async fn list_wallets(
    State(state): State<AppState>,
    query: Result<Query<WalletListQuery>, QueryRejection>,
) -> Result<Json<Vec<WalletResponse>>, ApiError> {
    let Query(query) = query?;
    let wallets = match query.owner {
        Some(owner) => state.wallets.get_by_owner(&owner).await?,
        None => state.wallets.get_all().await?,
    };
    Ok(Json(wallets.iter().map(WalletResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/wallet/{id}",
    tag = "Wallets",
    params(("id" = i64, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Active wallet", body = WalletResponse),
        (status = 400, description = "Id below 1", body = ErrorResponse),
        (status = 404, description = "No active wallet with this id", body = ErrorResponse)
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Path(id) = id?;
    let id = parse_id(id)?;
    let wallet = state
        .wallets
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;
    Ok(Json(wallet.into()))
}

/// Deactivate a wallet. The record is kept but hidden from every read.
#[utoipa::path(
    delete,
    path = "/api/wallet/{id}",
    tag = "Wallets",
    params(("id" = i64, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Wallet deactivated", body = WalletResponse),
        (status = 400, description = "Id below 1", body = ErrorResponse),
        (status = 404, description = "No active wallet with this id", body = ErrorResponse)
    )
)]
pub async fn delete_wallet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Path(id) = id?;
    let id = parse_id(id)?;
    let wallet = state
        .wallets
        .mark_deleted(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;

    tracing::info!(wallet_id = %id, "Wallet deactivated");
    Ok(Json(wallet.into()))
}
