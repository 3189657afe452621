// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet Registry - MoMo and Card Wallet Registration Service
//!
//! Registers payment accounts (mobile money numbers or card BINs) against
//! an owner phone number. Requests are checked against fixed format rules,
//! duplicates are refused, and each owner may hold at most five active
//! wallets. Deleting a wallet deactivates it; records are never removed.
//!
//! ## Modules
//!
//! - `wallet` - Wallet entity and internal enums
//! - `validation` - Ordered format checks on incoming requests
//! - `storage` - Store contract, redb and in-memory stores, repository
//! - `api` - HTTP API handlers (Axum)

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod validation;
pub mod wallet;
