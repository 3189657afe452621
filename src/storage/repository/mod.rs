// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer enforcing cross-record wallet rules on top of a
//! [`WalletStore`](super::WalletStore).

pub mod wallets;

pub use wallets::{RepositoryError, RepositoryResult, WalletConflict, WalletRepository};
