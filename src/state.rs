// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::storage::{InMemoryWalletStore, WalletRepository, WalletStore};

#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<WalletRepository>,
}

impl AppState {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            wallets: Arc::new(WalletRepository::new(store)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryWalletStore::new()))
    }
}
