// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local wallet store.
//!
//! Nothing survives a restart. Used by tests and when `WALLET_STORE=memory`.

use std::sync::RwLock;

use crate::wallet::{Wallet, WalletId};

use super::{StoreError, StoreResult, WalletFilter, WalletStore};

#[derive(Default)]
struct Inner {
    /// Kept in insertion order, which is also id order.
    wallets: Vec<Wallet>,
    last_id: u64,
}

#[derive(Default)]
pub struct InMemoryWalletStore {
    inner: RwLock<Inner>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WalletStore for InMemoryWalletStore {
    fn insert(&self, wallet: Wallet) -> StoreResult<Wallet> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = inner
            .last_id
            .checked_add(1)
            .and_then(WalletId::from_u64)
            .ok_or(StoreError::IdSpaceExhausted)?;

        let stored = wallet.with_id(id);
        inner.last_id = id.get();
        inner.wallets.push(stored.clone());
        Ok(stored)
    }

    fn update(&self, wallet: &Wallet) -> StoreResult<()> {
        let id = wallet.id().ok_or(StoreError::MissingId)?;
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let slot = inner
            .wallets
            .iter_mut()
            .find(|w| w.id() == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *slot = wallet.clone();
        Ok(())
    }

    fn find(&self, filter: &WalletFilter) -> StoreResult<Vec<Wallet>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .wallets
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }

    fn count(&self, filter: &WalletFilter) -> StoreResult<usize> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.wallets.iter().filter(|w| filter.matches(w)).count())
    }

    fn health_check(&self) -> StoreResult<()> {
        self.inner
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::LockPoisoned)
    }
}
