// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: wallet id → serialized Wallet (JSON bytes)
//! - `owner_wallets`: composite key (owner|id_be) → wallet id
//!
//! Ids are allocated inside the inserting write transaction, so they are
//! strictly increasing and a forward scan of either table yields wallets
//! in insertion order.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::wallet::{Wallet, WalletId};

use super::{StoreError, StoreResult, WalletFilter, WalletStore};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: wallet id → serialized Wallet (JSON bytes).
const WALLETS: TableDefinition<u64, &[u8]> = TableDefinition::new("wallets");

/// Index: `owner|id_be` → wallet id.
const OWNER_WALLETS: TableDefinition<&[u8], u64> = TableDefinition::new("owner_wallets");

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the owner_wallets table.
///
/// Format: `owner | id_be_bytes`. Big-endian ids keep per-owner scans in
/// insertion order.
fn make_owner_key(owner: &str, id: WalletId) -> Vec<u8> {
    let mut key = make_prefix(owner);
    key.extend_from_slice(&id.get().to_be_bytes());
    key
}

/// Build a prefix key for range scanning all wallets of an owner.
fn make_prefix(owner: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner.len() + 1 + 8);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a range scan: prefix followed by more 0xFF bytes than
/// any id suffix.
fn make_prefix_end(owner: &str) -> Vec<u8> {
    let mut end = make_prefix(owner);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

// =============================================================================
// WalletDatabase
// =============================================================================

/// Embedded ACID wallet database.
pub struct WalletDatabase {
    db: Database,
}

impl WalletDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(OWNER_WALLETS)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Wallet database opened");
        Ok(Self { db })
    }

    /// Look up a single wallet by id, active or not.
    fn get(&self, id: WalletId) -> StoreResult<Option<Wallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        match table.get(id.get())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All wallets of one owner, via the owner index.
    fn list_by_owner(&self, owner: &str) -> StoreResult<Vec<Wallet>> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(OWNER_WALLETS)?;
        let wallet_table = read_txn.open_table(WALLETS)?;

        let prefix = make_prefix(owner);
        let prefix_end = make_prefix_end(owner);

        let mut wallets = Vec::new();
        for entry in idx_table.range(prefix.as_slice()..prefix_end.as_slice())? {
            let (_, id) = entry?;
            match wallet_table.get(id.value())? {
                Some(value) => wallets.push(serde_json::from_slice(value.value())?),
                None => {
                    tracing::warn!(wallet_id = id.value(), owner, "Dangling owner index entry");
                }
            }
        }
        Ok(wallets)
    }

    /// Every stored wallet in id order.
    fn list_all(&self) -> StoreResult<Vec<Wallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;

        let mut wallets = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            wallets.push(serde_json::from_slice(value.value())?);
        }
        Ok(wallets)
    }
}

impl WalletStore for WalletDatabase {
    fn insert(&self, wallet: Wallet) -> StoreResult<Wallet> {
        let write_txn = self.db.begin_write()?;
        let stored = {
            let mut table = write_txn.open_table(WALLETS)?;
            let last_id = table.last()?.map(|(key, _)| key.value()).unwrap_or(0);
            let id = last_id
                .checked_add(1)
                .and_then(WalletId::from_u64)
                .ok_or(StoreError::IdSpaceExhausted)?;

            let stored = wallet.with_id(id);
            let json = serde_json::to_vec(&stored)?;
            table.insert(id.get(), json.as_slice())?;

            let mut idx_table = write_txn.open_table(OWNER_WALLETS)?;
            let key = make_owner_key(stored.owner(), id);
            idx_table.insert(key.as_slice(), id.get())?;

            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    fn update(&self, wallet: &Wallet) -> StoreResult<()> {
        let id = wallet.id().ok_or(StoreError::MissingId)?;
        let json = serde_json::to_vec(wallet)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLETS)?;
            if table.get(id.get())?.is_none() {
                return Err(StoreError::NotFound(id));
            }
            // Owner is immutable, so the owner index needs no change
            table.insert(id.get(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn find(&self, filter: &WalletFilter) -> StoreResult<Vec<Wallet>> {
        let candidates: Vec<Wallet> = match (filter.id, filter.owner.as_deref()) {
            (Some(id), _) => self.get(id)?.into_iter().collect(),
            (None, Some(owner)) => self.list_by_owner(owner)?,
            (None, None) => self.list_all()?,
        };
        Ok(candidates
            .into_iter()
            .filter(|w| filter.matches(w))
            .collect())
    }

    fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(WALLETS)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
