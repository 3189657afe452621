// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Storage
//!
//! The [`WalletStore`] trait is the only contract the repository relies on:
//! insert one record, update one record, query by a conjunction of equality
//! predicates, and report health. Each call commits its own changes before
//! returning.
//!
//! ## Implementations
//!
//! - [`WalletDatabase`]: embedded redb file, used in production
//! - [`InMemoryWalletStore`]: process-local, used by tests and ephemeral runs
//!
//! Query results are always in id order, which is insertion order.

pub mod memory;
pub mod repository;
pub mod wallet_db;

use std::io;

use crate::wallet::{Wallet, WalletId};

pub use memory::InMemoryWalletStore;
pub use repository::{RepositoryError, RepositoryResult, WalletConflict, WalletRepository};
pub use wallet_db::WalletDatabase;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("wallet store lock poisoned")]
    LockPoisoned,

    #[error("wallet has not been stored yet")]
    MissingId,

    #[error("wallet {0} not found")]
    NotFound(WalletId),

    #[error("wallet id space exhausted")]
    IdSpaceExhausted,
}

impl StoreError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(e) => io_is_transient(e),
            StoreError::RedbDatabase(redb::DatabaseError::DatabaseAlreadyOpen) => true,
            StoreError::RedbDatabase(redb::DatabaseError::Storage(e))
            | StoreError::RedbTransaction(redb::TransactionError::Storage(e))
            | StoreError::RedbTable(redb::TableError::Storage(e))
            | StoreError::RedbCommit(redb::CommitError::Storage(e))
            | StoreError::RedbStorage(e) => storage_is_transient(e),
            _ => false,
        }
    }
}

fn storage_is_transient(e: &redb::StorageError) -> bool {
    matches!(e, redb::StorageError::Io(io) if io_is_transient(io))
}

fn io_is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ResourceBusy
    )
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Query Filter
// =============================================================================

/// Conjunction of optional equality predicates. An empty filter matches
/// every stored wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletFilter {
    pub id: Option<WalletId>,
    pub owner: Option<String>,
    pub account_number: Option<String>,
    pub active: Option<bool>,
}

impl WalletFilter {
    /// Filter matching active wallets only.
    pub fn active_only() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: WalletId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    pub fn matches(&self, wallet: &Wallet) -> bool {
        self.id.is_none_or(|id| wallet.id() == Some(id))
            && self.owner.as_deref().is_none_or(|o| wallet.owner() == o)
            && self
                .account_number
                .as_deref()
                .is_none_or(|n| wallet.account_number() == n)
            && self.active.is_none_or(|a| wallet.is_active() == a)
    }
}

// =============================================================================
// Store Contract
// =============================================================================

/// Backing store for wallets.
pub trait WalletStore: Send + Sync {
    /// Persist a new wallet, assigning the next id. Any id already on the
    /// wallet is replaced.
    fn insert(&self, wallet: Wallet) -> StoreResult<Wallet>;

    /// Replace an existing wallet, matched by id.
    fn update(&self, wallet: &Wallet) -> StoreResult<()>;

    /// All wallets matching the filter, in id order.
    fn find(&self, filter: &WalletFilter) -> StoreResult<Vec<Wallet>>;

    /// Number of wallets matching the filter.
    fn count(&self, filter: &WalletFilter) -> StoreResult<usize> {
        Ok(self.find(filter)?.len())
    }

    /// Whether at least one wallet matches the filter.
    fn any(&self, filter: &WalletFilter) -> StoreResult<bool> {
        Ok(self.count(filter)? > 0)
    }

    /// Verify the store can serve reads.
    fn health_check(&self) -> StoreResult<()>;
}
