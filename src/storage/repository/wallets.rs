// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet repository.
//!
//! The only component that sees every stored wallet, so it owns the rules a
//! single-record validator cannot check:
//!
//! - no two **active** wallets share an (account number, owner) pair
//! - an owner holds at most [`MAX_ACTIVE_WALLETS_PER_OWNER`] **active** wallets
//!
//! Deactivated wallets are ignored by both rules and by every read.
//!
//! ## Concurrency
//!
//! `add` and `mark_deleted` hold a per-owner async lock around their
//! check-then-write sequence, so concurrent requests for one owner cannot
//! both pass the duplicate or quota check. Different owners never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::storage::{StoreError, WalletFilter, WalletStore};
use crate::wallet::{Wallet, WalletId, MAX_ACTIVE_WALLETS_PER_OWNER};

// =============================================================================
// Errors
// =============================================================================

/// Business rule broken by an add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WalletConflict {
    /// An active wallet with the same account number exists for the owner
    #[error("Wallet already added for user")]
    AlreadyExists,
    /// The owner already holds the maximum number of active wallets
    #[error("A user cannot have more than {limit} wallets")]
    QuotaExceeded { limit: usize },
}

impl WalletConflict {
    pub fn code(&self) -> &'static str {
        match self {
            WalletConflict::AlreadyExists => "wallet_already_exists",
            WalletConflict::QuotaExceeded { .. } => "wallet_quota_exceeded",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Conflict(#[from] WalletConflict),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

// =============================================================================
// Per-owner Serialization
// =============================================================================

/// Async locks keyed by owner phone number. Entries are removed once no
/// task holds or waits on them.
#[derive(Default)]
struct OwnerLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl OwnerLocks {
    async fn acquire(&self, owner: &str) -> OwnerGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(owner.to_string()).or_default().clone()
        };
        let guard = lock.clone().lock_owned().await;
        OwnerGuard {
            locks: self,
            owner: owner.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct OwnerGuard<'a> {
    locks: &'a OwnerLocks,
    owner: String,
    lock: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder
        self.guard.take();
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.owner);
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for wallet lifecycle operations over a [`WalletStore`].
pub struct WalletRepository {
    store: Arc<dyn WalletStore>,
    owner_locks: OwnerLocks,
}

impl WalletRepository {
    /// Create a new WalletRepository.
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            store,
            owner_locks: OwnerLocks::default(),
        }
    }

    /// The underlying store, for health checks.
    pub fn store(&self) -> &dyn WalletStore {
        self.store.as_ref()
    }

    /// Register a new wallet.
    ///
    /// # Returns
    /// - `Ok(wallet)` with the store-assigned id
    /// - `Err(Conflict(AlreadyExists))` if the owner has an active wallet
    ///   with the same account number
    /// - `Err(Conflict(QuotaExceeded))` if the owner already has the
    ///   maximum number of active wallets
    pub async fn add(&self, wallet: Wallet) -> RepositoryResult<Wallet> {
        let _guard = self.owner_locks.acquire(wallet.owner()).await;

        let duplicate = WalletFilter::active_only()
            .with_owner(wallet.owner())
            .with_account_number(wallet.account_number());
        if self.store.any(&duplicate)? {
            tracing::info!(owner = %wallet.owner(), "Wallet already added for owner");
            return Err(WalletConflict::AlreadyExists.into());
        }

        let owned = WalletFilter::active_only().with_owner(wallet.owner());
        let active = self.store.count(&owned)?;
        if active >= MAX_ACTIVE_WALLETS_PER_OWNER {
            tracing::info!(
                owner = %wallet.owner(),
                active,
                "Active wallet quota reached"
            );
            return Err(WalletConflict::QuotaExceeded {
                limit: MAX_ACTIVE_WALLETS_PER_OWNER,
            }
            .into());
        }

        let stored = self.store.insert(wallet)?;
        tracing::debug!(
            wallet_id = ?stored.id(),
            owner = %stored.owner(),
            "Wallet stored"
        );
        Ok(stored)
    }

    /// Get an active wallet by id. Inactive and missing wallets are `None`.
    pub async fn get_by_id(&self, id: WalletId) -> RepositoryResult<Option<Wallet>> {
        let filter = WalletFilter::active_only().with_id(id);
        Ok(self.store.find(&filter)?.into_iter().next())
    }

    /// All active wallets in creation order.
    pub async fn get_all(&self) -> RepositoryResult<Vec<Wallet>> {
        Ok(self.store.find(&WalletFilter::active_only())?)
    }

    /// Active wallets of one owner in creation order.
    pub async fn get_by_owner(&self, owner: &str) -> RepositoryResult<Vec<Wallet>> {
        if owner.trim().is_empty() {
            return Err(RepositoryError::InvalidArgument(
                "owner phone number cannot be empty".to_string(),
            ));
        }
        let filter = WalletFilter::active_only().with_owner(owner);
        Ok(self.store.find(&filter)?)
    }

    /// Soft-delete an active wallet.
    ///
    /// Returns the now-inactive wallet, or `None` when no active wallet has
    /// this id (including one that was already deleted).
    pub async fn mark_deleted(&self, id: WalletId) -> RepositoryResult<Option<Wallet>> {
        let Some(found) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let _guard = self.owner_locks.acquire(found.owner()).await;

        // Re-read under the owner lock; a concurrent delete may have won
        let Some(mut wallet) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        wallet.deactivate();
        self.store.update(&wallet)?;
        tracing::debug!(wallet_id = %id, owner = %wallet.owner(), "Wallet deactivated");
        Ok(Some(wallet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    use crate::storage::{InMemoryWalletStore, StoreResult, WalletDatabase};
    use crate::wallet::{AccountScheme, WalletType};

    fn repo() -> WalletRepository {
        WalletRepository::new(Arc::new(InMemoryWalletStore::new()))
    }

    fn momo(name: &str, account_number: &str, scheme: AccountScheme, owner: &str) -> Wallet {
        Wallet::new(name, account_number, WalletType::Momo, scheme, owner)
    }

    fn card(name: &str, account_number: &str, scheme: AccountScheme, owner: &str) -> Wallet {
        Wallet::new(name, account_number, WalletType::Card, scheme, owner)
    }

    const FRODO: &str = "0244123456";

    #[tokio::test]
    async fn add_then_get_round_trip() {
        let repo = repo();
        let stored = repo
            .add(card("Frodo's Visa", "192837", AccountScheme::Visa, FRODO))
            .await
            .unwrap();
        let id = stored.id().expect("id assigned");

        let loaded = repo.get_by_id(id).await.unwrap().expect("wallet is active");
        assert_eq!(loaded.wallet_name(), "Frodo's Visa");
        assert_eq!(loaded.account_number(), "192837");
        assert_eq!(loaded.wallet_type(), WalletType::Card);
        assert_eq!(loaded.account_scheme(), AccountScheme::Visa);
        assert_eq!(loaded.owner(), FRODO);
        assert!(loaded.is_active());
        assert!(loaded.updated_at().is_none());
    }

    #[tokio::test]
    async fn add_with_four_active_wallets_succeeds() {
        let repo = repo();
        repo.add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO)).await.unwrap();
        repo.add(momo("Frodo's Voda", "0204123456", AccountScheme::Vodafone, FRODO)).await.unwrap();
        repo.add(card("Frodo's Mastercard", "123456", AccountScheme::Mastercard, FRODO)).await.unwrap();
        repo.add(card("Bilbo's Mastercard", "567890", AccountScheme::Mastercard, "0240123789"))
            .await
            .unwrap();
        repo.add(momo("Frodo's AirtelTigo", "0266123456", AccountScheme::AirtelTigo, FRODO))
            .await
            .unwrap();

        let fifth = repo
            .add(card("Frodo's Visa", "192837", AccountScheme::Visa, FRODO))
            .await;
        assert!(fifth.is_ok());
        assert_eq!(repo.get_by_owner(FRODO).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn add_beyond_quota_is_rejected() {
        let repo = repo();
        for n in 0..5 {
            repo.add(momo("MoMo", &format!("026612345{n}"), AccountScheme::AirtelTigo, FRODO))
                .await
                .unwrap();
        }

        let result = repo
            .add(card("Frodo's Visa", "192837", AccountScheme::Visa, FRODO))
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Conflict(WalletConflict::QuotaExceeded { limit: 5 }))
        ));
        assert_eq!(repo.get_all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn quota_counts_active_wallets_only() {
        let repo = repo();
        for n in 0..6 {
            let stored = repo
                .add(momo("MoMo", &format!("026612345{n}"), AccountScheme::AirtelTigo, FRODO))
                .await
                .unwrap();
            repo.mark_deleted(stored.id().unwrap()).await.unwrap();
        }

        let result = repo
            .add(card("Frodo's Visa", "192837", AccountScheme::Visa, FRODO))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn duplicate_active_pair_is_rejected() {
        let repo = repo();
        repo.add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO)).await.unwrap();

        let result = repo
            .add(momo("MTN", "0244123456", AccountScheme::AirtelTigo, FRODO))
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Conflict(WalletConflict::AlreadyExists))
        ));
    }

    #[tokio::test]
    async fn duplicate_is_checked_before_quota() {
        let repo = repo();
        for n in 0..5 {
            repo.add(momo("MoMo", &format!("026612345{n}"), AccountScheme::Mtn, FRODO))
                .await
                .unwrap();
        }

        let result = repo
            .add(momo("Again", "0266123450", AccountScheme::Mtn, FRODO))
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Conflict(WalletConflict::AlreadyExists))
        ));
    }

    #[tokio::test]
    async fn same_account_for_another_owner_succeeds() {
        let repo = repo();
        repo.add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO)).await.unwrap();

        let result = repo
            .add(momo("Gandalf Ventures MTN", "0244123456", AccountScheme::AirtelTigo, "0302876543"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn account_can_be_reused_after_deactivation() {
        let repo = repo();
        let first = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap();
        repo.mark_deleted(first.id().unwrap()).await.unwrap();

        let again = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap();
        assert_ne!(again.id(), first.id());
    }

    #[tokio::test]
    async fn get_by_id_hides_missing_and_inactive() {
        let repo = repo();
        assert!(repo.get_by_id(WalletId::new(1).unwrap()).await.unwrap().is_none());

        let stored = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap();
        let id = stored.id().unwrap();
        repo.mark_deleted(id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_deleted_returns_inactive_wallet_once() {
        let repo = repo();
        let stored = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap();
        let id = stored.id().unwrap();

        let deleted = repo.mark_deleted(id).await.unwrap().expect("first delete");
        assert!(!deleted.is_active());
        assert!(deleted.updated_at().is_some());
        assert_eq!(deleted.id(), Some(id));

        assert!(repo.mark_deleted(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_deleted_unknown_id_is_none() {
        let repo = repo();
        assert!(repo
            .mark_deleted(WalletId::new(99).unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn listings_exclude_deleted_and_keep_order() {
        let repo = repo();
        let mut ids = Vec::new();
        for n in 0..4 {
            let stored = repo
                .add(momo(&format!("w{n}"), &format!("020000000{n}"), AccountScheme::Mtn, FRODO))
                .await
                .unwrap();
            ids.push(stored.id().unwrap());
        }
        repo.mark_deleted(ids[0]).await.unwrap();
        repo.mark_deleted(ids[2]).await.unwrap();

        let all: Vec<_> = repo.get_all().await.unwrap().iter().map(|w| w.id().unwrap()).collect();
        assert_eq!(all, vec![ids[1], ids[3]]);

        let owned: Vec<_> = repo
            .get_by_owner(FRODO)
            .await
            .unwrap()
            .iter()
            .map(|w| w.id().unwrap())
            .collect();
        assert_eq!(owned, vec![ids[1], ids[3]]);
    }

    #[tokio::test]
    async fn get_by_owner_filters_other_owners() {
        let repo = repo();
        repo.add(momo("a", "0200000001", AccountScheme::Mtn, FRODO)).await.unwrap();
        repo.add(momo("b", "0200000002", AccountScheme::Mtn, "0240123789")).await.unwrap();

        let owned = repo.get_by_owner("0240123789").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].wallet_name(), "b");

        assert!(repo.get_by_owner("0550000000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_listings_are_not_errors() {
        let repo = repo();
        assert!(repo.get_all().await.unwrap().is_empty());
        assert!(repo.get_by_owner(FRODO).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_owner_is_an_invalid_argument() {
        let repo = repo();
        assert!(matches!(
            repo.get_by_owner("").await,
            Err(RepositoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.get_by_owner("   ").await,
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    // -------------------------------------------------------------------------
    // redb-backed
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn rules_hold_on_redb_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = WalletDatabase::open(&dir.path().join("wallets.redb")).unwrap();
        let repo = WalletRepository::new(Arc::new(db));

        let first = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap();
        let first_id = first.id().unwrap();

        let dup = repo
            .add(momo("Again", "0244123456", AccountScheme::Mtn, FRODO))
            .await;
        assert!(matches!(
            dup,
            Err(RepositoryError::Conflict(WalletConflict::AlreadyExists))
        ));

        // Owner whose number prefixes FRODO's must not share the index range
        repo.add(momo("Prefix", "0244123456", AccountScheme::Mtn, "024412345"))
            .await
            .unwrap();

        let deleted = repo.mark_deleted(first_id).await.unwrap().expect("active");
        assert!(!deleted.is_active());
        assert!(repo.mark_deleted(first_id).await.unwrap().is_none());
        assert!(repo.get_by_id(first_id).await.unwrap().is_none());

        // Reuse after deactivation, then fill the quota
        for account in ["0244123456", "0244123451", "0244123452", "0244123453", "0244123454"] {
            repo.add(momo("MoMo", account, AccountScheme::Mtn, FRODO))
                .await
                .unwrap();
        }
        let over = repo
            .add(momo("Sixth", "0244123459", AccountScheme::Mtn, FRODO))
            .await;
        assert!(matches!(
            over,
            Err(RepositoryError::Conflict(WalletConflict::QuotaExceeded { limit: 5 }))
        ));

        let owned: Vec<u64> = repo
            .get_by_owner(FRODO)
            .await
            .unwrap()
            .iter()
            .map(|w| w.id().unwrap().get())
            .collect();
        assert_eq!(owned, vec![3, 4, 5, 6, 7]);
        assert_eq!(repo.get_all().await.unwrap().len(), 6);
    }

    // -------------------------------------------------------------------------
    // Store failures
    // -------------------------------------------------------------------------

    /// Store whose insert always fails with a timeout.
    #[derive(Default)]
    struct FailingInsertStore {
        inner: InMemoryWalletStore,
    }

    impl WalletStore for FailingInsertStore {
        fn insert(&self, _wallet: Wallet) -> StoreResult<Wallet> {
            Err(StoreError::Io(io::Error::new(io::ErrorKind::TimedOut, "disk stalled")))
        }
        fn update(&self, wallet: &Wallet) -> StoreResult<()> {
            self.inner.update(wallet)
        }
        fn find(&self, filter: &WalletFilter) -> StoreResult<Vec<Wallet>> {
            self.inner.find(filter)
        }
        fn health_check(&self) -> StoreResult<()> {
            self.inner.health_check()
        }
    }

    #[tokio::test]
    async fn store_failures_propagate_unmodified() {
        let repo = WalletRepository::new(Arc::new(FailingInsertStore::default()));
        let result = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await;

        match result {
            Err(RepositoryError::Store(e)) => assert!(e.is_transient()),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    /// Store that stalls between the read checks and the insert, widening the
    /// window in which unsynchronized adds would race.
    #[derive(Default)]
    struct SlowStore {
        inner: InMemoryWalletStore,
    }

    impl WalletStore for SlowStore {
        fn insert(&self, wallet: Wallet) -> StoreResult<Wallet> {
            std::thread::sleep(Duration::from_millis(5));
            self.inner.insert(wallet)
        }
        fn update(&self, wallet: &Wallet) -> StoreResult<()> {
            self.inner.update(wallet)
        }
        fn find(&self, filter: &WalletFilter) -> StoreResult<Vec<Wallet>> {
            self.inner.find(filter)
        }
        fn health_check(&self) -> StoreResult<()> {
            self.inner.health_check()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_respect_quota() {
        let repo = Arc::new(WalletRepository::new(Arc::new(SlowStore::default())));

        let handles: Vec<_> = (0..10)
            .map(|n| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.add(momo("MoMo", &format!("020000000{n}"), AccountScheme::Mtn, FRODO))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        let mut over_quota = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(RepositoryError::Conflict(WalletConflict::QuotaExceeded { .. })) => {
                    over_quota += 1
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(accepted, MAX_ACTIVE_WALLETS_PER_OWNER);
        assert_eq!(over_quota, 10 - MAX_ACTIVE_WALLETS_PER_OWNER);
        assert_eq!(repo.get_by_owner(FRODO).await.unwrap().len(), 5);
        assert_eq!(repo.owner_locks.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_adds_store_one_wallet() {
        let repo = Arc::new(WalletRepository::new(Arc::new(SlowStore::default())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(RepositoryError::Conflict(WalletConflict::AlreadyExists)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_deactivate_once() {
        let repo = Arc::new(repo());
        let id = repo
            .add(momo("Frodo's Mtn", "0244123456", AccountScheme::Mtn, FRODO))
            .await
            .unwrap()
            .id()
            .unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.mark_deleted(id).await })
            })
            .collect();

        let mut deleted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                deleted += 1;
            }
        }
        assert_eq!(deleted, 1);
    }
}
