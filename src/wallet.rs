// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Entity
//!
//! A wallet is a linked payment account (mobile money or card) held by an
//! owner identified by phone number. Every field except the lifecycle state
//! is fixed at construction.
//!
//! ## Lifecycle
//!
//! ```text
//! Wallet::new ──► Active ──deactivate()──► Deactivated
//! ```
//!
//! There is no reactivation and no hard delete. Deactivated wallets stay in
//! storage for history but are invisible to queries and do not count toward
//! the duplicate or quota rules.

use std::fmt;
use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::ValidatedWallet;

/// Maximum number of simultaneously active wallets per owner.
pub const MAX_ACTIVE_WALLETS_PER_OWNER: usize = 5;

// =============================================================================
// Identity
// =============================================================================

/// Store-assigned wallet identifier. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(NonZeroU64);

impl WalletId {
    /// Build an id from a raw integer, rejecting anything below 1.
    pub fn new(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().and_then(NonZeroU64::new).map(Self)
    }

    pub(crate) fn from_u64(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Payment Rail and Scheme
// =============================================================================

/// Payment rail of a stored wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletType {
    /// Mobile money, funded through a telecom-linked account
    Momo,
    /// Payment card
    Card,
}

/// Provider or network behind a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountScheme {
    Mtn,
    Vodafone,
    AirtelTigo,
    Mastercard,
    Visa,
}

impl AccountScheme {
    /// Whether this scheme may be used with the given wallet type.
    pub fn supports(self, wallet_type: WalletType) -> bool {
        match wallet_type {
            WalletType::Momo => matches!(self, Self::Mtn | Self::Vodafone | Self::AirtelTigo),
            WalletType::Card => matches!(self, Self::Mastercard | Self::Visa),
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle state of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    /// Visible to queries and counted by the duplicate and quota rules
    #[default]
    Active,
    /// Soft-deleted, retained for history only
    Deactivated,
}

// =============================================================================
// Wallet
// =============================================================================

/// A registered wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: Option<WalletId>,
    wallet_name: String,
    account_number: String,
    wallet_type: WalletType,
    account_scheme: AccountScheme,
    owner: String,
    created_at: DateTime<Utc>,
    status: WalletStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Create a new active wallet.
    ///
    /// Fields are trusted as-is; format checks belong to
    /// [`crate::validation::validate_wallet`]. The id stays unassigned until
    /// the wallet is inserted into a store.
    pub fn new(
        wallet_name: impl Into<String>,
        account_number: impl Into<String>,
        wallet_type: WalletType,
        account_scheme: AccountScheme,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            wallet_name: wallet_name.into(),
            account_number: account_number.into(),
            wallet_type,
            account_scheme,
            owner: owner.into(),
            created_at: Utc::now(),
            status: WalletStatus::Active,
            updated_at: None,
        }
    }

    pub fn id(&self) -> Option<WalletId> {
        self.id
    }

    pub fn wallet_name(&self) -> &str {
        &self.wallet_name
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn wallet_type(&self) -> WalletType {
        self.wallet_type
    }

    pub fn account_scheme(&self) -> AccountScheme {
        self.account_scheme
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> WalletStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Mark the wallet as deactivated and stamp `updated_at`.
    ///
    /// Not guarded here: calling it twice restamps `updated_at`. The
    /// repository only ever deactivates wallets it found active.
    pub fn deactivate(&mut self) {
        self.status = WalletStatus::Deactivated;
        self.updated_at = Some(Utc::now());
    }

    /// Assign the store identity. Only stores call this.
    pub(crate) fn with_id(mut self, id: WalletId) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<ValidatedWallet> for Wallet {
    fn from(valid: ValidatedWallet) -> Self {
        Wallet::new(
            valid.wallet_name,
            valid.account_number,
            valid.wallet_type,
            valid.account_scheme,
            valid.owner,
        )
    }
}
