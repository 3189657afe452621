// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API. All types derive
//! `ToSchema` for OpenAPI documentation and use camelCase on the wire.
//!
//! ## Untrusted Enums
//!
//! [`ExternalWalletType`] and [`ExternalAccountScheme`] carry an `UNKNOWN`
//! sentinel. Missing, `null` or unrecognised values all deserialize to it,
//! so that rejection happens in the validator with a proper reason rather
//! than as an opaque JSON error. The sentinel never reaches the
//! [`Wallet`] entity. String fields follow the same rule: `null` reads as
//! an empty string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::wallet::{AccountScheme, Wallet, WalletType};

// =============================================================================
// External Enums
// =============================================================================

/// Wallet type as supplied by API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalWalletType {
    #[default]
    Unknown,
    Momo,
    Card,
}

impl ExternalWalletType {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MOMO" => Self::Momo,
            "CARD" => Self::Card,
            _ => Self::Unknown,
        }
    }

    /// Internal wallet type, or `None` for the sentinel.
    pub fn known(self) -> Option<WalletType> {
        match self {
            Self::Unknown => None,
            Self::Momo => Some(WalletType::Momo),
            Self::Card => Some(WalletType::Card),
        }
    }
}

impl<'de> Deserialize<'de> for ExternalWalletType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Account scheme as supplied by API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalAccountScheme {
    #[default]
    Unknown,
    Mtn,
    Vodafone,
    AirtelTigo,
    Mastercard,
    Visa,
}

impl ExternalAccountScheme {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MTN" => Self::Mtn,
            "VODAFONE" => Self::Vodafone,
            "AIRTELTIGO" => Self::AirtelTigo,
            "MASTERCARD" => Self::Mastercard,
            "VISA" => Self::Visa,
            _ => Self::Unknown,
        }
    }

    /// Internal account scheme, or `None` for the sentinel.
    pub fn known(self) -> Option<AccountScheme> {
        match self {
            Self::Unknown => None,
            Self::Mtn => Some(AccountScheme::Mtn),
            Self::Vodafone => Some(AccountScheme::Vodafone),
            Self::AirtelTigo => Some(AccountScheme::AirtelTigo),
            Self::Mastercard => Some(AccountScheme::Mastercard),
            Self::Visa => Some(AccountScheme::Visa),
        }
    }
}

impl<'de> Deserialize<'de> for ExternalAccountScheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

// =============================================================================
// Wallet Models
// =============================================================================

/// Request to register a new wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateWalletRequest {
    /// Display name chosen by the owner.
    #[serde(deserialize_with = "null_as_empty")]
    pub wallet_name: String,
    /// MoMo number (`0` + 9 digits) or first 6 digits of a card.
    #[serde(deserialize_with = "null_as_empty")]
    pub account_number: String,
    /// `MOMO` or `CARD`.
    pub wallet_type: ExternalWalletType,
    /// `MTN`, `VODAFONE`, `AIRTELTIGO`, `MASTERCARD` or `VISA`.
    pub account_scheme: ExternalAccountScheme,
    /// Owner phone number, 7 to 15 digits without `+` or spaces.
    #[serde(deserialize_with = "null_as_empty")]
    pub owner_phone_number: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A wallet as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    /// Store-assigned identifier.
    pub id: u64,
    pub wallet_name: String,
    pub account_number: String,
    pub wallet_type: WalletType,
    pub account_scheme: AccountScheme,
    pub owner_phone_number: String,
    /// False once the wallet has been deleted.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Set when the wallet is deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Wallet> for WalletResponse {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id().map(|id| id.get()).unwrap_or_default(),
            wallet_name: wallet.wallet_name().to_string(),
            account_number: wallet.account_number().to_string(),
            wallet_type: wallet.wallet_type(),
            account_scheme: wallet.account_scheme(),
            owner_phone_number: wallet.owner().to_string(),
            is_active: wallet.is_active(),
            created_at: wallet.created_at(),
            updated_at: wallet.updated_at(),
        }
    }
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self::from(&wallet)
    }
}

/// Query parameters for listing wallets.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct WalletListQuery {
    /// Restrict the listing to one owner phone number.
    pub owner: Option<String>,
}

/// Error body returned by every failing endpoint, including rejected
/// path and query parameters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
    /// Stable machine-readable code.
    pub error_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletId;

    #[test]
    fn request_uses_camel_case_and_known_enums() {
        let request: CreateWalletRequest = serde_json::from_str(
            r#"{
                "walletName": "Frodo's Mtn",
                "accountNumber": "0244123456",
                "walletType": "MOMO",
                "accountScheme": "AIRTELTIGO",
                "ownerPhoneNumber": "233244123456"
            }"#,
        )
        .unwrap();

        assert_eq!(request.wallet_name, "Frodo's Mtn");
        assert_eq!(request.wallet_type, ExternalWalletType::Momo);
        assert_eq!(request.account_scheme, ExternalAccountScheme::AirtelTigo);
        assert_eq!(request.owner_phone_number, "233244123456");
    }

    #[test]
    fn unrecognised_or_missing_enums_become_unknown() {
        let request: CreateWalletRequest = serde_json::from_str(
            r#"{ "walletName": "x", "walletType": "BANK", "accountScheme": null }"#,
        )
        .unwrap();

        assert_eq!(request.wallet_type, ExternalWalletType::Unknown);
        assert_eq!(request.account_scheme, ExternalAccountScheme::Unknown);
        assert_eq!(request.account_number, "");
        assert_eq!(request.owner_phone_number, "");
    }

    #[test]
    fn null_strings_read_as_empty() {
        let request: CreateWalletRequest = serde_json::from_str(
            r#"{ "walletName": null, "accountNumber": null, "ownerPhoneNumber": null }"#,
        )
        .unwrap();

        assert_eq!(request.wallet_name, "");
        assert_eq!(request.account_number, "");
        assert_eq!(request.owner_phone_number, "");
    }

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!(ExternalWalletType::parse("card"), ExternalWalletType::Card);
        assert_eq!(ExternalAccountScheme::parse("Visa"), ExternalAccountScheme::Visa);
        assert_eq!(ExternalAccountScheme::parse(" mtn "), ExternalAccountScheme::Mtn);
    }

    #[test]
    fn sentinel_has_no_internal_counterpart() {
        assert_eq!(ExternalWalletType::Unknown.known(), None);
        assert_eq!(ExternalAccountScheme::Unknown.known(), None);
        assert_eq!(ExternalWalletType::Card.known(), Some(WalletType::Card));
        assert_eq!(
            ExternalAccountScheme::Mastercard.known(),
            Some(AccountScheme::Mastercard)
        );
    }

    #[test]
    fn response_from_wallet() {
        let wallet = Wallet::new(
            "Frodo's Visa",
            "192837",
            WalletType::Card,
            AccountScheme::Visa,
            "233244123456",
        )
        .with_id(WalletId::new(12).unwrap());

        let response = WalletResponse::from(&wallet);
        assert_eq!(response.id, 12);
        assert_eq!(response.owner_phone_number, "233244123456");
        assert!(response.is_active);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["walletType"], "CARD");
        assert_eq!(json["accountScheme"], "VISA");
        assert!(json.get("updatedAt").is_none());
    }
}
