// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet request validation.
//!
//! Checks run in a fixed order and stop at the first failure, so a request
//! that breaks several rules always reports the same single reason:
//!
//! 1. request present
//! 2. wallet name not blank
//! 3. owner phone number not blank
//! 4. owner phone number is 7-15 digits
//! 5. wallet type known
//! 6. account scheme known
//! 7. account number not blank
//! 8. MoMo account number is `0` + 9 digits
//! 9. card account number is 6 digits
//! 10. MoMo scheme is MTN, Vodafone or AirtelTigo
//! 11. card scheme is Mastercard or Visa

use std::sync::LazyLock;

use regex::Regex;

use crate::models::CreateWalletRequest;
use crate::wallet::{AccountScheme, WalletType};

static OWNER_PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,15}$").expect("owner phone number pattern"));

static MOMO_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[0-9]{9}$").expect("momo number pattern"));

static CARD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("card number pattern"));

/// Why a wallet request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("Invalid wallet: wallet cannot be null")]
    NullWallet,

    #[error("Invalid Wallet name, please provide a valid string")]
    InvalidWalletName,

    #[error("Invalid phone number: phone number cannot be empty")]
    EmptyWalletOwnerNumber,

    #[error(
        "Invalid wallet owner's mobile number: Please enter a valid international number \
         without spaces or the '+' symbol (e.g., 233247000000)."
    )]
    InvalidWalletOwnerPhoneNumberFormat,

    #[error("Unsupported wallet type: Wallet type must be MoMo or Card")]
    UnknownWalletType,

    #[error("Unsupported account scheme selected: Please choose a valid option")]
    UnknownAccountScheme,

    #[error("Invalid account number: Account number cannot be empty")]
    EmptyAccountNumber,

    #[error("Invalid MoMo number: A MoMo number must be 10 digits starting with 0")]
    InvalidMoMoNumber,

    #[error("Invalid Card number: A Card number must be the first 6 digits on your card")]
    InvalidCardNumber,

    #[error(
        "Invalid Account Scheme selected for MoMo wallet. \
         MoMo wallets can only be Mtn, Vodafone or AirtelTigo"
    )]
    InvalidAccountSchemeForMoMoWallets,

    #[error(
        "Invalid Account Scheme selected for Card wallet. \
         Card wallets can only be MasterCard or Visa"
    )]
    InvalidAccountSchemeForCardWallets,
}

impl InvalidReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::NullWallet => "null_wallet",
            InvalidReason::InvalidWalletName => "invalid_wallet_name",
            InvalidReason::EmptyWalletOwnerNumber => "empty_wallet_owner_number",
            InvalidReason::InvalidWalletOwnerPhoneNumberFormat => {
                "invalid_wallet_owner_phone_number_format"
            }
            InvalidReason::UnknownWalletType => "unknown_wallet_type",
            InvalidReason::UnknownAccountScheme => "unknown_account_scheme",
            InvalidReason::EmptyAccountNumber => "empty_account_number",
            InvalidReason::InvalidMoMoNumber => "invalid_momo_number",
            InvalidReason::InvalidCardNumber => "invalid_card_number",
            InvalidReason::InvalidAccountSchemeForMoMoWallets => {
                "invalid_account_scheme_for_momo_wallets"
            }
            InvalidReason::InvalidAccountSchemeForCardWallets => {
                "invalid_account_scheme_for_card_wallets"
            }
        }
    }
}

/// A request that passed every check, with internal enums in place of the
/// external sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWallet {
    pub wallet_name: String,
    pub account_number: String,
    pub wallet_type: WalletType,
    pub account_scheme: AccountScheme,
    pub owner: String,
}

/// Validate a wallet request. `None` stands for an absent request body.
pub fn validate_wallet(
    request: Option<&CreateWalletRequest>,
) -> Result<ValidatedWallet, InvalidReason> {
    let request = request.ok_or(InvalidReason::NullWallet)?;

    if is_blank(&request.wallet_name) {
        return Err(InvalidReason::InvalidWalletName);
    }
    if is_blank(&request.owner_phone_number) {
        return Err(InvalidReason::EmptyWalletOwnerNumber);
    }
    if !OWNER_PHONE_NUMBER.is_match(&request.owner_phone_number) {
        return Err(InvalidReason::InvalidWalletOwnerPhoneNumberFormat);
    }

    let wallet_type = request
        .wallet_type
        .known()
        .ok_or(InvalidReason::UnknownWalletType)?;
    let account_scheme = request
        .account_scheme
        .known()
        .ok_or(InvalidReason::UnknownAccountScheme)?;

    if is_blank(&request.account_number) {
        return Err(InvalidReason::EmptyAccountNumber);
    }
    match wallet_type {
        WalletType::Momo if !MOMO_NUMBER.is_match(&request.account_number) => {
            return Err(InvalidReason::InvalidMoMoNumber);
        }
        WalletType::Card if !CARD_NUMBER.is_match(&request.account_number) => {
            return Err(InvalidReason::InvalidCardNumber);
        }
        _ => {}
    }

    if !account_scheme.supports(wallet_type) {
        return Err(match wallet_type {
            WalletType::Momo => InvalidReason::InvalidAccountSchemeForMoMoWallets,
            WalletType::Card => InvalidReason::InvalidAccountSchemeForCardWallets,
        });
    }

    Ok(ValidatedWallet {
        wallet_name: request.wallet_name.clone(),
        account_number: request.account_number.clone(),
        wallet_type,
        account_scheme,
        owner: request.owner_phone_number.clone(),
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
