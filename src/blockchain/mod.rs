// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet and chain integration.
//!
//! The controllers never talk to a provider directly. They go through the
//! collaborator traits defined here:
//! - [`Wallet`] signs messages and sends transactions for the connected account
//! - [`ReceiptWatcher`] resolves a transaction hash to a mined outcome
//! - [`MerchantCredential`] checks and mints the merchant NFT
//! - [`TxNotifier`] reports issued transaction hashes
//!
//! [`LocalWallet`] implements the first three on top of an alloy provider
//! and a locally held key.

pub mod erc20;
pub mod local;
pub mod notify;
pub mod signing;
pub mod types;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::TransactionPayload;

pub use local::LocalWallet;
pub use notify::LogNotifier;
pub use types::*;

/// Errors reported by the wallet collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user declined the request in their wallet.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("Timed out waiting for the wallet or chain")]
    Timeout,

    #[error("{0}")]
    Failed(String),
}

impl WalletError {
    /// Classify a provider error message, recognising user rejections.
    pub fn from_provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_user_rejection(&message) {
            WalletError::Rejected(message)
        } else {
            WalletError::Failed(message)
        }
    }

    /// First line of the underlying message, for inline display.
    pub fn short_message(&self) -> String {
        match self {
            WalletError::Rejected(msg) => {
                first_line(msg).unwrap_or_else(|| "Request rejected in wallet.".to_string())
            }
            WalletError::NotConnected => "Please connect your wallet first.".to_string(),
            WalletError::Timeout => "Timed out waiting for confirmation.".to_string(),
            WalletError::Failed(msg) => {
                first_line(msg).unwrap_or_else(|| "Transaction failed".to_string())
            }
        }
    }
}

fn first_line(msg: &str) -> Option<String> {
    msg.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn is_user_rejection(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected by user")
        || lower.contains("code: 4001")
        || lower.contains("\"code\":4001")
}

/// Result of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Success,
    Reverted,
}

/// The connected account.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Currently connected address, if any.
    fn address(&self) -> Option<Address>;

    /// Chain the wallet is connected to, if known.
    fn chain_id(&self) -> Option<u64>;

    /// Personal-sign `message` and return the 0x-prefixed signature.
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;

    /// Send a backend-prepared transaction.
    async fn send_transaction(&self, payload: &TransactionPayload) -> Result<TxHash, WalletError>;

    /// Issue an ERC-20 `approve(spender, amount)` on `token`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError>;

    /// Read `allowance(owner, spender)` on `token`.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WalletError>;

    /// Drop the connection.
    async fn disconnect(&self);
}

/// Resolves transaction hashes to mined receipts.
#[async_trait]
pub trait ReceiptWatcher: Send + Sync {
    /// Wait until `hash` is mined, `cancel` fires, or the watcher gives up.
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        cancel: CancellationToken,
    ) -> Result<ReceiptOutcome, WalletError>;
}

/// On-chain merchant credential (merchant NFT).
#[async_trait]
pub trait MerchantCredential: Send + Sync {
    async fn has_merchant_credential(&self, owner: Address) -> Result<bool, WalletError>;

    async fn mint_merchant_credential(&self) -> Result<TxHash, WalletError>;
}

/// Receives every transaction hash the controllers obtain.
pub trait TxNotifier: Send + Sync {
    fn notify(&self, chain_id: u64, hash: TxHash, label: &str);
}
