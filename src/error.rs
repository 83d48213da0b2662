// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client error types.
//!
//! Every controller operation returns [`ClientError`]. Callers show
//! [`ClientError::user_message`] to the user and may branch on
//! [`ClientError::kind`]; the `Display` form is meant for logs.

use alloy::primitives::TxHash;
use serde::Deserialize;

use crate::blockchain::WalletError;

/// Longest plain-text error body that is shown to the user as-is.
const MAX_PLAIN_MESSAGE_LEN: usize = 200;

/// Failure talking to the Fiducia backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Build a status error from a raw response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        BackendError::Status {
            status,
            message: extract_server_message(body),
        }
    }

    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::InvalidResponse(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies are searched for `message`, then `detail`, then `error`.
/// Short non-JSON bodies are returned verbatim.
pub fn extract_server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<ServerErrorBody>(body) {
        let detail = parsed.detail.and_then(|d| match d {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
        return parsed
            .message
            .or(detail)
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty());
    }

    if body.starts_with('{') || body.starts_with('[') || body.starts_with('<') {
        return None;
    }
    if body.len() <= MAX_PLAIN_MESSAGE_LEN {
        Some(body.to_string())
    } else {
        None
    }
}

/// Error taxonomy used to decide recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected before any network or chain call.
    Precondition,
    /// Server sent something the protocol cannot use.
    Protocol,
    /// Server answered with a rejection.
    Remote,
    /// The wallet user declined.
    UserRejected,
    /// Transaction mined but reverted.
    OnChain,
    /// Transport failure or timeout.
    Network,
    /// Local configuration is unusable.
    Config,
}

/// Errors surfaced by the controllers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No wallet connected")]
    NoWalletConnected,

    #[error("A sign-in attempt is already in progress")]
    LoginInProgress,

    #[error("Sign-in was interrupted by a logout or wallet change")]
    LoginSuperseded,

    #[error("Challenge request failed: {0}")]
    ChallengeRequestFailed(BackendError),

    #[error("Challenge message does not contain a nonce")]
    MalformedChallenge,

    #[error("Signing failed: {0}")]
    Signing(WalletError),

    #[error("Login failed: {0}")]
    LoginFailed(BackendError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Role update failed: {0}")]
    RoleUpdateFailed(BackendError),

    #[error("Merchant credential required before the merchant role can be set")]
    MerchantCredentialRequired,

    #[error("Contract addresses are not loaded")]
    ContractsNotLoaded,

    #[error("Chain id not detected")]
    ChainNotDetected,

    #[error("Token approval required before payment")]
    ApprovalRequired,

    #[error("An approval is already in progress")]
    ApprovalInProgress,

    #[error("A payment is already in progress")]
    PaymentInProgress,

    #[error("Payment already settled")]
    AlreadyPaid,

    #[error("Payment flow was abandoned")]
    FlowAbandoned,

    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),

    #[error("Purchase rejected: {0}")]
    PurchaseRejected(String),

    #[error("Backend error: {0}")]
    Backend(BackendError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<BackendError> for ClientError {
    fn from(e: BackendError) -> Self {
        ClientError::Backend(e)
    }
}

impl From<WalletError> for ClientError {
    fn from(e: WalletError) -> Self {
        ClientError::Wallet(e)
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NoWalletConnected
            | ClientError::LoginInProgress
            | ClientError::LoginSuperseded
            | ClientError::NotLoggedIn
            | ClientError::MerchantCredentialRequired
            | ClientError::ContractsNotLoaded
            | ClientError::ChainNotDetected
            | ClientError::ApprovalRequired
            | ClientError::ApprovalInProgress
            | ClientError::PaymentInProgress
            | ClientError::AlreadyPaid
            | ClientError::FlowAbandoned
            | ClientError::InvalidAmount(_)
            | ClientError::InvalidInput(_) => ErrorKind::Precondition,
            ClientError::MalformedChallenge => ErrorKind::Protocol,
            ClientError::ChallengeRequestFailed(e)
            | ClientError::LoginFailed(e)
            | ClientError::RoleUpdateFailed(e)
            | ClientError::Backend(e) => backend_kind(e),
            ClientError::PurchaseRejected(_) => ErrorKind::Remote,
            ClientError::Signing(e) | ClientError::Wallet(e) => wallet_kind(e),
            ClientError::TransactionReverted(_) => ErrorKind::OnChain,
            ClientError::Config(_) => ErrorKind::Config,
        }
    }

    /// Short message suitable for an inline notification.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NoWalletConnected => "Please connect your wallet first.".to_string(),
            ClientError::LoginInProgress => "Sign-in already in progress.".to_string(),
            ClientError::LoginSuperseded => "Sign-in was interrupted. Please try again.".to_string(),
            ClientError::ChallengeRequestFailed(e) => {
                server_or(e, "Could not start sign-in. Please try again.")
            }
            ClientError::MalformedChallenge => {
                "Could not extract nonce from challenge message".to_string()
            }
            ClientError::Signing(e) => e.short_message(),
            ClientError::LoginFailed(e) => server_or(e, "Login failed. Please try again."),
            ClientError::NotLoggedIn => "Please sign in first.".to_string(),
            ClientError::RoleUpdateFailed(e) => {
                server_or(e, "Failed to set role. Please try again.")
            }
            ClientError::MerchantCredentialRequired => {
                "A merchant NFT is required to register as a merchant.".to_string()
            }
            ClientError::ContractsNotLoaded => "Contract addresses not loaded".to_string(),
            ClientError::ChainNotDetected => "Chain not detected".to_string(),
            ClientError::ApprovalRequired => "Please approve the token first.".to_string(),
            ClientError::ApprovalInProgress => "Approval already in progress.".to_string(),
            ClientError::PaymentInProgress => "Payment already in progress.".to_string(),
            ClientError::AlreadyPaid => "This payment has already been completed.".to_string(),
            ClientError::FlowAbandoned => "This payment was closed. Please start again.".to_string(),
            ClientError::Wallet(e) => e.short_message(),
            ClientError::TransactionReverted(_) => "Transaction failed".to_string(),
            ClientError::PurchaseRejected(status) => format!("Purchase failed: {status}"),
            ClientError::Backend(e) => server_or(e, "Request failed. Please try again."),
            ClientError::InvalidAmount(msg) => format!("Invalid amount: {msg}"),
            ClientError::InvalidInput(msg) => msg.clone(),
            ClientError::Config(msg) => format!("Configuration error: {msg}"),
        }
    }
}

fn server_or(e: &BackendError, fallback: &str) -> String {
    match e {
        BackendError::Timeout => "The server did not respond in time. Please try again.".to_string(),
        _ => e
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
    }
}

fn backend_kind(e: &BackendError) -> ErrorKind {
    match e {
        BackendError::Status { .. } => ErrorKind::Remote,
        BackendError::InvalidResponse(_) => ErrorKind::Protocol,
        BackendError::Network(_) | BackendError::Timeout => ErrorKind::Network,
    }
}

fn wallet_kind(e: &WalletError) -> ErrorKind {
    match e {
        WalletError::Rejected(_) => ErrorKind::UserRejected,
        WalletError::NotConnected => ErrorKind::Precondition,
        WalletError::Timeout => ErrorKind::Network,
        WalletError::Failed(_) => ErrorKind::Network,
    }
}
