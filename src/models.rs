// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend Data Models
//!
//! Request and response bodies for the Fiducia backend. Response types are
//! lenient: identifiers and amounts are accepted as JSON strings or numbers,
//! and optional fields may be missing or `null`.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype holds a lowercase-normalized address
//! string. Sessions compare addresses through it, so checksum casing never
//! causes a spurious mismatch.
//!
//! ## Model Categories
//!
//! - **Auth**: challenge, login, role selection
//! - **Payments**: backend-prepared transactions, token purchase
//! - **Orders**: order records, confirm/dispute actions
//! - **Chat**: conversational ordering messages
//! - **Merchant**: merchant profile and menu

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize};

use crate::orders::OrderStatus;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Lowercase-normalized wallet address.
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::from("0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// assert_eq!(addr.as_str(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value.trim().to_ascii_lowercase())
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress::from(value.to_string())
    }
}

impl From<Address> for WalletAddress {
    fn from(value: Address) -> Self {
        WalletAddress(format!("0x{}", alloy::hex::encode(value.as_slice())))
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Auth Models
// =============================================================================

/// `GET /auth/challenge` response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Human-readable message embedding `Nonce: <hex>`.
    pub message: String,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub address: WalletAddress,
    /// Signature over the bare nonce.
    pub signature: String,
}

/// User record returned by login and role updates.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub address: WalletAddress,
    /// Raw role as sent by the server (`consumer`, `customer`, `merchant`).
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub merchant_id: Option<String>,
}

/// Response of `POST /auth/login` and `POST /user/role`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// `POST /user/role` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoleRequest {
    /// `consumer` or `merchant`.
    pub role: String,
}

// =============================================================================
// Payment Models
// =============================================================================

/// A backend-prepared transaction. The client never builds calldata for
/// these itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionPayload {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, deserialize_with = "u256_lenient")]
    pub value: U256,
}

/// `POST /token/buya3a` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BuyTokenRequest {
    /// PYUSD amount in whole tokens.
    pub pyusd: f64,
}

/// `POST /token/buya3a` response.
///
/// `transaction` is usually a JSON-encoded string but some backend versions
/// send the object directly.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BuyTokenResponse {
    pub status: String,
    #[serde(default)]
    pub transaction: Option<serde_json::Value>,
}

impl BuyTokenResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Decode the embedded transaction descriptor.
    pub fn payload(&self) -> Result<TransactionPayload, String> {
        match &self.transaction {
            Some(serde_json::Value::String(encoded)) => {
                serde_json::from_str(encoded).map_err(|e| format!("invalid transaction: {e}"))
            }
            Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| format!("invalid transaction: {e}")),
            Some(_) => Err("unexpected transaction format".to_string()),
            None => Err("missing transaction".to_string()),
        }
    }
}

// =============================================================================
// Order Models
// =============================================================================

/// An order as listed by `GET /orders`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Order {
    #[serde(alias = "orderId", deserialize_with = "string_or_number")]
    pub order_id: String,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub buyer: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub price: Option<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// `POST /orders/:id/dispute` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisputeRequest {
    pub reason: String,
}

/// Generic `{ message }` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Chat Models
// =============================================================================

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `POST /chat/messages` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Raw `POST /chat/messages` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// A line item of a proposed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub price: Option<String>,
}

/// Structured order proposal produced by the chat assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderContent {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub total: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decoded assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Text(String),
    Order(OrderContent),
}

impl TryFrom<ChatResponse> for ChatReply {
    type Error = String;

    fn try_from(resp: ChatResponse) -> Result<Self, Self::Error> {
        if resp.kind.as_deref() == Some("order") {
            let content = match resp.content {
                // Some replies double-encode the order.
                serde_json::Value::String(encoded) => serde_json::from_str(&encoded),
                other => serde_json::from_value(other),
            }
            .map_err(|e| format!("invalid order content: {e}"))?;
            return Ok(ChatReply::Order(content));
        }

        match resp.content {
            serde_json::Value::String(text) => Ok(ChatReply::Text(text)),
            serde_json::Value::Null => Ok(ChatReply::Text(String::new())),
            other => Ok(ChatReply::Text(other.to_string())),
        }
    }
}

// =============================================================================
// Merchant Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /merchant/:id/profile` response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MerchantProfile {
    #[serde(default, deserialize_with = "string_or_number")]
    pub merchant_id: String,
    #[serde(default)]
    pub wallet: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

impl MerchantProfile {
    /// A profile is usable once wallet, description and location are filled in.
    pub fn is_complete(&self) -> bool {
        [&self.wallet, &self.description, &self.location]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

// =============================================================================
// Lenient deserializers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(String::from)
        .unwrap_or_default())
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

fn u256_lenient<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(U256::ZERO),
        Some(StringOrNumber::Number(n)) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid value: {n}"))),
        Some(StringOrNumber::String(s)) if s.trim().is_empty() => Ok(U256::ZERO),
        Some(StringOrNumber::String(s)) => U256::from_str(s.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid value {s:?}: {e}"))),
    }
}
