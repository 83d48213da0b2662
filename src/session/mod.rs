// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session
//!
//! The authenticated identity bound to a wallet address.
//!
//! ## Ownership
//!
//! Only [`AuthController`](crate::auth::AuthController) can change the
//! session: it holds the `watch::Sender` and the [`SessionStore`]. Every
//! other component gets a [`SessionReader`], which can observe the current
//! session and wait for changes but cannot write.
//!
//! ## Invariants
//!
//! - a token is present iff the login step has completed
//! - an address is present whenever a token is
//! - a role is never set without a token
//! - a merchant id is only kept for the merchant role

pub mod store;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::auth::Role;
use crate::models::WalletAddress;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};

/// Authenticated identity. Fields are private so the invariants above can
/// only be established through [`Session::authenticated`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    address: Option<WalletAddress>,
    role: Option<Role>,
    merchant_id: Option<String>,
}

impl Session {
    /// Session after a successful login or role update.
    ///
    /// Returns `None` for an empty token. A merchant id is dropped unless
    /// the role is [`Role::Merchant`].
    pub fn authenticated(
        token: impl Into<String>,
        address: WalletAddress,
        role: Option<Role>,
        merchant_id: Option<String>,
    ) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() || address.as_str().is_empty() {
            return None;
        }
        let merchant_id = merchant_id
            .filter(|id| !id.trim().is_empty())
            .filter(|_| role == Some(Role::Merchant));

        Some(Self {
            token: Some(token),
            address: Some(address),
            role,
            merchant_id,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    /// `None` means the role has not been chosen yet.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Logged in but no role chosen.
    pub fn needs_role(&self) -> bool {
        self.is_authenticated() && self.role.is_none()
    }

    /// Whether this session was minted for `address`.
    pub fn belongs_to(&self, address: &WalletAddress) -> bool {
        self.address.as_ref() == Some(address)
    }

    pub(crate) fn to_record(&self) -> SessionRecord {
        SessionRecord {
            token: self.token.clone(),
            address: self.address.as_ref().map(|a| a.to_string()),
            role: self.role.map(|r| r.to_string()),
            merchant_id: self.merchant_id.clone(),
            updated_at: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Rebuild a session from persisted keys, discarding combinations that
    /// violate the invariants.
    pub(crate) fn from_record(record: SessionRecord) -> Self {
        let (Some(token), Some(address)) = (record.token, record.address) else {
            return Self::default();
        };
        let role = record.role.as_deref().and_then(Role::from_str);
        Self::authenticated(token, WalletAddress::from(address), role, record.merchant_id)
            .unwrap_or_default()
    }
}

/// Persisted form. Every key is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    /// RFC 3339 timestamp of the last write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Read-only view of the live session.
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Session>,
}

impl SessionReader {
    pub(crate) fn new(rx: watch::Receiver<Session>) -> Self {
        Self { rx }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token.clone()
    }

    /// Wait for the next session change. Returns `false` once the owning
    /// controller is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> WalletAddress {
        WalletAddress::from("0xAAA")
    }

    #[test]
    fn empty_token_is_not_a_session() {
        assert!(Session::authenticated("", addr(), Some(Role::Customer), None).is_none());
        assert!(Session::authenticated("  ", addr(), None, None).is_none());
        assert!(Session::authenticated("tok", WalletAddress::from(""), None, None).is_none());
    }

    #[test]
    fn merchant_id_requires_merchant_role() {
        let customer =
            Session::authenticated("tok", addr(), Some(Role::Customer), Some("m1".into())).unwrap();
        assert_eq!(customer.merchant_id(), None);

        let unset = Session::authenticated("tok", addr(), None, Some("m1".into())).unwrap();
        assert_eq!(unset.merchant_id(), None);
        assert!(unset.needs_role());

        let merchant =
            Session::authenticated("tok", addr(), Some(Role::Merchant), Some("m1".into())).unwrap();
        assert_eq!(merchant.merchant_id(), Some("m1"));
    }

    #[test]
    fn record_without_token_loads_empty() {
        let record = SessionRecord {
            token: None,
            address: Some("0xaaa".into()),
            role: Some("merchant".into()),
            merchant_id: Some("m1".into()),
            updated_at: None,
        };
        let session = Session::from_record(record);
        assert_eq!(session, Session::default());
        assert_eq!(session.role(), None);
    }

    #[test]
    fn record_without_address_loads_empty() {
        let record = SessionRecord {
            token: Some("tok".into()),
            ..Default::default()
        };
        assert_eq!(Session::from_record(record), Session::default());
    }

    #[test]
    fn record_round_trip_normalizes_address() {
        let record = SessionRecord {
            token: Some("tok".into()),
            address: Some("0xAbC".into()),
            role: Some("consumer".into()),
            merchant_id: Some("m1".into()),
            updated_at: None,
        };
        let session = Session::from_record(record);
        assert_eq!(session.address().map(|a| a.as_str()), Some("0xabc"));
        assert_eq!(session.role(), Some(Role::Customer));
        assert_eq!(session.merchant_id(), None);

        let again = session.to_record();
        assert_eq!(again.role.as_deref(), Some("customer"));
        assert!(again.updated_at.is_some());
    }

    #[tokio::test]
    async fn reader_observes_changes() {
        let (tx, rx) = watch::channel(Session::default());
        let mut reader = SessionReader::new(rx);
        assert!(reader.token().is_none());

        let session = Session::authenticated("tok", addr(), None, None).unwrap();
        tx.send_replace(session.clone());
        assert!(reader.changed().await);
        assert_eq!(reader.current(), session);

        drop(tx);
        assert!(!reader.changed().await);
    }
}
