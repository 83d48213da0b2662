// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles.

use serde::{Deserialize, Serialize};

/// Role chosen by the user after login.
///
/// ## Wire Names
///
/// - The backend's role endpoint expects `consumer` for [`Role::Customer`]
/// - Responses may use either `consumer` or `customer`
/// - Persisted sessions use `customer` / `merchant`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Orders and pays
    #[serde(alias = "consumer")]
    Customer,
    /// Runs a restaurant; requires the merchant credential
    Merchant,
}

impl Role {
    /// Parse role from string (case-insensitive).
    /// Accepts the backend's `consumer` alias.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "consumer" => Some(Role::Customer),
            "merchant" => Some(Role::Merchant),
            _ => None,
        }
    }

    /// Value sent to `POST /user/role`.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Role::Customer => "consumer",
            Role::Merchant => "merchant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Merchant => write!(f, "merchant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!(Role::from_str("customer"), Some(Role::Customer));
        assert_eq!(Role::from_str("Consumer"), Some(Role::Customer));
        assert_eq!(Role::from_str("MERCHANT"), Some(Role::Merchant));
        assert_eq!(Role::from_str("admin"), None);
        assert_eq!(Role::from_str(""), None);
    }

    #[test]
    fn wire_and_display_names() {
        assert_eq!(Role::Customer.wire_value(), "consumer");
        assert_eq!(Role::Merchant.wire_value(), "merchant");
        assert_eq!(Role::Customer.to_string(), "customer");
    }

    #[test]
    fn serde_accepts_consumer_alias() {
        let role: Role = serde_json::from_str("\"consumer\"").unwrap();
        assert_eq!(role, Role::Customer);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"customer\"");
    }
}
