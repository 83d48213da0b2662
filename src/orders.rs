// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order lifecycle helpers.
//!
//! Order status arrives either as a string from the backend or as the
//! settlement contract's enum index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Order;

/// Status of an order on the settlement contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    AwaitingFulfillment,
    Confirmed,
    Delivering,
    Completed,
    Disputed,
}

impl OrderStatus {
    /// Contract enum order.
    const BY_INDEX: [OrderStatus; 5] = [
        OrderStatus::AwaitingFulfillment,
        OrderStatus::Confirmed,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Disputed,
    ];

    /// Decode the contract enum index; unknown values map to
    /// `AwaitingFulfillment`.
    pub fn from_index(index: u64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::BY_INDEX.get(i).copied())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingFulfillment => "AWAITING_FULFILLMENT",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Disputed => "DISPUTED",
        }
    }

    /// Whether the customer may still confirm or dispute the order.
    pub fn can_take_action(&self) -> bool {
        matches!(
            self,
            OrderStatus::AwaitingFulfillment | OrderStatus::Delivering | OrderStatus::Confirmed
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AWAITING_FULFILLMENT" => Ok(OrderStatus::AwaitingFulfillment),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "DELIVERING" => Ok(OrderStatus::Delivering),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "DISPUTED" => Ok(OrderStatus::Disputed),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(u64),
            Name(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Index(i)) => OrderStatus::from_index(i),
            Some(Raw::Name(name)) => name.parse().unwrap_or_default(),
            None => OrderStatus::default(),
        })
    }
}

/// Numeric part of an amount string such as `"12.50 PyUSD"`.
pub fn parse_display_amount(amount: &str) -> Option<f64> {
    let numeric: String = amount
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok()
}

/// Merchant revenue: total of completed order amounts.
pub fn completed_revenue(orders: &[Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .filter_map(|o| parse_display_amount(&o.amount))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, status: OrderStatus, amount: &str) -> Order {
        Order {
            order_id: id.to_string(),
            cid: None,
            status,
            amount: amount.to_string(),
            buyer: None,
            seller: None,
            price: None,
            timestamp: None,
        }
    }

    #[test]
    fn decodes_contract_index() {
        assert_eq!(OrderStatus::from_index(0), OrderStatus::AwaitingFulfillment);
        assert_eq!(OrderStatus::from_index(3), OrderStatus::Completed);
        assert_eq!(OrderStatus::from_index(4), OrderStatus::Disputed);
        assert_eq!(OrderStatus::from_index(99), OrderStatus::AwaitingFulfillment);
    }

    #[test]
    fn deserializes_names_and_indexes() {
        let parsed: Vec<OrderStatus> =
            serde_json::from_str(r#"["COMPLETED", 2, "bogus", null, "disputed"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                OrderStatus::Completed,
                OrderStatus::Delivering,
                OrderStatus::AwaitingFulfillment,
                OrderStatus::AwaitingFulfillment,
                OrderStatus::Disputed,
            ]
        );
    }

    #[test]
    fn actionable_statuses() {
        assert!(OrderStatus::AwaitingFulfillment.can_take_action());
        assert!(OrderStatus::Confirmed.can_take_action());
        assert!(OrderStatus::Delivering.can_take_action());
        assert!(!OrderStatus::Completed.can_take_action());
        assert!(!OrderStatus::Disputed.can_take_action());
    }

    #[test]
    fn revenue_counts_only_completed_orders() {
        let orders = vec![
            order("1", OrderStatus::Completed, "12.5 PyUSD"),
            order("2", OrderStatus::Completed, "7.5 PyUSD"),
            order("3", OrderStatus::Delivering, "100 PyUSD"),
            order("4", OrderStatus::Completed, "n/a"),
        ];
        assert!((completed_revenue(&orders) - 20.0).abs() < f64::EPSILON);
    }
}
