// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract addresses published by the backend.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::blockchain::{TokenInfo, A3A_TOKEN, PYUSD_TOKEN};

/// The contracts a payment flow needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// PYUSD stablecoin
    PaymentToken,
    /// A3A utility token, also the spender when buying A3A
    RewardToken,
    /// Order settlement contract
    OrderContract,
}

impl ContractKind {
    pub const ALL: [ContractKind; 3] = [
        ContractKind::PaymentToken,
        ContractKind::RewardToken,
        ContractKind::OrderContract,
    ];

    /// Path segment under `/contract/`.
    pub fn path(&self) -> &'static str {
        match self {
            ContractKind::PaymentToken => "pyusd",
            ContractKind::RewardToken => "a3atoken",
            ContractKind::OrderContract => "order",
        }
    }

    /// Token metadata, for the two ERC-20 contracts.
    pub fn token_info(&self) -> Option<TokenInfo> {
        match self {
            ContractKind::PaymentToken => Some(PYUSD_TOKEN),
            ContractKind::RewardToken => Some(A3A_TOKEN),
            ContractKind::OrderContract => None,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_info() {
            Some(info) => f.write_str(info.symbol),
            None => f.write_str("order contract"),
        }
    }
}

/// Addresses fetched once per session. Any of them may be unresolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractAddressSet {
    pub payment_token: Option<Address>,
    pub reward_token: Option<Address>,
    pub order_contract: Option<Address>,
}

impl ContractAddressSet {
    pub fn get(&self, kind: ContractKind) -> Option<Address> {
        match kind {
            ContractKind::PaymentToken => self.payment_token,
            ContractKind::RewardToken => self.reward_token,
            ContractKind::OrderContract => self.order_contract,
        }
    }

    /// Fill in an unresolved address. Resolved addresses are never replaced.
    pub fn resolve(&mut self, kind: ContractKind, address: Address) {
        let slot = match kind {
            ContractKind::PaymentToken => &mut self.payment_token,
            ContractKind::RewardToken => &mut self.reward_token,
            ContractKind::OrderContract => &mut self.order_contract,
        };
        slot.get_or_insert(address);
    }

    pub fn missing(&self) -> Vec<ContractKind> {
        ContractKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Parse the raw body of `GET /contract/<kind>`, which may be a bare
/// address or a JSON string.
pub fn parse_contract_address(raw: &str) -> Option<Address> {
    let trimmed = raw.trim().trim_matches('"').trim();
    Address::from_str(trimmed).ok()
}
