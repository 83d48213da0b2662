// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::U256;

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
}

impl NetworkConfig {
    /// The Fiducia demo network.
    pub fn fiducia_localnet() -> Self {
        Self {
            name: "Fiducia Localnet".to_string(),
            chain_id: 31337,
            rpc_url: "https://fiduciademo.123a.club/rpc".to_string(),
        }
    }
}

/// Allowance requested by every approval: approve once, reuse indefinitely.
pub const INFINITE_ALLOWANCE: U256 = U256::MAX;

/// ERC-20 token metadata used for amount conversion.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub decimals: u8,
}

/// PayPal USD, the payment stablecoin.
pub const PYUSD_TOKEN: TokenInfo = TokenInfo {
    symbol: "PYUSD",
    decimals: 6,
};

/// A3A, the platform utility token.
pub const A3A_TOKEN: TokenInfo = TokenInfo {
    symbol: "A3A",
    decimals: 18,
};
