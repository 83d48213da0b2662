// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token amount conversion.

use alloy::primitives::U256;

use crate::error::ClientError;

/// Parse a human-readable amount to token base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (6 for PYUSD, 18 for A3A)
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit
/// * `Err` - If parsing fails or the amount is zero
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ClientError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts.iter().all(|p| p.is_empty()) {
        return Err(ClientError::InvalidAmount("Invalid amount format".to_string()));
    }
    if !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return Err(ClientError::InvalidAmount("Invalid amount format".to_string()));
    }

    let whole = if parts[0].is_empty() {
        0u128
    } else {
        parts[0]
            .parse::<u128>()
            .map_err(|_| ClientError::InvalidAmount("Invalid whole number".to_string()))?
    };

    let decimal_part = if parts.len() == 2 && !parts[1].is_empty() {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(ClientError::InvalidAmount(format!(
                "Too many decimal places (max {decimals})"
            )));
        }
        // Pad with zeros to match decimals
        let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
        padded
            .parse::<u128>()
            .map_err(|_| ClientError::InvalidAmount("Invalid decimal".to_string()))?
    } else {
        0u128
    };

    let multiplier = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(|| ClientError::InvalidAmount("Too many decimals".to_string()))?;
    let total = whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| ClientError::InvalidAmount("Amount overflow".to_string()))?;

    if total == 0 {
        return Err(ClientError::InvalidAmount("Amount must be greater than zero".to_string()));
    }

    Ok(U256::from(total))
}

/// Format base units to a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!(
        "{:0>width$}",
        remainder.to_string(),
        width = decimals as usize
    );
    let trimmed = decimal_str.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{trimmed}")
    }
}
