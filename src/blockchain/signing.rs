// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet key loading.
//!
//! Keys come either as a hex string or as a PEM file holding a secp256k1
//! key in SEC1 or PKCS#8 form.

use std::fs;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use super::WalletError;
use crate::config::KeySource;

/// Parse a private key from PEM format to hex string.
///
/// # Arguments
/// * `pem_bytes` - The PEM-encoded private key bytes
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(WalletError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, WalletError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| WalletError::Failed(format!("Invalid UTF-8 in key file: {e}")))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| WalletError::Failed(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| WalletError::Failed(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Build a signer from a hex key, with or without `0x`.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, WalletError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| WalletError::Failed(format!("Invalid private key: {e}")))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| WalletError::Failed(format!("Invalid private key: {e}")))
}

/// Build a signer from PEM-encoded key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, WalletError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

/// Resolve a configured key source into a signer.
pub fn load_signer(source: &KeySource) -> Result<PrivateKeySigner, WalletError> {
    match source {
        KeySource::Hex(hex) => signer_from_hex(hex),
        KeySource::PemFile(path) => {
            let bytes = fs::read(path).map_err(|e| {
                WalletError::Failed(format!("Cannot read key file {}: {e}", path.display()))
            })?;
            signer_from_pem(&bytes)
        }
    }
}
