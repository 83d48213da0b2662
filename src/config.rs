// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! by the client. Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FIDUCIA_API_URL` | Backend base URL (including `/api`) | `https://fiduciademo.123a.club/api` |
//! | `FIDUCIA_RPC_URL` | EVM JSON-RPC endpoint | `https://fiduciademo.123a.club/rpc` |
//! | `FIDUCIA_CHAIN_ID` | Expected chain id | `31337` |
//! | `FIDUCIA_SESSION_FILE` | Persisted session file | `$HOME/.fiducia/session.json` |
//! | `FIDUCIA_PRIVATE_KEY` | Hex-encoded wallet key | Optional |
//! | `FIDUCIA_KEY_PEM` | Path to a PEM-encoded wallet key | Optional |
//! | `FIDUCIA_MERCHANT_NFT` | Merchant credential contract | Optional (gate disabled) |
//! | `FIDUCIA_HTTP_TIMEOUT_SECS` | Backend request timeout | `15` |
//! | `FIDUCIA_RECEIPT_TIMEOUT_SECS` | Receipt wait ceiling | `120` |
//! | `FIDUCIA_RECEIPT_POLL_MS` | Receipt poll interval | `1000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::NetworkConfig;
use crate::error::ClientError;
use crate::logging::LogFormat;

pub const API_URL_ENV: &str = "FIDUCIA_API_URL";
pub const RPC_URL_ENV: &str = "FIDUCIA_RPC_URL";
pub const CHAIN_ID_ENV: &str = "FIDUCIA_CHAIN_ID";
pub const SESSION_FILE_ENV: &str = "FIDUCIA_SESSION_FILE";
pub const PRIVATE_KEY_ENV: &str = "FIDUCIA_PRIVATE_KEY";
pub const KEY_PEM_ENV: &str = "FIDUCIA_KEY_PEM";
pub const MERCHANT_NFT_ENV: &str = "FIDUCIA_MERCHANT_NFT";
pub const HTTP_TIMEOUT_ENV: &str = "FIDUCIA_HTTP_TIMEOUT_SECS";
pub const RECEIPT_TIMEOUT_ENV: &str = "FIDUCIA_RECEIPT_TIMEOUT_SECS";
pub const RECEIPT_POLL_ENV: &str = "FIDUCIA_RECEIPT_POLL_MS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "https://fiduciademo.123a.club/api";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RECEIPT_POLL: Duration = Duration::from_millis(1000);

/// Where the wallet key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Hex(String),
    PemFile(PathBuf),
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub network: NetworkConfig,
    pub session_file: PathBuf,
    pub key: Option<KeySource>,
    /// `None` disables the merchant credential gate on role selection.
    pub merchant_nft: Option<Address>,
    pub http_timeout: Duration,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get(API_URL_ENV)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_base_url)
            .map_err(|e| ClientError::Config(format!("{API_URL_ENV}: {e}")))?;

        let mut network = NetworkConfig::fiducia_localnet();
        if let Some(rpc) = get(RPC_URL_ENV) {
            url::Url::parse(&rpc).map_err(|e| ClientError::Config(format!("{RPC_URL_ENV}: {e}")))?;
            network.rpc_url = rpc;
        }
        if let Some(raw) = get(CHAIN_ID_ENV) {
            network.chain_id = parse_number(CHAIN_ID_ENV, &raw)?;
        }

        let session_file = get(SESSION_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_file(get("HOME")));

        let key = match (get(PRIVATE_KEY_ENV), get(KEY_PEM_ENV)) {
            (Some(hex), _) => Some(KeySource::Hex(hex)),
            (None, Some(path)) => Some(KeySource::PemFile(PathBuf::from(path))),
            (None, None) => None,
        };

        let merchant_nft = get(MERCHANT_NFT_ENV)
            .map(|raw| {
                Address::from_str(&raw)
                    .map_err(|e| ClientError::Config(format!("{MERCHANT_NFT_ENV}: {e}")))
            })
            .transpose()?;

        let http_timeout = get(HTTP_TIMEOUT_ENV)
            .map(|raw| parse_number(HTTP_TIMEOUT_ENV, &raw).map(Duration::from_secs))
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);
        let receipt_timeout = get(RECEIPT_TIMEOUT_ENV)
            .map(|raw| parse_number(RECEIPT_TIMEOUT_ENV, &raw).map(Duration::from_secs))
            .transpose()?
            .unwrap_or(DEFAULT_RECEIPT_TIMEOUT);
        let receipt_poll_interval = get(RECEIPT_POLL_ENV)
            .map(|raw| parse_number(RECEIPT_POLL_ENV, &raw).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(DEFAULT_RECEIPT_POLL);

        let log_format = get(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            api_base_url,
            network,
            session_file,
            key,
            merchant_nft,
            http_timeout,
            receipt_timeout,
            receipt_poll_interval,
            log_format,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ClientError> {
    raw.parse::<u64>()
        .map_err(|_| ClientError::Config(format!("{name} must be a non-negative integer, got `{raw}`")))
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".fiducia").join("session.json"),
        None => PathBuf::from(".fiducia").join("session.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ClientConfig, ClientError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.session_file, PathBuf::from(".fiducia/session.json"));
        assert!(config.key.is_none());
        assert!(config.merchant_nft.is_none());
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            (API_URL_ENV, "http://localhost:8000/api/"),
            (CHAIN_ID_ENV, "11155111"),
            ("HOME", "/home/alice"),
            (PRIVATE_KEY_ENV, "abcd"),
            (MERCHANT_NFT_ENV, "0x1e08cFBd659436F8Fc72C91A9302B6C6F444c0A2"),
            (RECEIPT_POLL_ENV, "250"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.network.chain_id, 11155111);
        assert_eq!(
            config.session_file,
            PathBuf::from("/home/alice/.fiducia/session.json")
        );
        assert_eq!(config.key, Some(KeySource::Hex("abcd".into())));
        assert!(config.merchant_nft.is_some());
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn private_key_takes_precedence_over_pem() {
        let config = config_from(&[(PRIVATE_KEY_ENV, "ff"), (KEY_PEM_ENV, "/keys/wallet.pem")]).unwrap();
        assert_eq!(config.key, Some(KeySource::Hex("ff".into())));

        let config = config_from(&[(KEY_PEM_ENV, "/keys/wallet.pem")]).unwrap();
        assert_eq!(
            config.key,
            Some(KeySource::PemFile(PathBuf::from("/keys/wallet.pem")))
        );
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            config_from(&[(CHAIN_ID_ENV, "mainnet")]),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            config_from(&[(MERCHANT_NFT_ENV, "0x123")]),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            config_from(&[(API_URL_ENV, "not a url")]),
            Err(ClientError::Config(_))
        ));
    }
}
