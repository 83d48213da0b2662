// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login challenge parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClientError;

static NONCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Nonce:\s*([a-f0-9]+)").unwrap());

/// A server-issued login challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub full_message: String,
    pub nonce: String,
}

impl Challenge {
    pub fn parse(full_message: impl Into<String>) -> Result<Self, ClientError> {
        let full_message = full_message.into();
        let nonce = extract_nonce(&full_message)?;
        Ok(Self {
            full_message,
            nonce,
        })
    }
}

/// Extract the hex nonce following `Nonce:` in a challenge message.
pub fn extract_nonce(message: &str) -> Result<String, ClientError> {
    NONCE_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ClientError::MalformedChallenge)
}
