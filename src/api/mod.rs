// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiducia backend client.
//!
//! The controllers depend on the [`AuthBackend`] and [`PaymentBackend`]
//! traits so they can run against a stub in tests. [`HttpBackend`]
//! implements both over reqwest and also carries the order, chat and
//! merchant endpoints used by the CLI.
//!
//! | Method & Path | Auth |
//! |---|---|
//! | `GET /auth/challenge?address=` | none |
//! | `POST /auth/login` | none |
//! | `POST /user/role` | bearer |
//! | `GET /contract/{pyusd,a3atoken,order}` | bearer |
//! | `POST /token/buya3a` | bearer |
//! | `POST /chat/messages` | bearer |
//! | `GET /orders` | bearer |
//! | `POST /orders/:id/confirm-finish` | bearer |
//! | `POST /orders/:id/dispute` | bearer |
//! | `GET /merchant/:id/profile` | bearer |

pub mod chat;
pub mod client;
pub mod merchant;
pub mod orders;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{
    AuthResponse, BuyTokenRequest, BuyTokenResponse, ChallengeResponse, LoginRequest,
    RoleRequest, WalletAddress,
};
use crate::payment::ContractKind;

pub use client::HttpBackend;

/// Authentication endpoints.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /auth/challenge?address=<addr>`
    async fn request_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<ChallengeResponse, BackendError>;

    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError>;

    /// `POST /user/role` with bearer auth.
    async fn set_role(
        &self,
        token: &str,
        request: &RoleRequest,
    ) -> Result<AuthResponse, BackendError>;
}

/// Contract discovery and payment preparation endpoints.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Raw response text of `GET /contract/<kind>`.
    async fn contract_address(
        &self,
        token: &str,
        kind: ContractKind,
    ) -> Result<String, BackendError>;

    /// `POST /token/buya3a`
    async fn buy_token(
        &self,
        token: &str,
        request: &BuyTokenRequest,
    ) -> Result<BuyTokenResponse, BackendError>;
}
