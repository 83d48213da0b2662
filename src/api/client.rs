// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! reqwest implementation of the backend traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{AuthBackend, PaymentBackend};
use crate::error::BackendError;
use crate::models::{
    AuthResponse, BuyTokenRequest, BuyTokenResponse, ChallengeResponse, LoginRequest,
    RoleRequest, WalletAddress,
};
use crate::payment::ContractKind;

/// HTTP client for the Fiducia backend.
#[derive(Clone)]
pub struct HttpBackend {
    /// Base URL including the `/api` prefix, without trailing slash
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.get(self.url(path)), token)
    }

    pub(crate) fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.post(self.url(path)), token)
    }

    /// Send a request, turning non-2xx responses into [`BackendError::Status`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Backend returned an error status");
        Err(BackendError::from_status(status.as_u16(), &body))
    }

    /// Send a request and decode the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send_json(self.post(path, token).json(body)).await
    }

    /// Like [`send_json`](Self::send_json) but maps 404 to `None`.
    pub(crate) async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        match self.send_json(request).await {
            Ok(value) => Ok(Some(value)),
            Err(BackendError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn with_auth(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn request_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<ChallengeResponse, BackendError> {
        let request = self
            .get("/auth/challenge", None)
            .query(&[("address", address.as_str())]);
        self.send_json(request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.post_json("/auth/login", None, request).await
    }

    async fn set_role(
        &self,
        token: &str,
        request: &RoleRequest,
    ) -> Result<AuthResponse, BackendError> {
        self.post_json("/user/role", Some(token), request).await
    }
}

#[async_trait]
impl PaymentBackend for HttpBackend {
    async fn contract_address(
        &self,
        token: &str,
        kind: ContractKind,
    ) -> Result<String, BackendError> {
        let path = format!("/contract/{}", kind.path());
        let response = self.send(self.get(&path, Some(token))).await?;
        Ok(response.text().await?)
    }

    async fn buy_token(
        &self,
        token: &str,
        request: &BuyTokenRequest,
    ) -> Result<BuyTokenResponse, BackendError> {
        self.post_json("/token/buya3a", Some(token), request).await
    }
}
