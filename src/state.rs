// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wiring of configuration into the backend client, the wallet and the two
//! controllers.

use std::sync::Arc;

use crate::api::HttpBackend;
use crate::auth::AuthController;
use crate::blockchain::{LocalWallet, LogNotifier, WalletError};
use crate::config::{ClientConfig, KEY_PEM_ENV, PRIVATE_KEY_ENV};
use crate::error::ClientError;
use crate::payment::PaymentController;
use crate::session::FileSessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub backend: Arc<HttpBackend>,
    pub wallet: Arc<LocalWallet>,
    pub auth: AuthController,
    pub payments: Arc<PaymentController>,
}

impl AppState {
    /// Connect the configured wallet and build both controllers.
    ///
    /// The persisted session is not loaded here; call
    /// [`AuthController::restore_session`] once the state exists.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = Arc::new(HttpBackend::new(&config.api_base_url, config.http_timeout)?);

        let wallet = match LocalWallet::connect(&config).await {
            Ok(wallet) => Arc::new(wallet),
            Err(WalletError::NotConnected) => {
                return Err(ClientError::Config(format!(
                    "no wallet key configured, set {PRIVATE_KEY_ENV} or {KEY_PEM_ENV}"
                )))
            }
            Err(e) => return Err(ClientError::Config(e.to_string())),
        };
        let notifier = Arc::new(LogNotifier);

        let auth = AuthController::new(
            backend.clone(),
            wallet.clone(),
            wallet.clone(),
            wallet.clone(),
            notifier.clone(),
            Box::new(FileSessionStore::new(config.session_file.clone())),
        );
        let payments = Arc::new(PaymentController::new(
            backend.clone(),
            wallet.clone(),
            wallet.clone(),
            notifier,
            auth.reader(),
        ));

        Ok(Self {
            config,
            backend,
            wallet,
            auth,
            payments,
        })
    }

    /// Bearer token of the current session.
    pub fn token(&self) -> Result<String, ClientError> {
        self.auth
            .session()
            .token()
            .map(str::to_string)
            .ok_or(ClientError::NotLoggedIn)
    }
}
