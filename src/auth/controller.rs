// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Controller
//!
//! Owns the session lifecycle for one connected wallet.
//!
//! ```text
//! Disconnected -> ConnectedUnauthenticated -> ChallengeRequested
//!     -> AwaitingSignature -> LoggingIn -> Authenticated(None)
//!     -> Authenticated(Some(role))
//! ```
//!
//! Logout and wallet disconnect return to `Disconnected` from any state.
//! A failed login always ends with no session; a failed role update leaves
//! the session as it was.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::challenge::Challenge;
use super::roles::Role;
use crate::api::AuthBackend;
use crate::blockchain::{MerchantCredential, ReceiptOutcome, ReceiptWatcher, TxNotifier, Wallet};
use crate::error::{BackendError, ClientError};
use crate::models::{LoginRequest, RoleRequest, WalletAddress};
use crate::session::{Session, SessionReader, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Disconnected,
    ConnectedUnauthenticated,
    ChallengeRequested,
    AwaitingSignature,
    LoggingIn,
    /// `role` is `None` until one has been chosen.
    Authenticated { role: Option<Role> },
}

impl AuthState {
    /// A login attempt is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            AuthState::ChallengeRequested | AuthState::AwaitingSignature | AuthState::LoggingIn
        )
    }
}

/// Result of [`AuthController::restore_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Persisted session adopted with its role.
    Restored(Role),
    /// Persisted session adopted, role still to be chosen.
    RoleSelectionRequired,
    /// Nothing usable was persisted.
    SignInRequired,
    /// Persisted session belonged to another address and was removed.
    Discarded,
    /// No wallet connected; persisted data left untouched.
    NotConnected,
}

/// Result of a successful [`AuthController::login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Role),
    RoleSelectionRequired,
    /// Logged in; the pending merchant role waits for the credential.
    CredentialRequired,
}

/// Result of a successful [`AuthController::set_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    Set(Role),
    /// Merchant role deferred until the merchant credential is minted.
    CredentialRequired,
}

#[derive(Debug)]
struct Flow {
    state: AuthState,
    pending_role: Option<Role>,
    /// Bumped whenever an outstanding login must not complete.
    epoch: u64,
    /// Address the outstanding login is signing for.
    signer: Option<WalletAddress>,
}

impl Flow {
    fn invalidate_login(&mut self) {
        self.epoch += 1;
        self.signer = None;
    }
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    wallet: Arc<dyn Wallet>,
    credential: Arc<dyn MerchantCredential>,
    receipts: Arc<dyn ReceiptWatcher>,
    notifier: Arc<dyn TxNotifier>,
    store: Box<dyn SessionStore>,
    session: watch::Sender<Session>,
    flow: Mutex<Flow>,
}

/// Cloneable handle; all clones share one session.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

impl AuthController {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        wallet: Arc<dyn Wallet>,
        credential: Arc<dyn MerchantCredential>,
        receipts: Arc<dyn ReceiptWatcher>,
        notifier: Arc<dyn TxNotifier>,
        store: Box<dyn SessionStore>,
    ) -> Self {
        let state = if wallet.address().is_some() {
            AuthState::ConnectedUnauthenticated
        } else {
            AuthState::Disconnected
        };
        let (session, _rx) = watch::channel(Session::default());

        Self {
            inner: Arc::new(Inner {
                backend,
                wallet,
                credential,
                receipts,
                notifier,
                store,
                session,
                flow: Mutex::new(Flow {
                    state,
                    pending_role: None,
                    epoch: 0,
                    signer: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> AuthState {
        self.flow().state
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    /// Read-only handle for other components.
    pub fn reader(&self) -> SessionReader {
        SessionReader::new(self.inner.session.subscribe())
    }

    /// Role waiting for the merchant credential, if any.
    pub fn pending_role(&self) -> Option<Role> {
        self.flow().pending_role
    }

    /// Adopt the persisted session if it belongs to the connected wallet.
    ///
    /// No network call is made. A session for a different address is
    /// removed from the store.
    pub fn restore_session(&self) -> RestoreOutcome {
        let Some(connected) = self.inner.wallet.address().map(WalletAddress::from) else {
            self.set_state(AuthState::Disconnected);
            return RestoreOutcome::NotConnected;
        };

        let record = match self.inner.store.load() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                Default::default()
            }
        };
        let session = Session::from_record(record);

        if !session.is_authenticated() {
            self.inner.session.send_replace(Session::default());
            self.set_state(AuthState::ConnectedUnauthenticated);
            return RestoreOutcome::SignInRequired;
        }

        if !session.belongs_to(&connected) {
            info!(
                persisted = ?session.address().map(|a| a.as_str()),
                connected = %connected,
                "Persisted session belongs to another address, discarding"
            );
            self.clear_session();
            self.set_state(AuthState::ConnectedUnauthenticated);
            return RestoreOutcome::Discarded;
        }

        let role = session.role();
        self.inner.session.send_replace(session);
        self.set_state(AuthState::Authenticated { role });
        info!(address = %connected, role = ?role, "Session restored");

        match role {
            Some(role) => RestoreOutcome::Restored(role),
            None => RestoreOutcome::RoleSelectionRequired,
        }
    }

    /// Prove ownership of the connected address and obtain a session token.
    ///
    /// The wallet signs the bare nonce, never the full challenge message.
    /// Any failure clears the session, including a previously stored one.
    /// A logout or wallet change while the login is outstanding discards
    /// its result with [`ClientError::LoginSuperseded`].
    pub async fn login(&self) -> Result<LoginOutcome, ClientError> {
        let address = self
            .inner
            .wallet
            .address()
            .map(WalletAddress::from)
            .ok_or(ClientError::NoWalletConnected)?;

        let settled = {
            let current = self.inner.session.borrow();
            current.role().filter(|_| current.belongs_to(&address))
        };
        if let Some(role) = settled {
            return Ok(LoginOutcome::Authenticated(role));
        }

        let epoch = self.begin_login(&address)?;
        let session = match self.exchange_signature(&address, epoch).await {
            Ok(session) => session,
            Err(e) => {
                warn!(address = %address, error = %e, "Login failed");
                let mut flow = self.flow();
                if flow.epoch == epoch {
                    flow.signer = None;
                    flow.state = AuthState::ConnectedUnauthenticated;
                    self.clear_session();
                }
                return Err(e);
            }
        };

        let role = session.role();
        {
            let mut flow = self.flow();
            if flow.epoch != epoch {
                info!(address = %address, "Login superseded, discarding result");
                return Err(ClientError::LoginSuperseded);
            }
            flow.signer = None;

            let connected = self.inner.wallet.address().map(WalletAddress::from);
            if connected.as_ref() != Some(&address) {
                info!(address = %address, "Wallet changed during login, discarding result");
                flow.state = if connected.is_some() {
                    AuthState::ConnectedUnauthenticated
                } else {
                    AuthState::Disconnected
                };
                self.clear_session();
                return Err(ClientError::LoginSuperseded);
            }

            flow.state = AuthState::Authenticated { role };
            self.commit(session);
        }
        info!(address = %address, role = ?role, "Login accepted");

        if let Some(role) = role {
            self.flow().pending_role = None;
            return Ok(LoginOutcome::Authenticated(role));
        }

        let pending = self.flow().pending_role;
        match pending {
            Some(role) => match self.set_role(role).await? {
                RoleOutcome::Set(role) => Ok(LoginOutcome::Authenticated(role)),
                RoleOutcome::CredentialRequired => Ok(LoginOutcome::CredentialRequired),
            },
            None => Ok(LoginOutcome::RoleSelectionRequired),
        }
    }

    /// Choose the role for the logged-in user.
    ///
    /// Selecting [`Role::Merchant`] without the merchant credential keeps the
    /// selection pending and returns [`RoleOutcome::CredentialRequired`].
    /// On failure the session is left unchanged.
    pub async fn set_role(&self, role: Role) -> Result<RoleOutcome, ClientError> {
        let (token, address) = {
            let current = self.inner.session.borrow();
            match (current.token(), current.address()) {
                (Some(token), Some(address)) => (token.to_string(), address.clone()),
                _ => return Err(ClientError::NotLoggedIn),
            }
        };

        if role == Role::Merchant && !self.has_credential().await? {
            self.flow().pending_role = Some(Role::Merchant);
            info!(address = %address, "Merchant credential missing, role selection pending");
            return Ok(RoleOutcome::CredentialRequired);
        }

        let request = RoleRequest {
            role: role.wire_value().to_string(),
        };
        let response = self
            .inner
            .backend
            .set_role(&token, &request)
            .await
            .map_err(|e| {
                warn!(role = %role, error = %e, "Role update failed");
                ClientError::RoleUpdateFailed(e)
            })?;

        // The backend may reissue the token with the role embedded.
        let token_after = if response.token.trim().is_empty() {
            token.clone()
        } else {
            response.token
        };
        let assigned = response
            .user
            .role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or(role);

        if self.inner.session.borrow().token() != Some(token.as_str()) {
            return Err(ClientError::NotLoggedIn);
        }
        let session =
            Session::authenticated(token_after, address.clone(), Some(assigned), response.user.merchant_id)
                .ok_or(ClientError::NotLoggedIn)?;

        self.commit(session);
        {
            let mut flow = self.flow();
            flow.pending_role = None;
            flow.state = AuthState::Authenticated {
                role: Some(assigned),
            };
        }
        info!(address = %address, role = %assigned, "Role set");
        Ok(RoleOutcome::Set(assigned))
    }

    /// Mint the merchant credential, wait for it to be mined, then complete
    /// the pending role selection.
    pub async fn mint_merchant_credential(&self) -> Result<RoleOutcome, ClientError> {
        if !self.inner.session.borrow().is_authenticated() {
            return Err(ClientError::NotLoggedIn);
        }
        let chain_id = self
            .inner
            .wallet
            .chain_id()
            .ok_or(ClientError::ChainNotDetected)?;

        let hash = self.inner.credential.mint_merchant_credential().await?;
        self.inner.notifier.notify(chain_id, hash, "Mint merchant NFT");
        info!(tx_hash = %hash, "Merchant credential mint submitted");

        match self
            .inner
            .receipts
            .wait_for_receipt(hash, CancellationToken::new())
            .await?
        {
            ReceiptOutcome::Success => {}
            ReceiptOutcome::Reverted => return Err(ClientError::TransactionReverted(hash)),
        }

        if !self.has_credential().await? {
            return Err(ClientError::MerchantCredentialRequired);
        }
        let role = self.flow().pending_role.unwrap_or(Role::Merchant);
        self.set_role(role).await
    }

    /// Forget the session and disconnect the wallet.
    pub async fn logout(&self) {
        self.clear_session();
        {
            let mut flow = self.flow();
            flow.invalidate_login();
            flow.state = AuthState::Disconnected;
            flow.pending_role = None;
        }
        self.inner.wallet.disconnect().await;
        info!("Logged out");
    }

    /// React to the wallet switching account or disconnecting.
    pub fn on_wallet_changed(&self, address: Option<Address>) {
        let Some(address) = address.map(WalletAddress::from) else {
            self.clear_session();
            let mut flow = self.flow();
            flow.invalidate_login();
            flow.state = AuthState::Disconnected;
            flow.pending_role = None;
            return;
        };

        let stale = {
            let current = self.inner.session.borrow();
            current.is_authenticated() && !current.belongs_to(&address)
        };
        let mut flow = self.flow();
        let signer_changed = flow.signer.as_ref().is_some_and(|s| s != &address);
        if stale || signer_changed {
            info!(address = %address, "Wallet address changed, clearing session");
            self.clear_session();
            flow.invalidate_login();
            flow.state = AuthState::ConnectedUnauthenticated;
            flow.pending_role = None;
        } else if flow.state == AuthState::Disconnected {
            flow.state = AuthState::ConnectedUnauthenticated;
        }
    }

    /// Challenge, sign and submit. Returns the session to adopt.
    async fn exchange_signature(
        &self,
        address: &WalletAddress,
        epoch: u64,
    ) -> Result<Session, ClientError> {
        debug!(address = %address, "Requesting login challenge");
        let challenge = self
            .inner
            .backend
            .request_challenge(address)
            .await
            .map_err(ClientError::ChallengeRequestFailed)?;
        let challenge = Challenge::parse(challenge.message)?;
        debug!(nonce = %challenge.nonce, "Nonce extracted");

        self.advance(epoch, AuthState::AwaitingSignature)?;
        let signature = self
            .inner
            .wallet
            .sign_message(&challenge.nonce)
            .await
            .map_err(ClientError::Signing)?;
        debug!("Signature obtained");

        self.advance(epoch, AuthState::LoggingIn)?;
        let request = LoginRequest {
            address: address.clone(),
            signature,
        };
        let response = self
            .inner
            .backend
            .login(&request)
            .await
            .map_err(ClientError::LoginFailed)?;

        if &response.user.address != address {
            warn!(
                connected = %address,
                returned = %response.user.address,
                "Login response names a different address"
            );
        }
        let role = response.user.role.as_deref().and_then(Role::from_str);

        Session::authenticated(response.token, address.clone(), role, response.user.merchant_id)
            .ok_or_else(|| {
                ClientError::LoginFailed(BackendError::InvalidResponse(
                    "empty session token".to_string(),
                ))
            })
    }

    /// Start a login attempt and return its epoch.
    fn begin_login(&self, address: &WalletAddress) -> Result<u64, ClientError> {
        let mut flow = self.flow();
        if flow.state.is_busy() {
            return Err(ClientError::LoginInProgress);
        }
        flow.invalidate_login();
        flow.signer = Some(address.clone());
        flow.state = AuthState::ChallengeRequested;
        Ok(flow.epoch)
    }

    fn advance(&self, epoch: u64, state: AuthState) -> Result<(), ClientError> {
        let mut flow = self.flow();
        if flow.epoch != epoch {
            return Err(ClientError::LoginSuperseded);
        }
        flow.state = state;
        Ok(())
    }

    async fn has_credential(&self) -> Result<bool, ClientError> {
        let owner = self
            .inner
            .wallet
            .address()
            .ok_or(ClientError::NoWalletConnected)?;
        Ok(self.inner.credential.has_merchant_credential(owner).await?)
    }

    /// Persist and publish a complete session.
    fn commit(&self, session: Session) {
        if let Err(e) = self.inner.store.save(&session.to_record()) {
            warn!(error = %e, "Failed to persist session");
        }
        self.inner.session.send_replace(session);
    }

    fn clear_session(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.inner.session.send_replace(Session::default());
    }

    fn set_state(&self, state: AuthState) {
        self.flow().state = state;
    }

    fn flow(&self) -> MutexGuard<'_, Flow> {
        self.inner.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
