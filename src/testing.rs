// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stub collaborators shared by controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::api::{AuthBackend, PaymentBackend};
use crate::blockchain::{
    MerchantCredential, ReceiptOutcome, ReceiptWatcher, TxNotifier, Wallet, WalletError,
};
use crate::error::BackendError;
use crate::models::{
    AuthResponse, BuyTokenRequest, BuyTokenResponse, ChallengeResponse, LoginRequest,
    RoleRequest, TransactionPayload, WalletAddress,
};
use crate::payment::ContractKind;

/// `0x0000000000000000000000000000000000000123`
pub(crate) fn user_address() -> Address {
    let mut bytes = [0u8; 20];
    bytes[18] = 0x01;
    bytes[19] = 0x23;
    Address::from(bytes)
}

pub(crate) fn server_error() -> BackendError {
    BackendError::from_status(500, "")
}

// =============================================================================
// Backend
// =============================================================================

pub(crate) struct StubBackend {
    challenge: Mutex<Result<ChallengeResponse, BackendError>>,
    login: Mutex<Result<AuthResponse, BackendError>>,
    role: Mutex<Result<AuthResponse, BackendError>>,
    contracts: Mutex<HashMap<ContractKind, Result<String, BackendError>>>,
    buy: Mutex<Result<BuyTokenResponse, BackendError>>,
    pub calls: Mutex<Vec<String>>,
    pub login_requests: Mutex<Vec<LoginRequest>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            challenge: Mutex::new(Err(server_error())),
            login: Mutex::new(Err(server_error())),
            role: Mutex::new(Err(server_error())),
            contracts: Mutex::new(HashMap::new()),
            buy: Mutex::new(Err(server_error())),
            calls: Mutex::new(Vec::new()),
            login_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_challenge(self, message: &str) -> Self {
        self.set_challenge(Ok(ChallengeResponse {
            message: message.to_string(),
        }));
        self
    }

    pub fn set_challenge(&self, result: Result<ChallengeResponse, BackendError>) {
        *self.challenge.lock().unwrap() = result;
    }

    pub fn with_login(self, json: &str) -> Self {
        self.set_login(Ok(serde_json::from_str(json).unwrap()));
        self
    }

    pub fn set_login(&self, result: Result<AuthResponse, BackendError>) {
        *self.login.lock().unwrap() = result;
    }

    pub fn with_role(self, json: &str) -> Self {
        self.set_role_response(Ok(serde_json::from_str(json).unwrap()));
        self
    }

    pub fn set_role_response(&self, result: Result<AuthResponse, BackendError>) {
        *self.role.lock().unwrap() = result;
    }

    pub fn with_contract(self, kind: ContractKind, raw: &str) -> Self {
        self.contracts
            .lock()
            .unwrap()
            .insert(kind, Ok(raw.to_string()));
        self
    }

    pub fn with_contracts(self, set: &[(ContractKind, Address)]) -> Self {
        set.iter().fold(self, |backend, (kind, addr)| {
            backend.with_contract(*kind, &format!("\"{addr}\""))
        })
    }

    pub fn with_buy(self, json: &str) -> Self {
        *self.buy.lock().unwrap() = Ok(serde_json::from_str(json).unwrap());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn request_challenge(
        &self,
        address: &WalletAddress,
    ) -> Result<ChallengeResponse, BackendError> {
        self.record(format!("challenge {address}"));
        self.challenge.lock().unwrap().clone()
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.record("login".to_string());
        self.login_requests.lock().unwrap().push(request.clone());
        self.login.lock().unwrap().clone()
    }

    async fn set_role(
        &self,
        token: &str,
        request: &RoleRequest,
    ) -> Result<AuthResponse, BackendError> {
        self.record(format!("role {} {token}", request.role));
        self.role.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentBackend for StubBackend {
    async fn contract_address(
        &self,
        token: &str,
        kind: ContractKind,
    ) -> Result<String, BackendError> {
        self.record(format!("contract {} {token}", kind.path()));
        self.contracts
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Err(server_error()))
    }

    async fn buy_token(
        &self,
        token: &str,
        request: &BuyTokenRequest,
    ) -> Result<BuyTokenResponse, BackendError> {
        self.record(format!("buy {} {token}", request.pyusd));
        self.buy.lock().unwrap().clone()
    }
}

// =============================================================================
// Wallet
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WalletCall {
    Sign(String),
    Send(TransactionPayload),
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Allowance(Address),
    Mint,
    Disconnect,
}

pub(crate) struct StubWallet {
    address: Mutex<Option<Address>>,
    chain_id: Mutex<Option<u64>>,
    signature: Mutex<Result<String, WalletError>>,
    sign_gate: Mutex<Option<Arc<Notify>>>,
    approve_results: Mutex<VecDeque<Result<TxHash, WalletError>>>,
    send_results: Mutex<VecDeque<Result<TxHash, WalletError>>>,
    allowances: Mutex<HashMap<Address, U256>>,
    has_credential: Mutex<bool>,
    next_hash: AtomicU64,
    pub calls: Mutex<Vec<WalletCall>>,
}

impl StubWallet {
    pub fn new() -> Self {
        Self {
            address: Mutex::new(Some(user_address())),
            chain_id: Mutex::new(Some(31337)),
            signature: Mutex::new(Ok("0xSIG".to_string())),
            sign_gate: Mutex::new(None),
            approve_results: Mutex::new(VecDeque::new()),
            send_results: Mutex::new(VecDeque::new()),
            allowances: Mutex::new(HashMap::new()),
            has_credential: Mutex::new(true),
            next_hash: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_address(&self, address: Option<Address>) {
        *self.address.lock().unwrap() = address;
    }

    pub fn set_chain_id(&self, chain_id: Option<u64>) {
        *self.chain_id.lock().unwrap() = chain_id;
    }

    pub fn set_signature(&self, result: Result<String, WalletError>) {
        *self.signature.lock().unwrap() = result;
    }

    /// Hold signature requests until the returned handle is notified.
    pub fn hold_signature(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.sign_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_approve_result(&self, result: Result<TxHash, WalletError>) {
        self.approve_results.lock().unwrap().push_back(result);
    }

    pub fn push_send_result(&self, result: Result<TxHash, WalletError>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn set_allowance(&self, token: Address, amount: U256) {
        self.allowances.lock().unwrap().insert(token, amount);
    }

    pub fn set_has_credential(&self, has: bool) {
        *self.has_credential.lock().unwrap() = has;
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<TransactionPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WalletCall::Send(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn approvals(&self) -> Vec<(Address, Address, U256)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WalletCall::Approve {
                    token,
                    spender,
                    amount,
                } => Some((token, spender, amount)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: WalletCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn fresh_hash(&self) -> TxHash {
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
        TxHash::from(U256::from(n).to_be_bytes::<32>())
    }

    fn next(&self, queue: &Mutex<VecDeque<Result<TxHash, WalletError>>>) -> Result<TxHash, WalletError> {
        let scripted = queue.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fresh_hash()))
    }
}

#[async_trait]
impl Wallet for StubWallet {
    fn address(&self) -> Option<Address> {
        *self.address.lock().unwrap()
    }

    fn chain_id(&self) -> Option<u64> {
        *self.chain_id.lock().unwrap()
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.record(WalletCall::Sign(message.to_string()));
        let gate = self.sign_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.signature.lock().unwrap().clone()
    }

    async fn send_transaction(&self, payload: &TransactionPayload) -> Result<TxHash, WalletError> {
        self.record(WalletCall::Send(payload.clone()));
        self.next(&self.send_results)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        self.record(WalletCall::Approve {
            token,
            spender,
            amount,
        });
        self.next(&self.approve_results)
    }

    async fn allowance(
        &self,
        token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, WalletError> {
        self.record(WalletCall::Allowance(token));
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .unwrap_or_default())
    }

    async fn disconnect(&self) {
        self.record(WalletCall::Disconnect);
        self.set_address(None);
    }
}

#[async_trait]
impl MerchantCredential for StubWallet {
    async fn has_merchant_credential(&self, _owner: Address) -> Result<bool, WalletError> {
        Ok(*self.has_credential.lock().unwrap())
    }

    async fn mint_merchant_credential(&self) -> Result<TxHash, WalletError> {
        self.record(WalletCall::Mint);
        self.set_has_credential(true);
        Ok(self.fresh_hash())
    }
}

// =============================================================================
// Receipts and notifications
// =============================================================================

/// Receipt watcher with per-hash scripted outcomes (default: success).
///
/// With a gate installed, every wait blocks until the gate is released or
/// the wait is cancelled.
#[derive(Default)]
pub(crate) struct ScriptedReceipts {
    outcomes: Mutex<HashMap<TxHash, Result<ReceiptOutcome, WalletError>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub waited: Mutex<Vec<TxHash>>,
}

impl ScriptedReceipts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, hash: TxHash, outcome: Result<ReceiptOutcome, WalletError>) {
        self.outcomes.lock().unwrap().insert(hash, outcome);
    }

    /// Hold all receipt waits until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn waited(&self) -> Vec<TxHash> {
        self.waited.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReceiptWatcher for ScriptedReceipts {
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        cancel: CancellationToken,
    ) -> Result<ReceiptOutcome, WalletError> {
        self.waited.lock().unwrap().push(hash);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            tokio::select! {
                _ = gate.notified() => {}
                _ = cancel.cancelled() => {
                    return Err(WalletError::Failed("Stopped waiting for confirmation".into()));
                }
            }
        }

        self.outcomes
            .lock()
            .unwrap()
            .get(&hash)
            .cloned()
            .unwrap_or(Ok(ReceiptOutcome::Success))
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub notified: Mutex<Vec<(u64, TxHash, String)>>,
}

impl RecordingNotifier {
    pub fn hashes(&self) -> Vec<TxHash> {
        self.notified
            .lock()
            .unwrap()
            .iter()
            .map(|(_, hash, _)| *hash)
            .collect()
    }
}

impl TxNotifier for RecordingNotifier {
    fn notify(&self, chain_id: u64, hash: TxHash, label: &str) {
        self.notified
            .lock()
            .unwrap()
            .push((chain_id, hash, label.to_string()));
    }
}
