// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drives [`PaymentFlow`]s against the wallet and the backend.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::amount::parse_amount;
use super::contracts::{parse_contract_address, ContractAddressSet, ContractKind};
use super::flow::PaymentFlow;
use crate::api::PaymentBackend;
use crate::blockchain::{
    ReceiptOutcome, ReceiptWatcher, TxNotifier, Wallet, INFINITE_ALLOWANCE, PYUSD_TOKEN,
};
use crate::error::{BackendError, ClientError};
use crate::models::{BuyTokenRequest, TransactionPayload};
use crate::session::SessionReader;

/// Addresses resolved for one session token.
#[derive(Debug, Default)]
struct ContractCache {
    token: Option<String>,
    set: ContractAddressSet,
}

pub struct PaymentController {
    backend: Arc<dyn PaymentBackend>,
    wallet: Arc<dyn Wallet>,
    receipts: Arc<dyn ReceiptWatcher>,
    notifier: Arc<dyn TxNotifier>,
    session: SessionReader,
    contracts: Mutex<ContractCache>,
}

impl PaymentController {
    pub fn new(
        backend: Arc<dyn PaymentBackend>,
        wallet: Arc<dyn Wallet>,
        receipts: Arc<dyn ReceiptWatcher>,
        notifier: Arc<dyn TxNotifier>,
        session: SessionReader,
    ) -> Self {
        Self {
            backend,
            wallet,
            receipts,
            notifier,
            session,
            contracts: Mutex::new(ContractCache::default()),
        }
    }

    /// Addresses resolved so far for the current session.
    pub async fn contracts(&self) -> ContractAddressSet {
        let cache = self.contracts.lock().await;
        if cache.token.is_some() && cache.token == self.session.token() {
            cache.set
        } else {
            ContractAddressSet::default()
        }
    }

    /// Resolve every contract address not yet known for this session.
    ///
    /// Individual failures are logged and leave that address unresolved;
    /// the call only fails when no one is logged in.
    pub async fn fetch_contract_addresses(&self) -> Result<ContractAddressSet, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;

        let mut cache = self.contracts.lock().await;
        if cache.token.as_deref() != Some(token.as_str()) {
            *cache = ContractCache {
                token: Some(token.clone()),
                set: ContractAddressSet::default(),
            };
        }

        for kind in cache.set.missing() {
            match self.backend.contract_address(&token, kind).await {
                Ok(raw) => match parse_contract_address(&raw) {
                    Some(address) => cache.set.resolve(kind, address),
                    None => warn!(contract = %kind, body = %raw.trim(), "Unparseable contract address"),
                },
                Err(e) => warn!(contract = %kind, error = %e, "Failed to fetch contract address"),
            }
        }

        if cache.set.is_complete() {
            info!(
                payment_token = ?cache.set.payment_token,
                reward_token = ?cache.set.reward_token,
                order_contract = ?cache.set.order_contract,
                "Contract addresses cached"
            );
        }
        Ok(cache.set)
    }

    /// Re-read the on-chain allowance of every token in `flow` and adopt it
    /// where no approval is in flight. An unreadable allowance counts as
    /// unknown.
    pub async fn refresh_allowances(&self, flow: &PaymentFlow) -> Result<(), ClientError> {
        let owner = self.wallet.address().ok_or(ClientError::NoWalletConnected)?;
        let contracts = self.contracts().await;
        let spender = contracts
            .get(flow.spender())
            .ok_or(ClientError::ContractsNotLoaded)?;

        for approval in flow.snapshot().approvals {
            let allowance = match contracts.get(approval.token) {
                Some(token) => match self.wallet.allowance(token, owner, spender).await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(token = %approval.token, error = %e, "Failed to read allowance");
                        None
                    }
                },
                None => None,
            };
            flow.reconcile(approval.token, allowance);
        }
        Ok(())
    }

    /// Approve an unlimited allowance of `token` for the flow's spender and
    /// wait for it to be mined.
    pub async fn approve(&self, flow: &PaymentFlow, token: ContractKind) -> Result<(), ClientError> {
        match self.issue_approval(flow, token).await? {
            Some(hash) => self.confirm_approval(flow, token, hash).await,
            None => Ok(()),
        }
    }

    /// Approve every token of the flow that still needs it.
    ///
    /// Each approval is requested once the previous one has a hash. Receipts
    /// are awaited afterwards; the first failure is returned.
    pub async fn approve_all(&self, flow: &PaymentFlow) -> Result<(), ClientError> {
        let mut issued = Vec::new();
        let mut first_error = None;

        for token in flow.pending_tokens() {
            match self.issue_approval(flow, token).await {
                Ok(Some(hash)) => issued.push((token, hash)),
                Ok(None) => {}
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            }
        }

        for (token, hash) in issued {
            if let Err(e) = self.confirm_approval(flow, token, hash).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Send a backend-prepared transaction once every approval of the flow
    /// is `Approved`, then wait for it to settle.
    pub async fn pay(
        &self,
        flow: &PaymentFlow,
        payload: &TransactionPayload,
    ) -> Result<TxHash, ClientError> {
        flow.ensure_active()?;
        flow.begin_payment()?;

        let Some(chain_id) = self.wallet.chain_id() else {
            let err = ClientError::ChainNotDetected;
            flow.payment_failed(err.user_message());
            return Err(err);
        };

        let hash = match self.wallet.send_transaction(payload).await {
            Ok(hash) => hash,
            Err(e) => {
                flow.payment_failed(e.short_message());
                return Err(ClientError::Wallet(e));
            }
        };
        self.notifier.notify(chain_id, hash, flow.label());
        flow.payment_submitted(hash);
        info!(flow = %flow.id(), tx_hash = %hash, label = flow.label(), "Payment submitted");

        match self.receipts.wait_for_receipt(hash, flow.cancel_token()).await {
            Ok(ReceiptOutcome::Success) => {
                flow.payment_settled(hash);
                info!(flow = %flow.id(), tx_hash = %hash, "Payment settled");
                Ok(hash)
            }
            Ok(ReceiptOutcome::Reverted) => {
                let err = ClientError::TransactionReverted(hash);
                flow.payment_failed(err.user_message());
                warn!(flow = %flow.id(), tx_hash = %hash, "Payment reverted");
                Err(err)
            }
            Err(e) => {
                flow.payment_failed(e.short_message());
                Err(ClientError::Wallet(e))
            }
        }
    }

    /// Buy A3A for `pyusd` whole PYUSD. The PYUSD approval must already be
    /// in place; the backend prepares the purchase transaction.
    pub async fn buy_token(&self, flow: &PaymentFlow, pyusd: &str) -> Result<TxHash, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;
        flow.ensure_active()?;

        parse_amount(pyusd, PYUSD_TOKEN.decimals)?;
        let amount: f64 = pyusd
            .trim()
            .parse()
            .map_err(|_| ClientError::InvalidAmount(pyusd.to_string()))?;

        if !flow.snapshot().all_approved() {
            return Err(ClientError::ApprovalRequired);
        }

        let response = self
            .backend
            .buy_token(&token, &BuyTokenRequest { pyusd: amount })
            .await?;
        if !response.is_ok() {
            return Err(ClientError::PurchaseRejected(response.status));
        }
        let payload = response
            .payload()
            .map_err(|e| ClientError::Backend(BackendError::InvalidResponse(e)))?;

        self.pay(flow, &payload).await
    }

    /// Request the approval from the wallet. `Ok(None)` when the token was
    /// already approved.
    async fn issue_approval(
        &self,
        flow: &PaymentFlow,
        token: ContractKind,
    ) -> Result<Option<TxHash>, ClientError> {
        flow.ensure_active()?;
        let contracts = self.contracts().await;
        let (token_address, spender) = resolve_pair(&contracts, token, flow.spender())?;
        let chain_id = self.wallet.chain_id().ok_or(ClientError::ChainNotDetected)?;

        if !flow.begin_approval(token)? {
            return Ok(None);
        }

        let hash = match self
            .wallet
            .approve(token_address, spender, INFINITE_ALLOWANCE)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                flow.approval_failed(token, e.short_message());
                return Err(ClientError::Wallet(e));
            }
        };

        self.notifier.notify(chain_id, hash, &format!("Approve {token}"));
        flow.approval_submitted(token, hash);
        info!(flow = %flow.id(), token = %token, tx_hash = %hash, "Approval submitted");
        Ok(Some(hash))
    }

    async fn confirm_approval(
        &self,
        flow: &PaymentFlow,
        token: ContractKind,
        hash: TxHash,
    ) -> Result<(), ClientError> {
        match self.receipts.wait_for_receipt(hash, flow.cancel_token()).await {
            Ok(ReceiptOutcome::Success) => {
                flow.approval_confirmed(token);
                info!(flow = %flow.id(), token = %token, tx_hash = %hash, "Approval confirmed");
                Ok(())
            }
            Ok(ReceiptOutcome::Reverted) => {
                let err = ClientError::TransactionReverted(hash);
                flow.approval_failed(token, err.user_message());
                warn!(flow = %flow.id(), token = %token, tx_hash = %hash, "Approval reverted");
                Err(err)
            }
            Err(e) => {
                flow.approval_failed(token, e.short_message());
                Err(ClientError::Wallet(e))
            }
        }
    }
}

fn resolve_pair(
    contracts: &ContractAddressSet,
    token: ContractKind,
    spender: ContractKind,
) -> Result<(Address, Address), ClientError> {
    match (contracts.get(token), contracts.get(spender)) {
        (Some(token), Some(spender)) => Ok((token, spender)),
        _ => Err(ClientError::ContractsNotLoaded),
    }
}
