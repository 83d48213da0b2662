// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! A single approve-then-pay flow.
//!
//! Each purchase or order payment gets its own [`PaymentFlow`]. The flow
//! tracks one [`ApprovalState`] per token that must be approved and one
//! [`PaymentState`] for the settlement transaction. Observers subscribe to
//! [`FlowSnapshot`] updates; only the payment controller mutates a flow.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{TxHash, U256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::contracts::ContractKind;
use super::state::{derive_approval_state, ApprovalState, PaymentState};
use crate::error::ClientError;

type SettledCallback = Arc<dyn Fn(TxHash) + Send + Sync>;

/// Approval progress for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenApproval {
    pub token: ContractKind,
    /// Base units the payment will spend
    pub required: U256,
    /// Last allowance read, if any
    pub allowance: Option<U256>,
    pub state: ApprovalState,
    pub tx_hash: Option<TxHash>,
    /// Inline error for this token's approve action
    pub error: Option<String>,
}

/// Observable state of a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub approvals: Vec<TokenApproval>,
    pub payment: PaymentState,
    pub payment_tx: Option<TxHash>,
    /// Inline error for the pay action
    pub payment_error: Option<String>,
}

impl FlowSnapshot {
    pub fn approval(&self, token: ContractKind) -> Option<&TokenApproval> {
        self.approvals.iter().find(|a| a.token == token)
    }

    pub fn approval_state(&self, token: ContractKind) -> Option<ApprovalState> {
        self.approval(token).map(|a| a.state)
    }

    pub fn all_approved(&self) -> bool {
        self.approvals
            .iter()
            .all(|a| a.state == ApprovalState::Approved)
    }
}

#[derive(Clone)]
pub struct PaymentFlow {
    id: Uuid,
    label: String,
    spender: ContractKind,
    state: Arc<watch::Sender<FlowSnapshot>>,
    cancel: CancellationToken,
    on_settled: Option<SettledCallback>,
}

impl fmt::Debug for PaymentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentFlow")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("spender", &self.spender)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl PaymentFlow {
    /// A flow approving each `(token, required)` pair for `spender`.
    pub fn new(
        label: impl Into<String>,
        spender: ContractKind,
        required: impl IntoIterator<Item = (ContractKind, U256)>,
    ) -> Self {
        let approvals = required
            .into_iter()
            .map(|(token, required)| TokenApproval {
                token,
                required,
                allowance: None,
                state: ApprovalState::Needed,
                tx_hash: None,
                error: None,
            })
            .collect();
        let (tx, _rx) = watch::channel(FlowSnapshot {
            approvals,
            payment: PaymentState::Idle,
            payment_tx: None,
            payment_error: None,
        });

        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            spender,
            state: Arc::new(tx),
            cancel: CancellationToken::new(),
            on_settled: None,
        }
    }

    /// Buy A3A with PYUSD: PYUSD is approved for the A3A token contract.
    pub fn token_purchase(pyusd_required: U256) -> Self {
        Self::new(
            "Buy A3A",
            ContractKind::RewardToken,
            [(ContractKind::PaymentToken, pyusd_required)],
        )
    }

    /// Settle an order: PYUSD and A3A are both approved for the order
    /// contract.
    pub fn order_payment(pyusd_required: U256, a3a_required: U256) -> Self {
        Self::new(
            "Pay order",
            ContractKind::OrderContract,
            [
                (ContractKind::PaymentToken, pyusd_required),
                (ContractKind::RewardToken, a3a_required),
            ],
        )
    }

    /// Run `callback` with the settlement hash once the payment is `Paid`.
    pub fn on_settled(mut self, callback: impl Fn(TxHash) + Send + Sync + 'static) -> Self {
        self.on_settled = Some(Arc::new(callback));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn spender(&self) -> ContractKind {
        self.spender
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.state.subscribe()
    }

    /// Stop waiting on any receipt this flow is watching. In-flight states
    /// fall back to `Needed` / `Idle`. The flow, and every clone of it,
    /// refuses further approvals and payments; reopening means building a
    /// new flow, which starts from a fresh allowance read.
    pub fn abandon(&self) {
        self.cancel.cancel();
    }

    pub fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn ensure_active(&self) -> Result<(), ClientError> {
        if self.is_abandoned() {
            return Err(ClientError::FlowAbandoned);
        }
        Ok(())
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Tokens still waiting for an approval to be issued.
    pub(crate) fn pending_tokens(&self) -> Vec<ContractKind> {
        self.state
            .borrow()
            .approvals
            .iter()
            .filter(|a| a.state == ApprovalState::Needed)
            .map(|a| a.token)
            .collect()
    }

    /// `Needed -> Approving`. `Ok(false)` when the token is already approved.
    pub(crate) fn begin_approval(&self, token: ContractKind) -> Result<bool, ClientError> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|s| {
            let Some(approval) = s.approvals.iter_mut().find(|a| a.token == token) else {
                outcome = Err(ClientError::InvalidInput(format!(
                    "{token} is not part of this payment"
                )));
                return false;
            };
            match approval.state.begin() {
                Ok(ApprovalState::Approving) => {
                    approval.state = ApprovalState::Approving;
                    approval.error = None;
                    outcome = Ok(true);
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    pub(crate) fn approval_submitted(&self, token: ContractKind, hash: TxHash) {
        self.modify_approval(token, |a| {
            a.state = a.state.submitted();
            a.tx_hash = Some(hash);
        });
    }

    pub(crate) fn approval_confirmed(&self, token: ContractKind) {
        self.modify_approval(token, |a| a.state = a.state.confirmed());
    }

    pub(crate) fn approval_failed(&self, token: ContractKind, message: String) {
        self.modify_approval(token, |a| {
            a.state = a.state.failed();
            a.error = Some(message);
        });
    }

    /// Adopt an allowance read unless an approval is in flight.
    pub(crate) fn reconcile(&self, token: ContractKind, allowance: Option<U256>) -> bool {
        self.state.send_if_modified(|s| {
            let Some(approval) = s.approvals.iter_mut().find(|a| a.token == token) else {
                return false;
            };
            if approval.state.is_busy() {
                return false;
            }
            approval.allowance = allowance;
            approval.state = derive_approval_state(allowance, approval.required);
            true
        })
    }

    /// `Idle -> Paying`, gated on every approval.
    pub(crate) fn begin_payment(&self) -> Result<(), ClientError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|s| {
            let approved = s.all_approved();
            match s.payment.begin(approved) {
                Ok(next) => {
                    s.payment = next;
                    s.payment_error = None;
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    pub(crate) fn payment_submitted(&self, hash: TxHash) {
        self.state.send_modify(|s| {
            s.payment = s.payment.submitted();
            s.payment_tx = Some(hash);
        });
    }

    pub(crate) fn payment_settled(&self, hash: TxHash) {
        let mut settled = false;
        self.state.send_modify(|s| {
            let next = s.payment.confirmed();
            settled = next == PaymentState::Paid && s.payment != PaymentState::Paid;
            s.payment = next;
        });
        if settled {
            if let Some(callback) = &self.on_settled {
                callback(hash);
            }
        }
    }

    pub(crate) fn payment_failed(&self, message: String) {
        self.state.send_modify(|s| {
            s.payment = s.payment.failed();
            s.payment_error = Some(message);
        });
    }

    fn modify_approval(&self, token: ContractKind, f: impl FnOnce(&mut TokenApproval)) {
        self.state.send_if_modified(|s| {
            match s.approvals.iter_mut().find(|a| a.token == token) {
                Some(approval) => {
                    f(approval);
                    true
                }
                None => false,
            }
        });
    }
}
