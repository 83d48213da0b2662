// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Payment Authorization
//!
//! Two-phase token spending: approve an allowance for the spender, then
//! send the backend-prepared transaction.
//!
//! ## Ordering
//!
//! - payment is only sent once every approval of the flow is `Approved`
//! - approvals in a batch are issued one after another; the next approval
//!   is requested as soon as the previous one has a hash, not after it is
//!   confirmed
//! - every hash is reported to the [`TxNotifier`](crate::blockchain::TxNotifier)
//!
//! ## Recovery
//!
//! A wallet rejection or a reverted receipt puts the affected state back to
//! `Needed` / `Idle` and records a short inline error on the flow. The
//! session is never touched.

pub mod amount;
pub mod contracts;
pub mod controller;
pub mod flow;
pub mod state;

pub use amount::{format_amount, parse_amount};
pub use contracts::{parse_contract_address, ContractAddressSet, ContractKind};
pub use controller::PaymentController;
pub use flow::{FlowSnapshot, PaymentFlow, TokenApproval};
pub use state::{compute_needs_approval, derive_approval_state, ApprovalState, PaymentState};
