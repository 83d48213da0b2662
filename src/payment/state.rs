// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Approval and payment state machines.
//!
//! ```text
//! ApprovalState:  Needed -> Approving -> Confirming -> Approved
//!                    ^__________|______________|   (rejection / revert)
//!
//! PaymentState:   Idle -> Paying -> Confirming -> Paid (terminal)
//!                   ^________|___________|         (rejection / revert)
//! ```

use alloy::primitives::U256;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalState {
    #[default]
    Needed,
    /// Wallet prompt outstanding
    Approving,
    /// Receipt pending
    Confirming,
    Approved,
}

impl ApprovalState {
    /// `Needed -> Approving`.
    pub fn begin(self) -> Result<Self, ClientError> {
        match self {
            ApprovalState::Needed => Ok(ApprovalState::Approving),
            ApprovalState::Approving | ApprovalState::Confirming => {
                Err(ClientError::ApprovalInProgress)
            }
            ApprovalState::Approved => Ok(ApprovalState::Approved),
        }
    }

    /// Hash obtained: `Approving -> Confirming`.
    pub fn submitted(self) -> Self {
        match self {
            ApprovalState::Approving => ApprovalState::Confirming,
            other => other,
        }
    }

    /// Receipt succeeded: `Confirming -> Approved`.
    pub fn confirmed(self) -> Self {
        match self {
            ApprovalState::Confirming => ApprovalState::Approved,
            other => other,
        }
    }

    /// Rejection or revert: back to `Needed` from any in-flight state.
    pub fn failed(self) -> Self {
        match self {
            ApprovalState::Approved => ApprovalState::Approved,
            _ => ApprovalState::Needed,
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, ApprovalState::Approving | ApprovalState::Confirming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    Idle,
    /// Wallet prompt outstanding
    Paying,
    /// Receipt pending
    Confirming,
    /// Terminal
    Paid,
}

impl PaymentState {
    /// `Idle -> Paying`, only once every paired approval is `Approved`.
    pub fn begin(self, approved: bool) -> Result<Self, ClientError> {
        match self {
            PaymentState::Paid => Err(ClientError::AlreadyPaid),
            PaymentState::Paying | PaymentState::Confirming => Err(ClientError::PaymentInProgress),
            PaymentState::Idle if !approved => Err(ClientError::ApprovalRequired),
            PaymentState::Idle => Ok(PaymentState::Paying),
        }
    }

    pub fn submitted(self) -> Self {
        match self {
            PaymentState::Paying => PaymentState::Confirming,
            other => other,
        }
    }

    pub fn confirmed(self) -> Self {
        match self {
            PaymentState::Confirming => PaymentState::Paid,
            other => other,
        }
    }

    /// Rejection or revert: back to `Idle`. `Paid` is never left.
    pub fn failed(self) -> Self {
        match self {
            PaymentState::Paid => PaymentState::Paid,
            _ => PaymentState::Idle,
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, PaymentState::Paying | PaymentState::Confirming)
    }
}

/// An unknown allowance always needs approval.
pub fn compute_needs_approval(current_allowance: Option<U256>, required_amount: U256) -> bool {
    match current_allowance {
        None => true,
        Some(allowance) => allowance < required_amount,
    }
}

/// Approval state implied by an on-chain allowance read.
pub fn derive_approval_state(
    current_allowance: Option<U256>,
    required_amount: U256,
) -> ApprovalState {
    if compute_needs_approval(current_allowance, required_amount) {
        ApprovalState::Needed
    } else {
        ApprovalState::Approved
    }
}
