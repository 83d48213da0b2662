// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::TxHash;
use tracing::info;

use super::TxNotifier;

/// Reports transaction hashes as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl TxNotifier for LogNotifier {
    fn notify(&self, chain_id: u64, hash: TxHash, label: &str) {
        info!(chain_id, tx_hash = %hash, label, "Transaction submitted");
    }
}
