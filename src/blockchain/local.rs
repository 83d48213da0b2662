// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet backed by a locally held key and an HTTP JSON-RPC provider.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::erc20::{approve_calldata, mint_calldata, IERC20, IMerchantNFT};
use super::signing::load_signer;
use super::types::NetworkConfig;
use super::{MerchantCredential, ReceiptOutcome, ReceiptWatcher, Wallet, WalletError};
use crate::config::ClientConfig;
use crate::models::TransactionPayload;

/// Chain id value meaning "not detected yet".
const UNKNOWN_CHAIN: u64 = 0;

/// EVM wallet signing with a [`PrivateKeySigner`].
pub struct LocalWallet {
    signer: PrivateKeySigner,
    provider: DynProvider,
    network: NetworkConfig,
    chain_id: AtomicU64,
    connected: AtomicBool,
    merchant_nft: Option<Address>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl LocalWallet {
    /// Create a wallet without touching the network.
    pub fn new(
        signer: PrivateKeySigner,
        network: NetworkConfig,
        merchant_nft: Option<Address>,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, WalletError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| WalletError::Failed(format!("Invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url)
            .erased();

        Ok(Self {
            signer,
            provider,
            network,
            chain_id: AtomicU64::new(UNKNOWN_CHAIN),
            connected: AtomicBool::new(true),
            merchant_nft,
            receipt_timeout,
            poll_interval,
        })
    }

    /// Load the configured key and detect the chain.
    ///
    /// Chain detection failure is not fatal: the wallet stays usable for
    /// signing, and payment actions report `ChainNotDetected`.
    pub async fn connect(config: &ClientConfig) -> Result<Self, WalletError> {
        let source = config.key.as_ref().ok_or(WalletError::NotConnected)?;
        let signer = load_signer(source)?;

        let wallet = Self::new(
            signer,
            config.network.clone(),
            config.merchant_nft,
            config.receipt_timeout,
            config.receipt_poll_interval,
        )?;

        if let Err(e) = wallet.detect_chain().await {
            warn!(rpc_url = %wallet.network.rpc_url, error = %e, "Chain detection failed");
        }

        info!(
            address = %wallet.signer.address(),
            network = %wallet.network.name,
            "Wallet connected"
        );
        Ok(wallet)
    }

    /// Query the RPC for its chain id and remember it.
    pub async fn detect_chain(&self) -> Result<u64, WalletError> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| WalletError::Failed(format!("Failed to get chain id: {e}")))?;

        if chain_id != self.network.chain_id {
            warn!(
                expected = self.network.chain_id,
                actual = chain_id,
                "RPC endpoint reports an unexpected chain id"
            );
        }
        self.chain_id.store(chain_id, Ordering::SeqCst);
        Ok(chain_id)
    }

    fn ensure_connected(&self) -> Result<Address, WalletError> {
        self.address().ok_or(WalletError::NotConnected)
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| WalletError::from_provider(format!("Failed to send: {e}")))?;
        Ok(*pending.tx_hash())
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn address(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.signer.address())
    }

    fn chain_id(&self) -> Option<u64> {
        match self.chain_id.load(Ordering::SeqCst) {
            UNKNOWN_CHAIN => None,
            id => Some(id),
        }
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.ensure_connected()?;
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletError::from_provider(e.to_string()))?;
        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    async fn send_transaction(&self, payload: &TransactionPayload) -> Result<TxHash, WalletError> {
        let from = self.ensure_connected()?;
        let tx = TransactionRequest::default()
            .from(from)
            .to(payload.to)
            .input(payload.data.clone().into())
            .value(payload.value);
        self.submit(tx).await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        let from = self.ensure_connected()?;
        let tx = TransactionRequest::default()
            .from(from)
            .to(token)
            .input(approve_calldata(spender, amount).into());
        self.submit(tx).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WalletError> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| WalletError::Failed(format!("Failed to read allowance: {e}")))
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        debug!("Wallet disconnected");
    }
}

#[async_trait]
impl ReceiptWatcher for LocalWallet {
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        cancel: CancellationToken,
    ) -> Result<ReceiptOutcome, WalletError> {
        let deadline = Instant::now() + self.receipt_timeout;

        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let outcome = if receipt.status() {
                        ReceiptOutcome::Success
                    } else {
                        ReceiptOutcome::Reverted
                    };
                    debug!(tx_hash = %hash, ?outcome, "Receipt found");
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => debug!(tx_hash = %hash, error = %e, "Receipt poll failed"),
            }

            if Instant::now() >= deadline {
                return Err(WalletError::Timeout);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(WalletError::Failed("Stopped waiting for confirmation".to_string()));
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

#[async_trait]
impl MerchantCredential for LocalWallet {
    async fn has_merchant_credential(&self, owner: Address) -> Result<bool, WalletError> {
        let Some(nft) = self.merchant_nft else {
            return Ok(true);
        };
        let balance = IMerchantNFT::new(nft, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| WalletError::Failed(format!("Failed to read merchant NFT balance: {e}")))?;
        Ok(balance > U256::ZERO)
    }

    async fn mint_merchant_credential(&self) -> Result<TxHash, WalletError> {
        let nft = self
            .merchant_nft
            .ok_or_else(|| WalletError::Failed("Merchant NFT contract not configured".to_string()))?;
        let from = self.ensure_connected()?;
        let tx = TransactionRequest::default()
            .from(from)
            .to(nft)
            .input(mint_calldata().into());
        self.submit(tx).await
    }
}
