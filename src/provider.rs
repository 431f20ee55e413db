//! Wallet provider surface
//!
//! The provider owns account selection and signing. This crate only needs to
//! enumerate and request accounts, read the active chain, obtain a signer,
//! and hear about account/chain changes and disconnects.

use crate::error::RemoteError;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notification pushed by the provider outside any request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Authorized accounts changed; empty means every account was revoked
    AccountsChanged(Vec<String>),
    /// Active chain switched
    ChainChanged(u64),
    /// Provider dropped the connection
    Disconnected,
}

/// Contract call to sign and submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub to: Address,
    /// ABI-encoded calldata
    pub data: Bytes,
}

/// Outcome of a transaction included in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign and submit; returns the transaction hash once accepted
    async fn send_transaction(&self, request: TxRequest) -> Result<B256, RemoteError>;

    /// Resolve once the transaction is included in a block
    async fn wait_for_inclusion(&self, tx_hash: B256) -> Result<TxReceipt, RemoteError>;
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client (no prompt)
    async fn accounts(&self) -> Result<Vec<String>, RemoteError>;

    /// Ask the user to authorize accounts (interactive)
    async fn request_accounts(&self) -> Result<Vec<String>, RemoteError>;

    async fn chain_id(&self) -> Result<u64, RemoteError>;

    /// Signer acting as `account`
    async fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, RemoteError>;

    /// Ask the provider to forget this client's authorization
    ///
    /// Not every provider supports this; callers treat failure as advisory.
    async fn disconnect(&self) -> Result<(), RemoteError>;

    /// Register where provider notifications should be delivered
    ///
    /// Providers without push notifications keep the default no-op.
    fn subscribe(&self, _events: mpsc::UnboundedSender<ProviderEvent>) {}
}
