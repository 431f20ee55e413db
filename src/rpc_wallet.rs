//! Wallet backed by a JSON-RPC node with unlocked accounts
//!
//! Works against development nodes (hardhat, anvil) and any endpoint that
//! signs `eth_sendTransaction` on behalf of its accounts.

use crate::error::RemoteError;
use crate::provider::{TransactionSigner, TxReceipt, TxRequest, WalletProvider};
use crate::rpc::JsonRpcClient;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct RpcWallet {
    rpc: Arc<JsonRpcClient>,
    poll_interval: Duration,
    max_polls: u32,
}

impl RpcWallet {
    pub fn new(url: impl Into<String>, poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            rpc: Arc::new(JsonRpcClient::new(url)),
            poll_interval,
            max_polls: max_polls.max(1),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<String>, RemoteError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<String>, RemoteError> {
        self.rpc.request("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, RemoteError> {
        let raw: String = self.rpc.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, RemoteError> {
        Ok(Arc::new(RpcSigner {
            rpc: self.rpc.clone(),
            from: account,
            poll_interval: self.poll_interval,
            max_polls: self.max_polls,
        }))
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        let _: serde_json::Value = self.rpc.request("wallet_disconnect", json!([])).await?;
        Ok(())
    }
}

/// Signs through the node as `from`
pub struct RpcSigner {
    rpc: Arc<JsonRpcClient>,
    from: Address,
    poll_interval: Duration,
    max_polls: u32,
}

#[async_trait]
impl TransactionSigner for RpcSigner {
    async fn send_transaction(&self, request: TxRequest) -> Result<B256, RemoteError> {
        let params = json!([{
            "from": self.from,
            "to": request.to,
            "data": request.data,
        }]);
        self.rpc.request("eth_sendTransaction", params).await
    }

    async fn wait_for_inclusion(&self, tx_hash: B256) -> Result<TxReceipt, RemoteError> {
        for attempt in 1..=self.max_polls {
            let receipt: Option<RawReceipt> = self
                .rpc
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(raw) = receipt {
                let block_number = raw.block_number.as_deref().map(parse_quantity).transpose()?;
                // Pre-Byzantium receipts carry no status; treat inclusion as success
                let success = match raw.status.as_deref() {
                    Some(status) => parse_quantity(status)? == 1,
                    None => true,
                };
                return Ok(TxReceipt {
                    tx_hash: raw.transaction_hash,
                    block_number,
                    success,
                });
            }

            log::debug!(
                "Transaction {} not yet included (poll {}/{})",
                tx_hash,
                attempt,
                self.max_polls
            );
            if attempt < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(RemoteError::transport(format!(
            "Transaction {} not included after {} polls",
            tx_hash, self.max_polls
        )))
    }
}

/// Parse a JSON-RPC hex quantity such as `"0xaa36a7"`
fn parse_quantity(raw: &str) -> Result<u64, RemoteError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RemoteError::transport(format!("Invalid quantity '{}': {}", raw, e)))
}
