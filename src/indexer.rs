//! Indexing service token balance lookups
//!
//! Faster than a contract read, but operationally less reliable; callers
//! keep a contract fallback.

use crate::error::RemoteError;
use crate::rpc::JsonRpcClient;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait TokenBalanceIndexer: Send + Sync {
    /// Hex-encoded base-unit balance of `owner` in `token`, if the service has one
    async fn token_balance(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<Option<String>, RemoteError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResponse {
    #[serde(default)]
    token_balances: Vec<TokenBalanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalanceEntry {
    contract_address: Address,
    #[serde(default)]
    token_balance: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// `alchemy_getTokenBalances` client
pub struct AlchemyIndexer {
    rpc: JsonRpcClient,
}

impl AlchemyIndexer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl TokenBalanceIndexer for AlchemyIndexer {
    async fn token_balance(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<Option<String>, RemoteError> {
        let response: TokenBalancesResponse = self
            .rpc
            .request("alchemy_getTokenBalances", json!([owner, [token]]))
            .await?;
        Ok(select_balance(response, token))
    }
}

fn select_balance(response: TokenBalancesResponse, token: Address) -> Option<String> {
    let entry = response
        .token_balances
        .into_iter()
        .find(|entry| entry.contract_address == token)?;

    if let Some(err) = entry.error.filter(|e| !e.is_null()) {
        log::debug!("Indexer reported error for token {}: {}", token, err);
        return None;
    }
    entry.token_balance
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0x008f4592f43a280d553a56e8f237b846aeee4134";

    fn decode(value: serde_json::Value) -> TokenBalancesResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_select_matching_entry() {
        let response = decode(json!({
            "address": "0x00000000000000000000000000000000000000aa",
            "tokenBalances": [{
                "contractAddress": TOKEN,
                "tokenBalance": "0x0000000000000000000000000000000000000000000000000de0b6b3a7640000",
                "error": null
            }]
        }));
        let balance = select_balance(response, TOKEN.parse().unwrap());
        assert!(balance.unwrap().ends_with("de0b6b3a7640000"));
    }

    #[test]
    fn test_missing_or_failed_entry_is_none() {
        let missing = decode(json!({ "tokenBalances": [] }));
        assert_eq!(select_balance(missing, TOKEN.parse().unwrap()), None);

        let failed = decode(json!({
            "tokenBalances": [{
                "contractAddress": TOKEN,
                "tokenBalance": null,
                "error": "execution reverted"
            }]
        }));
        assert_eq!(select_balance(failed, TOKEN.parse().unwrap()), None);
    }
}
