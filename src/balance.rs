//! Token balance reads: indexing service first, contract fallback
//!
//! The indexing path is attempted once. Any failure there (transport, a
//! missing entry, an undecodable amount) falls through to a retried
//! `balanceOf` read; only a fallback failure reaches the caller.

use crate::amount::TokenAmount;
use crate::contracts::ContractReader;
use crate::error::RemoteError;
use crate::indexer::TokenBalanceIndexer;
use crate::retry::RetryExecutor;
use alloy_primitives::Address;
use std::sync::Arc;

pub struct BalanceReader {
    indexer: Arc<dyn TokenBalanceIndexer>,
    contracts: Arc<dyn ContractReader>,
    retry: RetryExecutor,
    token: Address,
}

impl BalanceReader {
    pub fn new(
        indexer: Arc<dyn TokenBalanceIndexer>,
        contracts: Arc<dyn ContractReader>,
        retry: RetryExecutor,
        token: Address,
    ) -> Self {
        Self {
            indexer,
            contracts,
            retry,
            token,
        }
    }

    pub async fn read(&self, owner: Address) -> Result<TokenAmount, RemoteError> {
        match self.read_indexed(owner).await {
            Ok(balance) => {
                log::debug!("Indexer balance for {}: {}", owner, balance);
                return Ok(balance);
            }
            Err(reason) => {
                log::warn!(
                    "Indexer balance lookup failed for {} ({}), falling back to contract",
                    owner,
                    reason
                );
            }
        }

        let units = self
            .retry
            .execute(|| self.contracts.balance_of(owner))
            .await?;
        Ok(TokenAmount::from_base_units(units))
    }

    async fn read_indexed(&self, owner: Address) -> Result<TokenAmount, String> {
        let raw = self
            .indexer
            .token_balance(owner, self.token)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no balance entry for token".to_string())?;
        TokenAmount::from_hex_str(&raw)
    }
}
