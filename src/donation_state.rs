//! Aggregate and per-account donation totals

use crate::amount::TokenAmount;
use crate::contracts::ContractReader;
use crate::error::RemoteError;
use crate::retry::RetryExecutor;
use alloy_primitives::Address;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationState {
    pub total: TokenAmount,
    pub user_donation: TokenAmount,
}

pub struct DonationStateReader {
    contracts: Arc<dyn ContractReader>,
    retry: RetryExecutor,
}

impl DonationStateReader {
    pub fn new(contracts: Arc<dyn ContractReader>, retry: RetryExecutor) -> Self {
        Self { contracts, retry }
    }

    /// Read the contract-wide total, then `donor`'s own total
    ///
    /// Sequential on purpose: at most one read is in flight at a time.
    pub async fn read(&self, donor: Address) -> Result<DonationState, RemoteError> {
        let total = self.read_total().await?;
        let user_donation = self.read_user_donation(donor).await?;

        log::debug!(
            "Donation state for {}: total={}, user={}",
            donor,
            total,
            user_donation
        );

        Ok(DonationState {
            total,
            user_donation,
        })
    }

    /// `totalDonations()`, retried
    pub async fn read_total(&self) -> Result<TokenAmount, RemoteError> {
        self.retry
            .execute(|| self.contracts.total_donations())
            .await
            .map(TokenAmount::from_base_units)
    }

    /// `getDonation(donor)`, retried
    pub async fn read_user_donation(&self, donor: Address) -> Result<TokenAmount, RemoteError> {
        self.retry
            .execute(|| self.contracts.donation_of(donor))
            .await
            .map(TokenAmount::from_base_units)
    }
}
