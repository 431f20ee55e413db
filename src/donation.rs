/// Approve-then-donate transaction flow
///
/// Two independent on-chain transactions, never retried here: a retried
/// submission could approve or donate twice. An approval that succeeded before
/// a failed donate stays on-chain; calling `donate` again re-approves.
use crate::amount::TokenAmount;
use crate::contracts::{approve_call, donate_call};
use crate::error::SyncError;
use crate::provider::{TransactionSigner, TxRequest};
use crate::state::DonationRecord;
use crate::sync::SyncCoordinator;
use alloy_primitives::{Address, B256};
use chrono::Local;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Display format of [`DonationRecord::timestamp`]
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H.%M.%S";

pub struct DonationTxOrchestrator {
    sync: Arc<SyncCoordinator>,
    token: Address,
    donation: Address,
    settle_delay: Duration,
    history: Mutex<Vec<DonationRecord>>,
    /// Bumped by `clear_history()`; donations started earlier are not appended
    generation: AtomicU64,
}

impl DonationTxOrchestrator {
    pub fn new(
        sync: Arc<SyncCoordinator>,
        token: Address,
        donation: Address,
        settle_delay: Duration,
    ) -> Self {
        Self {
            sync,
            token,
            donation,
            settle_delay,
            history: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Approve `amount` for the donation contract, donate it, record it, resync
    ///
    /// `account` and `signer` come from the connected session. Callers must not
    /// start a second donation while one is in flight.
    pub async fn donate(
        &self,
        account: Address,
        signer: &dyn TransactionSigner,
        amount: &str,
    ) -> Result<DonationRecord, SyncError> {
        let amount = TokenAmount::parse(amount).map_err(SyncError::InvalidAmount)?;
        if amount.is_zero() {
            return Err(SyncError::InvalidAmount(
                "amount must be greater than 0".to_string(),
            ));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let units = amount.base_units();
        log::info!("Donating {} ({} base units) from {}", amount, units, account);

        let approve_hash = self
            .submit(signer, approve_call(self.token, self.donation, units), "approve")
            .await?;
        log::info!("Approval {} confirmed", approve_hash);

        let donate_hash = self
            .submit(signer, donate_call(self.donation, units), "donate")
            .await?;
        log::info!("Donation {} confirmed", donate_hash);

        let record = DonationRecord {
            tx_hash: donate_hash,
            amount,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };

        {
            let mut history = self.history_mut();
            if generation == self.generation.load(Ordering::SeqCst) {
                history.push(record.clone());
            } else {
                log::warn!(
                    "Session ended while donation {} was in flight, not recording it",
                    donate_hash
                );
                return Ok(record);
            }
        }

        // Read path lags behind inclusion
        tokio::time::sleep(self.settle_delay).await;
        self.sync.refresh(account).await;

        Ok(record)
    }

    async fn submit(
        &self,
        signer: &dyn TransactionSigner,
        request: TxRequest,
        step: &str,
    ) -> Result<B256, SyncError> {
        let tx_hash = signer.send_transaction(request).await.map_err(|e| {
            log::error!("{} submission failed: {}", step, e);
            SyncError::from_tx_error(e)
        })?;
        log::info!("{} submitted: {}", step, tx_hash);

        let receipt = signer.wait_for_inclusion(tx_hash).await.map_err(|e| {
            log::error!("{} {} was not confirmed: {}", step, tx_hash, e);
            SyncError::from_tx_error(e)
        })?;

        if !receipt.success {
            log::error!("{} {} reverted", step, tx_hash);
            return Err(SyncError::TransactionFailed(format!(
                "{} transaction {} reverted",
                step, tx_hash
            )));
        }
        Ok(tx_hash)
    }

    /// Completed donations, oldest first
    pub fn history(&self) -> Vec<DonationRecord> {
        self.history_mut().clone()
    }

    pub fn clear_history(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.history_mut().clear();
    }

    fn history_mut(&self) -> MutexGuard<'_, Vec<DonationRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
