/// Snapshot synchronization
///
/// Combines donation totals and token balance into one [`DonationSnapshot`],
/// published through a watch channel. A refresh never fails: fields that
/// could not be read keep their last-known values and the snapshot is marked
/// stale, with a `DataRefreshFailed` advisory published alongside.
use crate::amount::TokenAmount;
use crate::balance::BalanceReader;
use crate::donation_state::DonationStateReader;
use crate::error::SyncError;
use crate::state::DonationSnapshot;
use alloy_primitives::Address;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub struct SyncCoordinator {
    donations: DonationStateReader,
    balances: BalanceReader,
    snapshot: watch::Sender<Option<DonationSnapshot>>,
    advisory: watch::Sender<Option<SyncError>>,
    /// Bumped by `clear()`; refreshes started under an older generation are discarded
    generation: AtomicU64,
    /// Account of the connected session; `None` accepts any account
    tracked: Mutex<Option<Address>>,
}

impl SyncCoordinator {
    pub fn new(donations: DonationStateReader, balances: BalanceReader) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (advisory, _) = watch::channel(None);
        Self {
            donations,
            balances,
            snapshot,
            advisory,
            generation: AtomicU64::new(0),
            tracked: Mutex::new(None),
        }
    }

    /// Latest snapshot; `None` when nothing has been loaded or after `clear()`
    pub fn snapshot(&self) -> Option<DonationSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DonationSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Current data-refresh advisory, if the last refresh was incomplete
    pub fn advisory(&self) -> Option<SyncError> {
        self.advisory.borrow().clone()
    }

    pub fn subscribe_advisory(&self) -> watch::Receiver<Option<SyncError>> {
        self.advisory.subscribe()
    }

    /// Re-read donation state and token balance for `account`
    pub async fn refresh(&self, account: Address) -> DonationSnapshot {
        let generation = self.generation.load(Ordering::SeqCst);
        log::debug!("Refreshing donation snapshot for {}", account);

        // Sequential: total, user donation, balance
        let total = self.donations.read_total().await;
        let user = self.donations.read_user_donation(account).await;
        let balance = self.balances.read(account).await;

        let previous = self.snapshot();
        // Per-account fields only carry over when the previous snapshot is for the same account
        let same_account = previous.as_ref().filter(|s| s.account == account);
        let mut failures = Vec::new();

        let total_donations = match total {
            Ok(total) => total,
            Err(e) => {
                failures.push(format!("total donations: {}", e));
                previous.as_ref().map_or(TokenAmount::ZERO, |s| s.total_donations)
            }
        };

        let user_donation = match user {
            Ok(user) => user,
            Err(e) => {
                failures.push(format!("user donation: {}", e));
                same_account.map_or(TokenAmount::ZERO, |s| s.user_donation)
            }
        };

        let token_balance = match balance {
            Ok(balance) => balance,
            Err(e) => {
                failures.push(format!("token balance: {}", e));
                same_account.map_or(TokenAmount::ZERO, |s| s.token_balance)
            }
        };

        let snapshot = DonationSnapshot {
            account,
            total_donations,
            user_donation,
            token_balance,
            as_of: Utc::now(),
            stale: !failures.is_empty(),
        };

        if generation != self.generation.load(Ordering::SeqCst) {
            log::debug!("Session ended during refresh for {}, discarding result", account);
            return snapshot;
        }
        if self.tracked().is_some_and(|tracked| tracked != account) {
            log::debug!("{} is no longer the session account, discarding refresh", account);
            return snapshot;
        }

        let advisory = if failures.is_empty() {
            None
        } else {
            let reason = failures.join("; ");
            log::warn!("Snapshot for {} is stale: {}", account, reason);
            Some(SyncError::DataRefreshFailed(reason))
        };

        self.snapshot.send_replace(Some(snapshot.clone()));
        self.advisory.send_replace(advisory);
        snapshot
    }

    /// Only publish refreshes for `account` from now on
    pub fn track(&self, account: Address) {
        *self.tracked_mut() = Some(account);
    }

    /// Account refreshes are currently published for
    pub fn tracked(&self) -> Option<Address> {
        *self.tracked_mut()
    }

    /// Drop the snapshot and advisory, invalidating any in-flight refresh
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.tracked_mut() = None;
        self.snapshot.send_replace(None);
        self.advisory.send_replace(None);
    }

    fn tracked_mut(&self) -> MutexGuard<'_, Option<Address>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
