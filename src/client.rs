/// Donation Client - Orchestration Layer
///
/// Wires the session manager, sync coordinator and donation flow together
/// and delegates each user operation to the component that owns it.
use crate::balance::BalanceReader;
use crate::config::DonationConfig;
use crate::contracts::{ContractReader, RpcContracts};
use crate::donation::DonationTxOrchestrator;
use crate::donation_state::DonationStateReader;
use crate::error::SyncError;
use crate::indexer::{AlchemyIndexer, TokenBalanceIndexer};
use crate::provider::WalletProvider;
use crate::retry::RetryExecutor;
use crate::rpc_wallet::RpcWallet;
use crate::session::SessionManager;
use crate::state::{DonationRecord, DonationSnapshot, Session};
use crate::storage::{AccountStore, FileAccountStore};
use crate::sync::SyncCoordinator;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub struct DonationClient {
    pub config: DonationConfig,
    session: Arc<SessionManager>,
    sync: Arc<SyncCoordinator>,
    donations: Arc<DonationTxOrchestrator>,
    listener: JoinHandle<()>,
}

impl DonationClient {
    // ============================================================================
    // Constructors
    // ============================================================================

    /// Client backed by JSON-RPC nodes, the indexing service and a file store
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: DonationConfig) -> Self {
        let provider: Arc<dyn WalletProvider> = Arc::new(RpcWallet::new(
            config.wallet_rpc_url.clone(),
            config.receipt_poll_interval,
            config.receipt_max_polls,
        ));
        let contracts = Arc::new(RpcContracts::new(
            config.rpc_url.clone(),
            config.donation_address,
            config.token_address,
        ));
        let indexer = Arc::new(AlchemyIndexer::new(config.indexer_url.clone()));
        let store = Arc::new(FileAccountStore::new(config.storage_dir.clone()));

        Self::with_parts(config, Some(provider), contracts, indexer, store)
    }

    /// Client over caller-supplied collaborators
    ///
    /// `provider` is `None` when no wallet is available. Must be called inside
    /// a tokio runtime.
    pub fn with_parts(
        config: DonationConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        contracts: Arc<dyn ContractReader>,
        indexer: Arc<dyn TokenBalanceIndexer>,
        store: Arc<dyn AccountStore>,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry);

        let sync = Arc::new(SyncCoordinator::new(
            DonationStateReader::new(contracts.clone(), retry),
            BalanceReader::new(indexer, contracts, retry, config.token_address),
        ));
        let donations = Arc::new(DonationTxOrchestrator::new(
            sync.clone(),
            config.token_address,
            config.donation_address,
            config.settle_delay,
        ));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        if let Some(provider) = provider.as_ref() {
            provider.subscribe(events_tx);
        }

        let session = Arc::new(SessionManager::new(
            provider,
            store,
            sync.clone(),
            donations.clone(),
            config.required_chain_id,
        ));
        let listener = session.clone().listen(events_rx);

        Self {
            config,
            session,
            sync,
            donations,
            listener,
        }
    }

    // ============================================================================
    // Session (delegates to SessionManager)
    // ============================================================================

    pub async fn connect(&self) -> Result<Session, SyncError> {
        self.session.connect().await
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await
    }

    pub async fn reconcile_on_startup(&self) -> Result<bool, SyncError> {
        self.session.reconcile_on_startup().await
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ============================================================================
    // Donations (delegates to DonationTxOrchestrator)
    // ============================================================================

    pub async fn donate(&self, amount: &str) -> Result<DonationRecord, SyncError> {
        if !self.session.session().is_connected() {
            return Err(SyncError::NotConnected);
        }
        let active = self.session.active().await.ok_or(SyncError::NotConnected)?;
        self.donations
            .donate(active.address, active.signer.as_ref(), amount)
            .await
    }

    /// Completed donations in completion order
    pub fn history(&self) -> Vec<DonationRecord> {
        self.donations.history()
    }

    /// Completed donations, most recent first
    pub fn history_newest_first(&self) -> Vec<DonationRecord> {
        let mut records = self.donations.history();
        records.reverse();
        records
    }

    // ============================================================================
    // Snapshot (delegates to SyncCoordinator)
    // ============================================================================

    /// Re-read the snapshot for the connected account
    pub async fn refresh(&self) -> Result<DonationSnapshot, SyncError> {
        let account = self
            .session
            .session()
            .connected_address()
            .ok_or(SyncError::NotConnected)?;
        Ok(self.sync.refresh(account).await)
    }

    pub fn snapshot(&self) -> Option<DonationSnapshot> {
        self.sync.snapshot()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<DonationSnapshot>> {
        self.sync.subscribe()
    }

    /// Non-blocking data refresh advisory
    pub fn advisory(&self) -> Option<SyncError> {
        self.sync.advisory()
    }
}

impl Drop for DonationClient {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
