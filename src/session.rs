/// Wallet session lifecycle
///
/// Owns the [`Session`]: `Disconnected -> Connecting -> Connected`. User
/// connects are rejected with `Busy` while another connect is in flight;
/// provider events wait their turn instead. A disconnect never fails and
/// invalidates any connect still in flight.
use crate::donation::DonationTxOrchestrator;
use crate::error::SyncError;
use crate::provider::{ProviderEvent, TransactionSigner, WalletProvider};
use crate::state::{ConnectionState, Session};
use crate::storage::AccountStore;
use crate::sync::SyncCoordinator;
use alloy_primitives::Address;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Connected account with its signer
#[derive(Clone)]
pub struct ActiveSession {
    pub address: Address,
    pub chain_id: u64,
    pub signer: Arc<dyn TransactionSigner>,
}

/// Who asked for the connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectTrigger {
    /// Direct user action: rejected with `Busy` if a connect is running
    User,
    /// Provider notification: queued behind a running connect
    Event,
}

/// What a successful connect attempt amounted to
enum Established {
    /// Same account already connected
    Unchanged,
    New(ActiveSession),
}

pub struct SessionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    store: Arc<dyn AccountStore>,
    sync: Arc<SyncCoordinator>,
    donations: Arc<DonationTxOrchestrator>,
    required_chain_id: u64,
    session: watch::Sender<Session>,
    active: RwLock<Option<ActiveSession>>,
    connect_lock: Mutex<()>,
    /// Bumped by every teardown so overlapping connects do not commit
    epoch: AtomicU64,
    startup_checked: AtomicBool,
}

impl SessionManager {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        store: Arc<dyn AccountStore>,
        sync: Arc<SyncCoordinator>,
        donations: Arc<DonationTxOrchestrator>,
        required_chain_id: u64,
    ) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            provider,
            store,
            sync,
            donations,
            required_chain_id,
            session,
            active: RwLock::new(None),
            connect_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
            startup_checked: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Connected account and signer, if any
    pub async fn active(&self) -> Option<ActiveSession> {
        self.active.read().await.clone()
    }

    /// Connect the wallet's first authorized account, prompting if none is
    pub async fn connect(&self) -> Result<Session, SyncError> {
        self.connect_with(None, ConnectTrigger::User).await
    }

    /// Attempt one automatic connect per lifetime when a previous session
    /// looks restorable
    ///
    /// Returns `Ok(false)` when no attempt was made.
    pub async fn reconcile_on_startup(&self) -> Result<bool, SyncError> {
        if self.startup_checked.swap(true, Ordering::SeqCst) {
            log::debug!("Startup reconciliation already ran");
            return Ok(false);
        }
        let Some(provider) = self.provider.as_ref() else {
            log::info!("No wallet provider present, skipping session restore");
            return Ok(false);
        };

        let authorized = match provider.accounts().await {
            Ok(accounts) => !accounts.is_empty(),
            Err(e) => {
                log::warn!("Could not list authorized accounts: {}", e);
                false
            }
        };
        let remembered = match self.store.load() {
            Ok(account) => account,
            Err(e) => {
                log::warn!("Could not read remembered account: {}", e);
                None
            }
        };

        if !authorized && remembered.is_none() {
            log::info!("No previous session to restore");
            return Ok(false);
        }

        log::info!(
            "Restoring session (authorized accounts: {}, remembered: {:?})",
            authorized,
            remembered
        );
        self.connect().await.map(|_| true)
    }

    async fn connect_with(
        &self,
        preferred: Option<String>,
        trigger: ConnectTrigger,
    ) -> Result<Session, SyncError> {
        let provider = self.provider.clone().ok_or(SyncError::ProviderMissing)?;

        let _guard = match trigger {
            ConnectTrigger::User => self.connect_lock.try_lock().map_err(|_| {
                log::warn!("Connect requested while another connect is in flight");
                SyncError::Busy
            })?,
            ConnectTrigger::Event => self.connect_lock.lock().await,
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        let previous = self.session();

        let outcome = self
            .establish(provider.as_ref(), preferred, &previous, epoch)
            .await;

        if epoch != self.epoch.load(Ordering::SeqCst) {
            log::warn!("Disconnected while connecting, abandoning connect");
            // Teardown already published Disconnected; undo anything this attempt published since
            self.session.send_if_modified(|session| {
                if session.connection_state == ConnectionState::Connecting {
                    *session = Session::default();
                    true
                } else {
                    false
                }
            });
            return Err(superseded());
        }

        match outcome {
            Ok(Established::Unchanged) => {
                log::debug!("Account already connected, nothing to do");
                Ok(previous)
            }
            Ok(Established::New(active)) => self.commit(active, epoch).await,
            Err(e @ SyncError::WrongNetwork { .. }) => {
                log::warn!("Connect rejected: {}", e);
                self.reset_local().await;
                Err(e)
            }
            Err(e) => {
                log::warn!("Connect failed: {}", e);
                self.session.send_replace(previous);
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        provider: &dyn WalletProvider,
        preferred: Option<String>,
        previous: &Session,
        epoch: u64,
    ) -> Result<Established, SyncError> {
        // A connected session keeps showing Connected until a different account is picked
        if !previous.is_connected() {
            self.mark_connecting(previous);
        }

        let raw_account = match preferred {
            Some(account) => account,
            None => self.select_account(provider).await?,
        };

        let address = Address::from_str(raw_account.trim()).map_err(|_| {
            SyncError::Unknown(format!("invalid account identifier '{}'", raw_account))
        })?;

        if previous.connected_address() == Some(address) {
            return Ok(Established::Unchanged);
        }
        if previous.is_connected() {
            // `previous` is outdated once a teardown ran during account selection
            if epoch != self.epoch.load(Ordering::SeqCst) {
                return Err(superseded());
            }
            self.mark_connecting(previous);
        }

        let chain_id = provider
            .chain_id()
            .await
            .map_err(SyncError::from_connect_error)?;
        if chain_id != self.required_chain_id {
            return Err(SyncError::WrongNetwork {
                expected: self.required_chain_id,
                actual: chain_id,
            });
        }

        let signer = provider
            .signer(address)
            .await
            .map_err(SyncError::from_connect_error)?;

        Ok(Established::New(ActiveSession {
            address,
            chain_id,
            signer,
        }))
    }

    fn mark_connecting(&self, previous: &Session) {
        self.session.send_replace(Session {
            connection_state: ConnectionState::Connecting,
            ..previous.clone()
        });
        log::info!("Session: {:?} -> Connecting", previous.connection_state);
    }

    /// First already-authorized account, or ask the user for one
    async fn select_account(&self, provider: &dyn WalletProvider) -> Result<String, SyncError> {
        let accounts = provider
            .accounts()
            .await
            .map_err(SyncError::from_connect_error)?;
        if let Some(account) = accounts.into_iter().next() {
            return Ok(account);
        }

        log::info!("No authorized accounts, requesting authorization");
        provider
            .request_accounts()
            .await
            .map_err(SyncError::from_connect_error)?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Unknown("no account selected".to_string()))
    }

    async fn commit(&self, active: ActiveSession, epoch: u64) -> Result<Session, SyncError> {
        let address = active.address;
        let session = Session::connected(address, active.chain_id);

        {
            // Teardown bumps the epoch before taking this lock
            let mut slot = self.active.write().await;
            if epoch != self.epoch.load(Ordering::SeqCst) {
                return Err(superseded());
            }
            *slot = Some(active);
            self.sync.track(address);
            self.session.send_replace(session.clone());
        }
        log::info!("Session: Connected as {} on chain {}", address, self.required_chain_id);

        if epoch != self.epoch.load(Ordering::SeqCst) {
            return Err(superseded());
        }
        if let Err(e) = self.store.save(&address.to_string()) {
            log::warn!("Could not remember account {}: {}", address, e);
        }

        self.sync.refresh(address).await;
        Ok(session)
    }

    /// Notify the provider (best effort), then drop all session state
    pub async fn disconnect(&self) {
        if let Some(provider) = self.provider.as_ref() {
            if let Err(e) = provider.disconnect().await {
                log::warn!("Wallet did not accept disconnect request: {}", e);
            }
        }
        self.teardown().await;
    }

    async fn teardown(&self) {
        self.reset_local().await;
        if let Err(e) = self.store.clear() {
            log::warn!("Could not forget remembered account: {}", e);
        }
    }

    /// Clear session, snapshot and history without touching the provider or store
    async fn reset_local(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.active.write().await = None;
        self.sync.clear();
        self.donations.clear_history();
        self.session.send_replace(Session::default());
        log::info!("Session: Disconnected");
    }

    /// Apply one provider notification
    ///
    /// Safe to deliver repeatedly: a repeated account list or disconnect
    /// leaves the state as the first delivery did.
    pub async fn handle_event(&self, event: ProviderEvent) -> Result<(), SyncError> {
        log::debug!("Provider event: {:?}", event);
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let Some(first) = accounts.into_iter().next() else {
                    log::info!("All accounts revoked by wallet");
                    self.teardown().await;
                    return Ok(());
                };
                let current = self.session().connected_address();
                if current.is_some() && Address::from_str(first.trim()).ok() == current {
                    return Ok(());
                }
                self.connect_with(Some(first), ConnectTrigger::Event)
                    .await
                    .map(|_| ())
            }
            ProviderEvent::ChainChanged(chain_id) => {
                if self.session().is_connected() && chain_id != self.required_chain_id {
                    log::warn!(
                        "Wallet switched to chain {}, required {}; dropping session",
                        chain_id,
                        self.required_chain_id
                    );
                    self.reset_local().await;
                }
                Ok(())
            }
            ProviderEvent::Disconnected => {
                log::info!("Wallet reported disconnect");
                self.teardown().await;
                Ok(())
            }
        }
    }

    /// Consume provider notifications until the channel closes
    pub fn listen(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<ProviderEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = self.handle_event(event).await {
                    log::warn!("Provider event handling failed: {}", e);
                }
            }
            log::debug!("Provider event channel closed");
        })
    }
}

fn superseded() -> SyncError {
    SyncError::Unknown("connection attempt superseded by disconnect".to_string())
}
