/// Common test utilities for donation sync integration tests
///
/// This module provides scripted in-memory collaborators:
/// - `MockWallet` / `MockSigner`: wallet provider and transaction signer
/// - `MockContracts`: contract reads with per-method failure budgets
/// - `MockIndexer`: indexing service with a fixed answer
/// - `TestEnvironment`: a `DonationClient` wired to all of the above
#[allow(dead_code)]
pub mod mocks {
    use async_trait::async_trait;
    use donation_sync::{
        Address, ContractReader, ProviderEvent, RemoteError, TokenBalanceIndexer,
        TransactionSigner, TxReceipt, TxRequest, WalletProvider, B256, U256,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Simulated latency; zero completes without yielding
    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    // ============================================================================
    // Wallet provider
    // ============================================================================

    pub struct MockWallet {
        pub accounts: Mutex<Vec<String>>,
        pub requested: Mutex<Result<Vec<String>, RemoteError>>,
        pub chain_id: Mutex<u64>,
        /// Delay inside `accounts()`, to hold account selection in flight
        pub accounts_delay: Mutex<Duration>,
        /// Delay inside `chain_id()`, to hold a connect in flight
        pub chain_delay: Mutex<Duration>,
        pub disconnect_result: Mutex<Result<(), RemoteError>>,
        pub signer: Arc<MockSigner>,
        pub events: Mutex<Option<mpsc::UnboundedSender<ProviderEvent>>>,
        pub accounts_calls: AtomicUsize,
        pub request_calls: AtomicUsize,
        pub disconnect_calls: AtomicUsize,
    }

    impl MockWallet {
        pub fn new(accounts: &[&str], chain_id: u64) -> Self {
            Self {
                accounts: Mutex::new(accounts.iter().map(|a| a.to_string()).collect()),
                requested: Mutex::new(Ok(Vec::new())),
                chain_id: Mutex::new(chain_id),
                accounts_delay: Mutex::new(Duration::ZERO),
                chain_delay: Mutex::new(Duration::ZERO),
                disconnect_result: Mutex::new(Ok(())),
                signer: Arc::new(MockSigner::default()),
                events: Mutex::new(None),
                accounts_calls: AtomicUsize::new(0),
                request_calls: AtomicUsize::new(0),
                disconnect_calls: AtomicUsize::new(0),
            }
        }

        pub fn set_accounts(&self, accounts: &[&str]) {
            *self.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
        }

        pub fn set_requested(&self, result: Result<Vec<&str>, RemoteError>) {
            *self.requested.lock().unwrap() =
                result.map(|accounts| accounts.iter().map(|a| a.to_string()).collect());
        }

        /// Push a provider notification to whoever subscribed
        pub fn emit(&self, event: ProviderEvent) {
            if let Some(sender) = self.events.lock().unwrap().as_ref() {
                sender.send(event).expect("event listener dropped");
            }
        }
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        async fn accounts(&self) -> Result<Vec<String>, RemoteError> {
            self.accounts_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.accounts_delay.lock().unwrap();
            pause(delay).await;
            Ok(self.accounts.lock().unwrap().clone())
        }

        async fn request_accounts(&self) -> Result<Vec<String>, RemoteError> {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.requested.lock().unwrap().clone();
            if let Ok(accounts) = &result {
                *self.accounts.lock().unwrap() = accounts.clone();
            }
            result
        }

        async fn chain_id(&self) -> Result<u64, RemoteError> {
            let delay = *self.chain_delay.lock().unwrap();
            pause(delay).await;
            Ok(*self.chain_id.lock().unwrap())
        }

        async fn signer(
            &self,
            _account: Address,
        ) -> Result<Arc<dyn TransactionSigner>, RemoteError> {
            let signer: Arc<dyn TransactionSigner> = self.signer.clone();
            Ok(signer)
        }

        async fn disconnect(&self) -> Result<(), RemoteError> {
            self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
            self.disconnect_result.lock().unwrap().clone()
        }

        fn subscribe(&self, events: mpsc::UnboundedSender<ProviderEvent>) {
            *self.events.lock().unwrap() = Some(events);
        }
    }

    // ============================================================================
    // Transaction signer
    // ============================================================================

    /// Records submitted calls; outcomes are scripted per submission
    #[derive(Default)]
    pub struct MockSigner {
        pub sent: Mutex<Vec<TxRequest>>,
        /// Popped per `send_transaction`; empty means success
        pub send_results: Mutex<VecDeque<Result<(), RemoteError>>>,
        /// Popped per `wait_for_inclusion`; empty means a successful receipt
        pub receipt_success: Mutex<VecDeque<bool>>,
        /// Time each transaction takes to be included
        pub inclusion_delay: Mutex<Duration>,
    }

    impl MockSigner {
        pub fn sent(&self) -> Vec<TxRequest> {
            self.sent.lock().unwrap().clone()
        }

        pub fn script_sends(&self, results: Vec<Result<(), RemoteError>>) {
            *self.send_results.lock().unwrap() = results.into();
        }

        pub fn script_receipts(&self, outcomes: Vec<bool>) {
            *self.receipt_success.lock().unwrap() = outcomes.into();
        }

        pub fn set_inclusion_delay(&self, delay: Duration) {
            *self.inclusion_delay.lock().unwrap() = delay;
        }
    }

    #[async_trait]
    impl TransactionSigner for MockSigner {
        async fn send_transaction(&self, request: TxRequest) -> Result<B256, RemoteError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(request);
            let index = sent.len();
            if let Some(Err(e)) = self.send_results.lock().unwrap().pop_front() {
                return Err(e);
            }
            Ok(B256::with_last_byte(index as u8))
        }

        async fn wait_for_inclusion(&self, tx_hash: B256) -> Result<TxReceipt, RemoteError> {
            let delay = *self.inclusion_delay.lock().unwrap();
            pause(delay).await;
            let success = self
                .receipt_success
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(true);
            Ok(TxReceipt {
                tx_hash,
                block_number: Some(1),
                success,
            })
        }
    }

    // ============================================================================
    // Contracts
    // ============================================================================

    /// One contract method: value source plus failure budget
    #[derive(Default)]
    pub struct MethodScript {
        /// Calls that fail before the method starts succeeding (usize::MAX = always)
        pub failures: AtomicUsize,
        pub calls: AtomicUsize,
    }

    impl MethodScript {
        fn call(&self, name: &str) -> Result<(), RemoteError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let failures = self.failures.load(Ordering::SeqCst);
            if failures == usize::MAX || call < failures {
                return Err(RemoteError::transport(format!("{} unavailable", name)));
            }
            Ok(())
        }

        pub fn fail_always(&self) {
            self.failures.store(usize::MAX, Ordering::SeqCst);
        }

        pub fn recover(&self) {
            self.failures.store(0, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    pub struct MockContracts {
        pub total: Mutex<U256>,
        pub donations: Mutex<HashMap<Address, U256>>,
        pub balances: Mutex<HashMap<Address, U256>>,
        pub total_script: MethodScript,
        pub donation_script: MethodScript,
        pub balance_script: MethodScript,
        /// Order in which read methods were invoked
        pub call_log: Mutex<Vec<&'static str>>,
        /// Latency of every read
        pub read_delay: Mutex<Duration>,
    }

    impl MockContracts {
        pub fn set_total(&self, units: U256) {
            *self.total.lock().unwrap() = units;
        }

        pub fn set_donation(&self, donor: Address, units: U256) {
            self.donations.lock().unwrap().insert(donor, units);
        }

        pub fn set_balance(&self, owner: Address, units: U256) {
            self.balances.lock().unwrap().insert(owner, units);
        }

        pub fn set_read_delay(&self, delay: Duration) {
            *self.read_delay.lock().unwrap() = delay;
        }
    }

    #[async_trait]
    impl ContractReader for MockContracts {
        async fn total_donations(&self) -> Result<U256, RemoteError> {
            self.call_log.lock().unwrap().push("totalDonations");
            let delay = *self.read_delay.lock().unwrap();
            pause(delay).await;
            self.total_script.call("totalDonations")?;
            Ok(*self.total.lock().unwrap())
        }

        async fn donation_of(&self, donor: Address) -> Result<U256, RemoteError> {
            self.call_log.lock().unwrap().push("getDonation");
            let delay = *self.read_delay.lock().unwrap();
            pause(delay).await;
            self.donation_script.call("getDonation")?;
            Ok(self
                .donations
                .lock()
                .unwrap()
                .get(&donor)
                .copied()
                .unwrap_or_default())
        }

        async fn balance_of(&self, owner: Address) -> Result<U256, RemoteError> {
            self.call_log.lock().unwrap().push("balanceOf");
            let delay = *self.read_delay.lock().unwrap();
            pause(delay).await;
            self.balance_script.call("balanceOf")?;
            Ok(self
                .balances
                .lock()
                .unwrap()
                .get(&owner)
                .copied()
                .unwrap_or_default())
        }
    }

    // ============================================================================
    // Indexer
    // ============================================================================

    pub struct MockIndexer {
        pub answer: Mutex<Result<Option<String>, RemoteError>>,
        pub calls: AtomicUsize,
    }

    impl MockIndexer {
        pub fn answering(answer: Result<Option<&str>, RemoteError>) -> Self {
            Self {
                answer: Mutex::new(answer.map(|a| a.map(str::to_string))),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self::answering(Err(RemoteError::new(429, "rate limited")))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenBalanceIndexer for MockIndexer {
        async fn token_balance(
            &self,
            _owner: Address,
            _token: Address,
        ) -> Result<Option<String>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.lock().unwrap().clone()
        }
    }
}

#[allow(dead_code)]
pub mod env {
    use super::mocks::{MockContracts, MockIndexer, MockWallet};
    use donation_sync::{
        Address, DonationClient, DonationConfig, MemoryAccountStore, RetryPolicy, U256,
        WalletProvider,
    };
    use std::sync::Arc;
    use std::time::Duration;

    pub const ALICE: &str = "0x000000000000000000000000000000000000a11c";
    pub const BOB: &str = "0x0000000000000000000000000000000000000b0b";
    pub const REQUIRED_CHAIN: u64 = 11155111;

    /// One whole token in base units
    pub fn tokens(whole: u64) -> U256 {
        U256::from(whole) * U256::from(1_000_000_000_000_000_000u64)
    }

    pub fn addr(raw: &str) -> Address {
        raw.parse().expect("valid test address")
    }

    /// Initialize logging (only once, subsequent calls are no-ops)
    pub fn init_logging() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    /// Sepolia defaults with zero delays
    pub fn test_config() -> DonationConfig {
        DonationConfig {
            retry: RetryPolicy::new(3, Duration::ZERO),
            settle_delay: Duration::ZERO,
            receipt_poll_interval: Duration::ZERO,
            ..DonationConfig::default()
        }
    }

    /// Client wired to scripted collaborators
    pub struct TestEnvironment {
        pub wallet: Arc<MockWallet>,
        pub contracts: Arc<MockContracts>,
        pub indexer: Arc<MockIndexer>,
        pub store: Arc<MemoryAccountStore>,
        pub client: DonationClient,
    }

    impl TestEnvironment {
        /// Wallet with `accounts` authorized on the required chain
        pub fn new(accounts: &[&str]) -> Self {
            Self::build(MockWallet::new(accounts, REQUIRED_CHAIN), MemoryAccountStore::default())
        }

        pub fn build(wallet: MockWallet, store: MemoryAccountStore) -> Self {
            init_logging();

            let wallet = Arc::new(wallet);
            let contracts = Arc::new(MockContracts::default());
            contracts.set_total(tokens(100));
            contracts.set_donation(addr(ALICE), tokens(10));
            contracts.set_balance(addr(ALICE), tokens(50));
            // Indexer is down unless a test says otherwise
            let indexer = Arc::new(MockIndexer::failing());
            let store = Arc::new(store);

            let provider: Arc<dyn WalletProvider> = wallet.clone();
            let client = DonationClient::with_parts(
                test_config(),
                Some(provider),
                contracts.clone(),
                indexer.clone(),
                store.clone(),
            );

            Self {
                wallet,
                contracts,
                indexer,
                store,
                client,
            }
        }

        /// Number of snapshot refreshes so far (each reads the total once)
        pub fn refreshes(&self) -> usize {
            self.contracts.total_script.calls()
        }
    }
}
