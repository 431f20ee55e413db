/// Donation client configuration from environment variables
///
/// Controls node/indexer endpoints, contract addresses, the required chain
/// and retry/settle timing. Defaults target Sepolia.
use crate::retry::RetryPolicy;
use alloy_primitives::{address, Address};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Sepolia testnet chain id
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Deployed donation contract on Sepolia
pub const DEFAULT_DONATION_ADDRESS: Address = address!("00Ce02F63d01aB52996E17f422698A04ac651abc");

/// Deployed test token contract on Sepolia
pub const DEFAULT_TOKEN_ADDRESS: Address = address!("008f4592f43A280d553A56e8f237B846Aeee4134");

const ALCHEMY_SEPOLIA_URL: &str = "https://eth-sepolia.g.alchemy.com/v2";
const LOCAL_NODE_URL: &str = "http://localhost:8545";

#[derive(Clone, Debug)]
pub struct DonationConfig {
    /// Node used for contract reads
    pub rpc_url: String,
    /// Node whose unlocked accounts act as the wallet
    pub wallet_rpc_url: String,
    /// Indexing service endpoint (token balance lookups)
    pub indexer_url: String,
    pub donation_address: Address,
    pub token_address: Address,
    /// The only chain a session may be established on
    pub required_chain_id: u64,
    pub retry: RetryPolicy,
    /// Wait after a donation before re-reading state
    pub settle_delay: Duration,
    pub receipt_poll_interval: Duration,
    pub receipt_max_polls: u32,
    /// Directory holding the persisted last-connected account
    pub storage_dir: PathBuf,
}

impl DonationConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ALCHEMY_API_KEY`: indexing service key (defaults to the public "demo" key)
    /// - `RPC_URL`: node for contract reads (Alchemy Sepolia when a key is set, else localhost)
    /// - `WALLET_RPC_URL`: node whose unlocked accounts sign (defaults to `RPC_URL`)
    /// - `INDEXER_URL`: overrides the indexing service URL
    /// - `DONATION_ADDRESS`, `TOKEN_ADDRESS`: contract addresses
    /// - `REQUIRED_CHAIN_ID`: accepted chain (default Sepolia, 11155111)
    /// - `RETRY_MAX_ATTEMPTS`, `RETRY_DELAY_MS`: read retry policy
    /// - `SETTLE_DELAY_MS`: pause before the post-donation refresh
    /// - `RECEIPT_POLL_INTERVAL_MS`, `RECEIPT_MAX_POLLS`: inclusion polling
    /// - `STORAGE_DIR`: where the last account is remembered
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Sepolia through Alchemy
    /// ALCHEMY_API_KEY=... cargo run -- status
    ///
    /// # Local hardhat node
    /// RPC_URL=http://localhost:8545 REQUIRED_CHAIN_ID=31337 cargo run -- connect
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("ALCHEMY_API_KEY").ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!("ALCHEMY_API_KEY not set, indexing service will use the public demo key");
        }

        let indexer_url = env::var("INDEXER_URL").unwrap_or_else(|_| {
            format!(
                "{}/{}",
                ALCHEMY_SEPOLIA_URL,
                api_key.as_deref().unwrap_or("demo")
            )
        });
        log::info!("Indexer URL: {}", redact_key(&indexer_url));

        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| match api_key {
            Some(ref key) => format!("{}/{}", ALCHEMY_SEPOLIA_URL, key),
            None => LOCAL_NODE_URL.to_string(),
        });
        log::info!("RPC URL: {}", redact_key(&rpc_url));

        let wallet_rpc_url = env::var("WALLET_RPC_URL").unwrap_or_else(|_| rpc_url.clone());

        let donation_address = parse_var("DONATION_ADDRESS", defaults.donation_address);
        let token_address = parse_var("TOKEN_ADDRESS", defaults.token_address);
        let required_chain_id = parse_var("REQUIRED_CHAIN_ID", defaults.required_chain_id);
        log::info!(
            "Donation contract {}, token {}, chain {}",
            donation_address,
            token_address,
            required_chain_id
        );

        let retry = RetryPolicy::new(
            parse_var("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts()),
            millis_var("RETRY_DELAY_MS", defaults.retry.delay()),
        );

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        Self {
            rpc_url,
            wallet_rpc_url,
            indexer_url,
            donation_address,
            token_address,
            required_chain_id,
            retry,
            settle_delay: millis_var("SETTLE_DELAY_MS", defaults.settle_delay),
            receipt_poll_interval: millis_var(
                "RECEIPT_POLL_INTERVAL_MS",
                defaults.receipt_poll_interval,
            ),
            receipt_max_polls: parse_var("RECEIPT_MAX_POLLS", defaults.receipt_max_polls),
            storage_dir,
        }
    }
}

impl Default for DonationConfig {
    /// Default configuration (Sepolia, local node, demo indexer key)
    fn default() -> Self {
        Self {
            rpc_url: LOCAL_NODE_URL.to_string(),
            wallet_rpc_url: LOCAL_NODE_URL.to_string(),
            indexer_url: format!("{}/demo", ALCHEMY_SEPOLIA_URL),
            donation_address: DEFAULT_DONATION_ADDRESS,
            token_address: DEFAULT_TOKEN_ADDRESS,
            required_chain_id: SEPOLIA_CHAIN_ID,
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(2),
            receipt_poll_interval: Duration::from_secs(2),
            receipt_max_polls: 60,
            storage_dir: PathBuf::from("./.donation-sync"),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("⚠️  Invalid {} '{}', using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn millis_var(name: &str, default: Duration) -> Duration {
    Duration::from_millis(parse_var(name, default.as_millis() as u64))
}

/// Hide the API key segment of an Alchemy-style URL
fn redact_key(url: &str) -> String {
    match url.rsplit_once("/v2/") {
        Some((base, key)) if !key.is_empty() => format!("{}/v2/***", base),
        _ => url.to_string(),
    }
}
