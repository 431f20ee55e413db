//! Donation Sync: wallet session and on-chain donation state
//!
//! This crate keeps a single wallet session in step with a donation contract
//! and its ERC-20 token: it connects the wallet, keeps a snapshot of donation
//! totals and token balance current, and drives the approve-then-donate
//! transaction pair.
//!
//! # Architecture
//!
//! - **SessionManager**: wallet connect/disconnect lifecycle and provider events
//! - **SyncCoordinator**: one consistent [`DonationSnapshot`] per refresh, stale on partial failure
//! - **DonationTxOrchestrator**: approve → donate → record → resync
//! - **BalanceReader**: indexing service first, contract `balanceOf` fallback
//! - **DonationStateReader**: contract totals, sequential retried reads
//! - **RetryExecutor**: fixed-delay bounded retry for idempotent reads
//!
//! # Example
//!
//! ```ignore
//! use donation_sync::{DonationClient, DonationConfig};
//!
//! let client = DonationClient::new(DonationConfig::from_env());
//! client.reconcile_on_startup().await?;
//! client.connect().await?;
//!
//! let record = client.donate("2.5").await?;
//! println!("donated {} in {}", record.amount, record.tx_hash);
//! println!("{:?}", client.snapshot());
//! ```

// Public modules
pub mod amount;
pub mod balance;
pub mod client;
pub mod config;
pub mod contracts;
pub mod donation;
pub mod donation_state;
pub mod error;
pub mod indexer;
pub mod provider;
pub mod retry;
pub mod rpc;
pub mod rpc_wallet;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;

// Re-exports for convenience
pub use amount::TokenAmount;
pub use balance::BalanceReader;
pub use client::DonationClient;
pub use config::{DonationConfig, SEPOLIA_CHAIN_ID};
pub use contracts::{ContractReader, IDonation, RpcContracts, IERC20};
pub use donation::DonationTxOrchestrator;
pub use donation_state::{DonationState, DonationStateReader};
pub use error::{RemoteError, StorageError, SyncError};
pub use indexer::{AlchemyIndexer, TokenBalanceIndexer};
pub use provider::{ProviderEvent, TransactionSigner, TxReceipt, TxRequest, WalletProvider};
pub use retry::{RetryExecutor, RetryPolicy};
pub use rpc_wallet::RpcWallet;
pub use session::{ActiveSession, SessionManager};
pub use state::{ConnectionState, DonationRecord, DonationSnapshot, Session};
pub use storage::{AccountStore, FileAccountStore, MemoryAccountStore};
pub use sync::SyncCoordinator;

// Re-export commonly used EVM types
pub use alloy_primitives::{Address, Bytes, B256, U256};

// Common result type
pub type Result<T> = std::result::Result<T, SyncError>;
