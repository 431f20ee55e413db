//! Error types for donation session and sync operations
//!
//! Three layers:
//! - [`RemoteError`]: what any remote collaborator (node, indexer, wallet) fails with
//! - [`SyncError`]: the user-facing taxonomy surfaced by connect/donate/refresh
//! - [`StorageError`]: persisted account file failures

use thiserror::Error;

/// Provider code for an explicit user decline (EIP-1193)
pub const USER_REJECTED_CODE: i64 = 4001;

/// Provider code for "a request of this type is already pending"
pub const REQUEST_PENDING_CODE: i64 = -32002;

/// Failure reported by a remote service
///
/// Carries the provider/JSON-RPC error code when one was returned, so the
/// session and transaction layers can classify the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    /// JSON-RPC or EIP-1193 error code (None for transport failures)
    pub code: Option<i64>,
    /// Human-readable message from the remote side
    pub message: String,
}

impl RemoteError {
    /// Error with a provider/JSON-RPC code
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Transport or decoding failure without a remote code
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }

    pub fn is_request_pending(&self) -> bool {
        self.code == Some(REQUEST_PENDING_CODE)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::transport(format!("Malformed response: {}", err))
    }
}

/// Session, donation and refresh failures
///
/// Every variant leaves the system in a retriable state: Disconnected,
/// Connected with a stale snapshot, or Connected with unchanged history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("No wallet provider available")]
    ProviderMissing,

    #[error("A wallet connection is already in progress")]
    Busy,

    #[error("Request rejected by user")]
    UserRejected,

    #[error("Wallet already has a pending request")]
    RequestPending,

    #[error("Wrong network: expected chain {expected}, got {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Data refresh failed: {0}")]
    DataRefreshFailed(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("{0}")]
    Unknown(String),
}

impl SyncError {
    /// Classify a wallet-provider failure raised while connecting
    pub fn from_connect_error(err: RemoteError) -> Self {
        if err.is_user_rejected() {
            Self::UserRejected
        } else if err.is_request_pending() {
            Self::RequestPending
        } else {
            Self::Unknown(err.message)
        }
    }

    /// Classify a failure raised while submitting or awaiting a transaction
    pub fn from_tx_error(err: RemoteError) -> Self {
        if err.is_user_rejected() {
            Self::UserRejected
        } else {
            Self::TransactionFailed(err.message)
        }
    }

    /// Message shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderMissing => {
                "No wallet found. Please install a browser wallet such as MetaMask.".to_string()
            }
            Self::Busy => "A wallet connection request is being processed. Please wait.".to_string(),
            Self::UserRejected => "The request was cancelled in the wallet.".to_string(),
            Self::RequestPending => {
                "A wallet request is already open. Please complete it in your wallet.".to_string()
            }
            Self::WrongNetwork { expected, .. } => {
                format!("Please switch your wallet to chain {}.", expected)
            }
            Self::TransactionFailed(msg) => format!("Donation transaction failed: {}", msg),
            Self::DataRefreshFailed(_) => {
                "Could not refresh donation data. Values shown may be out of date.".to_string()
            }
            Self::InvalidAmount(_) => "Enter a donation amount greater than 0.".to_string(),
            Self::NotConnected => "Connect a wallet before donating.".to_string(),
            Self::Unknown(msg) => format!("Wallet connection failed: {}", msg),
        }
    }
}

/// Persisted account file errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
