//! Persisted last-connected account
//!
//! Only used to decide whether to attempt an automatic reconnect on startup.
//! Never treated as proof of authorization.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait AccountStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, account: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub last_account: String,
    pub saved_at: DateTime<Utc>,
}

/// JSON file under a base directory
#[derive(Clone)]
pub struct FileAccountStore {
    base_path: PathBuf,
}

impl FileAccountStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn session_file(&self) -> PathBuf {
        self.base_path.join("session.json")
    }
}

impl AccountStore for FileAccountStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let session: PersistedSession = serde_json::from_str(&contents)?;
        Ok(Some(session.last_account))
    }

    fn save(&self, account: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let session = PersistedSession {
            last_account: account.to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&session)?;
        fs::write(self.session_file(), json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.session_file();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process store for tests and hosts without a writable disk
#[derive(Default)]
pub struct MemoryAccountStore {
    account: Mutex<Option<String>>,
}

impl MemoryAccountStore {
    pub fn with_account(account: &str) -> Self {
        Self {
            account: Mutex::new(Some(account.to_string())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.account
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AccountStore for MemoryAccountStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    fn save(&self, account: &str) -> Result<(), StorageError> {
        *self.slot() = Some(account.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}
