//! Session, snapshot and donation history models

use crate::amount::TokenAmount;
use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Which account is authorized, and on which chain
///
/// `Connected` implies `address` is set and `chain_id` is the required chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub connection_state: ConnectionState,
}

impl Session {
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
            connection_state: ConnectionState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    /// Address of the connected account, if any
    pub fn connected_address(&self) -> Option<Address> {
        if self.is_connected() {
            self.address
        } else {
            None
        }
    }
}

/// Point-in-time donation totals and token balance for one account
///
/// Replaced wholesale on every refresh. `stale` marks a refresh that partially
/// failed; the affected fields then hold last-known values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSnapshot {
    pub account: Address,
    pub total_donations: TokenAmount,
    pub user_donation: TokenAmount,
    pub token_balance: TokenAmount,
    pub as_of: DateTime<Utc>,
    pub stale: bool,
}

/// A completed donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    /// Hash of the donate transaction
    pub tx_hash: B256,
    /// Donated amount in canonical form: "2.50" is recorded as "2.5"
    pub amount: TokenAmount,
    /// Local time the donation completed, display formatted
    pub timestamp: String,
}
