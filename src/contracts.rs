//! Donation and token contract surface
//!
//! Reads go through [`ContractReader`]; writes are built here as
//! [`TxRequest`]s and handed to the wallet's signer.

use crate::error::RemoteError;
use crate::provider::TxRequest;
use crate::rpc::JsonRpcClient;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde_json::json;

sol! {
    /// Donation contract: pulls approved tokens from the donor
    interface IDonation {
        /// Sum of every donation ever made
        function totalDonations() external view returns (uint256);

        /// Running total donated by `donor`
        function getDonation(address donor) external view returns (uint256);

        /// Transfer `amount` from the caller (requires allowance)
        function donate(uint256 amount) external;
    }

    /// The subset of ERC20 the donation flow touches
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);

        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Read-only contract calls; amounts are base units
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// `Donation.totalDonations()`
    async fn total_donations(&self) -> Result<U256, RemoteError>;

    /// `Donation.getDonation(donor)`
    async fn donation_of(&self, donor: Address) -> Result<U256, RemoteError>;

    /// `Token.balanceOf(owner)`
    async fn balance_of(&self, owner: Address) -> Result<U256, RemoteError>;
}

/// `Token.approve(spender, amount)`
pub fn approve_call(token: Address, spender: Address, amount: U256) -> TxRequest {
    TxRequest {
        to: token,
        data: IERC20::approveCall { spender, amount }.abi_encode().into(),
    }
}

/// `Donation.donate(amount)`
pub fn donate_call(donation: Address, amount: U256) -> TxRequest {
    TxRequest {
        to: donation,
        data: IDonation::donateCall { amount }.abi_encode().into(),
    }
}

/// Contract reads via `eth_call`
pub struct RpcContracts {
    rpc: JsonRpcClient,
    donation: Address,
    token: Address,
}

impl RpcContracts {
    pub fn new(rpc_url: impl Into<String>, donation: Address, token: Address) -> Self {
        Self {
            rpc: JsonRpcClient::new(rpc_url),
            donation,
            token,
        }
    }

    async fn call<C>(&self, to: Address, call: C) -> Result<C::Return, RemoteError>
    where
        C: SolCall + Send,
    {
        let data = Bytes::from(call.abi_encode());
        let params = json!([{ "to": to, "data": data }, "latest"]);
        let raw: Bytes = self.rpc.request("eth_call", params).await?;
        C::abi_decode_returns(&raw, true).map_err(|e| {
            RemoteError::transport(format!("Undecodable {} result: {}", C::SIGNATURE, e))
        })
    }
}

#[async_trait]
impl ContractReader for RpcContracts {
    async fn total_donations(&self) -> Result<U256, RemoteError> {
        let ret = self
            .call(self.donation, IDonation::totalDonationsCall {})
            .await?;
        Ok(ret._0)
    }

    async fn donation_of(&self, donor: Address) -> Result<U256, RemoteError> {
        let ret = self
            .call(self.donation, IDonation::getDonationCall { donor })
            .await?;
        Ok(ret._0)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, RemoteError> {
        let ret = self
            .call(self.token, IERC20::balanceOfCall { account: owner })
            .await?;
        Ok(ret._0)
    }
}
