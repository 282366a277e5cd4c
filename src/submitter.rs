//! Network submitter boundary
//!
//! The planner and the runner talk to the chain only through
//! [`NetworkSubmitter`]. Each call submits one transaction and resolves once
//! its receipt is available, so callers that await one call before issuing
//! the next never have two submissions in flight.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use eyre::Result;

/// Outcome of a settled transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: B256,
    /// Receipt status flag (false means the transaction reverted on-chain)
    pub success: bool,
    /// Address of the created contract, for deployment transactions
    pub contract_address: Option<Address>,
}

#[async_trait]
pub trait NetworkSubmitter: Send + Sync {
    /// Address of the signing identity
    fn sender(&self) -> Address;

    /// Submit a contract-creation transaction and wait for its receipt
    async fn deploy(&self, code: Bytes) -> Result<Receipt>;

    /// Submit a call to `to` with `data` and wait for its receipt
    async fn call(&self, to: Address, data: Bytes) -> Result<Receipt>;
}
