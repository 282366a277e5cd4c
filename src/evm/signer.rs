//! EVM transaction submitter
//!
//! Signs with a local private key and submits over HTTP JSON-RPC. Nonce and
//! fees come from alloy's recommended fillers; the gas limit is fixed by
//! configuration. Every submission blocks until its receipt is available.

use crate::config::NetworkConfig;
use crate::submitter::{NetworkSubmitter, Receipt};
use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::{debug, info};
use url::Url;

/// Signs and submits transactions for one session
pub struct EvmSubmitter {
    signer: PrivateKeySigner,
    rpc_url: Url,
    chain_id: u64,
    gas_limit: u64,
}

impl EvmSubmitter {
    /// Build a submitter from the network configuration
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let signer: PrivateKeySigner = config
            .private_key()?
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;

        info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            address = %signer.address(),
            "EVM submitter initialized"
        );

        Ok(Self {
            signer,
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            gas_limit: config.gas_limit,
        })
    }

    /// Build a submitter and check that the node serves the configured chain
    pub async fn connect(config: &NetworkConfig) -> Result<Self> {
        let submitter = Self::new(config)?;
        let remote = ProviderBuilder::new()
            .on_http(submitter.rpc_url.clone())
            .get_chain_id()
            .await
            .wrap_err_with(|| format!("Failed to reach {}", submitter.rpc_url))?;

        if remote != submitter.chain_id {
            return Err(eyre!(
                "Node at {} reports chain id {}, expected {}",
                submitter.rpc_url,
                remote,
                submitter.chain_id
            ));
        }
        Ok(submitter)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send(&self, tx: TransactionRequest) -> Result<Receipt> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.clone());

        let tx = tx
            .with_from(self.signer.address())
            .with_chain_id(self.chain_id)
            .with_gas_limit(self.gas_limit);

        let pending = provider
            .send_transaction(tx)
            .await
            .wrap_err("Failed to send transaction")?;

        let tx_hash = *pending.tx_hash();
        debug!(tx_hash = %tx_hash, "Transaction sent, waiting for receipt");

        let receipt = pending
            .get_receipt()
            .await
            .wrap_err_with(|| format!("Failed to get receipt for {}", tx_hash))?;

        Ok(Receipt {
            tx_hash,
            success: receipt.status(),
            contract_address: receipt.contract_address,
        })
    }
}

#[async_trait]
impl NetworkSubmitter for EvmSubmitter {
    fn sender(&self) -> Address {
        self.signer.address()
    }

    async fn deploy(&self, code: Bytes) -> Result<Receipt> {
        self.send(TransactionRequest::default().with_deploy_code(code))
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Receipt> {
        self.send(TransactionRequest::default().with_to(to).with_input(data))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First Anvil dev account
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn network(private_key: Option<&str>) -> NetworkConfig {
        NetworkConfig {
            rpc_url: Url::parse("http://localhost:8545").unwrap(),
            chain_id: 31337,
            private_key: private_key.map(str::to_string),
            gas_limit: 4_500_000,
        }
    }

    #[test]
    fn test_sender_derived_from_key() {
        let submitter = EvmSubmitter::new(&network(Some(TEST_KEY))).unwrap();
        assert_eq!(
            submitter.sender(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(submitter.chain_id(), 31337);
    }

    #[test]
    fn test_missing_or_bad_key() {
        assert!(EvmSubmitter::new(&network(None)).is_err());
        assert!(EvmSubmitter::new(&network(Some("0x1234"))).is_err());
    }
}
