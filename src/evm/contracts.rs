//! Read-only bindings for the demo token and the ICS20 bank

use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use eyre::{eyre, Result};
use url::Url;

sol! {
    /// ERC20 token deployed for the demo
    #[derive(Debug)]
    #[sol(rpc)]
    contract SimpleToken {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    /// Multi-denomination bank; balances are keyed by a string id
    #[derive(Debug)]
    #[sol(rpc)]
    contract ICS20Bank {
        function balanceOf(address account, string calldata id) external view returns (uint256);
    }
}

/// Bank id of an ERC20 deposited directly: its lowercase hex address
pub fn bank_denom(token: Address) -> String {
    format!("{:?}", token).to_lowercase()
}

/// Balance queries against a deployed token/bank pair
pub struct BalanceReader {
    rpc_url: Url,
}

impl BalanceReader {
    pub fn new(rpc_url: Url) -> Self {
        Self { rpc_url }
    }

    /// `SimpleToken.balanceOf(account)`
    pub async fn token_balance(&self, token: Address, account: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = SimpleToken::new(token, &provider);
        let balance = contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get token balance: {}", e))?;
        Ok(balance._0)
    }

    /// `SimpleToken.allowance(owner, spender)`
    pub async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = SimpleToken::new(token, &provider);
        let allowance = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get allowance: {}", e))?;
        Ok(allowance._0)
    }

    /// `ICS20Bank.balanceOf(account, id)`
    pub async fn bank_balance(&self, bank: Address, account: Address, id: &str) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = ICS20Bank::new(bank, &provider);
        let balance = contract
            .balanceOf(account, id.to_lowercase())
            .call()
            .await
            .map_err(|e| eyre!("Failed to get bank balance: {}", e))?;
        Ok(balance._0)
    }
}
