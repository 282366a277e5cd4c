//! Demo preparation sequence
//!
//! After deployment the bank is funded for a cross-chain transfer demo:
//! the token approves the bank, then the bank takes one deposit credited to
//! the deployer and one per extra recipient.

use crate::abi::ArgValue;
use crate::runner::TransactionStep;
use alloy::primitives::{address, Address, U256};

/// Unit names the demo sequence targets
pub const BANK_UNIT: &str = "ICS20Bank";
pub const TOKEN_UNIT: &str = "SimpleToken";

/// Recipient credited by the stock demo in addition to the deployer
pub const DEFAULT_DEMO_RECIPIENT: Address = address!("A5241513DA9F4463F1d4874b548dFBAC29D91f34");

/// Constructor parameters of the demo token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub initial_supply: U256,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: "simple".to_string(),
            symbol: "simple".to_string(),
            initial_supply: U256::from(1_000_000u64),
        }
    }
}

/// Amounts and recipients of the demo sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub token: TokenParams,
    pub approve_amount: U256,
    pub deposit_amount: U256,
    /// Credited after the deployer, in this order
    pub recipients: Vec<Address>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            token: TokenParams::default(),
            approve_amount: U256::from(1_000_000u64),
            deposit_amount: U256::from(500_000u64),
            recipients: vec![DEFAULT_DEMO_RECIPIENT],
        }
    }
}

/// Build the approve + deposit steps
pub fn demo_steps(config: &DemoConfig) -> Vec<TransactionStep> {
    let deposit = |name: String, receiver: ArgValue| {
        TransactionStep::new(
            name,
            BANK_UNIT,
            "deposit(address,uint256,address)",
            vec![
                ArgValue::unit(TOKEN_UNIT),
                ArgValue::Uint(config.deposit_amount),
                receiver,
            ],
        )
    };

    let mut steps = vec![
        TransactionStep::new(
            "approve bank",
            TOKEN_UNIT,
            "approve(address,uint256)",
            vec![ArgValue::unit(BANK_UNIT), ArgValue::Uint(config.approve_amount)],
        ),
        deposit("deposit to deployer".to_string(), ArgValue::Deployer),
    ];
    for recipient in &config.recipients {
        steps.push(deposit(
            format!("deposit to {}", recipient),
            ArgValue::Address(*recipient),
        ));
    }
    steps
}
