//! Shared fixtures: a scripted in-memory submitter and artifact builders

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use deployer::artifact::legacy_placeholder;
use deployer::{Artifact, InMemoryRegistry, NetworkSubmitter, Receipt};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const DEPLOYER: Address = Address::repeat_byte(0xde);

/// Creation code prefix every test artifact starts with
pub const CODE_PREFIX: &str = "6080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Deploy(Bytes),
    Call { to: Address, data: Bytes },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fail,
    Revert,
}

/// Records every submission and answers with deterministic receipts
///
/// The n-th deployment (1-based) lands at `Address::with_last_byte(0x10 + n)`.
#[derive(Default)]
pub struct MockSubmitter {
    submissions: Mutex<Vec<Submission>>,
    deploy_script: Vec<(usize, Outcome)>,
    call_script: Vec<(usize, Outcome)>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th deployment (1-based) fail or revert
    pub fn on_deploy(mut self, n: usize, outcome: Outcome) -> Self {
        self.deploy_script.push((n, outcome));
        self
    }

    /// Make the n-th call (1-based) fail or revert
    pub fn on_call(mut self, n: usize, outcome: Outcome) -> Self {
        self.call_script.push((n, outcome));
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn deploys(&self) -> Vec<Bytes> {
        self.submissions()
            .into_iter()
            .filter_map(|s| match s {
                Submission::Deploy(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.submissions()
            .into_iter()
            .filter_map(|s| match s {
                Submission::Call { to, data } => Some((to, data)),
                _ => None,
            })
            .collect()
    }

    pub fn deployed_address(n: usize) -> Address {
        Address::with_last_byte(0x10 + n as u8)
    }

    fn count(&self, deploy: bool) -> usize {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches!(s, Submission::Deploy(_)) == deploy)
            .count()
    }

    fn scripted(script: &[(usize, Outcome)], n: usize) -> Option<Outcome> {
        script.iter().find(|(at, _)| *at == n).map(|(_, o)| *o)
    }
}

#[async_trait]
impl NetworkSubmitter for MockSubmitter {
    fn sender(&self) -> Address {
        DEPLOYER
    }

    async fn deploy(&self, code: Bytes) -> eyre::Result<Receipt> {
        let n = self.count(true) + 1;
        self.submissions.lock().unwrap().push(Submission::Deploy(code));
        let tx_hash = B256::with_last_byte(n as u8);

        match Self::scripted(&self.deploy_script, n) {
            Some(Outcome::Fail) => Err(eyre::eyre!("connection refused")),
            Some(Outcome::Revert) => Ok(Receipt {
                tx_hash,
                success: false,
                contract_address: None,
            }),
            None => Ok(Receipt {
                tx_hash,
                success: true,
                contract_address: Some(Self::deployed_address(n)),
            }),
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Receipt> {
        let n = self.count(false) + 1;
        self.submissions
            .lock()
            .unwrap()
            .push(Submission::Call { to, data });
        let tx_hash = B256::with_last_byte(0x80 + n as u8);

        match Self::scripted(&self.call_script, n) {
            Some(Outcome::Fail) => Err(eyre::eyre!("nonce too low")),
            Some(Outcome::Revert) => Ok(Receipt {
                tx_hash,
                success: false,
                contract_address: None,
            }),
            None => Ok(Receipt {
                tx_hash,
                success: true,
                contract_address: None,
            }),
        }
    }
}

/// Truffle-style artifact whose bytecode holds one placeholder per library
pub fn artifact(name: &str, links: &[&str], ctor_inputs: &[(&str, &str)]) -> Artifact {
    let mut code = CODE_PREFIX.to_string();
    for library in links {
        code.push_str(&legacy_placeholder(library));
        code.push_str("00");
    }

    let mut abi: Vec<Value> = Vec::new();
    if !ctor_inputs.is_empty() {
        let inputs: Vec<Value> = ctor_inputs
            .iter()
            .map(|(name, ty)| json!({ "name": name, "type": ty, "internalType": ty }))
            .collect();
        abi.push(json!({
            "type": "constructor",
            "inputs": inputs,
            "stateMutability": "nonpayable"
        }));
    }

    let json = json!({
        "contractName": name,
        "abi": abi,
        "bytecode": format!("0x{}", code),
    });
    Artifact::from_json(name, &json).unwrap()
}

/// Registry holding the given artifacts
pub fn registry_with(entries: Vec<(&str, Artifact)>) -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    for (name, artifact) in entries {
        registry.insert(name, artifact);
    }
    registry
}

/// Whether `code` contains `address` somewhere
pub fn contains_address(code: &[u8], address: Address) -> bool {
    code.windows(20).any(|w| w == address.as_slice())
}
