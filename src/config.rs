//! Deployer configuration
//!
//! Everything the session needs (endpoint, signing key, gas policy, paths and
//! demo parameters) is collected into one [`DeployerConfig`] value at start-up
//! and passed down explicitly.

use crate::demo::{DemoConfig, TokenParams};
use crate::redact::Redacted;
use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:7445";
pub const DEFAULT_CHAIN_ID: u64 = 214;
pub const DEFAULT_GAS_LIMIT: u64 = 4_500_000;
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";
pub const DEFAULT_SESSION_FILE: &str = "deployments.json";

/// Connection and signing settings
#[derive(Clone)]
pub struct NetworkConfig {
    pub rpc_url: Url,
    pub chain_id: u64,
    /// Hex private key of the signing identity
    pub private_key: Option<String>,
    pub gas_limit: u64,
}

impl NetworkConfig {
    /// Private key, required for anything that submits transactions
    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_deref()
            .ok_or_else(|| eyre!("DEPLOYER_PRIVATE_KEY required"))
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(Redacted))
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

/// Root configuration for a deployment session
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    pub network: NetworkConfig,
    /// Directory holding compiled artifacts
    pub artifacts_dir: PathBuf,
    /// JSON manifest; the built-in IBC stack is used when unset
    pub manifest: Option<PathBuf>,
    /// Session output (name -> address)
    pub session_file: PathBuf,
    /// Optional `.env` export of deployed addresses
    pub env_file: Option<PathBuf>,
    pub demo: DemoConfig,
}

impl DeployerConfig {
    /// Load configuration from the environment (and `.env`, if present)
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_env()
    }

    /// Load configuration from process environment variables only
    pub fn from_env() -> Result<Self> {
        let rpc_url = env::var("DEPLOYER_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

        let network = NetworkConfig {
            rpc_url: Url::parse(&rpc_url).wrap_err("Invalid DEPLOYER_RPC_URL")?,
            chain_id: parse_env("DEPLOYER_CHAIN_ID")?.unwrap_or(DEFAULT_CHAIN_ID),
            private_key: env::var("DEPLOYER_PRIVATE_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gas_limit: parse_env("DEPLOYER_GAS_LIMIT")?.unwrap_or(DEFAULT_GAS_LIMIT),
        };

        let defaults = DemoConfig::default();
        let recipients = match env::var("DEMO_RECIPIENTS") {
            Ok(list) => parse_recipients(&list)?,
            Err(_) => defaults.recipients,
        };

        let demo = DemoConfig {
            token: TokenParams {
                name: env::var("DEMO_TOKEN_NAME").unwrap_or(defaults.token.name),
                symbol: env::var("DEMO_TOKEN_SYMBOL").unwrap_or(defaults.token.symbol),
                initial_supply: parse_env("DEMO_TOKEN_SUPPLY")?
                    .unwrap_or(defaults.token.initial_supply),
            },
            approve_amount: parse_env("DEMO_APPROVE_AMOUNT")?.unwrap_or(defaults.approve_amount),
            deposit_amount: parse_env("DEMO_DEPOSIT_AMOUNT")?.unwrap_or(defaults.deposit_amount),
            recipients,
        };

        Ok(Self {
            network,
            artifacts_dir: env::var("DEPLOYER_ARTIFACTS_DIR")
                .unwrap_or_else(|_| DEFAULT_ARTIFACTS_DIR.to_string())
                .into(),
            manifest: env::var("DEPLOYER_MANIFEST").ok().map(PathBuf::from),
            session_file: env::var("DEPLOYER_SESSION_FILE")
                .unwrap_or_else(|_| DEFAULT_SESSION_FILE.to_string())
                .into(),
            env_file: env::var("DEPLOYER_ENV_FILE").ok().map(PathBuf::from),
            demo,
        })
    }
}

/// Parse an optional variable, failing loudly on a malformed value
fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| eyre!("Invalid {}: {}", key, e)),
        Err(_) => Ok(None),
    }
}

/// Comma-separated addresses; an empty string means no extra recipients
fn parse_recipients(list: &str) -> Result<Vec<Address>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| eyre!("Invalid address in DEMO_RECIPIENTS '{}': {}", s, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DEFAULT_DEMO_RECIPIENT;
    use alloy::primitives::U256;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "DEPLOYER_RPC_URL",
        "DEPLOYER_CHAIN_ID",
        "DEPLOYER_PRIVATE_KEY",
        "DEPLOYER_GAS_LIMIT",
        "DEPLOYER_ARTIFACTS_DIR",
        "DEPLOYER_MANIFEST",
        "DEPLOYER_SESSION_FILE",
        "DEPLOYER_ENV_FILE",
        "DEMO_RECIPIENTS",
        "DEMO_TOKEN_NAME",
        "DEMO_TOKEN_SYMBOL",
        "DEMO_TOKEN_SUPPLY",
        "DEMO_APPROVE_AMOUNT",
        "DEMO_DEPOSIT_AMOUNT",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = DeployerConfig::from_env().unwrap();

        assert_eq!(config.network.rpc_url.as_str(), "http://127.0.0.1:7445/");
        assert_eq!(config.network.chain_id, 214);
        assert_eq!(config.network.gas_limit, 4_500_000);
        assert!(config.network.private_key().is_err());
        assert_eq!(config.session_file, PathBuf::from("deployments.json"));
        assert!(config.manifest.is_none());
        assert_eq!(config.demo.recipients, vec![DEFAULT_DEMO_RECIPIENT]);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("DEPLOYER_CHAIN_ID", "31337");
        env::set_var("DEMO_DEPOSIT_AMOUNT", "42");
        env::set_var("DEMO_RECIPIENTS", "");

        let config = DeployerConfig::from_env().unwrap();

        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.demo.deposit_amount, U256::from(42u64));
        assert!(config.demo.recipients.is_empty());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_number_is_an_error() {
        clear_env();
        env::set_var("DEPLOYER_GAS_LIMIT", "lots");

        assert!(DeployerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_private_key_is_redacted_in_debug() {
        clear_env();
        env::set_var("DEPLOYER_PRIVATE_KEY", "0xdeadbeef");

        let config = DeployerConfig::from_env().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
        clear_env();
    }

    #[test]
    fn test_parse_recipients() {
        let list = format!(" {} ,", DEFAULT_DEMO_RECIPIENT);
        assert_eq!(parse_recipients(&list).unwrap(), vec![DEFAULT_DEMO_RECIPIENT]);
        assert!(parse_recipients("0x1234").is_err());
    }
}
