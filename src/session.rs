//! Deployment session: the write-once name -> handle map
//!
//! Handles are recorded in deployment order. When a session file is attached
//! the map is flushed to disk after every recorded deployment, so an aborted
//! plan still leaves an accurate record of what is on-chain.

use crate::error::{LinkError, SessionError};
use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Immutable result of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedHandle {
    pub name: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
}

/// On-disk shape of the session output
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    chain_id: u64,
    contracts: Vec<DeployedHandle>,
}

/// Name -> handle map for one deployment session
#[derive(Debug)]
pub struct DeploymentSession {
    chain_id: u64,
    handles: Vec<DeployedHandle>,
    index: HashMap<String, usize>,
    persist_path: Option<PathBuf>,
}

impl DeploymentSession {
    /// Start an empty, in-memory session
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            handles: Vec::new(),
            index: HashMap::new(),
            persist_path: None,
        }
    }

    /// Flush to `path` after every recorded deployment
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Load a previously written session file
    pub fn load(path: &Path, chain_id: u64) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SessionFile =
            serde_json::from_str(&content).map_err(|source| SessionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if file.chain_id != chain_id {
            return Err(SessionError::ChainMismatch {
                path: path.to_path_buf(),
                expected: chain_id,
                found: file.chain_id,
            });
        }

        let mut session = Self::new(chain_id);
        for handle in file.contracts {
            session.insert(handle)?;
        }
        info!(path = %path.display(), contracts = session.len(), "Loaded deployment session");
        Ok(session.persist_to(path))
    }

    /// Load `path` if it exists, otherwise start an empty session bound to it
    pub fn open(path: &Path, chain_id: u64) -> Result<Self, SessionError> {
        if path.exists() {
            Self::load(path, chain_id)
        } else {
            Ok(Self::new(chain_id).persist_to(path))
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DeployedHandle> {
        self.index.get(name).map(|&i| &self.handles[i])
    }

    /// Handles in the order they were deployed
    pub fn handles(&self) -> &[DeployedHandle] {
        &self.handles
    }

    /// Address of `dependency`, needed by `unit`
    pub fn resolve(&self, unit: &str, dependency: &str) -> Result<Address, LinkError> {
        self.get(dependency)
            .map(|h| h.address)
            .ok_or_else(|| LinkError::Unresolved {
                unit: unit.to_string(),
                dependency: dependency.to_string(),
            })
    }

    /// Record a new handle; a unit can only be recorded once
    pub fn record(&mut self, handle: DeployedHandle) -> Result<&DeployedHandle, SessionError> {
        let name = handle.name.clone();
        self.insert(handle)?;
        self.flush()?;
        Ok(&self.handles[self.index[&name]])
    }

    fn insert(&mut self, handle: DeployedHandle) -> Result<(), SessionError> {
        if self.index.contains_key(&handle.name) {
            return Err(SessionError::AlreadyRecorded(handle.name));
        }
        self.index.insert(handle.name.clone(), self.handles.len());
        self.handles.push(handle);
        Ok(())
    }

    fn flush(&self) -> Result<(), SessionError> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        self.save(path)?;
        debug!(path = %path.display(), "Session flushed");
        Ok(())
    }

    /// Write the session as JSON
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let file = SessionFile {
            chain_id: self.chain_id,
            contracts: self.handles.clone(),
        };
        let io_err = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        std::fs::write(path, content).map_err(io_err)
    }

    /// Export addresses as `NAME_ADDRESS=0x...` lines for downstream tooling
    pub fn export_env(&self, path: &Path) -> Result<(), SessionError> {
        info!("Exporting deployed addresses to {}", path.display());

        let mut content = format!("CHAIN_ID={}\n", self.chain_id);
        for handle in &self.handles {
            content.push_str(&format!(
                "{}_ADDRESS={}\n",
                env_key(&handle.name),
                handle.address
            ));
        }

        std::fs::write(path, content).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `ICS20TransferBank` -> `ICS20_TRANSFER_BANK`, `IBCHost` -> `IBC_HOST`
fn env_key(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str, byte: u8) -> DeployedHandle {
        DeployedHandle {
            name: name.to_string(),
            address: Address::with_last_byte(byte),
            tx_hash: None,
        }
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ibc-deployer-{}-{}.json", tag, std::process::id()))
    }

    #[test]
    fn test_handles_are_write_once() {
        let mut session = DeploymentSession::new(214);
        session.record(handle("IBCHost", 1)).unwrap();

        let err = session.record(handle("IBCHost", 2)).unwrap_err();

        assert!(matches!(err, SessionError::AlreadyRecorded(name) if name == "IBCHost"));
        assert_eq!(session.get("IBCHost").unwrap().address, Address::with_last_byte(1));
    }

    #[test]
    fn test_resolve_unknown_is_link_error() {
        let session = DeploymentSession::new(214);
        assert_eq!(
            session.resolve("IBCHandler", "IBCHost"),
            Err(LinkError::Unresolved {
                unit: "IBCHandler".into(),
                dependency: "IBCHost".into()
            })
        );
    }

    #[test]
    fn test_persisted_session_reloads_in_order() {
        let path = temp_path("session");
        let mut session = DeploymentSession::new(214).persist_to(&path);
        session.record(handle("ICS20Bank", 1)).unwrap();
        session.record(handle("SimpleToken", 2)).unwrap();

        let loaded = DeploymentSession::load(&path, 214).unwrap();
        let names: Vec<_> = loaded.handles().iter().map(|h| h.name.as_str()).collect();

        assert_eq!(names, vec!["ICS20Bank", "SimpleToken"]);
        assert!(matches!(
            DeploymentSession::load(&path, 1),
            Err(SessionError::ChainMismatch { found: 214, .. })
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_env() {
        let path = temp_path("env");
        let mut session = DeploymentSession::new(214);
        session.record(handle("ICS20TransferBank", 1)).unwrap();

        session.export_env(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("CHAIN_ID=214\n"));
        assert!(content.contains(&format!(
            "ICS20_TRANSFER_BANK_ADDRESS={}",
            Address::with_last_byte(1)
        )));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("IBCHost"), "IBC_HOST");
        assert_eq!(env_key("IBCMsgs"), "IBC_MSGS");
        assert_eq!(env_key("TendermintLightClient"), "TENDERMINT_LIGHT_CLIENT");
        assert_eq!(env_key("ICS20Bank"), "ICS20_BANK");
        assert_eq!(env_key("Bytes"), "BYTES");
    }
}
