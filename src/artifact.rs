//! Compiled-unit registry and bytecode linking
//!
//! Reads Truffle artifacts (`contractName`, `abi`, `bytecode` as a hex string
//! with `__Name____` placeholders) and Foundry artifacts (`bytecode.object`
//! plus `bytecode.linkReferences` byte offsets).

use crate::error::{ArtifactError, LinkError};
use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of a library placeholder in hex characters (one address)
const PLACEHOLDER_LEN: usize = 40;

/// Offsets at which one library's address must be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub library: String,
    /// Byte offsets into the creation code
    pub offsets: Vec<usize>,
}

/// Creation bytecode with unresolved library placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeTemplate {
    /// Hex without `0x`, placeholders included. Case is kept as emitted:
    /// legacy placeholders carry the library name verbatim.
    hex: String,
    link_references: Vec<LinkReference>,
}

impl BytecodeTemplate {
    pub fn new(hex: &str, link_references: Vec<LinkReference>) -> Self {
        Self {
            hex: hex.trim_start_matches("0x").to_string(),
            link_references,
        }
    }

    /// Bind `address` into every placeholder for `library`
    ///
    /// `source_name` is the library's source unit, used to recognise hashed
    /// placeholders. Returns how many placeholders were replaced; zero is not
    /// an error, the library may simply be unused by this unit.
    pub fn link(
        &mut self,
        unit: &str,
        library: &str,
        source_name: Option<&str>,
        address: Address,
    ) -> Result<usize, LinkError> {
        let addr_hex = hex::encode(address);
        let mut replaced = 0;

        if let Some(reference) = self.link_references.iter().find(|r| r.library == library) {
            for &offset in &reference.offsets {
                let range = offset
                    .checked_mul(2)
                    .and_then(|start| Some(start..start.checked_add(PLACEHOLDER_LEN)?))
                    .filter(|range| self.hex.get(range.clone()).is_some())
                    .ok_or_else(|| LinkError::OffsetOutOfRange {
                        unit: unit.to_string(),
                        library: library.to_string(),
                    })?;
                self.hex.replace_range(range, &addr_hex);
                replaced += 1;
            }
        }

        let mut placeholders = vec![legacy_placeholder(library)];
        if let Some(source) = source_name {
            placeholders.push(hashed_placeholder(&format!("{}:{}", source, library)));
        }
        for placeholder in placeholders {
            let count = self.hex.matches(&placeholder).count();
            if count > 0 {
                self.hex = self.hex.replace(&placeholder, &addr_hex);
                replaced += count;
            }
        }

        debug!(unit, library, %address, replaced, "Linked library");
        Ok(replaced)
    }

    /// Decode to bytes, failing if any placeholder is still unbound
    pub fn to_bytes(&self, unit: &str) -> Result<Bytes, LinkError> {
        if let Some(pos) = self.hex.find("__") {
            return Err(LinkError::UnlinkedPlaceholder {
                unit: unit.to_string(),
                placeholder: self.hex[pos..].chars().take(PLACEHOLDER_LEN).collect(),
            });
        }
        hex::decode(&self.hex)
            .map(Bytes::from)
            .map_err(|e| LinkError::InvalidBytecode {
                unit: unit.to_string(),
                cause: e.to_string(),
            })
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }
}

/// Placeholder emitted by old solc versions and by Truffle: `__Name___...`
pub fn legacy_placeholder(library: &str) -> String {
    let name: String = library.chars().take(PLACEHOLDER_LEN - 4).collect();
    format!("__{:_<width$}", name, width = PLACEHOLDER_LEN - 2)
}

/// Placeholder emitted by solc >= 0.5: `__$<34 hex of keccak(fqn)>$__`
pub fn hashed_placeholder(fully_qualified_name: &str) -> String {
    let hash = hex::encode(keccak256(fully_qualified_name.as_bytes()));
    format!("__${}$__", &hash[..34])
}

/// A compiled unit as loaded from the registry
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    /// Source unit name (e.g. `contracts/core/IBCHost.sol`), when known
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    pub bytecode: BytecodeTemplate,
}

impl Artifact {
    /// Parse a Truffle or Foundry artifact JSON document
    pub fn from_json(name: &str, json: &Value) -> Result<Self, ArtifactError> {
        let malformed = |cause: String| ArtifactError::Malformed {
            name: name.to_string(),
            cause,
        };

        let contract_name = json
            .get("contractName")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();

        let abi: JsonAbi = match json.get("abi") {
            Some(abi) => serde_json::from_value(abi.clone())
                .map_err(|e| malformed(format!("invalid abi: {}", e)))?,
            None => JsonAbi::new(),
        };

        let source_name = json
            .get("sourceName")
            .and_then(Value::as_str)
            .or_else(|| json.pointer("/ast/absolutePath").and_then(Value::as_str))
            .map(str::to_string);

        let bytecode = match json.get("bytecode") {
            Some(Value::String(hex)) => BytecodeTemplate::new(hex, Vec::new()),
            Some(obj @ Value::Object(_)) => {
                let hex = obj
                    .get("object")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("bytecode.object missing".into()))?;
                let refs = obj
                    .get("linkReferences")
                    .map(parse_link_references)
                    .transpose()
                    .map_err(malformed)?
                    .unwrap_or_default();
                BytecodeTemplate::new(hex, refs)
            }
            _ => return Err(malformed("bytecode missing".into())),
        };

        if bytecode.as_hex().is_empty() {
            return Err(malformed(
                "empty bytecode (abstract contract or interface?)".into(),
            ));
        }
        if let Some(c) = bytecode
            .as_hex()
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
        {
            return Err(malformed(format!("unexpected character {:?} in bytecode", c)));
        }

        Ok(Self {
            contract_name,
            source_name,
            abi,
            bytecode,
        })
    }
}

/// `{ "path/File.sol": { "Lib": [ {"start": n, "length": 20} ] } }`
fn parse_link_references(value: &Value) -> Result<Vec<LinkReference>, String> {
    let files = value
        .as_object()
        .ok_or_else(|| "linkReferences is not an object".to_string())?;

    let mut refs = Vec::new();
    for libraries in files.values() {
        let libraries = libraries
            .as_object()
            .ok_or_else(|| "linkReferences entry is not an object".to_string())?;
        for (library, positions) in libraries {
            let offsets = positions
                .as_array()
                .ok_or_else(|| format!("positions for {} are not a list", library))?
                .iter()
                .map(|p| {
                    p.get("start")
                        .and_then(Value::as_u64)
                        .map(|s| s as usize)
                        .ok_or_else(|| format!("bad link position for {}", library))
                })
                .collect::<Result<Vec<_>, _>>()?;
            refs.push(LinkReference {
                library: library.clone(),
                offsets,
            });
        }
    }
    Ok(refs)
}

/// Read-only lookup of compiled units by name
pub trait ArtifactRegistry {
    fn artifact(&self, name: &str) -> Result<Artifact, ArtifactError>;
}

/// Registry backed by a build directory
///
/// Looks for `<dir>/<Name>.json` (Truffle) then `<dir>/<Name>.sol/<Name>.json`
/// (Foundry).
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    dir: PathBuf,
}

impl DirectoryRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, name: &str) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.json", name)),
            self.dir
                .join(format!("{}.sol", name))
                .join(format!("{}.json", name)),
        ]
    }

    fn read(path: &Path, name: &str) -> Result<Artifact, ArtifactError> {
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json: Value =
            serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
                name: name.to_string(),
                cause: e.to_string(),
            })?;
        Artifact::from_json(name, &json)
    }
}

impl ArtifactRegistry for DirectoryRegistry {
    fn artifact(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let path = self
            .candidates(name)
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| ArtifactError::NotFound {
                name: name.to_string(),
                dir: self.dir.clone(),
            })?;
        debug!(name, path = %path.display(), "Loading artifact");
        Self::read(&path, name)
    }
}

/// Registry holding artifacts in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    artifacts: HashMap<String, Artifact>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) {
        self.artifacts.insert(name.into(), artifact);
    }
}

impl ArtifactRegistry for InMemoryRegistry {
    fn artifact(&self, name: &str) -> Result<Artifact, ArtifactError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                name: name.to_string(),
                dir: PathBuf::from("<memory>"),
            })
    }
}
