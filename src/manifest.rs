//! Deployable unit definitions
//!
//! A [`Manifest`] is the static list of units for a session, in declaration
//! order. Declaration order matters: it breaks ties between units that do not
//! depend on each other, so the same manifest always deploys in the same order.

use crate::abi::ArgValue;
use crate::demo::TokenParams;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static definition of one deployable contract or library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Unit name, unique within the manifest
    pub name: String,
    /// Artifact to load, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Libraries whose addresses must be linked into this unit's bytecode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    /// Constructor arguments, possibly referencing other units
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgValue>,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifact: None,
            links: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn link(mut self, library: impl Into<String>) -> Self {
        self.links.push(library.into());
        self
    }

    pub fn arg(mut self, arg: ArgValue) -> Self {
        self.args.push(arg);
        self
    }

    /// Artifact name to look up in the registry
    pub fn artifact_name(&self) -> &str {
        self.artifact.as_deref().unwrap_or(&self.name)
    }
}

/// How an upstream unit's address reaches the dependent unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Substituted into the dependent's bytecode template
    Link,
    /// Passed as a constructor argument
    ConstructorArg,
}

/// `from` must be deployed before `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Ordered list of units for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub units: Vec<UnitSpec>,
}

impl Manifest {
    pub fn new(units: Vec<UnitSpec>) -> Self {
        Self { units }
    }

    /// Load a manifest from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    pub fn unit(&self, name: &str) -> Option<&UnitSpec> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Every dependency edge, links first, in declaration order
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for unit in &self.units {
            for lib in &unit.links {
                edges.push(DependencyEdge {
                    from: lib.clone(),
                    to: unit.name.clone(),
                    kind: EdgeKind::Link,
                });
            }
            for upstream in unit.args.iter().filter_map(ArgValue::unit_ref) {
                edges.push(DependencyEdge {
                    from: upstream.to_string(),
                    to: unit.name.clone(),
                    kind: EdgeKind::ConstructorArg,
                });
            }
        }
        edges
    }

    /// The IBC core stack, Tendermint light client and ICS20 token bank
    pub fn ibc_stack(token: &TokenParams) -> Self {
        let units = vec![
            UnitSpec::new("IBCIdentifier"),
            UnitSpec::new("IBCMsgs"),
            UnitSpec::new("IBCClient").link("IBCMsgs"),
            UnitSpec::new("IBCConnection")
                .link("IBCMsgs")
                .link("IBCClient"),
            UnitSpec::new("IBCChannel")
                .link("IBCMsgs")
                .link("IBCClient")
                .link("IBCConnection"),
            UnitSpec::new("Identifier"),
            UnitSpec::new("Bytes"),
            UnitSpec::new("TendermintLightClient")
                .link("IBCIdentifier")
                .link("IBCMsgs")
                .link("Identifier")
                .link("Bytes"),
            UnitSpec::new("IBCHost").link("IBCIdentifier"),
            UnitSpec::new("IBCHandler")
                .link("IBCIdentifier")
                .link("IBCMsgs")
                .link("IBCClient")
                .link("IBCConnection")
                .link("IBCChannel")
                .arg(ArgValue::unit("IBCHost")),
            UnitSpec::new("SimpleToken")
                .arg(ArgValue::string(token.name.clone()))
                .arg(ArgValue::string(token.symbol.clone()))
                .arg(ArgValue::Uint(token.initial_supply)),
            UnitSpec::new("ICS20Bank"),
            UnitSpec::new("ICS20TransferBank")
                .arg(ArgValue::unit("IBCHost"))
                .arg(ArgValue::unit("IBCHandler"))
                .arg(ArgValue::unit("ICS20Bank")),
        ];
        Self { units }
    }
}
