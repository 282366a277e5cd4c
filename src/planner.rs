//! Deployment planner
//!
//! [`DeploymentPlan::build`] validates the manifest, sorts it and loads every
//! artifact before anything touches the network: a broken graph or a missing
//! artifact aborts with nothing deployed. [`DeploymentPlan::execute`] then
//! walks the order one unit at a time, linking libraries and resolving
//! constructor arguments from the session, and stops at the first failure.

use crate::abi::{encode_constructor, resolve_args};
use crate::artifact::{Artifact, ArtifactRegistry};
use crate::error::{DeployResult, DeploymentError};
use crate::graph::DependencyGraph;
use crate::manifest::{Manifest, UnitSpec};
use crate::session::{DeployedHandle, DeploymentSession};
use crate::submitter::NetworkSubmitter;
use alloy::primitives::Bytes;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// A unit paired with its compiled artifact
#[derive(Debug, Clone)]
pub struct DeployableUnit {
    pub spec: UnitSpec,
    pub artifact: Artifact,
}

/// Validated, ordered deployment plan
#[derive(Debug)]
pub struct DeploymentPlan {
    units: Vec<DeployableUnit>,
    /// Unit name -> position in `units`
    positions: HashMap<String, usize>,
}

impl DeploymentPlan {
    /// Validate the graph, compute the order and load all artifacts
    pub fn build(manifest: &Manifest, registry: &dyn ArtifactRegistry) -> DeployResult<Self> {
        let graph = DependencyGraph::new(manifest)?;
        let order = graph.topological_order()?;

        let mut units = Vec::with_capacity(order.len());
        let mut positions = HashMap::with_capacity(order.len());
        for spec in order {
            let artifact = registry.artifact(spec.artifact_name())?;
            positions.insert(spec.name.clone(), units.len());
            units.push(DeployableUnit {
                spec: spec.clone(),
                artifact,
            });
        }

        info!(units = units.len(), "Deployment plan built");
        Ok(Self { units, positions })
    }

    /// Units in deployment order
    pub fn units(&self) -> &[DeployableUnit] {
        &self.units
    }

    /// Unit names in deployment order
    pub fn order(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.spec.name.as_str()).collect()
    }

    /// Deploy every unit not already present in `session`
    ///
    /// Returns the handles created by this call, in deployment order. On
    /// failure the handles created so far stay in the session; nothing is
    /// rolled back.
    pub async fn execute<S: NetworkSubmitter + ?Sized>(
        &self,
        session: &mut DeploymentSession,
        submitter: &S,
    ) -> DeployResult<Vec<DeployedHandle>> {
        let mut deployed = Vec::new();

        for unit in &self.units {
            let name = unit.spec.name.as_str();
            if let Some(existing) = session.get(name) {
                debug!(unit = name, address = %existing.address, "Already deployed, skipping");
                continue;
            }

            let code = self.creation_code(unit, session, submitter)?;
            let handle = self.deploy_unit(name, code, submitter).await?;
            deployed.push(session.record(handle)?.clone());
        }

        info!(
            deployed = deployed.len(),
            total = self.units.len(),
            "Deployment plan complete"
        );
        Ok(deployed)
    }

    /// Linked bytecode followed by the encoded constructor arguments
    fn creation_code<S: NetworkSubmitter + ?Sized>(
        &self,
        unit: &DeployableUnit,
        session: &DeploymentSession,
        submitter: &S,
    ) -> DeployResult<Bytes> {
        let name = unit.spec.name.as_str();

        let mut template = unit.artifact.bytecode.clone();
        for library in &unit.spec.links {
            let address = session.resolve(name, library)?;
            let source_name = self
                .positions
                .get(library)
                .and_then(|&i| self.units[i].artifact.source_name.as_deref());
            template.link(name, library, source_name, address)?;
        }
        let mut code = template.to_bytes(name)?.to_vec();

        let args = resolve_args(&unit.spec.args, submitter.sender(), |dep| {
            session.resolve(name, dep)
        })?;
        let encoded = encode_constructor(unit.artifact.abi.constructor(), &args).map_err(|e| {
            DeploymentError::Encoding {
                unit: name.to_string(),
                cause: format!("{:#}", e),
            }
        })?;
        code.extend_from_slice(&encoded);

        Ok(code.into())
    }

    async fn deploy_unit<S: NetworkSubmitter + ?Sized>(
        &self,
        name: &str,
        code: Bytes,
        submitter: &S,
    ) -> Result<DeployedHandle, DeploymentError> {
        info!(unit = name, size = code.len(), "Deploying");

        let receipt = submitter.deploy(code).await.map_err(|e| {
            error!(unit = name, error = %e, "Deployment submission failed");
            DeploymentError::Submission {
                unit: name.to_string(),
                cause: format!("{:#}", e),
            }
        })?;

        if !receipt.success {
            error!(unit = name, tx_hash = %receipt.tx_hash, "Deployment reverted");
            return Err(DeploymentError::Reverted {
                unit: name.to_string(),
                tx_hash: receipt.tx_hash,
            });
        }

        let address = receipt
            .contract_address
            .ok_or_else(|| DeploymentError::MissingAddress {
                unit: name.to_string(),
                tx_hash: receipt.tx_hash,
            })?;

        info!(unit = name, address = %address, tx_hash = %receipt.tx_hash, "Deployed");
        Ok(DeployedHandle {
            name: name.to_string(),
            address,
            tx_hash: Some(receipt.tx_hash),
        })
    }
}

