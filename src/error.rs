//! Error taxonomy for the deployer
//!
//! Every kind halts forward progress. Nothing is retried: deployments and
//! transfers are irreversible on-chain, so the caller gets enough context
//! (unit or step name, cause, tx hash) to diagnose and decide by hand.

use alloy::primitives::B256;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by the planner and the runner
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// The dependency graph is unusable. Raised before anything is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("dependency cycle among units: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("unit '{unit}' depends on undefined unit '{dependency}'")]
    UnknownDependency { unit: String, dependency: String },

    #[error("unit '{0}' is declared more than once")]
    DuplicateUnit(String),
}

/// A unit's deployment transaction failed. The rest of the plan is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentError {
    #[error("deployment of '{unit}' could not be submitted: {cause}")]
    Submission { unit: String, cause: String },

    #[error("deployment of '{unit}' reverted (tx {tx_hash})")]
    Reverted { unit: String, tx_hash: B256 },

    #[error("deployment of '{unit}' (tx {tx_hash}) produced no contract address")]
    MissingAddress { unit: String, tx_hash: B256 },

    #[error("constructor arguments for '{unit}' could not be encoded: {cause}")]
    Encoding { unit: String, cause: String },
}

impl DeploymentError {
    /// Name of the unit whose deployment failed
    pub fn unit(&self) -> &str {
        match self {
            Self::Submission { unit, .. }
            | Self::Reverted { unit, .. }
            | Self::MissingAddress { unit, .. }
            | Self::Encoding { unit, .. } => unit,
        }
    }
}

/// An address was needed before it was resolved, or bytecode could not be
/// bound. Indicates an ordering bug or a broken artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("'{unit}' needs the address of '{dependency}', which is not deployed yet")]
    Unresolved { unit: String, dependency: String },

    #[error("bytecode of '{unit}' still contains unlinked placeholder '{placeholder}'")]
    UnlinkedPlaceholder { unit: String, placeholder: String },

    #[error("bytecode of '{unit}' is not valid hex: {cause}")]
    InvalidBytecode { unit: String, cause: String },

    #[error("link reference for '{library}' in '{unit}' is out of range")]
    OffsetOutOfRange { unit: String, library: String },
}

/// A post-deployment step failed. Earlier steps are not undone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("step '{step}' could not be submitted: {cause}")]
    Submission { step: String, cause: String },

    #[error("step '{step}' failed to execute (tx {tx_hash})")]
    Reverted { step: String, tx_hash: B256 },

    #[error("call data for step '{step}' could not be encoded: {cause}")]
    Encoding { step: String, cause: String },
}

impl TransactionError {
    /// Name of the failing step
    pub fn step(&self) -> &str {
        match self {
            Self::Submission { step, .. }
            | Self::Reverted { step, .. }
            | Self::Encoding { step, .. } => step,
        }
    }
}

/// The compiled-unit registry could not produce an artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no artifact for '{name}' under {}", .dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact '{name}': {cause}")]
    Malformed { name: String, cause: String },
}

/// The name -> handle session map rejected an operation
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unit '{0}' already has a handle in this session")]
    AlreadyRecorded(String),

    #[error("session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {} is malformed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session file {} belongs to chain {found}, expected {expected}", .path.display())]
    ChainMismatch {
        path: PathBuf,
        expected: u64,
        found: u64,
    },
}

pub type DeployResult<T> = std::result::Result<T, DeployError>;
