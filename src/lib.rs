//! IBC Bank Deployer
//!
//! Deploys the IBC core contracts, the Tendermint light client and the ICS20
//! token bank onto an EVM chain, then funds the bank for a transfer demo.
//!
//! - **Planner** - orders units by their link and constructor-argument
//!   dependencies, links library addresses into bytecode and deploys each
//!   unit once per session
//! - **Runner** - submits a fixed list of calls one at a time and stops at
//!   the first failed receipt
//!
//! Both talk to the chain only through [`NetworkSubmitter`]; the alloy-backed
//! implementation lives in [`evm`].

pub mod abi;
pub mod artifact;
pub mod config;
pub mod demo;
pub mod error;
pub mod evm;
pub mod graph;
pub mod manifest;
pub mod planner;
pub mod redact;
pub mod runner;
pub mod session;
pub mod submitter;

pub use abi::ArgValue;
pub use artifact::{Artifact, ArtifactRegistry, DirectoryRegistry, InMemoryRegistry};
pub use config::DeployerConfig;
pub use demo::{demo_steps, DemoConfig, TokenParams};
pub use error::{
    DeployError, DeployResult, DeploymentError, GraphError, LinkError, SessionError,
    TransactionError,
};
pub use graph::DependencyGraph;
pub use manifest::{DependencyEdge, EdgeKind, Manifest, UnitSpec};
pub use planner::{DeployableUnit, DeploymentPlan};
pub use runner::{StepReceipt, TransactionRunner, TransactionStep};
pub use session::{DeployedHandle, DeploymentSession};
pub use submitter::{NetworkSubmitter, Receipt};
