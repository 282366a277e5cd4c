//! Post-deployment transaction runner
//!
//! Steps run strictly in declaration order. Each one is submitted and its
//! receipt awaited before the next is built; the first submission error or
//! failed receipt ends the run. Nothing is retried.

use crate::abi::{encode_call, parse_function, resolve_args, ArgValue};
use crate::error::{DeployResult, TransactionError};
use crate::session::DeploymentSession;
use crate::submitter::{NetworkSubmitter, Receipt};
use alloy::primitives::Bytes;
use tracing::{error, info, warn};

/// One state-changing call against a deployed unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStep {
    /// Label used in logs and errors
    pub name: String,
    /// Unit the call is sent to
    pub target: String,
    /// Human-readable signature, e.g. `approve(address,uint256)`
    pub signature: String,
    pub args: Vec<ArgValue>,
    /// When false a reverted receipt is logged and the run continues
    pub require_success: bool,
}

impl TransactionStep {
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        signature: impl Into<String>,
        args: Vec<ArgValue>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            signature: signature.into(),
            args,
            require_success: true,
        }
    }
}

/// Receipt of a completed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReceipt {
    pub step: String,
    pub receipt: Receipt,
}

/// Executes a fixed list of steps against a deployed session
pub struct TransactionRunner<'a, S: NetworkSubmitter + ?Sized> {
    session: &'a DeploymentSession,
    submitter: &'a S,
}

impl<'a, S: NetworkSubmitter + ?Sized> TransactionRunner<'a, S> {
    pub fn new(session: &'a DeploymentSession, submitter: &'a S) -> Self {
        Self { session, submitter }
    }

    /// Run every step in order, returning their receipts
    pub async fn run(&self, steps: &[TransactionStep]) -> DeployResult<Vec<StepReceipt>> {
        let mut receipts = Vec::with_capacity(steps.len());

        for (i, step) in steps.iter().enumerate() {
            info!(
                step = %step.name,
                index = i + 1,
                total = steps.len(),
                target = %step.target,
                call = %step.signature,
                "Submitting step"
            );
            let receipt = self.run_step(step).await?;
            receipts.push(StepReceipt {
                step: step.name.clone(),
                receipt,
            });
        }

        info!(steps = receipts.len(), "All steps succeeded");
        Ok(receipts)
    }

    async fn run_step(&self, step: &TransactionStep) -> DeployResult<Receipt> {
        let to = self.session.resolve(&step.name, &step.target)?;
        let data = self.calldata(step)?;

        let receipt = self.submitter.call(to, data).await.map_err(|e| {
            error!(step = %step.name, error = %e, "Step submission failed");
            TransactionError::Submission {
                step: step.name.clone(),
                cause: format!("{:#}", e),
            }
        })?;

        if !receipt.success {
            if step.require_success {
                error!(step = %step.name, tx_hash = %receipt.tx_hash, "Transaction failed to execute");
                return Err(TransactionError::Reverted {
                    step: step.name.clone(),
                    tx_hash: receipt.tx_hash,
                }
                .into());
            }
            warn!(step = %step.name, tx_hash = %receipt.tx_hash, "Step reverted, continuing");
        } else {
            info!(step = %step.name, tx_hash = %receipt.tx_hash, "Step succeeded");
        }

        Ok(receipt)
    }

    fn calldata(&self, step: &TransactionStep) -> DeployResult<Bytes> {
        let encoding = |cause: String| TransactionError::Encoding {
            step: step.name.clone(),
            cause,
        };

        let function = parse_function(&step.signature).map_err(|e| encoding(format!("{:#}", e)))?;
        let args = resolve_args(&step.args, self.submitter.sender(), |unit| {
            self.session.resolve(&step.name, unit)
        })?;
        let data = encode_call(&function, &args).map_err(|e| encoding(format!("{:#}", e)))?;
        Ok(data.into())
    }
}
