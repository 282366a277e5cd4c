//! EVM network support
//!
//! - `signer` - [`EvmSubmitter`], the alloy-backed network submitter
//! - `contracts` - read-only bindings for the demo token and the bank

pub mod contracts;
pub mod signer;

pub use contracts::{bank_denom, BalanceReader};
pub use signer::EvmSubmitter;
