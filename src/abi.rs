//! Argument values and ABI encoding for constructors and calls
//!
//! Arguments are declared loosely (a unit reference, a literal, the deployer)
//! and coerced against the parameter types of the target ABI at encode time,
//! so a manifest never has to spell out Solidity types.

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Constructor, Function, Param};
use alloy::primitives::{Address, U256};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// An argument to a constructor or a contract call
///
/// Serialized externally tagged: `{"unit": "IBCHost"}`, `{"uint": "1000"}`,
/// `"deployer"`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    /// Address of another unit deployed in the same session
    Unit(String),
    /// Address of the signing identity
    Deployer,
    Address(Address),
    Uint(U256),
    String(String),
    Bool(bool),
}

impl ArgValue {
    /// Convenience constructor for a unit reference
    pub fn unit(name: impl Into<String>) -> Self {
        Self::Unit(name.into())
    }

    /// Convenience constructor for a string literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Name of the referenced unit, if this argument is a unit reference
    pub fn unit_ref(&self) -> Option<&str> {
        match self {
            Self::Unit(name) => Some(name),
            _ => None,
        }
    }
}

/// An argument with every unit reference replaced by its address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedArg {
    Address(Address),
    Uint(U256),
    String(String),
    Bool(bool),
}

impl ResolvedArg {
    /// Textual form fed to the type coercer
    fn as_text(&self) -> String {
        match self {
            Self::Address(a) => a.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Resolve a list of arguments, looking up unit references with `lookup`
pub fn resolve_args<E>(
    args: &[ArgValue],
    deployer: Address,
    mut lookup: impl FnMut(&str) -> std::result::Result<Address, E>,
) -> std::result::Result<Vec<ResolvedArg>, E> {
    args.iter()
        .map(|arg| {
            Ok(match arg {
                ArgValue::Unit(name) => ResolvedArg::Address(lookup(name)?),
                ArgValue::Deployer => ResolvedArg::Address(deployer),
                ArgValue::Address(a) => ResolvedArg::Address(*a),
                ArgValue::Uint(v) => ResolvedArg::Uint(*v),
                ArgValue::String(s) => ResolvedArg::String(s.clone()),
                ArgValue::Bool(b) => ResolvedArg::Bool(*b),
            })
        })
        .collect()
}

fn coerce(params: &[Param], args: &[ResolvedArg]) -> Result<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(eyre!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        ));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| eyre!("unsupported parameter type '{}': {}", param.ty, e))?;
            coerce_one(&ty, arg)
                .map_err(|e| eyre!("argument '{}' is not a valid {}: {}", param.name, ty, e))
        })
        .collect()
}

/// Typed values pass through unchanged; anything else goes through the text coercer
fn coerce_one(ty: &DynSolType, arg: &ResolvedArg) -> Result<DynSolValue> {
    match (ty, arg) {
        (DynSolType::String, ResolvedArg::String(s)) => Ok(DynSolValue::String(s.clone())),
        (DynSolType::Address, ResolvedArg::Address(a)) => Ok(DynSolValue::Address(*a)),
        (DynSolType::Bool, ResolvedArg::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (DynSolType::Uint(bits), ResolvedArg::Uint(v)) => {
            if v.bit_len() > *bits {
                return Err(eyre!("{} does not fit in {} bits", v, bits));
            }
            Ok(DynSolValue::Uint(*v, *bits))
        }
        _ => ty.coerce_str(&arg.as_text()).map_err(|e| eyre!("{}", e)),
    }
}

/// ABI-encode constructor arguments (without the bytecode prefix)
///
/// A contract with no constructor in its ABI accepts only an empty list.
pub fn encode_constructor(ctor: Option<&Constructor>, args: &[ResolvedArg]) -> Result<Vec<u8>> {
    match ctor {
        Some(ctor) => {
            let values = coerce(&ctor.inputs, args)?;
            ctor.abi_encode_input(&values)
                .map_err(|e| eyre!("encoding failed: {}", e))
        }
        None if args.is_empty() => Ok(Vec::new()),
        None => Err(eyre!(
            "contract has no constructor but {} arguments were given",
            args.len()
        )),
    }
}

/// Parse a human-readable signature such as `approve(address,uint256)`
pub fn parse_function(signature: &str) -> Result<Function> {
    Function::parse(signature).map_err(|e| eyre!("invalid function signature '{}': {}", signature, e))
}

/// ABI-encode a call, selector included
pub fn encode_call(function: &Function, args: &[ResolvedArg]) -> Result<Vec<u8>> {
    let values = coerce(&function.inputs, args)?;
    function
        .abi_encode_input(&values)
        .map_err(|e| eyre!("encoding failed: {}", e))
}
