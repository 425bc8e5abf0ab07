//! FILENAME: core/adapters/src/chain.rs
//! PURPOSE: Extension contract for compiled-in chain adapters.
//! CONTEXT: Adapters come in two shapes: scripts loaded through the script
//! host, and compiled-in types implementing this interface. The contract
//! standardizes construction-time injection of capabilities and handler
//! configuration; chain-specific behavior lives entirely in the
//! implementor.

use script_host::CapabilitySet;
use serde::{Deserialize, Serialize};

use crate::descriptor::HandlerConfig;
use crate::error::AdapterError;

/// An account balance as reported by a chain. Amounts are decimal strings:
/// chain integer widths exceed f64.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub account: String,
    pub amount: String,
}

/// A transaction handed to an adapter for submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Submission outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionReceipt {
    pub id: String,
    pub accepted: bool,
}

/// A contract interaction request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractCall {
    pub contract: String,
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Result of a contract interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractResult {
    pub value: serde_json::Value,
}

/// Capability interface for compiled-in adapters.
///
/// Implementors are constructed through a registered
/// [`ChainAdapterConstructor`] receiving the capability set and handler
/// configuration; beyond that injection point the contract imposes no
/// further invariant.
pub trait ChainAdapter {
    fn name(&self) -> &str;

    fn balance(&self, account: &str) -> Result<Balance, AdapterError>;

    fn submit_transaction(&self, transaction: &Transaction) -> Result<TransactionReceipt, AdapterError>;

    fn call_contract(&self, call: &ContractCall) -> Result<ContractResult, AdapterError>;
}

/// Constructor for a compiled-in adapter, registered per adapter name.
pub type ChainAdapterConstructor =
    Box<dyn Fn(CapabilitySet, HandlerConfig) -> Box<dyn ChainAdapter>>;
