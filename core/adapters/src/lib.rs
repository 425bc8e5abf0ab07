//! FILENAME: core/adapters/src/lib.rs
//! PURPOSE: Database and chain adapter registry.
//! CONTEXT: Adapters are loaded dynamically as capability-scoped scripts or
//! registered as compiled-in implementations of the chain-adapter
//! interface. The registry owns every descriptor and handle; starting an
//! adapter reports an informational boolean and only raises when the
//! script itself cannot be loaded.

mod chain;
mod descriptor;
mod error;
mod registry;

pub use chain::{
    Balance, ChainAdapter, ChainAdapterConstructor, ContractCall, ContractResult, Transaction,
    TransactionReceipt,
};
pub use descriptor::{AdapterDescriptor, HandlerConfig};
pub use error::AdapterError;
pub use registry::AdapterRegistry;
