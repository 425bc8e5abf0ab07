//! FILENAME: core/adapters/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("unknown adapter: {name}")]
    NotFound { name: String },

    #[error(transparent)]
    Host(#[from] script_host::ScriptHostError),

    #[error("chain operation `{operation}` failed for {adapter}: {detail}")]
    Chain {
        adapter: String,
        operation: String,
        detail: String,
    },
}
