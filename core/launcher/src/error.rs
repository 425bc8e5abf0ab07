//! FILENAME: core/launcher/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Host(#[from] script_host::ScriptHostError),

    #[error(transparent)]
    Adapter(#[from] adapters::AdapterError),

    #[error(transparent)]
    Presentation(#[from] crate::presentation::PresentationError),
}
