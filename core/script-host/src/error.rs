//! FILENAME: core/script-host/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptHostError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script error in {path}: {detail}")]
    Script { path: PathBuf, detail: String },

    #[error("script {path} does not export `{name}`")]
    MissingExport { name: String, path: PathBuf },

    #[error("failed to install capability `{name}`: {detail}")]
    Capability { name: String, detail: String },

    #[error("engine error: {0}")]
    Engine(#[from] rquickjs::Error),
}
