//! FILENAME: core/adapters/src/descriptor.rs
//! PURPOSE: Descriptors for dynamically loaded adapters.
//! CONTEXT: A descriptor names a persistence/chain adapter, where its script
//! lives, and where its platform binary would be found. The loaded handle is
//! owned by the registry and replaced wholesale on reload.

use std::path::{Path, PathBuf};

use script_host::ScriptContext;
use serde::{Deserialize, Serialize};

/// Configuration sub-object for one adapter. Passed unchanged into the
/// script's descriptor argument and to its `initialize` entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct HandlerConfig(pub serde_json::Value);

/// One named adapter: its script, its platform-binary template, and (once
/// loaded) the execution context serving as its handle.
pub struct AdapterDescriptor {
    name: String,
    script_path: PathBuf,
    binary_path_template: String,
    handler_config: HandlerConfig,
    handle: Option<ScriptContext>,
}

impl AdapterDescriptor {
    pub fn new(
        name: &str,
        script_path: &Path,
        binary_path_template: &str,
        handler_config: HandlerConfig,
    ) -> Self {
        AdapterDescriptor {
            name: name.to_string(),
            script_path: script_path.to_path_buf(),
            binary_path_template: binary_path_template.to_string(),
            handler_config,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn handler_config(&self) -> &HandlerConfig {
        &self.handler_config
    }

    /// The loaded execution context, if any.
    pub fn handle(&self) -> Option<&ScriptContext> {
        self.handle.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Replace the stored handle. The previous context, if any, is dropped:
    /// a reload never merges with earlier state.
    pub(crate) fn install_handle(&mut self, handle: ScriptContext) {
        self.handle = Some(handle);
    }

    /// The binary path with `{platform}`/`{arch}` tokens substituted for the
    /// running host.
    pub fn resolved_binary_path(&self) -> String {
        self.binary_path_template
            .replace("{platform}", std::env::consts::OS)
            .replace("{arch}", std::env::consts::ARCH)
    }

    /// The data half of the descriptor argument handed to `initialize`.
    /// The live `adapter` reference is attached by the caller inside the
    /// script's own context.
    pub(crate) fn descriptor_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": &self.name,
            "script": self.script_path.display().to_string(),
            "binary": self.resolved_binary_path(),
            "config": &self.handler_config,
        })
    }
}
