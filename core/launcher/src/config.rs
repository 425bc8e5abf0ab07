//! FILENAME: core/launcher/src/config.rs
//! PURPOSE: Launch configuration: directory roots, window geometry, and the
//! adapter table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adapters::HandlerConfig;
use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
    /// Content the window loads, relative to the client root.
    #[serde(default = "default_content")]
    pub content: PathBuf,
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    800
}

fn default_title() -> String {
    "Chainshell".to_string()
}

fn default_content() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            content: default_content(),
        }
    }
}

/// One adapter table row. Script paths are relative to the server root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub name: String,
    pub script: PathBuf,
    /// Platform-binary path template; `{platform}` and `{arch}` tokens are
    /// substituted when the descriptor is resolved.
    #[serde(default)]
    pub binary: String,
    #[serde(default)]
    pub config: HandlerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Root of the server tree, relative to the launch directory.
    pub server_root: PathBuf,
    /// Root of the client tree, relative to the launch directory.
    pub client_root: PathBuf,
    /// The server module, relative to the server root.
    #[serde(default = "default_server_script")]
    pub server_script: PathBuf,
    /// Which adapter the database stage starts.
    #[serde(default = "default_database_adapter")]
    pub database_adapter: String,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
    /// Optional bound on adapter initialization and server readiness.
    /// Absent means an unbounded wait.
    #[serde(default)]
    pub init_timeout_ms: Option<u64>,
}

fn default_server_script() -> PathBuf {
    PathBuf::from("index.js")
}

fn default_database_adapter() -> String {
    "sqlite3".to_string()
}

impl LaunchConfig {
    pub fn from_file(path: &Path) -> Result<Self, LauncherError> {
        let text = std::fs::read_to_string(path).map_err(|e| LauncherError::ConfigIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| LauncherError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve the relative directory roots against the launch directory.
    pub fn resolved(mut self, base: &Path) -> Self {
        self.server_root = base.join(&self.server_root);
        self.client_root = base.join(&self.client_root);
        self
    }

    pub fn server_script_path(&self) -> PathBuf {
        self.server_root.join(&self.server_script)
    }

    pub fn window_content_path(&self) -> PathBuf {
        self.client_root.join(&self.window.content)
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("launch.json");
        fs::write(
            &path,
            r#"{"server_root": "server", "client_root": "client"}"#,
        )
        .expect("write");
        let config = LaunchConfig::from_file(&path).expect("load");
        assert_eq!(config.database_adapter, "sqlite3");
        assert_eq!(config.server_script, PathBuf::from("index.js"));
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.init_timeout_ms, None);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_resolved_joins_roots() {
        let config = LaunchConfig {
            server_root: PathBuf::from("server"),
            client_root: PathBuf::from("client"),
            server_script: default_server_script(),
            database_adapter: default_database_adapter(),
            window: WindowConfig::default(),
            adapters: Vec::new(),
            init_timeout_ms: None,
        }
        .resolved(Path::new("/opt/chainshell"));
        assert_eq!(config.server_root, PathBuf::from("/opt/chainshell/server"));
        assert_eq!(
            config.server_script_path(),
            PathBuf::from("/opt/chainshell/server/index.js")
        );
        assert_eq!(
            config.window_content_path(),
            PathBuf::from("/opt/chainshell/client/index.html")
        );
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("launch.json");
        fs::write(&path, "{not json").expect("write");
        let err = LaunchConfig::from_file(&path).expect_err("must fail");
        assert!(matches!(err, LauncherError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_config_is_io_error() {
        let err =
            LaunchConfig::from_file(Path::new("/nonexistent/launch.json")).expect_err("must fail");
        assert!(matches!(err, LauncherError::ConfigIo { .. }));
    }
}
