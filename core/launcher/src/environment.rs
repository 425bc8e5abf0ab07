//! FILENAME: core/launcher/src/environment.rs
//! PURPOSE: Process-wide application state and the environment
//! self-reference capability.
//! CONTEXT: Constructed once at process start and mutated only by the
//! sequencer on the single logical thread. Only the server context receives
//! a capability reaching back into this state; adapter contexts never see
//! it.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use adapters::{AdapterDescriptor, AdapterRegistry};
use script_host::rquickjs::{Function, Object};
use script_host::{Capability, CapabilitySet, InstallSite};

use crate::config::LaunchConfig;
use crate::presentation::WindowHandle;

/// Shared handle to the application environment.
pub type SharedEnvironment = Rc<RefCell<ApplicationEnvironment>>;

/// Directory roots, the capability-set template, the adapter registry, and
/// the one optional window reference.
pub struct ApplicationEnvironment {
    server_root: PathBuf,
    client_root: PathBuf,
    capability_template: CapabilitySet,
    registry: AdapterRegistry,
    window: Option<WindowHandle>,
}

impl ApplicationEnvironment {
    /// Build the environment from a resolved launch configuration: the
    /// capability template rooted at the server tree, and one registry
    /// entry per adapter table row.
    pub fn from_config(config: &LaunchConfig) -> Self {
        let mut registry = AdapterRegistry::new();
        for adapter in &config.adapters {
            registry.register(AdapterDescriptor::new(
                &adapter.name,
                &config.server_root.join(&adapter.script),
                &adapter.binary,
                adapter.config.clone(),
            ));
        }
        ApplicationEnvironment {
            server_root: config.server_root.clone(),
            client_root: config.client_root.clone(),
            capability_template: CapabilitySet::standard(&config.server_root),
            registry,
            window: None,
        }
    }

    pub fn shared(self) -> SharedEnvironment {
        Rc::new(RefCell::new(self))
    }

    pub fn server_root(&self) -> &Path {
        &self.server_root
    }

    pub fn client_root(&self) -> &Path {
        &self.client_root
    }

    pub fn capability_template(&self) -> &CapabilitySet {
        &self.capability_template
    }

    /// Widen the template with one more entry. Every context loaded after
    /// this observes the addition; the shell uses it to surface extra host
    /// facilities to both adapters and the server.
    pub fn extend_capabilities(
        &mut self,
        name: &str,
        capability: Rc<dyn Capability>,
    ) {
        self.capability_template = self.capability_template.extended(name, capability);
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    pub fn window(&self) -> Option<&WindowHandle> {
        self.window.as_ref()
    }

    pub fn set_window(&mut self, handle: WindowHandle) {
        self.window = Some(handle);
    }

    pub fn clear_window(&mut self) {
        self.window = None;
    }
}

// ============================================================================
// READINESS SIGNAL
// ============================================================================

/// Latch raised by the server through its injected callback. Counts
/// invocations so over-signaling is observable.
#[derive(Clone, Default)]
pub struct ReadySignal(Rc<Cell<u32>>);

impl ReadySignal {
    pub fn new() -> Self {
        ReadySignal::default()
    }

    pub fn signaled(&self) -> bool {
        self.0.get() > 0
    }

    pub fn count(&self) -> u32 {
        self.0.get()
    }

    fn raise(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }
}

// ============================================================================
// ENVIRONMENT SELF-REFERENCE CAPABILITY
// ============================================================================

/// The self-reference handed to the server context: directory roots,
/// adapter-name enumeration, and the readiness callback. Modeled as an
/// explicit capability rather than ambient state so the widened surface
/// stays auditable next to the standard entries.
pub struct EnvironmentCapability {
    environment: SharedEnvironment,
    ready: ReadySignal,
}

impl EnvironmentCapability {
    pub fn new(environment: SharedEnvironment, ready: ReadySignal) -> Self {
        EnvironmentCapability { environment, ready }
    }
}

impl Capability for EnvironmentCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> script_host::rquickjs::Result<()> {
        let env = Object::new(site.ctx.clone())?;
        {
            let state = self.environment.borrow();
            env.set("serverRoot", state.server_root().display().to_string())?;
            env.set("clientRoot", state.client_root().display().to_string())?;
        }

        let environment = Rc::clone(&self.environment);
        env.set(
            "adapters",
            Function::new(site.ctx.clone(), move || -> Vec<String> {
                environment.borrow().registry().names()
            })?,
        )?;

        let ready = self.ready.clone();
        env.set(
            "signalReady",
            Function::new(site.ctx.clone(), move || {
                ready.raise();
            })?,
        )?;

        site.ctx.globals().set(site.name, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdapterConfig, WindowConfig};
    use adapters::HandlerConfig;

    fn config(dir: &Path) -> LaunchConfig {
        LaunchConfig {
            server_root: dir.join("server"),
            client_root: dir.join("client"),
            server_script: PathBuf::from("index.js"),
            database_adapter: "sqlite3".to_string(),
            window: WindowConfig::default(),
            adapters: vec![AdapterConfig {
                name: "sqlite3".to_string(),
                script: PathBuf::from("db/sqlite3.js"),
                binary: "bin/{platform}/sqlite3.node".to_string(),
                config: HandlerConfig::default(),
            }],
            init_timeout_ms: None,
        }
    }

    #[test]
    fn test_from_config_registers_adapters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let environment = ApplicationEnvironment::from_config(&config(dir.path()));
        assert!(environment.registry().contains("sqlite3"));
        let descriptor = environment.registry().descriptor("sqlite3").expect("row");
        assert_eq!(
            descriptor.script_path(),
            dir.path().join("server/db/sqlite3.js")
        );
    }

    #[test]
    fn test_template_excludes_environment_capability() {
        let dir = tempfile::tempdir().expect("tempdir");
        let environment = ApplicationEnvironment::from_config(&config(dir.path()));
        assert!(!environment.capability_template().contains("environment"));
        assert!(environment.capability_template().contains("require"));
    }

    #[test]
    fn test_ready_signal_counts() {
        let signal = ReadySignal::new();
        assert!(!signal.signaled());
        signal.raise();
        signal.raise();
        assert!(signal.signaled());
        assert_eq!(signal.count(), 2);
    }

    #[test]
    fn test_window_reference_lifecycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut environment = ApplicationEnvironment::from_config(&config(dir.path()));
        assert!(environment.window().is_none());
        environment.set_window(WindowHandle::new(7));
        assert_eq!(environment.window().map(|w| w.id()), Some(7));
        environment.clear_window();
        assert!(environment.window().is_none());
    }
}
