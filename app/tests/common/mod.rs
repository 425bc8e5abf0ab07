//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for Chainshell integration tests.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use adapters::HandlerConfig;
use launcher::{
    AdapterConfig, ApplicationEnvironment, LaunchConfig, PresentationError, PresentationHost,
    StartupSequencer, WindowConfig, WindowHandle, WindowSpec,
};
use script_host::rquickjs::Function;
use script_host::{Capability, InstallSite, ScriptHost};

/// Shared ordered event log, fed from scripts (through the trace
/// capability) and from the presentation host.
pub type Trace = Rc<RefCell<Vec<String>>>;

/// Capability exposing `trace(message)` to loaded scripts, so tests can
/// observe ordering across contexts.
pub struct TraceCapability {
    trace: Trace,
}

impl Capability for TraceCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> script_host::rquickjs::Result<()> {
        let trace = Rc::clone(&self.trace);
        let f = Function::new(site.ctx.clone(), move |message: String| {
            trace.borrow_mut().push(message);
        })?;
        site.ctx.globals().set(site.name, f)
    }
}

/// Presentation host that appends creation events to the trace and records
/// every requested spec.
pub struct TracingPresentationHost {
    trace: Trace,
    windows: Rc<RefCell<Vec<WindowSpec>>>,
}

impl PresentationHost for TracingPresentationHost {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowHandle, PresentationError> {
        self.trace
            .borrow_mut()
            .push(format!("window:created:{}x{}", spec.width, spec.height));
        let mut windows = self.windows.borrow_mut();
        windows.push(spec.clone());
        Ok(WindowHandle::new(windows.len() as u64))
    }
}

/// Test harness owning a laid-out workspace and a wired sequencer.
pub struct TestHarness {
    pub sequencer: StartupSequencer,
    pub trace: Trace,
    pub windows: Rc<RefCell<Vec<WindowSpec>>>,
    _dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a harness with the given adapter and server sources laid out
    /// under a fresh workspace.
    pub fn new(adapter_source: &str, server_source: &str) -> Self {
        Self::with_timeout(adapter_source, server_source, None)
    }

    /// Same, with a bounded initialization wait.
    pub fn with_timeout(
        adapter_source: &str,
        server_source: &str,
        init_timeout_ms: Option<u64>,
    ) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let server_root = dir.path().join("server");
        let client_root = dir.path().join("client");
        fs::create_dir_all(server_root.join("db")).expect("server tree");
        fs::create_dir_all(&client_root).expect("client tree");
        fs::write(server_root.join("db/sqlite3.js"), adapter_source).expect("adapter script");
        fs::write(server_root.join("index.js"), server_source).expect("server script");
        fs::write(client_root.join("index.html"), "<html></html>").expect("client page");

        let config = LaunchConfig {
            server_root,
            client_root,
            server_script: PathBuf::from("index.js"),
            database_adapter: "sqlite3".to_string(),
            window: WindowConfig::default(),
            adapters: vec![AdapterConfig {
                name: "sqlite3".to_string(),
                script: PathBuf::from("db/sqlite3.js"),
                binary: "bin/{platform}/sqlite3.node".to_string(),
                config: HandlerConfig(serde_json::json!({"file": "wallet.db"})),
            }],
            init_timeout_ms,
        };

        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let windows = Rc::new(RefCell::new(Vec::new()));

        let mut environment = ApplicationEnvironment::from_config(&config);
        environment.extend_capabilities(
            "trace",
            Rc::new(TraceCapability {
                trace: Rc::clone(&trace),
            }),
        );

        let host = ScriptHost::new().expect("script host");
        let presentation = Box::new(TracingPresentationHost {
            trace: Rc::clone(&trace),
            windows: Rc::clone(&windows),
        });
        let sequencer = StartupSequencer::new(config, environment.shared(), host, presentation);

        TestHarness {
            sequencer,
            trace,
            windows,
            _dir: dir,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.trace.borrow().clone()
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }
}
