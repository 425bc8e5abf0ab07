//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point for the Chainshell shell.
// CONTEXT: Wires configuration, the script host, the adapter registry, and
// the startup sequencer together, then feeds the process-ready signal.

use std::path::{Path, PathBuf};

use launcher::{
    ApplicationEnvironment, LaunchConfig, LauncherError, LifecycleEvent, PresentationHost,
    StartupSequencer, StartupState,
};
use script_host::ScriptHost;

pub mod logging;
pub mod presentation;

pub use presentation::HeadlessPresentationHost;

/// Build a fully wired sequencer from a resolved configuration.
pub fn build_sequencer(
    config: LaunchConfig,
    presentation: Box<dyn PresentationHost>,
) -> Result<StartupSequencer, LauncherError> {
    let environment = ApplicationEnvironment::from_config(&config).shared();
    let host = ScriptHost::new()?;
    Ok(StartupSequencer::new(config, environment, host, presentation))
}

/// Load the configuration at `path`, run the startup sequence once, and
/// report how it ended.
pub fn run_with_config(path: &Path) -> Result<StartupState, LauncherError> {
    let base = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let config = LaunchConfig::from_file(path)?.resolved(&base);
    let mut sequencer = build_sequencer(config, Box::new(HeadlessPresentationHost::new()))?;
    sequencer.handle_event(LifecycleEvent::Ready);

    let state = sequencer.state();
    match state {
        StartupState::Ready => log::info!("launch complete"),
        StartupState::Degraded => log::error!("launch degraded: no server, no window"),
        other => log::warn!("launch ended in {:?}", other),
    }
    Ok(state)
}

pub fn run() {
    logging::init();
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("launch.json"));
    if let Err(err) = run_with_config(&config_path) {
        log::error!("launch failed: {}", err);
        std::process::exit(1);
    }
}
