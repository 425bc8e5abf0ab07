//! FILENAME: core/launcher/src/lib.rs
//! PURPOSE: Startup sequencing for the Chainshell desktop shell.
//! CONTEXT: Chains database adapter -> application server -> presentation
//! layer. The server module is loaded into a capability-scoped context
//! carrying a self-reference to the application environment; the
//! presentation layer is an external collaborator behind a trait.

pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod presentation;
pub mod sequencer;

// Re-export commonly used types at the crate root
pub use config::{AdapterConfig, LaunchConfig, WindowConfig};
pub use environment::{
    ApplicationEnvironment, EnvironmentCapability, ReadySignal, SharedEnvironment,
};
pub use error::LauncherError;
pub use lifecycle::LifecycleEvent;
pub use presentation::{PresentationError, PresentationHost, WindowHandle, WindowSpec};
pub use sequencer::{StartupSequencer, StartupState};
