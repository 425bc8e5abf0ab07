//! FILENAME: core/launcher/src/presentation.rs
//! PURPOSE: Contract for the presentation-layer collaborator.
//! CONTEXT: The launcher consumes the window system through exactly one
//! creation call plus a closed notification. Rendering and window-manager
//! integration live entirely behind this trait.

use std::path::PathBuf;

use thiserror::Error;

/// Everything the launcher says about the window it wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
    /// Content the window loads, resolved under the client tree.
    pub content_path: PathBuf,
    pub title: String,
}

/// Opaque reference to a created window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    id: u64,
}

impl WindowHandle {
    pub fn new(id: u64) -> Self {
        WindowHandle { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("window creation failed: {0}")]
    Creation(String),
}

/// The presentation-layer host. Implementations own the actual window
/// system; the launcher only asks for creation and is told about closure
/// through [`crate::StartupSequencer::window_closed`].
pub trait PresentationHost {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowHandle, PresentationError>;
}
