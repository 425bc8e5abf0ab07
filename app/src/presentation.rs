//! FILENAME: app/src/presentation.rs
// PURPOSE: Presentation host used when no window system is wired in.
// CONTEXT: The real window system plugs in behind the same trait; this
// implementation only records the creation call in the log.

use launcher::{PresentationError, PresentationHost, WindowHandle, WindowSpec};

/// Counts creation calls and hands out sequential window ids.
#[derive(Default)]
pub struct HeadlessPresentationHost {
    next_id: u64,
}

impl HeadlessPresentationHost {
    pub fn new() -> Self {
        HeadlessPresentationHost::default()
    }
}

impl PresentationHost for HeadlessPresentationHost {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowHandle, PresentationError> {
        self.next_id += 1;
        log::info!(
            "window {} created: {}x{} \"{}\" loading {}",
            self.next_id,
            spec.width,
            spec.height,
            spec.title,
            spec.content_path.display()
        );
        Ok(WindowHandle::new(self.next_id))
    }
}
