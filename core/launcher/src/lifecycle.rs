//! FILENAME: core/launcher/src/lifecycle.rs

/// Process lifecycle signals consumed by the startup sequencer. The shell
/// owning the process loop translates its platform events into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The process finished booting; begin the startup sequence.
    Ready,
    /// The application was re-activated (for example from the dock). Must
    /// be idempotent while a server/window pair is active.
    Reactivate,
    /// Every window is gone; the stored window reference is stale.
    AllWindowsClosed,
}
