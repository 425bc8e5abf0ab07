//! FILENAME: core/script-host/src/lib.rs
//! PURPOSE: Capability-scoped JavaScript host built on QuickJS.
//! CONTEXT: Loads externally supplied module source into isolated execution
//! contexts. Each context is seeded with an explicit capability whitelist;
//! nothing outside that list is reachable from inside a loaded script. A
//! cooperative pump drives engine jobs and host timers on one logical
//! thread.

pub mod capabilities;
pub mod context;
pub mod convert;
pub mod error;
pub mod host;
pub mod timers;

// Re-export commonly used types at the crate root
pub use capabilities::{
    BufferCapability, Capability, CapabilitySet, ClearTimeoutCapability, ConsoleCapability,
    InstallSite, ModuleRefCapability, ModuleResolverCapability, ProcessCapability,
    SetTimeoutCapability,
};
pub use context::{PendingValue, ScriptContext, SettledValue};
pub use convert::{display_value, error_detail, js_to_json, json_to_js, json_truthy};
pub use error::ScriptHostError;
pub use host::{PumpOutcome, ScriptHost};
pub use timers::{SharedTimerQueue, TimerEntry, TimerQueue};

// The capability trait needs rquickjs types in downstream implementors
// (the environment self-reference lives outside this crate).
pub use rquickjs;
