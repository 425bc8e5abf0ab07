//! FILENAME: core/script-host/src/host.rs
//! PURPOSE: Loads script source into capability-scoped contexts and drives
//! the cooperative pump.
//! CONTEXT: All script execution happens on one logical thread. Suspension
//! points are engine job boundaries and host timer firings; overlapping
//! asynchronous work interleaves there and nowhere else. The pump imposes
//! no deadline unless the caller passes one.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rquickjs::{CatchResultExt, Context, Runtime};

use crate::capabilities::CapabilitySet;
use crate::context::{PendingValue, ScriptContext};
use crate::convert::error_detail;
use crate::error::ScriptHostError;
use crate::timers::{SharedTimerQueue, TimerQueue};

/// How a pump run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The predicate was satisfied.
    Satisfied,
    /// No runnable work remains and the predicate can never be satisfied.
    Exhausted,
    /// The configured deadline passed first.
    TimedOut,
}

/// The capability-scoped script host.
///
/// Owns one engine runtime (and with it the job queue shared by every
/// context it creates) plus the timer queue backing the injected
/// setTimeout/clearTimeout capabilities.
pub struct ScriptHost {
    runtime: Runtime,
    timers: SharedTimerQueue,
}

impl ScriptHost {
    pub fn new() -> Result<Self, ScriptHostError> {
        Ok(ScriptHost {
            runtime: Runtime::new()?,
            timers: Rc::new(RefCell::new(TimerQueue::new())),
        })
    }

    /// Shared handle to the host timer queue.
    pub fn timers(&self) -> SharedTimerQueue {
        Rc::clone(&self.timers)
    }

    /// Read the script at `path` and execute it once, synchronously, inside
    /// a fresh context seeded with exactly the given capabilities.
    ///
    /// The source is read eagerly: an unreadable path fails with `Io`
    /// before any context exists. A parse or runtime failure during
    /// execution fails with `Script`, carrying the path and the engine
    /// diagnostic, and propagates to the caller.
    pub fn load(
        &self,
        path: &Path,
        capabilities: &CapabilitySet,
    ) -> Result<ScriptContext, ScriptHostError> {
        let source = std::fs::read_to_string(path).map_err(|e| ScriptHostError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let context = Context::full(&self.runtime)?;
        context.with(|ctx| {
            capabilities
                .install_all(&ctx, &context, &self.timers)
                .map_err(|(name, err)| {
                    let detail = match err {
                        rquickjs::Error::Exception => error_detail(&ctx, &ctx.catch()),
                        other => other.to_string(),
                    };
                    ScriptHostError::Capability { name, detail }
                })
        })?;

        context.with(|ctx| {
            ctx.eval::<(), _>(source)
                .catch(&ctx)
                .map_err(|e| ScriptHostError::Script {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
        })?;

        log::debug!("loaded script {}", path.display());
        Ok(ScriptContext::new(
            context,
            path.to_path_buf(),
            capabilities.names(),
        ))
    }

    /// Drive engine jobs and due timers until `done` holds, the queues are
    /// exhausted, or the optional deadline passes.
    ///
    /// With no deadline the wait is unbounded as long as runnable work
    /// remains; `Exhausted` is returned only when neither a job nor a timer
    /// could ever run again.
    pub fn pump_until(
        &self,
        mut done: impl FnMut() -> bool,
        timeout: Option<Duration>,
    ) -> PumpOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if done() {
                return PumpOutcome::Satisfied;
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return PumpOutcome::TimedOut;
                }
            }

            // one job at a time, so the predicate is re-checked promptly
            let ran_job = match self.runtime.execute_pending_job() {
                Ok(ran) => ran,
                Err(_) => {
                    log::warn!("script job raised an uncaught error");
                    true
                }
            };
            if ran_job {
                continue;
            }

            let due = self.timers.borrow_mut().take_due(Instant::now());
            if !due.is_empty() {
                for entry in due {
                    entry.fire();
                }
                continue;
            }

            // nothing runnable right now: wait for the next timer deadline
            let next = self.timers.borrow().next_due();
            match next {
                Some(mut wake) => {
                    if let Some(d) = deadline {
                        if d < wake {
                            wake = d;
                        }
                    }
                    let now = Instant::now();
                    if wake > now {
                        std::thread::sleep(wake - now);
                    }
                }
                None => return PumpOutcome::Exhausted,
            }
        }
    }

    /// Pump until a pending script call settles.
    pub fn await_pending(&self, pending: &PendingValue, timeout: Option<Duration>) -> PumpOutcome {
        self.pump_until(|| pending.is_settled(), timeout)
    }
}
