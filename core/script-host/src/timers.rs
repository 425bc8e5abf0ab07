//! FILENAME: core/script-host/src/timers.rs
//! PURPOSE: Host-side timer queue backing the injected setTimeout and
//! clearTimeout capabilities.
//! CONTEXT: QuickJS has no event loop of its own. Scripts that schedule
//! timers hand their callbacks to this queue; the host pump fires the due
//! entries between job executions on the single logical thread.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use rquickjs::{CatchResultExt, Context, Function, Persistent};

/// Shared handle to the host timer queue.
pub type SharedTimerQueue = Rc<RefCell<TimerQueue>>;

/// One scheduled callback, bound to the context that created it.
pub struct TimerEntry {
    id: u32,
    due: Instant,
    context: Context,
    callback: Persistent<Function<'static>>,
}

impl TimerEntry {
    /// Run the callback inside its owning context. Callback errors are
    /// logged, not propagated: a failing timer must not take down the pump.
    pub fn fire(self) {
        self.context.with(|ctx| {
            let outcome = self
                .callback
                .clone()
                .restore(&ctx)
                .and_then(|f| f.call::<_, ()>(()))
                .catch(&ctx);
            if let Err(err) = outcome {
                log::error!("timer callback failed: {}", err);
            }
        });
    }
}

/// Timer queue sorted by due time; ties fire in scheduling order.
///
/// Callers must release the queue borrow before firing taken entries:
/// a callback may re-enter the queue through setTimeout.
#[derive(Default)]
pub struct TimerQueue {
    next_id: u32,
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        TimerQueue::default()
    }

    /// Schedule a callback and return its cancellation id.
    pub fn schedule(
        &mut self,
        context: Context,
        due: Instant,
        callback: Persistent<Function<'static>>,
    ) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        let at = self
            .entries
            .iter()
            .position(|e| e.due > due)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            TimerEntry {
                id,
                due,
                context,
                callback,
            },
        );
        id
    }

    /// Cancel a scheduled callback. Unknown ids are ignored, matching the
    /// clearTimeout contract.
    pub fn cancel(&mut self, id: u32) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deadline of the earliest pending entry.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.first().map(|e| e.due)
    }

    /// Remove every entry due at `now`, preserving order.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerEntry> {
        let split = self
            .entries
            .iter()
            .position(|e| e.due > now)
            .unwrap_or(self.entries.len());
        self.entries.drain(..split).collect()
    }
}
