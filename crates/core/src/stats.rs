//! Coroutine lifecycle statistics
//!
//! Counters are thread-local: coroutines never leave the thread that created
//! them, so every transition is counted on the thread where it happens and no
//! atomics are needed.
//!
//! Useful diagnostics:
//! - Currently allocated: `live`
//! - Leaked contexts: `created - freed > live` would indicate a bug
//! - Forced unwinds: iterators dropped before exhaustion
//! - Peak concurrency: `peak_live` (nesting depth of operator chains shows up here)

use std::cell::Cell;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoroutineStats {
    /// Contexts successfully allocated
    pub created: u64,
    /// Bodies that returned normally
    pub completed: u64,
    /// Bodies that ended through the stop signal (yield break or forced)
    pub stopped: u64,
    /// Stops that were forced by dropping a suspended coroutine
    pub forced_unwinds: u64,
    /// Bodies that returned an error or panicked
    pub failed: u64,
    /// Contexts released
    pub freed: u64,
    /// Contexts currently allocated
    pub live: usize,
    /// High-water mark of `live`
    pub peak_live: usize,
}

thread_local! {
    static STATS: Cell<CoroutineStats> = const {
        Cell::new(CoroutineStats {
            created: 0,
            completed: 0,
            stopped: 0,
            forced_unwinds: 0,
            failed: 0,
            freed: 0,
            live: 0,
            peak_live: 0,
        })
    };
}

/// Snapshot of this thread's counters.
pub fn snapshot() -> CoroutineStats {
    STATS.with(|s| s.get())
}

/// Number of coroutine contexts currently allocated on this thread.
pub fn live_coroutines() -> usize {
    STATS.with(|s| s.get().live)
}

fn update(f: impl FnOnce(&mut CoroutineStats)) {
    STATS.with(|s| {
        let mut stats = s.get();
        f(&mut stats);
        s.set(stats);
    });
}

pub(crate) fn record_created() {
    update(|s| {
        s.created += 1;
        s.live += 1;
        s.peak_live = s.peak_live.max(s.live);
    });
}

pub(crate) fn record_freed() {
    update(|s| {
        s.freed += 1;
        s.live = s.live.saturating_sub(1);
    });
}

pub(crate) fn record_completed() {
    update(|s| s.completed += 1);
}

pub(crate) fn record_stopped(forced: bool) {
    update(|s| {
        s.stopped += 1;
        if forced {
            s.forced_unwinds += 1;
        }
    });
}

pub(crate) fn record_failed() {
    update(|s| s.failed += 1);
}
