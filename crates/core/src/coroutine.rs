//! Coroutine - suspendable producer bodies
//!
//! A `Coroutine` runs a body on its own stack (a stackful generator context)
//! and lets it hand control back to whoever resumed it without returning,
//! keeping its call stack and locals intact.
//!
//! ## Lifecycle
//!
//! ```text
//! Created --resume--> Running --body returns / fails--> Stopped
//!                        |
//!                        +--suspend(false) / drop--> StopPending --resume / drop--> Stopped
//! ```
//!
//! Nothing leaves `Stopped`; resuming a stopped coroutine returns `Ok(false)`.
//!
//! ## Failure transport
//!
//! The body runs under `catch_unwind` on its own stack. A returned `Err` or a
//! panic is captured there and handed to the resumer, which returns the error
//! (or re-raises the panic with `resume_unwind`) from the very `resume` call
//! that observed it.
//!
//! ## Forced stop
//!
//! A coroutine that must stop while suspended (yield break, or the owner
//! dropping it mid-body) is resumed one last time in `StopPending`. Its
//! suspension point then raises the internal stop signal, an unwind payload
//! that tears the body's stack down (running destructors on the way) and is
//! recognised at the boundary as control flow, not as a failure. Bodies must
//! not swallow it with their own `catch_unwind`.

use crate::config::{CoroutineConfig, default_config};
use crate::error::{Result, SeqError, format_panic_payload};
use crate::stats;
use generator::{Gn, LocalGenerator};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

static NEXT_COROUTINE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Ids of coroutines currently executing on this thread, innermost last.
    /// A body that resumes an upstream coroutine pushes a second entry.
    static ACTIVE: RefCell<Vec<CoroutineId>> = const { RefCell::new(Vec::new()) };

    /// Stop signals currently unwinding on this thread. While one is in
    /// flight, dropping a suspended coroutine still forces it through the
    /// stop path, so a whole operator chain unwinds.
    static STOP_UNWINDS: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoroutineId(u64);

impl CoroutineId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CoroutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "co#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineState {
    /// Allocated, body not entered yet
    Created,
    /// Body entered; either executing or suspended at a yield
    Running,
    /// Body asked to stop (or owner is dropping it); next resume unwinds it
    StopPending,
    /// Body finished, failed, or was unwound
    Stopped,
}

/// Unwind payload raised at a suspension point of a coroutine that has to stop.
struct StopSignal;

enum Failure {
    Error(SeqError),
    Panic(Box<dyn Any + Send>),
}

enum Outcome {
    Completed,
    Stopped,
    Failed(Failure),
}

/// What crosses the context switch back to the resumer.
enum Transfer<Y> {
    Suspended(Option<Y>),
    Finished(Outcome),
}

/// The capability a body receives to suspend itself.
///
/// Only reachable from inside the body, on the coroutine's own stack.
pub struct Yielder<'s, Y> {
    switch: &'s mut dyn FnMut(Option<Y>),
    state: &'s Cell<CoroutineState>,
}

impl<Y> Yielder<'_, Y> {
    /// Hand `value` to the resumer and suspend; returns when resumed again.
    pub fn emit(&mut self, value: Y) {
        self.transfer(Some(value), true);
    }

    /// Suspend without a value. With `go_on == false` the coroutine is marked
    /// to stop: the call does not return normally, the body is unwound on
    /// the next resume (or when the owner drops it).
    pub fn suspend(&mut self, go_on: bool) {
        self.transfer(None, go_on);
    }

    /// End the body here (yield break).
    pub fn stop(&mut self) -> ! {
        self.transfer(None, false);
        raise_stop()
    }

    fn transfer(&mut self, value: Option<Y>, go_on: bool) {
        if !go_on {
            self.state.set(CoroutineState::StopPending);
        }
        (self.switch)(value);
        if self.state.get() == CoroutineState::StopPending {
            raise_stop();
        }
    }
}

fn raise_stop() -> ! {
    STOP_UNWINDS.with(|n| n.set(n.get() + 1));
    panic::resume_unwind(Box::new(StopSignal))
}

/// A suspendable body with its own stack.
///
/// `Y` is the type handed out by [`Yielder::emit`]. The coroutine is bound
/// to the thread that created it (`!Send`).
pub struct Coroutine<'a, Y> {
    id: CoroutineId,
    state: Rc<Cell<CoroutineState>>,
    context: Option<LocalGenerator<'a, (), Transfer<Y>>>,
    yielded: Option<Y>,
}

impl<'a, Y: 'a> Coroutine<'a, Y> {
    /// Allocate a coroutine for `body` with the process-wide configuration.
    /// The body does not run until the first `resume`.
    pub fn new<F>(body: F) -> Result<Self>
    where
        F: FnOnce(&mut Yielder<'_, Y>) -> Result<()> + 'a,
    {
        Self::with_config(body, &default_config())
    }

    pub fn with_config<F>(body: F, config: &CoroutineConfig) -> Result<Self>
    where
        F: FnOnce(&mut Yielder<'_, Y>) -> Result<()> + 'a,
    {
        config.validate()?;
        let live = stats::live_coroutines();
        if live >= config.max_live {
            return Err(SeqError::ResourceExhausted(format!(
                "{} live coroutines on this thread (limit {})",
                live, config.max_live
            )));
        }

        let id = CoroutineId(NEXT_COROUTINE_ID.fetch_add(1, Ordering::Relaxed));
        let state = Rc::new(Cell::new(CoroutineState::Created));
        let body_state = Rc::clone(&state);
        let words = config.stack_words();

        // The generator layer panics if it cannot map the stack.
        let allocated = panic::catch_unwind(AssertUnwindSafe(move || {
            Gn::<()>::new_scoped_opt_local(words, move |mut scope| {
                let mut switch = |value: Option<Y>| scope.yield_with(Transfer::Suspended(value));
                let mut yielder = Yielder {
                    switch: &mut switch,
                    state: &body_state,
                };
                Transfer::Finished(run_body(body, &mut yielder))
            })
        }));
        let context = allocated.map_err(|payload| {
            SeqError::ResourceExhausted(format!(
                "allocating a {} byte stack failed: {}",
                config.stack_size,
                format_panic_payload(payload.as_ref())
            ))
        })?;

        stats::record_created();
        trace!(coroutine = %id, stack_size = config.stack_size, "coroutine created");
        Ok(Coroutine {
            id,
            state,
            context: Some(context),
            yielded: None,
        })
    }

    /// Transfer control into the body until it suspends or finishes.
    ///
    /// Returns `Ok(true)` if the body suspended and wants to continue,
    /// `Ok(false)` once it has finished. A failure inside the body is
    /// returned (or, for panics, re-raised) from the call that observes it.
    pub fn resume(&mut self) -> Result<bool> {
        match self.state.get() {
            CoroutineState::Stopped => return Ok(false),
            CoroutineState::StopPending => {
                return match self.force_stop() {
                    Some(outcome) => self.finish(outcome, false),
                    None => {
                        self.abandon(false);
                        Ok(false)
                    }
                };
            }
            CoroutineState::Created => {
                self.state.set(CoroutineState::Running);
                trace!(coroutine = %self.id, "coroutine started");
            }
            CoroutineState::Running => {}
        }

        match self.switch_in() {
            Some(Transfer::Suspended(value)) => {
                self.yielded = value;
                Ok(self.state.get() == CoroutineState::Running)
            }
            Some(Transfer::Finished(outcome)) => self.finish(outcome, false),
            None => {
                self.abandon(false);
                Ok(false)
            }
        }
    }

    /// Value handed over by the last `emit`, if not taken yet.
    pub fn yielded(&self) -> Option<&Y> {
        self.yielded.as_ref()
    }

    pub fn take_yielded(&mut self) -> Option<Y> {
        self.yielded.take()
    }

    pub fn id(&self) -> CoroutineId {
        self.id
    }

    pub fn state(&self) -> CoroutineState {
        self.state.get()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.get() == CoroutineState::Stopped
    }

    fn switch_in(&mut self) -> Option<Transfer<Y>> {
        let id = self.id;
        let context = self.context.as_mut()?;
        let _active = ActiveGuard::enter(id);
        context.resume()
    }

    /// Resume one last time in `StopPending` so the suspension point raises
    /// the stop signal. `None` if there was no context to resume or the body
    /// swallowed the signal and suspended again.
    fn force_stop(&mut self) -> Option<Outcome> {
        self.state.set(CoroutineState::StopPending);
        match self.switch_in() {
            Some(Transfer::Finished(outcome)) => Some(outcome),
            Some(Transfer::Suspended(_)) => {
                warn!(coroutine = %self.id, "body suspended again after the stop signal; cancelling its context");
                None
            }
            None => None,
        }
    }

    fn finish(&mut self, outcome: Outcome, forced: bool) -> Result<bool> {
        self.state.set(CoroutineState::Stopped);
        self.yielded = None;
        self.release();
        match outcome {
            Outcome::Completed => {
                stats::record_completed();
                trace!(coroutine = %self.id, "coroutine completed");
                Ok(false)
            }
            Outcome::Stopped => {
                stats::record_stopped(forced);
                trace!(coroutine = %self.id, forced, "coroutine stopped");
                Ok(false)
            }
            Outcome::Failed(Failure::Error(err)) => {
                stats::record_failed();
                debug!(coroutine = %self.id, error = %err, "body failed");
                Err(err)
            }
            Outcome::Failed(Failure::Panic(payload)) => {
                stats::record_failed();
                debug!(
                    coroutine = %self.id,
                    panic = %format_panic_payload(payload.as_ref()),
                    "body panicked; re-raising in resumer"
                );
                panic::resume_unwind(payload)
            }
        }
    }

    /// Stop without an outcome from the body.
    fn abandon(&mut self, forced: bool) {
        self.state.set(CoroutineState::Stopped);
        self.yielded = None;
        self.release();
        stats::record_stopped(forced);
    }

    /// Free the execution context.
    fn release(&mut self) {
        if self.context.take().is_some() {
            stats::record_freed();
        }
    }
}

impl<Y> Drop for Coroutine<'_, Y> {
    fn drop(&mut self) {
        debug_assert!(
            !is_active(self.id),
            "coroutine {} dropped from inside its own body",
            self.id
        );
        let state = self.state.get();
        if matches!(state, CoroutineState::Created | CoroutineState::Stopped) {
            if self.context.take().is_some() {
                stats::record_freed();
            }
            return;
        }

        let forced = state == CoroutineState::Running;
        if std::thread::panicking()
            && STOP_UNWINDS.with(|n| n.get()) == 0
            && current_id().is_none()
        {
            // A panic in the top-level owner: no second unwind, same rule as
            // the generator layer. The stack is freed without running the
            // body's destructors. Inside a body the panic stops at that
            // body's boundary, so upstream bodies still get unwound.
            debug!(coroutine = %self.id, "owner is panicking; freeing context without unwinding");
            self.state.set(CoroutineState::Stopped);
            if self.context.take().is_some() {
                stats::record_freed();
            }
            return;
        }

        if forced {
            debug!(coroutine = %self.id, "dropping suspended coroutine; forcing unwind");
        }
        self.state.set(CoroutineState::StopPending);
        let outcome = match self.context.as_mut() {
            Some(context) => {
                let _active = ActiveGuard::enter(self.id);
                context.resume()
            }
            None => None,
        };
        self.state.set(CoroutineState::Stopped);
        self.yielded = None;
        if self.context.take().is_some() {
            stats::record_freed();
        }
        match outcome {
            Some(Transfer::Finished(Outcome::Completed)) => stats::record_completed(),
            Some(Transfer::Finished(Outcome::Stopped)) => stats::record_stopped(forced),
            Some(Transfer::Finished(Outcome::Failed(failure))) => {
                stats::record_failed();
                let reason = match &failure {
                    Failure::Error(err) => err.to_string(),
                    Failure::Panic(payload) => format_panic_payload(payload.as_ref()),
                };
                warn!(coroutine = %self.id, %reason, "failure during forced unwind discarded");
            }
            Some(Transfer::Suspended(_)) => {
                warn!(coroutine = %self.id, "body suspended again after the stop signal; context cancelled");
                stats::record_stopped(forced);
            }
            None => stats::record_stopped(forced),
        }
    }
}

impl<Y> fmt::Debug for Coroutine<'_, Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .finish()
    }
}

/// Innermost coroutine executing on this thread, if any.
pub fn current_id() -> Option<CoroutineId> {
    ACTIVE.with(|active| active.borrow().last().copied())
}

fn is_active(id: CoroutineId) -> bool {
    ACTIVE.with(|active| active.borrow().contains(&id))
}

struct ActiveGuard;

impl ActiveGuard {
    fn enter(id: CoroutineId) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(id));
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

fn run_body<Y, F>(body: F, yielder: &mut Yielder<'_, Y>) -> Outcome
where
    F: FnOnce(&mut Yielder<'_, Y>) -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| body(yielder))) {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(err)) => Outcome::Failed(Failure::Error(err)),
        Err(payload) if payload.is::<StopSignal>() => {
            STOP_UNWINDS.with(|n| n.set(n.get().saturating_sub(1)));
            Outcome::Stopped
        }
        // The generator layer's own cancellation has to reach it untouched.
        Err(payload) if payload.is::<generator::Error>() => panic::resume_unwind(payload),
        Err(payload) => Outcome::Failed(Failure::Panic(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting(n: i32) -> Coroutine<'static, i32> {
        Coroutine::new(move |y| {
            for i in 0..n {
                y.emit(i);
            }
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn test_body_does_not_run_before_resume() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let co: Coroutine<'_, ()> = Coroutine::new(move |_| {
            flag.set(true);
            Ok(())
        })
        .unwrap();
        assert_eq!(co.state(), CoroutineState::Created);
        assert!(!ran.get());
        drop(co);
        assert!(!ran.get());
    }

    #[test]
    fn test_resume_yields_in_order() {
        let mut co = counting(3);
        let mut seen = Vec::new();
        while co.resume().unwrap() {
            assert_eq!(co.state(), CoroutineState::Running);
            seen.push(co.take_yielded().unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(co.is_stopped());
    }

    #[test]
    fn test_resume_after_stop_is_noop() {
        let mut co = counting(1);
        assert!(co.resume().unwrap());
        assert!(!co.resume().unwrap());
        assert!(!co.resume().unwrap());
        assert!(!co.resume().unwrap());
        assert_eq!(co.state(), CoroutineState::Stopped);
    }

    #[test]
    fn test_locals_survive_suspension() {
        let mut co = Coroutine::new(|y| {
            let mut acc = String::new();
            for word in ["a", "b", "c"] {
                acc.push_str(word);
                y.emit(acc.clone());
            }
            Ok(())
        })
        .unwrap();
        let mut seen = Vec::new();
        while co.resume().unwrap() {
            seen.push(co.take_yielded().unwrap());
        }
        assert_eq!(seen, vec!["a", "ab", "abc"]);
    }

    #[test]
    fn test_error_surfaces_on_failing_resume() {
        let mut co = Coroutine::new(|y| {
            y.emit(1);
            Err(SeqError::invalid_operation("boom"))
        })
        .unwrap();
        assert!(co.resume().unwrap());
        assert_eq!(co.take_yielded(), Some(1));
        let err = co.resume().unwrap_err();
        assert!(matches!(err, SeqError::InvalidOperation(ref m) if m == "boom"));
        assert!(co.is_stopped());
        assert!(!co.resume().unwrap());
    }

    #[test]
    fn test_panic_reraised_in_resumer() {
        let mut co: Coroutine<'_, i32> = Coroutine::new(|y| {
            y.emit(1);
            panic!("inside body");
        })
        .unwrap();
        assert!(co.resume().unwrap());
        let caught = panic::catch_unwind(AssertUnwindSafe(|| co.resume()));
        let payload = caught.unwrap_err();
        assert_eq!(format_panic_payload(payload.as_ref()), "inside body");
        assert!(co.is_stopped());
        assert!(!co.resume().unwrap());
    }

    #[test]
    fn test_suspend_false_ends_sequence() {
        let after_stop = Rc::new(Cell::new(false));
        let flag = Rc::clone(&after_stop);
        let mut co = Coroutine::new(move |y| {
            y.emit(1);
            y.suspend(false);
            flag.set(true);
            y.emit(2);
            Ok(())
        })
        .unwrap();
        assert!(co.resume().unwrap());
        assert!(!co.resume().unwrap());
        assert_eq!(co.state(), CoroutineState::StopPending);
        assert!(!co.resume().unwrap());
        assert_eq!(co.state(), CoroutineState::Stopped);
        assert!(!after_stop.get());
    }

    #[test]
    fn test_stop_unwinds_body_on_next_resume() {
        let dropped = Rc::new(Cell::new(false));
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }
        let flag = Flag(Rc::clone(&dropped));
        let mut co: Coroutine<'_, i32> = Coroutine::new(move |y| {
            let _guard = flag;
            y.stop()
        })
        .unwrap();
        assert!(!co.resume().unwrap());
        assert!(!dropped.get());
        assert!(!co.resume().unwrap());
        assert!(dropped.get());
    }

    #[test]
    fn test_drop_forces_unwind_of_suspended_body() {
        let log = Rc::new(RefCell::new(Vec::new()));
        struct Noisy(Rc<RefCell<Vec<&'static str>>>);
        impl Drop for Noisy {
            fn drop(&mut self) {
                self.0.borrow_mut().push("unwound");
            }
        }
        let body_log = Rc::clone(&log);
        let before = stats::snapshot();
        let mut co = Coroutine::new(move |y| {
            let _noisy = Noisy(Rc::clone(&body_log));
            y.emit(1);
            body_log.borrow_mut().push("resumed");
            y.emit(2);
            Ok(())
        })
        .unwrap();
        assert!(co.resume().unwrap());
        drop(co);

        assert_eq!(*log.borrow(), vec!["unwound"]);
        let after = stats::snapshot();
        assert_eq!(after.forced_unwinds, before.forced_unwinds + 1);
        assert_eq!(after.live, before.live);
    }

    #[test]
    fn test_drop_unwinds_nested_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        struct Noisy(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl Drop for Noisy {
            fn drop(&mut self) {
                self.1.borrow_mut().push(self.0);
            }
        }
        let inner_log = Rc::clone(&log);
        let outer_log = Rc::clone(&log);
        let mut outer = Coroutine::new(move |y| {
            let _noisy = Noisy("outer", Rc::clone(&outer_log));
            let probe = Rc::clone(&inner_log);
            let mut inner = Coroutine::new(move |iy| {
                let _noisy = Noisy("inner", probe);
                loop {
                    iy.emit(1);
                }
            })?;
            while inner.resume()? {
                y.emit(inner.take_yielded().unwrap_or_default());
            }
            Ok(())
        })
        .unwrap();
        assert!(outer.resume().unwrap());
        drop(outer);

        // The body drops `inner` before its own guard.
        assert_eq!(*log.borrow(), vec!["inner", "outer"]);
        assert_eq!(STOP_UNWINDS.with(|n| n.get()), 0);
    }

    #[test]
    fn test_panic_in_body_unwinds_upstream() {
        let dropped = Rc::new(Cell::new(false));
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }
        let flag = Rc::clone(&dropped);
        let mut outer: Coroutine<'_, i32> = Coroutine::new(move |_| {
            let flag = Rc::clone(&flag);
            let mut inner = Coroutine::new(move |iy| {
                let _flag = Flag(flag);
                loop {
                    iy.emit(1);
                }
            })?;
            inner.resume()?;
            panic!("callback failed");
        })
        .unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| outer.resume()));
        assert!(result.is_err());
        assert!(dropped.get());
        assert_eq!(STOP_UNWINDS.with(|n| n.get()), 0);
    }

    #[test]
    fn test_failure_during_forced_unwind_is_discarded() {
        let before = stats::snapshot();
        let mut co = Coroutine::new(|y| {
            // Swallowing the stop signal turns the unwind into a failure.
            let _ = panic::catch_unwind(AssertUnwindSafe(|| y.emit(1)));
            Err(SeqError::invalid_operation("cleanup failed"))
        })
        .unwrap();
        assert!(co.resume().unwrap());
        drop(co);

        let after = stats::snapshot();
        assert_eq!(after.failed, before.failed + 1);
        assert_eq!(after.live, before.live);
    }

    #[test]
    fn test_live_limit_reports_resource_exhausted() {
        let live = stats::live_coroutines();
        let config = CoroutineConfig::new().with_max_live(live + 1);
        let first = Coroutine::<i32>::with_config(|_| Ok(()), &config).unwrap();
        let second = Coroutine::<i32>::with_config(|_| Ok(()), &config);
        assert!(matches!(second, Err(SeqError::ResourceExhausted(_))));
        drop(first);
        assert!(Coroutine::<i32>::with_config(|_| Ok(()), &config).is_ok());
    }

    #[test]
    fn test_nested_coroutines_track_active_id() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let inner_seen = Rc::clone(&seen);
        let mut outer = Coroutine::new(move |y| {
            let outer_id = current_id();
            let probe = Rc::clone(&inner_seen);
            let mut inner = Coroutine::new(move |iy| {
                probe.borrow_mut().push(current_id());
                iy.emit(10);
                Ok(())
            })?;
            while inner.resume()? {
                let v = inner.take_yielded().unwrap_or_default();
                inner_seen.borrow_mut().push(outer_id);
                y.emit(v + 1);
            }
            Ok(())
        })
        .unwrap();

        assert!(current_id().is_none());
        assert!(outer.resume().unwrap());
        assert_eq!(outer.take_yielded(), Some(11));
        assert!(!outer.resume().unwrap());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        assert_eq!(seen[1], Some(outer.id()));
        assert!(current_id().is_none());
    }

    #[test]
    fn test_failure_crosses_nested_boundaries() {
        let mut outer: Coroutine<'_, i32> = Coroutine::new(|y| {
            let mut inner: Coroutine<'_, i32> =
                Coroutine::new(|_| Err(SeqError::Overflow("inner")))?;
            while inner.resume()? {
                y.emit(0);
            }
            Ok(())
        })
        .unwrap();
        assert!(matches!(outer.resume(), Err(SeqError::Overflow("inner"))));
    }
}
