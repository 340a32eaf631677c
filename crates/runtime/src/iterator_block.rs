//! IteratorBlock - a sequence defined by a suspendable producer body
//!
//! The producer body is a plain function that calls `sink.emit(x)` for every
//! element. Each enumeration runs the body in its own [`Coroutine`], so the
//! body keeps its loop state across elements without any hand-written state
//! machine.
//!
//! ## Re-entrancy
//!
//! A block carries one embedded iterator role, owned by the thread that
//! built the block. The first `get_iterator` on that thread takes the
//! embedded role. Every other request (a second enumeration, or any request
//! from another thread) is served by a fresh copy of the block's definition,
//! owned by the calling thread. Either way the caller gets an independent
//! cursor with its own coroutine; the distinction is visible through
//! [`Origin`].
//!
//! Coroutine-backed cursors are `!Send`: they are advanced only on the thread
//! that obtained them.

use crate::enumerable::{Enumerable, Enumerator, Origin};
use lazyseq_core::{Coroutine, CoroutineConfig, Result, SeqError, Yielder, default_config};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use tracing::trace;

/// The handle a producer body emits elements through.
pub type Sink<'s, T> = Yielder<'s, T>;

type Producer<T> = dyn Fn(&mut Sink<'_, T>) -> Result<()> + Send + Sync;

pub struct IteratorBlock<T> {
    producer: Arc<Producer<T>>,
    owner: ThreadId,
    vended: AtomicBool,
    config: Option<CoroutineConfig>,
}

impl<T: 'static> IteratorBlock<T> {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Sink<'_, T>) -> Result<()> + Send + Sync + 'static,
    {
        IteratorBlock {
            producer: Arc::new(body),
            owner: thread::current().id(),
            vended: AtomicBool::new(false),
            config: None,
        }
    }

    /// Run this block's coroutines with `config` instead of the process-wide
    /// default.
    pub fn with_config(mut self, config: CoroutineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether the embedded iterator role has been handed out.
    pub fn is_vended(&self) -> bool {
        self.vended.load(Ordering::Acquire)
    }

    /// A copy of the definition owned by the calling thread, with its
    /// embedded role still available.
    fn clone_definition(&self) -> Self {
        IteratorBlock {
            producer: Arc::clone(&self.producer),
            owner: thread::current().id(),
            vended: AtomicBool::new(false),
            config: self.config,
        }
    }

    fn start(&self, origin: Origin) -> Result<BlockIter<T>> {
        let producer = Arc::clone(&self.producer);
        let config = match self.config {
            Some(config) => config,
            None => default_config(),
        };
        let coroutine = Coroutine::with_config(
            move |sink: &mut Sink<'_, T>| (*producer)(sink),
            &config,
        )?;
        trace!(coroutine = %coroutine.id(), ?origin, "iterator block started");
        Ok(BlockIter {
            coroutine,
            current: None,
            origin,
        })
    }
}

impl<T: 'static> Enumerable<T> for IteratorBlock<T> {
    fn get_iterator(&self) -> Result<Box<dyn Enumerator<T>>> {
        if thread::current().id() == self.owner && !self.vended.swap(true, Ordering::AcqRel) {
            return Ok(Box::new(self.start(Origin::Embedded)?));
        }
        let copy = self.clone_definition();
        copy.vended.store(true, Ordering::Release);
        Ok(Box::new(copy.start(Origin::Cloned)?))
    }
}

impl<T> fmt::Debug for IteratorBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IteratorBlock")
            .field("owner", &self.owner)
            .field("vended", &self.vended.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}

/// Cursor over one run of a producer body.
struct BlockIter<T: 'static> {
    coroutine: Coroutine<'static, T>,
    current: Option<T>,
    origin: Origin,
}

impl<T: 'static> Enumerator<T> for BlockIter<T> {
    fn advance(&mut self) -> Result<bool> {
        self.current = None;
        // A suspension without a value is not an element.
        loop {
            if !self.coroutine.resume()? {
                return Ok(false);
            }
            if let Some(item) = self.coroutine.take_yielded() {
                self.current = Some(item);
                return Ok(true);
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn reset(&mut self) -> Result<()> {
        Err(SeqError::reset_unsupported())
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyseq_core::CoroutineStats;
    use std::sync::atomic::AtomicUsize;

    fn counter_block(n: i32, runs: Arc<AtomicUsize>) -> IteratorBlock<i32> {
        IteratorBlock::new(move |sink| {
            runs.fetch_add(1, Ordering::SeqCst);
            for i in 0..n {
                sink.emit(i);
            }
            Ok(())
        })
    }

    fn drain(iter: &mut dyn Enumerator<i32>) -> Vec<i32> {
        let mut out = Vec::new();
        while iter.advance().unwrap() {
            out.push(*iter.current().unwrap());
        }
        out
    }

    #[test]
    fn test_first_iterator_is_embedded() {
        let runs = Arc::new(AtomicUsize::new(0));
        let block = counter_block(3, Arc::clone(&runs));
        assert!(!block.is_vended());

        let mut first = block.get_iterator().unwrap();
        assert_eq!(first.origin(), Origin::Embedded);
        assert!(block.is_vended());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let mut second = block.get_iterator().unwrap();
        assert_eq!(second.origin(), Origin::Cloned);

        assert_eq!(drain(first.as_mut()), vec![0, 1, 2]);
        assert_eq!(drain(second.as_mut()), vec![0, 1, 2]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_interleaved_iterators_are_isolated() {
        let block = counter_block(4, Arc::new(AtomicUsize::new(0)));
        let mut a = block.get_iterator().unwrap();
        let mut b = block.get_iterator().unwrap();

        assert!(a.advance().unwrap());
        assert!(a.advance().unwrap());
        assert!(b.advance().unwrap());
        assert_eq!(a.current(), Some(&1));
        assert_eq!(b.current(), Some(&0));
    }

    #[test]
    fn test_other_thread_gets_clone() {
        let block = Arc::new(counter_block(2, Arc::new(AtomicUsize::new(0))));
        let remote = Arc::clone(&block);
        let (origin, items) = thread::spawn(move || {
            let mut iter = remote.get_iterator().unwrap();
            (iter.origin(), drain(iter.as_mut()))
        })
        .join()
        .unwrap();

        assert_eq!(origin, Origin::Cloned);
        assert_eq!(items, vec![0, 1]);
        // The embedded role is still available to the owner.
        assert!(!block.is_vended());
        assert_eq!(block.get_iterator().unwrap().origin(), Origin::Embedded);
    }

    #[test]
    fn test_valueless_suspension_is_skipped() {
        let block = IteratorBlock::new(|sink| {
            sink.suspend(true);
            sink.emit(7);
            sink.suspend(true);
            Ok(())
        });
        let mut iter = block.get_iterator().unwrap();
        assert_eq!(drain(iter.as_mut()), vec![7]);
    }

    #[test]
    fn test_reset_is_unsupported() {
        let block = counter_block(1, Arc::new(AtomicUsize::new(0)));
        let mut iter = block.get_iterator().unwrap();
        assert!(iter.advance().unwrap());
        assert!(matches!(iter.reset(), Err(SeqError::InvalidOperation(_))));
        assert!(!iter.advance().unwrap());
    }

    #[test]
    fn test_current_is_cleared_at_end() {
        let block = counter_block(1, Arc::new(AtomicUsize::new(0)));
        let mut iter = block.get_iterator().unwrap();
        assert!(iter.advance().unwrap());
        assert_eq!(iter.current(), Some(&0));
        assert!(!iter.advance().unwrap());
        assert_eq!(iter.current(), None);
        assert!(!iter.advance().unwrap());
    }

    #[test]
    fn test_dropping_iterator_frees_coroutine() {
        let before: CoroutineStats = lazyseq_core::stats::snapshot();
        let block = counter_block(10, Arc::new(AtomicUsize::new(0)));
        let mut iter = block.get_iterator().unwrap();
        assert!(iter.advance().unwrap());
        drop(iter);
        let after = lazyseq_core::stats::snapshot();
        assert_eq!(after.live, before.live);
        assert_eq!(after.forced_unwinds, before.forced_unwinds + 1);
    }
}
