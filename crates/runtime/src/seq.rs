//! Seq - the shareable lazy sequence handle
//!
//! `Seq<T>` wraps any [`Enumerable`] behind an `Arc`. Cloning the handle
//! shares the same definition instance; operators capture clones of their
//! upstream handles and never iterate them at construction time.
//!
//! `SeqIter<T>` is the consumer-side cursor. It is `!Send` when backed by a
//! coroutine, so an iterator can never be advanced from a thread other than
//! the one that obtained it; other threads obtain their own iterator from the
//! (shareable) `Seq`.

use crate::enumerable::{Enumerable, Enumerator, Origin};
use crate::iterator_block::{IteratorBlock, Sink};
use lazyseq_core::{Result, SeqError};
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

pub struct Seq<T> {
    inner: Arc<dyn Enumerable<T>>,
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Seq {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seq")
            .field("definition", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl<T: 'static> Seq<T> {
    /// Wrap a custom source.
    pub fn from_enumerable(source: Arc<dyn Enumerable<T>>) -> Self {
        Seq { inner: source }
    }

    /// Build a sequence from a producer body. Nothing runs until the
    /// sequence is enumerated; the body runs once per enumeration.
    ///
    /// ```rust
    /// use lazyseq_runtime::Seq;
    ///
    /// let squares = Seq::from_fn(|sink| {
    ///     for i in 1..=3 {
    ///         sink.emit(i * i);
    ///     }
    ///     Ok(())
    /// });
    /// assert_eq!(squares.to_vec().unwrap(), vec![1, 4, 9]);
    /// ```
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(&mut Sink<'_, T>) -> Result<()> + Send + Sync + 'static,
    {
        Seq {
            inner: Arc::new(IteratorBlock::new(body)),
        }
    }

    pub fn from_block(block: IteratorBlock<T>) -> Self {
        Seq {
            inner: Arc::new(block),
        }
    }

    pub fn get_iterator(&self) -> Result<SeqIter<T>> {
        Ok(SeqIter::new(self.inner.get_iterator()?))
    }

    pub fn iter(&self) -> Result<SeqIter<T>> {
        self.get_iterator()
    }

    /// Drive the whole sequence, handing each element to `f`.
    pub fn for_each(&self, mut f: impl FnMut(T)) -> Result<()> {
        self.try_for_each(|item| {
            f(item);
            Ok(())
        })
    }

    /// Like `for_each`, stopping at the first error returned by `f`.
    pub fn try_for_each(&self, mut f: impl FnMut(T) -> Result<()>) -> Result<()> {
        let mut iter = self.get_iterator()?;
        while iter.advance()? {
            if let Some(item) = iter.take_current() {
                f(item)?;
            }
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.for_each(|item| items.push(item))?;
        Ok(items)
    }

    /// True if both handles share the same definition instance.
    pub fn ptr_eq(&self, other: &Seq<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Access to the underlying handle; operator traits are implemented on top
/// of this.
pub trait AsSeq<T> {
    fn as_seq(&self) -> &Seq<T>;
}

impl<T> AsSeq<T> for Seq<T> {
    fn as_seq(&self) -> &Seq<T> {
        self
    }
}

/// Consumer cursor over a `Seq`.
///
/// Besides the explicit `advance`/`current` protocol it is a regular
/// `Iterator` yielding `Result<T>`; after an error it is exhausted.
pub struct SeqIter<T> {
    inner: Box<dyn Enumerator<T>>,
    exhausted: bool,
}

impl<T> SeqIter<T> {
    pub fn new(inner: Box<dyn Enumerator<T>>) -> Self {
        SeqIter {
            inner,
            exhausted: false,
        }
    }

    pub fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        match self.inner.advance() {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.exhausted = true;
                Ok(false)
            }
            Err(err) => {
                self.exhausted = true;
                Err(err)
            }
        }
    }

    pub fn current(&self) -> Option<&T> {
        if self.exhausted {
            return None;
        }
        self.inner.current()
    }

    pub fn take_current(&mut self) -> Option<T> {
        if self.exhausted {
            return None;
        }
        self.inner.take_current()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.inner.reset()?;
        self.exhausted = false;
        Ok(())
    }

    pub fn origin(&self) -> Origin {
        self.inner.origin()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<T> Iterator for SeqIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        match self.advance() {
            Ok(true) => match self.inner.take_current() {
                Some(item) => Some(Ok(item)),
                None => {
                    self.exhausted = true;
                    Some(Err(SeqError::invalid_operation(
                        "enumerator advanced without a current element",
                    )))
                }
            },
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> FusedIterator for SeqIter<T> {}

impl<T> fmt::Debug for SeqIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqIter")
            .field("origin", &self.inner.origin())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
