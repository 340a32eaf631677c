//! Sequence and iterator capabilities
//!
//! Every source and every operator speaks this pair of traits, so combinators
//! compose the same way whether the data ultimately comes from a vector, a
//! range generator or another combinator.

use lazyseq_core::Result;

/// A deferred definition of an ordered element stream.
///
/// Implementations must be cheap to share: building one performs no work,
/// only `get_iterator` followed by `advance` does.
pub trait Enumerable<T>: Send + Sync {
    /// Obtain a fresh, independent cursor over the sequence.
    fn get_iterator(&self) -> Result<Box<dyn Enumerator<T>>>;
}

/// How an iterator was obtained from its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The iterator block's own embedded iterator (first use on the owning thread)
    Embedded,
    /// An iterator over a fresh clone of the block's definition
    Cloned,
    /// Any other enumerator (container sources, custom sources)
    Standalone,
}

/// A single-pass cursor.
///
/// `current` is only meaningful between a successful `advance` and the next
/// one; implementations return `None` outside that window.
pub trait Enumerator<T> {
    /// Move to the next element. `Ok(false)` once exhausted, and on every
    /// call after that.
    fn advance(&mut self) -> Result<bool>;

    fn current(&self) -> Option<&T>;

    /// Move the current element out of the cursor.
    fn take_current(&mut self) -> Option<T>;

    /// Restart from the beginning, if the source supports it. Only container
    /// sources such as `Seq::from_vec` restart; iterator blocks, and so every
    /// operator built on them, always reject `reset`.
    fn reset(&mut self) -> Result<()>;

    fn origin(&self) -> Origin {
        Origin::Standalone
    }
}
