//! lazyseq Runtime: deferred-execution sequences
//!
//! A `Seq<T>` is a recipe for producing elements, not a collection. Building
//! one (or chaining operators onto it) does no work; elements are produced
//! one at a time as a consumer advances an iterator.
//!
//! Key design principles:
//! - Iterator blocks: a producer body calls `sink.emit(x)` and runs inside a
//!   coroutine, keeping its loop state between elements
//! - Every `get_iterator` yields an independent cursor; the same sequence can
//!   be enumerated again, interleaved, or from another thread
//! - Failures surface on the `advance` call that reaches them, never earlier
//!
//! # Modules
//!
//! - `enumerable`: The `Enumerable` / `Enumerator` capability traits
//! - `iterator_block`: Sequences defined by a producer body
//! - `seq`: The shareable `Seq` handle and its consumer cursor
//! - `source`: `empty`, `range`, `repeat`, `from_vec`

pub mod enumerable;
pub mod iterator_block;
pub mod seq;
pub mod source;

pub use enumerable::{Enumerable, Enumerator, Origin};
pub use iterator_block::{IteratorBlock, Sink};
pub use lazyseq_core::{CoroutineConfig, Result, SeqError};
pub use seq::{AsSeq, Seq, SeqIter};
