//! lazyseq Query: LINQ-style operators over lazy sequences
//!
//! Operators are extension traits implemented for every `Seq<T>`; bring
//! them into scope with the prelude.
//!
//! ```rust
//! use lazyseq_query::prelude::*;
//!
//! let evens = Seq::range(1, 10)
//!     .unwrap()
//!     .filter(|x| x % 2 == 0)
//!     .map(|x| x * x);
//! assert_eq!(evens.take(3).to_vec().unwrap(), vec![4, 16, 36]);
//! ```
//!
//! Producing operators (`filter`, `map`, `take`, `union`, ...) only capture
//! their inputs; nothing is evaluated, and nothing can fail, until the result
//! is enumerated. Terminal operators (`first`, `count`, `sum`, ...) enumerate
//! immediately and stop as soon as their answer is known.
//!
//! # Modules
//!
//! - `filter`: `filter`, `filter_indexed`
//! - `projection`: `map` and `flat_map` families
//! - `partition`: `take`, `skip` and their `_while` forms
//! - `combine`: `concat`, `reverse`
//! - `set_ops`: `distinct`, `union`, `except` (by `Ord`, comparator or key)
//! - `element`: `first`, `last`, `single`, `element_at` and `_or_none` forms
//! - `quantifier`: `all`, `any`, `contains`, `sequence_equal`
//! - `aggregate`: folds, counts, `sum`, `average`, `min`, `max`

pub mod aggregate;
pub mod combine;
pub mod element;
pub mod filter;
mod lookup;
mod pipe;
pub mod partition;
pub mod projection;
pub mod quantifier;
pub mod set_ops;

pub use aggregate::{AggregateOps, Numeric};
pub use combine::CombineOps;
pub use element::ElementOps;
pub use filter::FilterOps;
pub use partition::PartitionOps;
pub use projection::ProjectionOps;
pub use quantifier::QuantifierOps;
pub use set_ops::SetOps;

pub mod prelude {
    pub use crate::{
        AggregateOps, CombineOps, ElementOps, FilterOps, Numeric, PartitionOps, ProjectionOps,
        QuantifierOps, SetOps,
    };
    pub use lazyseq_runtime::{AsSeq, Enumerable, Enumerator, Result, Seq, SeqError, SeqIter};
}
