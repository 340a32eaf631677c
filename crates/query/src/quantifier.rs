//! Quantifiers and sequence equality
//!
//! All of these short-circuit: enumeration stops as soon as the answer is
//! known, and the abandoned iterator unwinds its producer.

use lazyseq_runtime::{AsSeq, Result, Seq};

pub trait QuantifierOps<T: 'static>: AsSeq<T> {
    /// `true` for an empty sequence.
    fn all(&self, predicate: impl Fn(&T) -> bool) -> Result<bool> {
        for item in self.as_seq().get_iterator()? {
            if !predicate(&item?) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn any(&self, predicate: impl Fn(&T) -> bool) -> Result<bool> {
        self.all(|item| !predicate(item)).map(|all_fail| !all_fail)
    }

    /// `true` if the sequence has at least one element.
    fn has_any(&self) -> Result<bool> {
        self.as_seq().get_iterator()?.advance()
    }

    fn contains(&self, value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        self.any(|item| item == value)
    }

    /// `contains` with a caller-supplied equality; `equals` receives
    /// `(value, element)`.
    fn contains_by(&self, value: &T, equals: impl Fn(&T, &T) -> bool) -> Result<bool> {
        self.any(|item| equals(value, item))
    }

    /// Same length and pairwise equal elements.
    fn sequence_equal(&self, other: &Seq<T>) -> Result<bool>
    where
        T: PartialEq,
    {
        let mut left = self.as_seq().get_iterator()?;
        let mut right = other.get_iterator()?;
        loop {
            let has_left = left.advance()?;
            let has_right = right.advance()?;
            if has_left != has_right {
                return Ok(false);
            }
            if !has_left {
                return Ok(true);
            }
            if left.current() != right.current() {
                return Ok(false);
            }
        }
    }

    /// `sequence_equal` against a slice.
    fn sequence_equal_slice(&self, expected: &[T]) -> Result<bool>
    where
        T: PartialEq,
    {
        let mut iter = self.as_seq().get_iterator()?;
        for want in expected {
            if !iter.advance()? || iter.current() != Some(want) {
                return Ok(false);
            }
        }
        Ok(!iter.advance()?)
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> QuantifierOps<T> for S {}
