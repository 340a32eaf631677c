//! Combining operators: `concat` and `reverse`

use crate::pipe::forward_all;
use lazyseq_runtime::{AsSeq, Seq};

pub trait CombineOps<T: 'static>: AsSeq<T> {
    /// All of `self`, then all of `other`. `other` is not enumerated until
    /// `self` is exhausted.
    fn concat(&self, other: &Seq<T>) -> Seq<T> {
        let left = self.as_seq().clone();
        let right = other.clone();
        Seq::from_fn(move |sink| {
            forward_all(&left, sink)?;
            forward_all(&right, sink)
        })
    }

    /// The source in reverse order. The whole source is buffered when the
    /// first element is requested.
    fn reverse(&self) -> Seq<T> {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut buffered = source.to_vec()?;
            while let Some(item) = buffered.pop() {
                sink.emit(item);
            }
            Ok(())
        })
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> CombineOps<T> for S {}
