//! Partitioning operators: `take` / `skip` and their `_while` forms
//!
//! Counts are `i32`; a count of zero or less takes nothing (`take`) or skips
//! nothing (`skip`). `take` and `take_while` stop pulling the source as soon
//! as they are done, so they work on unbounded sources.

use crate::pipe::forward_rest;
use lazyseq_runtime::{AsSeq, Seq};

pub trait PartitionOps<T: 'static>: AsSeq<T> {
    fn take(&self, count: i32) -> Seq<T> {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            if count <= 0 {
                return Ok(());
            }
            let mut iter = source.get_iterator()?;
            let mut taken = 0;
            while taken < count && iter.advance()? {
                if let Some(item) = iter.take_current() {
                    sink.emit(item);
                }
                taken += 1;
            }
            Ok(())
        })
    }

    /// Leading elements while `predicate` holds; ends at the first element
    /// that fails it.
    fn take_while<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.take_while_indexed(move |item, _| predicate(item))
    }

    fn take_while_indexed<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut iter = source.get_iterator()?;
            let mut index = 0;
            while iter.advance()? {
                let Some(item) = iter.take_current() else {
                    continue;
                };
                if !predicate(&item, index) {
                    sink.stop();
                }
                index += 1;
                sink.emit(item);
            }
            Ok(())
        })
    }

    fn skip(&self, count: i32) -> Seq<T> {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut iter = source.get_iterator()?;
            for _ in 0..count {
                if !iter.advance()? {
                    return Ok(());
                }
            }
            forward_rest(&mut iter, sink)
        })
    }

    /// Everything from the first element for which `predicate` fails.
    fn skip_while<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.skip_while_indexed(move |item, _| predicate(item))
    }

    fn skip_while_indexed<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut iter = source.get_iterator()?;
            let mut index = 0;
            while iter.advance()? {
                let Some(item) = iter.take_current() else {
                    continue;
                };
                if !predicate(&item, index) {
                    sink.emit(item);
                    break;
                }
                index += 1;
            }
            forward_rest(&mut iter, sink)
        })
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> PartitionOps<T> for S {}
