//! Projection operators: `map` and the `flat_map` family
//!
//! The `_with` variants pair every inner element with the outer element it
//! came from through a result selector.

use crate::pipe::forward_all;
use lazyseq_runtime::{AsSeq, Seq};

pub trait ProjectionOps<T: 'static>: AsSeq<T> {
    fn map<U, F>(&self, selector: F) -> Seq<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            source.try_for_each(|item| {
                sink.emit(selector(item));
                Ok(())
            })
        })
    }

    fn map_indexed<U, F>(&self, selector: F) -> Seq<U>
    where
        U: 'static,
        F: Fn(T, usize) -> U + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut index = 0;
            source.try_for_each(|item| {
                sink.emit(selector(item, index));
                index += 1;
                Ok(())
            })
        })
    }

    /// Concatenation of the sequences `selector` returns for each element.
    /// Each inner sequence is enumerated only when the outer one reaches it.
    fn flat_map<U, F>(&self, selector: F) -> Seq<U>
    where
        U: 'static,
        F: Fn(T) -> Seq<U> + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            source.try_for_each(|item| forward_all(&selector(item), sink))
        })
    }

    fn flat_map_indexed<U, F>(&self, selector: F) -> Seq<U>
    where
        U: 'static,
        F: Fn(T, usize) -> Seq<U> + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut index = 0;
            source.try_for_each(|item| {
                let inner = selector(item, index);
                index += 1;
                forward_all(&inner, sink)
            })
        })
    }

    fn flat_map_with<C, U, F, R>(&self, collection: F, result: R) -> Seq<U>
    where
        C: 'static,
        U: 'static,
        F: Fn(&T) -> Seq<C> + Send + Sync + 'static,
        R: Fn(&T, C) -> U + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            source.try_for_each(|item| {
                collection(&item).try_for_each(|inner| {
                    sink.emit(result(&item, inner));
                    Ok(())
                })
            })
        })
    }

    fn flat_map_indexed_with<C, U, F, R>(&self, collection: F, result: R) -> Seq<U>
    where
        C: 'static,
        U: 'static,
        F: Fn(&T, usize) -> Seq<C> + Send + Sync + 'static,
        R: Fn(&T, C) -> U + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut index = 0;
            source.try_for_each(|item| {
                let inner = collection(&item, index);
                index += 1;
                inner.try_for_each(|element| {
                    sink.emit(result(&item, element));
                    Ok(())
                })
            })
        })
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> ProjectionOps<T> for S {}
