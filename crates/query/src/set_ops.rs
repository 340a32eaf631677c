//! Set operators: `distinct`, `union`, `except`
//!
//! Each comes in three flavours that differ only in how duplicates are
//! recognised (see [`crate::lookup`]):
//! - plain: the element's `Ord`
//! - `_by`: an explicit total order, `Equal` meaning duplicate
//! - `_by_key`: a `Hash + Eq` key projected from the element
//!
//! Results keep the first occurrence of each element, in source order.

use crate::lookup::{Comparer, ComparerLookup, KeyLookup, KeySelector, Lookup, OrdLookup};
use lazyseq_runtime::{AsSeq, Seq};
use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;

fn distinct_with<T, L, M>(source: Seq<T>, new_lookup: M) -> Seq<T>
where
    T: 'static,
    L: Lookup<T>,
    M: Fn() -> L + Send + Sync + 'static,
{
    Seq::from_fn(move |sink| {
        let mut seen = new_lookup();
        source.try_for_each(|item| {
            if seen.insert(&item) {
                sink.emit(item);
            }
            Ok(())
        })
    })
}

fn union_with<T, L, M>(left: Seq<T>, right: Seq<T>, new_lookup: M) -> Seq<T>
where
    T: 'static,
    L: Lookup<T>,
    M: Fn() -> L + Send + Sync + 'static,
{
    Seq::from_fn(move |sink| {
        let mut seen = new_lookup();
        for side in [&left, &right] {
            side.try_for_each(|item| {
                if seen.insert(&item) {
                    sink.emit(item);
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

/// `right` is drained into the banned set on the first pull; `left` is then
/// streamed, and every element it yields is banned too.
fn except_with<T, L, M>(left: Seq<T>, right: Seq<T>, new_lookup: M) -> Seq<T>
where
    T: 'static,
    L: Lookup<T>,
    M: Fn() -> L + Send + Sync + 'static,
{
    Seq::from_fn(move |sink| {
        let mut banned = new_lookup();
        right.for_each(|item| {
            banned.insert(&item);
        })?;
        left.try_for_each(|item| {
            if banned.insert(&item) {
                sink.emit(item);
            }
            Ok(())
        })
    })
}

fn comparer<T, C>(compare: C) -> Arc<Comparer<T>>
where
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    Arc::new(compare)
}

fn key_selector<T, K, F>(key: F) -> Arc<KeySelector<T, K>>
where
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    Arc::new(key)
}

pub trait SetOps<T: 'static>: AsSeq<T> {
    fn distinct(&self) -> Seq<T>
    where
        T: Ord + Clone,
    {
        distinct_with(self.as_seq().clone(), OrdLookup::new)
    }

    fn distinct_by<C>(&self, compare: C) -> Seq<T>
    where
        T: Clone,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let compare = comparer(compare);
        distinct_with(self.as_seq().clone(), move || {
            ComparerLookup::new(Arc::clone(&compare))
        })
    }

    fn distinct_by_key<K, F>(&self, key: F) -> Seq<T>
    where
        K: Hash + Eq + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = key_selector(key);
        distinct_with(self.as_seq().clone(), move || KeyLookup::new(Arc::clone(&key)))
    }

    /// Distinct elements of `self`, then distinct elements of `other` not
    /// already produced.
    fn union(&self, other: &Seq<T>) -> Seq<T>
    where
        T: Ord + Clone,
    {
        union_with(self.as_seq().clone(), other.clone(), OrdLookup::new)
    }

    fn union_by<C>(&self, other: &Seq<T>, compare: C) -> Seq<T>
    where
        T: Clone,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let compare = comparer(compare);
        union_with(self.as_seq().clone(), other.clone(), move || {
            ComparerLookup::new(Arc::clone(&compare))
        })
    }

    fn union_by_key<K, F>(&self, other: &Seq<T>, key: F) -> Seq<T>
    where
        K: Hash + Eq + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = key_selector(key);
        union_with(self.as_seq().clone(), other.clone(), move || {
            KeyLookup::new(Arc::clone(&key))
        })
    }

    /// Distinct elements of `self` that do not appear in `other`.
    fn except(&self, other: &Seq<T>) -> Seq<T>
    where
        T: Ord + Clone,
    {
        except_with(self.as_seq().clone(), other.clone(), OrdLookup::new)
    }

    fn except_by<C>(&self, other: &Seq<T>, compare: C) -> Seq<T>
    where
        T: Clone,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let compare = comparer(compare);
        except_with(self.as_seq().clone(), other.clone(), move || {
            ComparerLookup::new(Arc::clone(&compare))
        })
    }

    fn except_by_key<K, F>(&self, other: &Seq<T>, key: F) -> Seq<T>
    where
        K: Hash + Eq + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = key_selector(key);
        except_with(self.as_seq().clone(), other.clone(), move || {
            KeyLookup::new(Arc::clone(&key))
        })
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> SetOps<T> for S {}
