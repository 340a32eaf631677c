//! Seen-element lookups for the set operators
//!
//! Three ways to decide that two elements are "the same":
//! - `OrdLookup`: the element's own `Ord`
//! - `ComparerLookup`: an explicit total order; `Equal` means duplicate
//! - `KeyLookup`: a projected `Hash + Eq` key
//!
//! A lookup is built fresh for every enumeration, so repeated enumeration of
//! a set operator starts from an empty lookup.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::sync::Arc;

pub(crate) trait Lookup<T> {
    /// Record `item`; `true` if it had not been seen before.
    fn insert(&mut self, item: &T) -> bool;
}

pub(crate) struct OrdLookup<T> {
    seen: BTreeSet<T>,
}

impl<T> OrdLookup<T> {
    pub(crate) fn new() -> Self {
        OrdLookup {
            seen: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> Lookup<T> for OrdLookup<T> {
    fn insert(&mut self, item: &T) -> bool {
        if self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.clone())
    }
}

pub(crate) type Comparer<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

/// Kept sorted under `compare`, so membership is a binary search.
pub(crate) struct ComparerLookup<T> {
    seen: Vec<T>,
    compare: Arc<Comparer<T>>,
}

impl<T> ComparerLookup<T> {
    pub(crate) fn new(compare: Arc<Comparer<T>>) -> Self {
        ComparerLookup {
            seen: Vec::new(),
            compare,
        }
    }
}

impl<T: Clone> Lookup<T> for ComparerLookup<T> {
    fn insert(&mut self, item: &T) -> bool {
        match self
            .seen
            .binary_search_by(|probe| (self.compare)(probe, item))
        {
            Ok(_) => false,
            Err(pos) => {
                self.seen.insert(pos, item.clone());
                true
            }
        }
    }
}

pub(crate) type KeySelector<T, K> = dyn Fn(&T) -> K + Send + Sync;

pub(crate) struct KeyLookup<T, K> {
    seen: HashSet<K>,
    key: Arc<KeySelector<T, K>>,
}

impl<T, K> KeyLookup<T, K> {
    pub(crate) fn new(key: Arc<KeySelector<T, K>>) -> Self {
        KeyLookup {
            seen: HashSet::new(),
            key,
        }
    }
}

impl<T, K: Hash + Eq> Lookup<T> for KeyLookup<T, K> {
    fn insert(&mut self, item: &T) -> bool {
        self.seen.insert((self.key)(item))
    }
}
