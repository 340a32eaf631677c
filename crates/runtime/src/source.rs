//! Sequence sources
//!
//! Generated sources (`empty`, `range`, `repeat`) are iterator blocks.
//! Container sources (`from_vec`, `collect`) snapshot their elements into a
//! shared slice and enumerate it without a coroutine; their cursors are the
//! only ones that support `reset`.

use crate::enumerable::{Enumerable, Enumerator};
use crate::seq::Seq;
use lazyseq_core::{Result, SeqError};
use std::sync::Arc;

impl<T: Send + Sync + 'static> Seq<T> {
    /// A sequence with no elements.
    pub fn empty() -> Self {
        Seq::from_fn(|sink| sink.stop())
    }

    /// `count` copies of `element`.
    pub fn repeat(element: T, count: i32) -> Result<Self>
    where
        T: Clone,
    {
        if count < 0 {
            return Err(SeqError::out_of_range(
                "count",
                format!("{} is negative", count),
            ));
        }
        Ok(Seq::from_fn(move |sink| {
            for _ in 0..count {
                sink.emit(element.clone());
            }
            Ok(())
        }))
    }

    /// Enumerate a snapshot of `items`. The cursor supports `reset`.
    pub fn from_vec(items: Vec<T>) -> Self
    where
        T: Clone,
    {
        Seq::from_enumerable(Arc::new(VecSource {
            items: items.into(),
        }))
    }
}

impl Seq<i32> {
    /// `count` consecutive integers starting at `start`.
    ///
    /// ```rust
    /// use lazyseq_runtime::Seq;
    ///
    /// assert_eq!(Seq::range(3, 4).unwrap().to_vec().unwrap(), vec![3, 4, 5, 6]);
    /// assert!(Seq::range(i32::MAX, 2).is_err());
    /// ```
    pub fn range(start: i32, count: i32) -> Result<Self> {
        if count < 0 {
            return Err(SeqError::out_of_range(
                "count",
                format!("{} is negative", count),
            ));
        }
        let last = i64::from(start) + i64::from(count) - 1;
        if last > i64::from(i32::MAX) {
            return Err(SeqError::out_of_range(
                "count",
                format!("start {} + count {} runs past i32::MAX", start, count),
            ));
        }
        Ok(Seq::from_fn(move |sink| {
            for offset in 0..count {
                sink.emit(start + offset);
            }
            Ok(())
        }))
    }
}

impl<T: Clone + Send + Sync + 'static> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Seq::from_vec(iter.into_iter().collect())
    }
}

struct VecSource<T> {
    items: Arc<[T]>,
}

impl<T: Clone + Send + Sync + 'static> Enumerable<T> for VecSource<T> {
    fn get_iterator(&self) -> Result<Box<dyn Enumerator<T>>> {
        Ok(Box::new(VecIter {
            items: Arc::clone(&self.items),
            next: 0,
            current: None,
        }))
    }
}

struct VecIter<T> {
    items: Arc<[T]>,
    next: usize,
    current: Option<usize>,
}

impl<T: Clone> Enumerator<T> for VecIter<T> {
    fn advance(&mut self) -> Result<bool> {
        if self.next < self.items.len() {
            self.current = Some(self.next);
            self.next += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.and_then(|index| self.items.get(index))
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take().and_then(|index| self.items.get(index).cloned())
    }

    fn reset(&mut self) -> Result<()> {
        self.next = 0;
        self.current = None;
        Ok(())
    }
}
