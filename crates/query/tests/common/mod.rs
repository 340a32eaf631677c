//! Shared fixtures for the operator integration tests

#![allow(dead_code)]

use lazyseq_query::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A source that fails as soon as anything asks it for an iterator.
pub struct ThrowingEnumerable;

impl Enumerable<i32> for ThrowingEnumerable {
    fn get_iterator(&self) -> Result<Box<dyn Enumerator<i32>>> {
        Err(SeqError::invalid_operation("source must not be enumerated"))
    }
}

pub fn throwing() -> Seq<i32> {
    Seq::from_enumerable(Arc::new(ThrowingEnumerable))
}

/// Building `query` over a throwing source must succeed, as must obtaining
/// its iterator; the failure appears on the first `advance`.
pub fn assert_deferred<U: 'static>(query: impl FnOnce(Seq<i32>) -> Seq<U>) {
    let result = query(throwing());
    let mut iter = result
        .get_iterator()
        .expect("obtaining the iterator must not touch the source");
    assert!(matches!(
        iter.advance(),
        Err(SeqError::InvalidOperation(_))
    ));
}

/// An unbounded source counting how many elements were pulled from it.
pub fn counted_naturals() -> (Seq<i32>, Arc<AtomicUsize>) {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let seq = Seq::from_fn(move |sink| {
        let mut n = 0;
        loop {
            counter.fetch_add(1, Ordering::SeqCst);
            sink.emit(n);
            n += 1;
        }
    });
    (seq, pulled)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
