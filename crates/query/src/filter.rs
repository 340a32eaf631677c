//! Filtering operators

use lazyseq_runtime::{AsSeq, Seq};

pub trait FilterOps<T: 'static>: AsSeq<T> {
    /// Elements for which `predicate` holds, in source order.
    fn filter<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            source.try_for_each(|item| {
                if predicate(&item) {
                    sink.emit(item);
                }
                Ok(())
            })
        })
    }

    /// Like `filter`; the predicate also receives the element's position in
    /// the source.
    fn filter_indexed<P>(&self, predicate: P) -> Seq<T>
    where
        P: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        let source = self.as_seq().clone();
        Seq::from_fn(move |sink| {
            let mut index = 0;
            source.try_for_each(|item| {
                if predicate(&item, index) {
                    sink.emit(item);
                }
                index += 1;
                Ok(())
            })
        })
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> FilterOps<T> for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_order() {
        let evens = Seq::range(1, 10).unwrap().filter(|x| x % 2 == 0);
        assert_eq!(evens.to_vec().unwrap(), vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_filter_indexed_sees_source_positions() {
        let seq = Seq::from_vec(vec!["a", "b", "c", "d"]).filter_indexed(|_, i| i % 2 == 1);
        assert_eq!(seq.to_vec().unwrap(), vec!["b", "d"]);
    }
}
