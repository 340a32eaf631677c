//! Aggregation operators
//!
//! `count` is an `i32` and `long_count` an `i64`; both report `Overflow`
//! rather than wrapping. Integer sums use checked addition. `aggregate`,
//! `average`, `min` and `max` need at least one element.

use lazyseq_runtime::{AsSeq, Result, SeqError, SeqIter};

/// Element types `sum` and `average` work over.
pub trait Numeric: Copy {
    const ZERO: Self;

    /// `None` on overflow. Floating point never overflows here.
    fn checked_sum(self, rhs: Self) -> Option<Self>;

    fn to_f64(self) -> f64;
}

macro_rules! integer_numeric {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0;

                fn checked_sum(self, rhs: Self) -> Option<Self> {
                    self.checked_add(rhs)
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

integer_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_numeric {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0.0;

                fn checked_sum(self, rhs: Self) -> Option<Self> {
                    Some(self + rhs)
                }

                fn to_f64(self) -> f64 {
                    f64::from(self)
                }
            }
        )*
    };
}

float_numeric!(f32, f64);

fn sum_values<N: Numeric>(values: impl Iterator<Item = Result<N>>) -> Result<N> {
    let mut total = N::ZERO;
    for value in values {
        total = total
            .checked_sum(value?)
            .ok_or(SeqError::Overflow("sum"))?;
    }
    Ok(total)
}

fn average_values<N: Numeric>(values: impl Iterator<Item = Result<N>>) -> Result<f64> {
    let mut total = 0.0;
    let mut count: u64 = 0;
    for value in values {
        total += value?.to_f64();
        count += 1;
    }
    if count == 0 {
        return Err(SeqError::empty_sequence());
    }
    Ok(total / count as f64)
}

/// The element kept by `replace(best, candidate)`; ties keep the earlier
/// element.
fn extreme<U>(
    mut values: impl Iterator<Item = Result<U>>,
    replace: impl Fn(&U, &U) -> bool,
) -> Result<U> {
    let mut best = match values.next() {
        Some(first) => first?,
        None => return Err(SeqError::empty_sequence()),
    };
    for value in values {
        let value = value?;
        if replace(&best, &value) {
            best = value;
        }
    }
    Ok(best)
}

fn count_matching<T, N>(
    iter: SeqIter<T>,
    predicate: impl Fn(&T) -> bool,
    limit: N,
    what: &'static str,
) -> Result<N>
where
    N: Numeric + PartialEq + std::ops::AddAssign + From<u8>,
{
    let mut count = N::ZERO;
    for item in iter {
        if predicate(&item?) {
            if count == limit {
                return Err(SeqError::Overflow(what));
            }
            count += N::from(1);
        }
    }
    Ok(count)
}

pub trait AggregateOps<T: 'static>: AsSeq<T> {
    /// Left fold seeded with the first element.
    fn aggregate(&self, func: impl Fn(T, T) -> T) -> Result<T> {
        let mut iter = self.as_seq().get_iterator()?;
        let mut acc = match iter.next() {
            Some(first) => first?,
            None => return Err(SeqError::empty_sequence()),
        };
        for item in iter {
            acc = func(acc, item?);
        }
        Ok(acc)
    }

    fn fold<A>(&self, seed: A, func: impl Fn(A, T) -> A) -> Result<A> {
        let mut acc = seed;
        for item in self.as_seq().get_iterator()? {
            acc = func(acc, item?);
        }
        Ok(acc)
    }

    /// `fold`, then `result` on the final accumulator.
    fn fold_map<A, R>(
        &self,
        seed: A,
        func: impl Fn(A, T) -> A,
        result: impl FnOnce(A) -> R,
    ) -> Result<R> {
        self.fold(seed, func).map(result)
    }

    fn count(&self) -> Result<i32> {
        self.count_where(|_| true)
    }

    fn count_where(&self, predicate: impl Fn(&T) -> bool) -> Result<i32> {
        count_matching(self.as_seq().get_iterator()?, predicate, i32::MAX, "count")
    }

    fn long_count(&self) -> Result<i64> {
        self.long_count_where(|_| true)
    }

    fn long_count_where(&self, predicate: impl Fn(&T) -> bool) -> Result<i64> {
        count_matching(
            self.as_seq().get_iterator()?,
            predicate,
            i64::MAX,
            "long_count",
        )
    }

    /// Zero for an empty sequence.
    fn sum(&self) -> Result<T>
    where
        T: Numeric,
    {
        sum_values(self.as_seq().get_iterator()?)
    }

    fn sum_of<N: Numeric>(&self, selector: impl Fn(T) -> N) -> Result<N> {
        sum_values(self.as_seq().get_iterator()?.map(|item| item.map(&selector)))
    }

    fn average(&self) -> Result<f64>
    where
        T: Numeric,
    {
        average_values(self.as_seq().get_iterator()?)
    }

    fn average_of<N: Numeric>(&self, selector: impl Fn(T) -> N) -> Result<f64> {
        average_values(self.as_seq().get_iterator()?.map(|item| item.map(&selector)))
    }

    /// Smallest element; the first one wins ties.
    fn min(&self) -> Result<T>
    where
        T: PartialOrd,
    {
        extreme(self.as_seq().get_iterator()?, |best, item| best > item)
    }

    fn min_of<U: PartialOrd>(&self, selector: impl Fn(T) -> U) -> Result<U> {
        extreme(
            self.as_seq().get_iterator()?.map(|item| item.map(&selector)),
            |best, item| best > item,
        )
    }

    /// Largest element; the first one wins ties.
    fn max(&self) -> Result<T>
    where
        T: PartialOrd,
    {
        extreme(self.as_seq().get_iterator()?, |best, item| best < item)
    }

    fn max_of<U: PartialOrd>(&self, selector: impl Fn(T) -> U) -> Result<U> {
        extreme(
            self.as_seq().get_iterator()?.map(|item| item.map(&selector)),
            |best, item| best < item,
        )
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> AggregateOps<T> for S {}
