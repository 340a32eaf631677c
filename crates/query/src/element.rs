//! Element operators
//!
//! These run immediately. The plain forms fail with `InvalidOperation` when
//! there is no suitable element; the `_or_none` forms return `Ok(None)`
//! instead. `single` fails on more than one element (or match) in both forms.

use lazyseq_runtime::{AsSeq, Result, SeqError};

pub trait ElementOps<T: 'static>: AsSeq<T> {
    fn first(&self) -> Result<T> {
        self.first_or_none()?.ok_or_else(SeqError::empty_sequence)
    }

    fn first_or_none(&self) -> Result<Option<T>> {
        self.as_seq().get_iterator()?.next().transpose()
    }

    fn first_where(&self, predicate: impl Fn(&T) -> bool) -> Result<T> {
        self.first_where_or_none(predicate)?
            .ok_or_else(SeqError::no_match)
    }

    /// Stops enumerating at the first match.
    fn first_where_or_none(&self, predicate: impl Fn(&T) -> bool) -> Result<Option<T>> {
        for item in self.as_seq().get_iterator()? {
            let item = item?;
            if predicate(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn last(&self) -> Result<T> {
        self.last_or_none()?.ok_or_else(SeqError::empty_sequence)
    }

    fn last_or_none(&self) -> Result<Option<T>> {
        let mut last = None;
        for item in self.as_seq().get_iterator()? {
            last = Some(item?);
        }
        Ok(last)
    }

    fn last_where(&self, predicate: impl Fn(&T) -> bool) -> Result<T> {
        self.last_where_or_none(predicate)?
            .ok_or_else(SeqError::no_match)
    }

    fn last_where_or_none(&self, predicate: impl Fn(&T) -> bool) -> Result<Option<T>> {
        let mut last = None;
        for item in self.as_seq().get_iterator()? {
            let item = item?;
            if predicate(&item) {
                last = Some(item);
            }
        }
        Ok(last)
    }

    fn single(&self) -> Result<T> {
        self.single_or_none()?.ok_or_else(SeqError::empty_sequence)
    }

    /// `Ok(None)` when empty; still an error when there are several elements.
    fn single_or_none(&self) -> Result<Option<T>> {
        let mut iter = self.as_seq().get_iterator()?;
        let Some(only) = iter.next().transpose()? else {
            return Ok(None);
        };
        if iter.advance()? {
            return Err(SeqError::invalid_operation(
                "sequence contained multiple elements",
            ));
        }
        Ok(Some(only))
    }

    fn single_where(&self, predicate: impl Fn(&T) -> bool) -> Result<T> {
        self.single_where_or_none(predicate)?
            .ok_or_else(SeqError::no_match)
    }

    /// Scans the whole sequence; a second match is an error.
    fn single_where_or_none(&self, predicate: impl Fn(&T) -> bool) -> Result<Option<T>> {
        let mut found = None;
        for item in self.as_seq().get_iterator()? {
            let item = item?;
            if predicate(&item) {
                if found.is_some() {
                    return Err(SeqError::invalid_operation(
                        "sequence contained multiple matching elements",
                    ));
                }
                found = Some(item);
            }
        }
        Ok(found)
    }

    /// Element at zero-based `index`; `ArgumentOutOfRange` if `index` is
    /// negative or past the end.
    fn element_at(&self, index: i32) -> Result<T> {
        self.element_at_or_none(index)?.ok_or_else(|| {
            SeqError::out_of_range("index", format!("no element at index {}", index))
        })
    }

    fn element_at_or_none(&self, index: i32) -> Result<Option<T>> {
        if index < 0 {
            return Ok(None);
        }
        let mut iter = self.as_seq().get_iterator()?;
        for _ in 0..index {
            if !iter.advance()? {
                return Ok(None);
            }
        }
        iter.next().transpose()
    }
}

impl<T: 'static, S: AsSeq<T> + ?Sized> ElementOps<T> for S {}
