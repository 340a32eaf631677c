//! Error Taxonomy
//!
//! Every fault a sequence can report to its consumer is a [`SeqError`].
//!
//! Construction-time validation (bad counts, bad configuration) is reported
//! immediately by the constructor. Everything that depends on sequence
//! content (emptiness, overflow, failures inside producer bodies) is deferred
//! and surfaces on the `advance()` call that would have produced the element.
//!
//! Panics raised by user callbacks are the other kind of opaque failure. They
//! are not converted into `SeqError`: the coroutine boundary captures the
//! payload and re-raises it in the consumer with `resume_unwind`.

use std::any::Any;
use thiserror::Error;

/// Canonical result for sequence operations.
pub type Result<T> = std::result::Result<T, SeqError>;

#[derive(Debug, Error)]
pub enum SeqError {
    /// A required argument is malformed (e.g. a configuration value that
    /// does not parse).
    #[error("invalid argument `{name}`: {reason}")]
    ArgumentInvalid { name: &'static str, reason: String },

    /// A positional or count argument violates its documented bound.
    #[error("argument `{name}` out of range: {reason}")]
    ArgumentOutOfRange { name: &'static str, reason: String },

    /// Sequence contract violation: empty where an element is required,
    /// several matches where exactly one is required, or `reset()`.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An accumulated count or sum left the range of its result type.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// The coroutine primitive could not allocate an execution context.
    #[error("coroutine context unavailable: {0}")]
    ResourceExhausted(String),

    /// Opaque failure returned by a user producer body.
    #[error("producer failed: {0}")]
    Producer(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SeqError {
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        SeqError::InvalidOperation(msg.into())
    }

    pub fn out_of_range(name: &'static str, reason: impl Into<String>) -> Self {
        SeqError::ArgumentOutOfRange {
            name,
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        SeqError::ArgumentInvalid {
            name,
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary error raised inside a producer body.
    pub fn producer(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        SeqError::Producer(err.into())
    }

    /// The "Sequence was empty" fault used by element and aggregate operators.
    pub fn empty_sequence() -> Self {
        SeqError::invalid_operation("sequence was empty")
    }

    pub fn no_match() -> Self {
        SeqError::invalid_operation("no items matched the predicate")
    }

    pub fn reset_unsupported() -> Self {
        SeqError::invalid_operation("reset is not supported; obtain a fresh iterator instead")
    }
}

/// Format a panic payload into an error message
pub fn format_panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_panic_payload() {
        let payload: Box<dyn Any + Send> = Box::new("panic message");
        assert_eq!(format_panic_payload(payload.as_ref()), "panic message");

        let payload: Box<dyn Any + Send> = Box::new("owned panic".to_string());
        assert_eq!(format_panic_payload(payload.as_ref()), "owned panic");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(format_panic_payload(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_display_messages() {
        let err = SeqError::out_of_range("count", "must be non-negative, got -1");
        assert_eq!(
            err.to_string(),
            "argument `count` out of range: must be non-negative, got -1"
        );
        assert_eq!(
            SeqError::Overflow("count").to_string(),
            "arithmetic overflow in count"
        );
        assert_eq!(
            SeqError::empty_sequence().to_string(),
            "invalid operation: sequence was empty"
        );
    }

    #[test]
    fn test_producer_error_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let err = SeqError::producer(io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("disk on fire"));
    }
}
