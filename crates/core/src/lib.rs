//! lazyseq Core: the generator engine underneath lazy sequences
//!
//! This crate provides the pieces that let an ordinary closure act as a
//! "yielding" producer without language support for generators.
//!
//! Key design principles:
//! - Coroutine: a body running on its own stack that suspends back to its
//!   resumer instead of returning
//! - Yielder: the only handle a body has on its coroutine (emit / suspend / stop)
//! - Failures cross the suspension boundary and surface on the resume that
//!   observes them
//!
//! # Modules
//!
//! - `coroutine`: Stackful coroutine primitive and its state machine
//! - `config`: Stack size and live-coroutine limits (builder + environment)
//! - `error`: `SeqError` taxonomy shared by every layer
//! - `stats`: Thread-local coroutine lifecycle counters

pub mod config;
pub mod coroutine;
pub mod error;
pub mod stats;

pub use config::{CoroutineConfig, default_config, set_default_config};
pub use coroutine::{Coroutine, CoroutineId, CoroutineState, Yielder, current_id};
pub use error::{Result, SeqError, format_panic_payload};
pub use stats::CoroutineStats;
