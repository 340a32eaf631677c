//! Coroutine configuration
//!
//! Stack size and the per-thread live-coroutine limit. Values come from the
//! builder, or from the environment:
//!
//! - `LAZYSEQ_STACK_SIZE`: coroutine stack size in bytes (default 256KB)
//! - `LAZYSEQ_MAX_COROUTINES`: live coroutines allowed per thread (default 4096)
//!
//! `from_env` warns and falls back to the default on bad values;
//! `try_from_env` reports them.
//!
//! # Example
//!
//! ```rust
//! use lazyseq_core::CoroutineConfig;
//!
//! let config = CoroutineConfig::new()
//!     .with_stack_size(64 * 1024)
//!     .with_max_live(128);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, SeqError};
use std::sync::RwLock;
use tracing::warn;

pub const STACK_SIZE_ENV: &str = "LAZYSEQ_STACK_SIZE";
pub const MAX_COROUTINES_ENV: &str = "LAZYSEQ_MAX_COROUTINES";

/// Default coroutine stack size: 256KB (0x40000 bytes)
pub const DEFAULT_STACK_SIZE: usize = 0x40000;

/// Smallest stack we hand to the generator layer: 16KB
pub const MIN_STACK_SIZE: usize = 0x4000;

/// Largest stack we hand to the generator layer: 64MB
pub const MAX_STACK_SIZE: usize = 0x400_0000;

/// Default number of live coroutines per thread.
pub const DEFAULT_MAX_LIVE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoroutineConfig {
    /// Stack size in bytes for each coroutine context
    pub stack_size: usize,

    /// Maximum number of allocated (not yet freed) coroutines per thread
    pub max_live: usize,
}

impl Default for CoroutineConfig {
    fn default() -> Self {
        CoroutineConfig {
            stack_size: DEFAULT_STACK_SIZE,
            max_live: DEFAULT_MAX_LIVE,
        }
    }
}

impl CoroutineConfig {
    pub fn new() -> Self {
        CoroutineConfig::default()
    }

    /// Set the stack size in bytes (builder pattern)
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Set the per-thread live coroutine limit (builder pattern)
    pub fn with_max_live(mut self, max_live: usize) -> Self {
        self.max_live = max_live;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_STACK_SIZE..=MAX_STACK_SIZE).contains(&self.stack_size) {
            return Err(SeqError::out_of_range(
                "stack_size",
                format!(
                    "{} bytes is outside {}..={}",
                    self.stack_size, MIN_STACK_SIZE, MAX_STACK_SIZE
                ),
            ));
        }
        if self.max_live == 0 {
            return Err(SeqError::out_of_range(
                "max_live",
                "at least one coroutine must be allowed",
            ));
        }
        Ok(())
    }

    /// Stack size in machine words, which is the unit the generator layer
    /// takes. Always even: an odd word count turns on stack usage tracking.
    pub fn stack_words(&self) -> usize {
        (self.stack_size / std::mem::size_of::<usize>()) & !1
    }

    /// Read the configuration from the environment, warning about and
    /// ignoring invalid values.
    pub fn from_env() -> Self {
        CoroutineConfig {
            stack_size: lenient(
                STACK_SIZE_ENV,
                std::env::var(STACK_SIZE_ENV).ok(),
                DEFAULT_STACK_SIZE,
                |v| (MIN_STACK_SIZE..=MAX_STACK_SIZE).contains(&v),
            ),
            max_live: lenient(
                MAX_COROUTINES_ENV,
                std::env::var(MAX_COROUTINES_ENV).ok(),
                DEFAULT_MAX_LIVE,
                |v| v > 0,
            ),
        }
    }

    /// Read the configuration from the environment, failing on invalid values.
    pub fn try_from_env() -> Result<Self> {
        Self::from_values(
            std::env::var(STACK_SIZE_ENV).ok(),
            std::env::var(MAX_COROUTINES_ENV).ok(),
        )
    }

    /// Strict parse of optional raw values (missing means default).
    pub fn from_values(stack_size: Option<String>, max_live: Option<String>) -> Result<Self> {
        let mut config = CoroutineConfig::default();
        if let Some(raw) = stack_size {
            config.stack_size = parse_usize("stack_size", &raw)?;
        }
        if let Some(raw) = max_live {
            config.max_live = parse_usize("max_live", &raw)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(name: &'static str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| SeqError::invalid_argument(name, format!("'{}': {}", raw, e)))
}

/// Parse an optional value, returning the default (with a warning) if the
/// value is not a number or fails `accept`.
fn lenient(
    var: &str,
    value: Option<String>,
    default: usize,
    accept: impl Fn(usize) -> bool,
) -> usize {
    match value {
        Some(val) => match val.trim().parse::<usize>() {
            Ok(n) if accept(n) => n,
            Ok(n) => {
                warn!(var, value = n, default, "value out of range, using default");
                default
            }
            Err(_) => {
                warn!(var, value = %val, default, "value is not a valid number, using default");
                default
            }
        },
        None => default,
    }
}

static DEFAULT_CONFIG: RwLock<Option<CoroutineConfig>> = RwLock::new(None);

/// The process-wide configuration used by `Coroutine::new`.
///
/// Read from the environment on first use unless `set_default_config` ran
/// first.
pub fn default_config() -> CoroutineConfig {
    if let Some(config) = DEFAULT_CONFIG.read().ok().and_then(|guard| *guard) {
        return config;
    }
    let mut guard = match DEFAULT_CONFIG.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard.get_or_insert_with(CoroutineConfig::from_env)
}

/// Replace the process-wide configuration. Coroutines already allocated keep
/// their stacks.
pub fn set_default_config(config: CoroutineConfig) -> Result<()> {
    config.validate()?;
    let mut guard = match DEFAULT_CONFIG.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(config);
    Ok(())
}
