//! Error types for allocator construction.
//!
//! Runtime allocation calls never error: failure is always communicated as
//! the null block (see [`Block::NULL`](crate::Block::NULL)), and unrecognized
//! blocks make `deallocate` a no-op and `owns` return `false`. The fallible
//! surface of this crate is configuration — constructors validate their
//! parameters up front, so a bad tree fails at assembly, not mid-allocation.

use thiserror::Error;

/// Result type for allocator construction.
pub type Result<T> = core::result::Result<T, ConfigError>;

/// Invalid allocator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A capacity, batch size, or step of zero was given.
    #[error("{what} must be non-zero")]
    Zero {
        /// Which parameter was zero.
        what: &'static str,
    },

    /// A parameter that must be a power of two was not.
    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Which parameter was invalid.
        what: &'static str,
        /// The offending value.
        value: usize,
    },

    /// A serviceable size range with `min` above `max`.
    #[error("invalid size range: min {min} exceeds max {max}")]
    InvalidSizeRange {
        /// Lower bound of the range.
        min: usize,
        /// Upper bound of the range.
        max: usize,
    },

    /// A bucket span that the step does not divide evenly.
    #[error("step {step} does not evenly divide the {span}-byte bucket span")]
    UnevenStep {
        /// Total span of the bucketized range.
        span: usize,
        /// The configured step.
        step: usize,
    },
}

impl ConfigError {
    /// Creates a zero-parameter error.
    pub fn zero(what: &'static str) -> Self {
        Self::Zero { what }
    }

    /// Creates a not-a-power-of-two error.
    pub fn not_power_of_two(what: &'static str, value: usize) -> Self {
        Self::NotPowerOfTwo { what, value }
    }

    /// Creates an inverted size range error.
    pub fn invalid_size_range(min: usize, max: usize) -> Self {
        Self::InvalidSizeRange { min, max }
    }

    /// Creates an uneven bucket step error.
    pub fn uneven_step(span: usize, step: usize) -> Self {
        Self::UnevenStep { span, step }
    }
}
