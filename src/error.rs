//! Configuration error taxonomy.
//!
//! Errors in this crate are limited to configuration problems: invalid
//! sizes at `prepare()`/reallocation time, and precondition failures on
//! block-level `process()` entry points. The per-sample inner loops are
//! infallible.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of channels must be at least 1")]
    ZeroChannels,

    #[error("requested {requested} channels, but at most {max} are supported")]
    TooManyChannels { requested: usize, max: usize },

    #[error("sample rate must be positive (got {0})")]
    InvalidSampleRate(f64),

    #[error("ramp length must be at least 1 sample")]
    InvalidRampLength,

    #[error("delay buffer must hold at least 1 sample")]
    ZeroDelayLength,

    #[error("section count must be at least 1")]
    ZeroSections,

    #[error("section index {section} out of range ({allocated} allocated)")]
    SectionOutOfRange { section: usize, allocated: usize },

    #[error("buffer length mismatch: expected {expected} samples, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("block of {requested} samples exceeds the prepared maximum of {max}")]
    BlockTooLarge { requested: usize, max: usize },

    #[error("maximum block size must be at least 1 sample")]
    ZeroBlockSize,

    #[error("component used before prepare()")]
    NotPrepared,

    #[error("invalid network shape: {0}")]
    InvalidNetworkShape(String),

    #[error("failed to parse network parameters: {0}")]
    MalformedParameters(String),
}
