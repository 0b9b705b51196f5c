//! Crate-wide constants.
//!
//! Every processor stores its own sample rate, set via `prepare()`. The
//! values here are only fallback defaults and allocation bounds.

/// The default sample rate, 44.1 kHz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// The number of channels supported by the stereo effects ([`Comb`] and
/// [`RingMod`]).
///
/// [`Comb`]: crate::dsp::Comb
/// [`RingMod`]: crate::dsp::RingMod
pub const MAX_CHANNELS: usize = 2;

/// The maximum available block size for block-based processors.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// The default parameter smoothing time in milliseconds.
pub const DEFAULT_RAMP_TIME_MS: f64 = 50.0;

/// The default tuning frequency in Hz.
pub const DEFAULT_TUNING_FREQ_HZ: f64 = 440.0;
