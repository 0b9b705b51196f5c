//! General utility functions — these are publicly re-exported in `prelude.rs`.

use crate::settings::DEFAULT_TUNING_FREQ_HZ;

pub mod interp;
pub mod smoothing;

pub use interp::{ilerp, lerp};
pub use smoothing::{Ramp, Smoothable};

/// Converts a MIDI note value to its frequency in Hz, relative to the
/// default tuning frequency (A4 = note 69).
pub fn note_to_freq(note: f64) -> f64 {
    DEFAULT_TUNING_FREQ_HZ * 2.0f64.powf((note - 69.0) / 12.0)
}

/// Converts a frequency in Hz to its (possibly fractional) MIDI note value.
pub fn freq_to_note(freq: f64) -> f64 {
    12.0f64.mul_add((freq / DEFAULT_TUNING_FREQ_HZ).log2(), 69.0)
}

/// Converts an amplitude level to decibels.
pub fn level_to_db(level: f64) -> f64 {
    20.0 * level.log10()
}

/// Converts a decibel value to an amplitude level.
pub fn db_to_level(db_value: f64) -> f64 {
    10.0f64.powf(db_value / 20.0)
}

/// Converts a duration in milliseconds to a (fractional) number of samples.
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * 0.001 * sample_rate
}

/// Returns whether `value` is within `tolerance` of `target`.
pub fn within_tolerance(value: f64, target: f64, tolerance: f64) -> bool {
    (value - target).abs() <= tolerance
}
