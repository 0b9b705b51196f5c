//! Basic non-anti-aliased waveform oscillator.

use crate::error::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{PI, TAU};

/// All the waveforms available from [`Oscillator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum OscType {
    Sine = 0,
    #[default]
    Triangle,
    Sawtooth,
    Square,
    Noise,
}

unsafe impl bytemuck::NoUninit for OscType {}

impl OscType {
    /// Maps a selector parameter index to a waveform, clamping to the last
    /// variant.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Sine,
            1 => Self::Triangle,
            2 => Self::Sawtooth,
            3 => Self::Square,
            _ => Self::Noise,
        }
    }
}

/// A phase-accumulator oscillator producing one of the [`OscType`]
/// waveforms, all bipolar in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    osc_type: OscType,

    phase: f64,
    phase_inc: f64,

    freq_hz: f64,
    sample_rate: f64,

    rng: StdRng,
}

impl Oscillator {
    /// Creates a new `Oscillator`. Call [`prepare()`][Self::prepare()]
    /// before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            osc_type: OscType::default(),

            phase: 0.0,
            phase_inc: 0.0,

            freq_hz: crate::settings::DEFAULT_TUNING_FREQ_HZ,
            sample_rate: crate::settings::DEFAULT_SAMPLE_RATE,

            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    /// Resets the phase for a new sample rate.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is not positive.
    pub fn prepare(&mut self, sample_rate: f64) -> Result<(), ConfigError> {
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        self.sample_rate = sample_rate;
        self.phase = 0.0;
        self.update_phase_inc();

        Ok(())
    }

    /// Sets the oscillator frequency in Hz, clamped to be non-negative.
    pub fn set_freq(&mut self, freq_hz: f64) {
        debug_assert!(freq_hz <= self.sample_rate / 2.0);

        self.freq_hz = freq_hz.max(0.0);
        self.update_phase_inc();
    }

    /// Sets the waveform type.
    pub fn set_osc_type(&mut self, osc_type: OscType) {
        self.osc_type = osc_type;
    }

    /// Returns the currently selected waveform type.
    #[must_use]
    pub fn get_osc_type(&self) -> OscType {
        self.osc_type
    }

    /// Produces the next sample and advances the phase.
    pub fn next(&mut self) -> f64 {
        let out = match self.osc_type {
            OscType::Sine => self.phase.sin(),
            OscType::Triangle => 2.0 * (self.phase / PI - 1.0).abs() - 1.0,
            OscType::Sawtooth => self.phase / PI - 1.0,
            OscType::Square => {
                if self.phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            OscType::Noise => self.rng.random_range(-1.0..1.0),
        };

        self.phase = (self.phase + self.phase_inc) % TAU;

        out
    }

    /// Fills `buffer` with consecutive oscillator samples.
    pub fn fill(&mut self, buffer: &mut [f64]) {
        for sample in buffer {
            *sample = self.next();
        }
    }

    fn update_phase_inc(&mut self) {
        self.phase_inc = self.freq_hz / self.sample_rate * TAU;
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}
