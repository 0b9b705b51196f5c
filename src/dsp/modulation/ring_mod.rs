//! Ring modulator.

use super::comb::check_channel_layout;
use crate::dsp::util::Effect;
use crate::error::ConfigError;
use crate::params::{ParamId, ParamUpdate};
use crate::prelude::*;

/// Carrier waveforms for the ring modulator. All are bipolar, spanning
/// `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum RingModCarrier {
    #[default]
    Sin = 0,
    Tri,
    Sqr,
}

unsafe impl bytemuck::NoUninit for RingModCarrier {}

/// An LFO-driven amplitude modulator.
///
/// Holds no state beyond the two carrier phases — one per channel, offset
/// by a quarter period for stereo widening, as in [`Comb`](super::Comb).
#[derive(Debug, Clone)]
pub struct RingMod {
    sample_rate: f64,

    mod_rate: f64,
    carrier: RingModCarrier,

    phase_state: [f64; 2],
    phase_inc: f64,
}

impl RingMod {
    /// The channel cap of the ring modulator.
    pub const MAX_CHANNELS: usize = crate::settings::MAX_CHANNELS;

    /// Creates a new `RingMod` with a static carrier. Call
    /// [`prepare()`][Self::prepare()] before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,

            mod_rate: 0.0,
            carrier: RingModCarrier::default(),

            phase_state: [0.0, FRAC_PI_2],
            phase_inc: 0.0,
        }
    }

    /// Resets the phase states for a new sample rate.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is not positive.
    pub fn prepare(&mut self, sample_rate: f64) -> Result<(), ConfigError> {
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        self.sample_rate = sample_rate;
        self.phase_state = [0.0, FRAC_PI_2];
        self.phase_inc = TAU / sample_rate * self.mod_rate;

        Ok(())
    }

    /// Multiplies each input sample by its channel's current carrier value.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel counts disagree or exceed the
    /// channel cap, or if the buffer lengths are mismatched.
    pub fn process(
        &mut self,
        output: &mut [&mut [f64]],
        input: &[&[f64]],
    ) -> Result<(), ConfigError> {
        let num_channels = output.len();
        check_channel_layout(output, input, Self::MAX_CHANNELS)?;

        let num_samples = output[0].len();

        for n in 0..num_samples {
            for ch in 0..num_channels {
                output[ch][n] = input[ch][n] * self.carrier_value(ch);
            }

            self.increment_phases();
        }

        Ok(())
    }

    /// Sets the modulation rate in Hz.
    pub fn set_mod_rate(&mut self, mod_rate_hz: f64) {
        self.mod_rate = mod_rate_hz.max(0.0);
        self.phase_inc = TAU / self.sample_rate * self.mod_rate;
    }

    /// Sets the carrier waveform.
    pub fn set_carrier(&mut self, carrier: RingModCarrier) {
        self.carrier = carrier;
    }

    /// Applies a typed parameter update.
    pub fn apply_update(&mut self, update: ParamUpdate) {
        match update.id {
            ParamId::Rate => self.set_mod_rate(update.value),
            ParamId::ModType => {
                self.set_carrier(match update.value.round() as u32 {
                    0 => RingModCarrier::Sin,
                    1 => RingModCarrier::Tri,
                    _ => RingModCarrier::Sqr,
                });
            }
            _ => {}
        }
    }

    fn carrier_value(&self, channel: usize) -> f64 {
        let phase = self.phase_state[channel];

        match self.carrier {
            RingModCarrier::Sin => phase.sin(),
            RingModCarrier::Tri => 2.0 * (phase / PI - 1.0).abs() - 1.0,
            RingModCarrier::Sqr => {
                if phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    fn increment_phases(&mut self) {
        self.phase_state[0] = (self.phase_state[0] + self.phase_inc) % TAU;
        self.phase_state[1] = (self.phase_state[1] + self.phase_inc) % TAU;
    }
}

impl Default for RingMod {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for RingMod {
    fn process_stereo(&mut self, in_l: f64, in_r: f64) -> (f64, f64) {
        let out = (in_l * self.carrier_value(0), in_r * self.carrier_value(1));
        self.increment_phases();
        out
    }

    fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn get_identifier(&self) -> &str {
        "ring_mod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    #[test]
    fn square_carrier_flips_polarity_halfway() {
        let mut rm = RingMod::new();
        rm.set_carrier(RingModCarrier::Sqr);
        rm.prepare(8.0).unwrap();
        // 2 Hz at 8 Hz sample rate: a full period every 4 samples
        rm.set_mod_rate(2.0);

        let input = [1.0; 4];
        let mut left = [0.0; 4];
        let mut right = [0.0; 4];

        {
            let mut outputs: [&mut [f64]; 2] = [&mut left, &mut right];
            let inputs: [&[f64]; 2] = [&input, &input];
            rm.process(&mut outputs, &inputs).unwrap();
        }

        assert_eq!(left, [1.0, 1.0, -1.0, -1.0]);
        // the right channel leads by a quarter period
        assert_eq!(right, [1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn triangle_carrier_spans_full_range() {
        let mut rm = RingMod::new();
        rm.set_carrier(RingModCarrier::Tri);
        rm.prepare(4.0).unwrap();
        rm.set_mod_rate(1.0);

        let input = [1.0; 4];
        let mut left = [0.0; 4];
        let mut right = [0.0; 4];

        {
            let mut outputs: [&mut [f64]; 2] = [&mut left, &mut right];
            let inputs: [&[f64]; 2] = [&input, &input];
            rm.process(&mut outputs, &inputs).unwrap();
        }

        assert!(within_tolerance(left[0], 1.0, f64::EPSILON));
        assert!(within_tolerance(left[1], 0.0, f64::EPSILON));
        assert!(within_tolerance(left[2], -1.0, f64::EPSILON));
        assert!(within_tolerance(left[3], 0.0, f64::EPSILON));
    }

    #[test]
    fn zero_rate_sine_carrier_holds_phase() {
        let mut rm = RingMod::new();
        rm.prepare(48000.0).unwrap();

        // phase 0 sine carrier silences the left channel entirely
        let (l, r) = rm.process_stereo(1.0, 1.0);
        assert!(within_tolerance(l, 0.0, f64::EPSILON));
        assert!(within_tolerance(r, 1.0, f64::EPSILON));
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut rm = RingMod::new();
        rm.prepare(48000.0).unwrap();

        let input = [0.0; 4];
        let short = [0.0; 3];
        let mut out = [0.0; 4];

        let mut outputs: [&mut [f64]; 1] = [&mut out];
        let inputs: [&[f64]; 1] = [&short];
        assert_eq!(
            rm.process(&mut outputs, &inputs),
            Err(ConfigError::BufferSizeMismatch { expected: 4, got: 3 })
        );

        let inputs: [&[f64]; 1] = [&input];
        assert!(rm.process(&mut outputs, &inputs).is_ok());
    }
}
