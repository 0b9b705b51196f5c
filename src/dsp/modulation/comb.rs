//! Modulated feedback comb filter.

use crate::dsp::delay::DelayLine;
use crate::dsp::util::Effect;
use crate::error::ConfigError;
use crate::params::{ParamId, ParamInfo, ParamUpdate};
use crate::prelude::*;
use log::debug;

/// Fixed baseline delay which the modulated offset is added on top of.
const BASE_DELAY_MS: f64 = 1.0;

/// Smoothing time for the offset, depth and feedback ramps.
const RAMP_TIME_MS: f64 = 50.0;

/// Delay-time modulation waveforms. Both are mapped into `[0, 1]` before
/// being scaled by the modulation depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum CombModulation {
    #[default]
    Sin = 0,
    Tri,
}

unsafe impl bytemuck::NoUninit for CombModulation {}

/// A stereo modulated feedback comb filter.
///
/// A mono LFO is mirrored across the two channels with a quarter-period
/// phase offset for stereo widening. The LFO (scaled by the depth ramp and
/// shifted by the offset ramp) drives the fractional read position of an
/// internal [`DelayLine`], and the delayed output is fed back into the
/// input through the feedback ramp.
///
/// Feedback gains at or above unity are not clamped here; keeping the
/// filter stable is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct Comb {
    sample_rate: f64,

    delay_line: DelayLine,

    offset_ramp: Ramp<f64>,
    mod_depth_ramp: Ramp<f64>,
    feedback_ramp: Ramp<f64>,

    feedback_state: [f64; 2],

    phase_state: [f64; 2],
    phase_inc: f64,

    offset_ms: f64,
    mod_depth_ms: f64,
    mod_rate: f64,
    feedback_gain: f64,

    mod_type: CombModulation,
}

impl Comb {
    /// The channel cap of the comb filter.
    pub const MAX_CHANNELS: usize = crate::settings::MAX_CHANNELS;

    /// Creates a new `Comb` with all modulation at rest and a feedback gain
    /// of `0.5`. Call [`prepare()`][Self::prepare()] before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,

            delay_line: DelayLine::new(),

            offset_ramp: Ramp::new(RAMP_TIME_MS),
            mod_depth_ramp: Ramp::new(RAMP_TIME_MS),
            feedback_ramp: Ramp::new(RAMP_TIME_MS),

            feedback_state: [0.0; 2],

            phase_state: [0.0, FRAC_PI_2],
            phase_inc: 0.0,

            offset_ms: 0.0,
            mod_depth_ms: 0.0,
            mod_rate: 0.0,
            feedback_gain: 0.5,

            mod_type: CombModulation::default(),
        }
    }

    /// The parameter set this processor responds to, with the ranges its
    /// host controls should use.
    #[must_use]
    pub fn default_params() -> Vec<ParamInfo> {
        vec![
            ParamInfo::new(ParamId::Offset, "Offset", "ms", 2.0, 1.0, 100.0, 0.1, 0.5),
            ParamInfo::new(ParamId::Depth, "Depth", "ms", 2.0, 0.0, 10.0, 0.1, 0.5),
            ParamInfo::new(ParamId::Rate, "Rate", "Hz", 0.5, 0.01, 10.0, 0.01, 0.5),
            ParamInfo::new(ParamId::ModType, "Mod. Type", "", 0.0, 0.0, 1.0, 1.0, 1.0),
            ParamInfo::new(ParamId::Feedback, "Feedback", "", 0.5, 0.0, 0.99, 0.01, 1.0),
        ]
    }

    /// Reallocates and clears the internal delay line for a new sample rate
    /// and maximum delay time, and snaps all ramps to their current
    /// parameter targets.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive sample rate, zero channels, or
    /// more than [`MAX_CHANNELS`][Self::MAX_CHANNELS] channels.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_time_ms: f64,
        num_channels: usize,
    ) -> Result<(), ConfigError> {
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if num_channels == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if num_channels > Self::MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels {
                requested: num_channels,
                max: Self::MAX_CHANNELS,
            });
        }

        self.sample_rate = sample_rate;

        // +1 sample of headroom for the interpolation neighbour
        let max_delay_samples =
            ms_to_samples(max_time_ms.max(BASE_DELAY_MS), sample_rate).round()
                as usize
                + 1;

        self.delay_line
            .prepare(max_delay_samples, Self::MAX_CHANNELS)?;
        self.delay_line
            .set_delay_samples(ms_to_samples(BASE_DELAY_MS, sample_rate).ceil()
                as usize);

        // skip the ramps when preparing
        self.offset_ramp.prepare(
            sample_rate,
            true,
            ms_to_samples(self.offset_ms, sample_rate),
        )?;
        self.mod_depth_ramp.prepare(
            sample_rate,
            true,
            ms_to_samples(self.mod_depth_ms, sample_rate),
        )?;
        self.feedback_ramp
            .prepare(sample_rate, true, self.feedback_gain)?;

        self.phase_state = [0.0, FRAC_PI_2];
        self.feedback_state = [0.0; 2];
        self.phase_inc = TAU / sample_rate * self.mod_rate;

        debug!(
            "prepared comb: {max_delay_samples} samples of delay at {sample_rate} Hz"
        );

        Ok(())
    }

    /// Clears the delay line and feedback state without deallocating.
    pub fn clear(&mut self) {
        self.delay_line.clear();
        self.feedback_state = [0.0; 2];
    }

    /// Processes a block of audio.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter has not been prepared, if the channel
    /// counts disagree or exceed the channel cap, or if any channel's
    /// buffer length differs from the first output channel's.
    pub fn process(
        &mut self,
        output: &mut [&mut [f64]],
        input: &[&[f64]],
    ) -> Result<(), ConfigError> {
        let num_channels = output.len();
        check_channel_layout(output, input, Self::MAX_CHANNELS)?;

        if self.delay_line.max_delay_samples() == 0 {
            return Err(ConfigError::NotPrepared);
        }

        let num_samples = output[0].len();

        for n in 0..num_samples {
            let mut frame = [0.0; 2];
            for ch in 0..num_channels {
                frame[ch] = input[ch][n];
            }

            let out = self.tick(frame, num_channels);

            for ch in 0..num_channels {
                output[ch][n] = out[ch];
            }
        }

        Ok(())
    }

    /// Sets the delay offset in ms. The fixed baseline delay is deducted
    /// from the requested offset, so an offset of `1.0` ms corresponds to
    /// the shortest delay the filter produces.
    pub fn set_offset(&mut self, offset_ms: f64) {
        self.offset_ms = (offset_ms - BASE_DELAY_MS).max(0.0);
        self.offset_ramp
            .set_target(ms_to_samples(self.offset_ms, self.sample_rate), false);
    }

    /// Sets the delay-time modulation depth in ms.
    pub fn set_depth(&mut self, depth_ms: f64) {
        self.mod_depth_ms = depth_ms.max(0.0);
        self.mod_depth_ramp.set_target(
            ms_to_samples(self.mod_depth_ms, self.sample_rate),
            false,
        );
    }

    /// Sets the delay-time modulation rate in Hz.
    pub fn set_modulation_rate(&mut self, mod_rate_hz: f64) {
        self.mod_rate = mod_rate_hz.max(0.0);
        self.phase_inc = TAU / self.sample_rate * self.mod_rate;
    }

    /// Sets the delay-time modulation waveform.
    pub fn set_modulation_type(&mut self, mod_type: CombModulation) {
        self.mod_type = mod_type;
    }

    /// Sets the feedback gain. Not clamped: values at or above unity will
    /// make the filter unstable.
    pub fn set_feedback_gain(&mut self, feedback_gain: f64) {
        self.feedback_gain = feedback_gain;
        self.feedback_ramp.set_target(feedback_gain, false);
    }

    /// Applies a typed parameter update, clamping the value into the ranges
    /// of [`default_params()`][Self::default_params()].
    pub fn apply_update(&mut self, update: ParamUpdate) {
        match update.id {
            ParamId::Offset => self.set_offset(update.value.max(BASE_DELAY_MS)),
            ParamId::Depth => self.set_depth(update.value),
            ParamId::Rate => self.set_modulation_rate(update.value),
            ParamId::ModType => {
                self.set_modulation_type(if update.value.round() >= 1.0 {
                    CombModulation::Tri
                } else {
                    CombModulation::Sin
                });
            }
            ParamId::Feedback => self.set_feedback_gain(update.value),
            _ => {}
        }
    }

    /// Processes one frame of up to two channels.
    fn tick(&mut self, frame: [f64; 2], num_channels: usize) -> [f64; 2] {
        // LFO values for this sample, in [0, 1]
        let mut lfo = [0.0; 2];
        match self.mod_type {
            CombModulation::Sin => {
                lfo[0] = 0.5 + 0.5 * self.phase_state[0].sin();
                lfo[1] = 0.5 + 0.5 * self.phase_state[1].sin();
            }
            CombModulation::Tri => {
                lfo[0] = (self.phase_state[0] / PI - 1.0).abs();
                lfo[1] = (self.phase_state[1] / PI - 1.0).abs();
            }
        }

        self.phase_state[0] = (self.phase_state[0] + self.phase_inc) % TAU;
        self.phase_state[1] = (self.phase_state[1] + self.phase_inc) % TAU;

        // scale into samples of modulation, then shift by the offset
        self.mod_depth_ramp.apply_gain(&mut lfo[..num_channels]);
        self.offset_ramp.apply_sum(&mut lfo[..num_channels]);

        let mut x = [0.0; 2];
        for ch in 0..num_channels {
            x[ch] = frame[ch] + self.feedback_state[ch];
        }

        let mut y = [0.0; 2];
        self.delay_line.process(
            &mut y[..num_channels],
            &x[..num_channels],
            &lfo[..num_channels],
        );

        let out = y;

        // the value fed back at the next iteration
        self.feedback_ramp.apply_gain(&mut y[..num_channels]);
        for ch in 0..num_channels {
            self.feedback_state[ch] = y[ch];
        }

        out
    }
}

impl Default for Comb {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Comb {
    fn process_stereo(&mut self, in_l: f64, in_r: f64) -> (f64, f64) {
        let out = self.tick([in_l, in_r], 2);
        (out[0], out[1])
    }

    fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn get_identifier(&self) -> &str {
        "comb"
    }
}

/// Validates the channel layout shared by the block-based stereo effects.
pub(crate) fn check_channel_layout(
    output: &[&mut [f64]],
    input: &[&[f64]],
    max_channels: usize,
) -> Result<(), ConfigError> {
    let num_channels = output.len();

    if num_channels == 0 {
        return Err(ConfigError::ZeroChannels);
    }
    if num_channels > max_channels {
        return Err(ConfigError::TooManyChannels {
            requested: num_channels,
            max: max_channels,
        });
    }
    if input.len() != num_channels {
        return Err(ConfigError::BufferSizeMismatch {
            expected: num_channels,
            got: input.len(),
        });
    }

    let num_samples = output[0].len();
    for buf in input.iter().map(|b| b.len()) {
        if buf != num_samples {
            return Err(ConfigError::BufferSizeMismatch {
                expected: num_samples,
                got: buf,
            });
        }
    }
    for buf in output.iter().map(|b| b.len()) {
        if buf != num_samples {
            return Err(ConfigError::BufferSizeMismatch {
                expected: num_samples,
                got: buf,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    // 1 kHz sample rate: the 1 ms baseline delay is exactly one sample
    const TEST_SR: f64 = 1000.0;

    fn bypassed_comb() -> Comb {
        let mut comb = Comb::new();
        comb.set_feedback_gain(0.0);
        comb.set_depth(0.0);
        comb.set_offset(BASE_DELAY_MS);
        comb.prepare(TEST_SR, 20.0, 2).unwrap();
        comb
    }

    fn run_mono(comb: &mut Comb, input: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; input.len()];
        let mut out_right = vec![0.0; input.len()];
        let right = vec![0.0; input.len()];

        {
            let mut outputs: [&mut [f64]; 2] = [&mut out, &mut out_right];
            let inputs: [&[f64]; 2] = [input, &right];
            comb.process(&mut outputs, &inputs).unwrap();
        }

        out
    }

    #[test]
    fn channel_cap_is_enforced() {
        let mut comb = Comb::new();
        assert_eq!(
            comb.prepare(48000.0, 20.0, 3),
            Err(ConfigError::TooManyChannels { requested: 3, max: 2 })
        );
        assert_eq!(comb.prepare(48000.0, 20.0, 0), Err(ConfigError::ZeroChannels));
    }

    #[test]
    fn zero_depth_zero_feedback_is_a_pure_delay() {
        let mut comb = bypassed_comb();

        let mut input = vec![0.0; 8];
        input[0] = 1.0;
        let out = run_mono(&mut comb, &input);

        // with modulation and feedback bypassed, only the fixed 1-sample
        // baseline delay remains
        for (n, &sample) in out.iter().enumerate() {
            let expected = if n == 1 { 1.0 } else { 0.0 };
            assert!(
                within_tolerance(sample, expected, 1e-12),
                "sample {n} was {sample}"
            );
        }
    }

    #[test]
    fn feedback_recirculates_the_impulse() {
        let mut comb = Comb::new();
        comb.set_depth(0.0);
        comb.set_offset(BASE_DELAY_MS);
        comb.set_feedback_gain(0.5);
        comb.prepare(TEST_SR, 20.0, 2).unwrap();

        let mut input = vec![0.0; 6];
        input[0] = 1.0;
        let out = run_mono(&mut comb, &input);

        // the loop is the 1-sample baseline delay plus the 1-sample
        // feedback state, so echoes recur every 2 samples, halving each pass
        assert!(within_tolerance(out[1], 1.0, 1e-12));
        assert!(within_tolerance(out[3], 0.5, 1e-12));
        assert!(within_tolerance(out[5], 0.25, 1e-12));
        assert!(within_tolerance(out[2], 0.0, 1e-12));
        assert!(within_tolerance(out[4], 0.0, 1e-12));
    }

    #[test]
    fn stereo_phases_start_a_quarter_period_apart() {
        let mut comb = Comb::new();
        comb.prepare(48000.0, 20.0, 2).unwrap();
        assert!(within_tolerance(
            comb.phase_state[1] - comb.phase_state[0],
            FRAC_PI_2,
            f64::EPSILON
        ));
    }

    #[test]
    fn clear_resets_sample_state() {
        let mut comb = Comb::new();
        comb.prepare(TEST_SR, 20.0, 2).unwrap();

        let input = vec![1.0; 4];
        run_mono(&mut comb, &input);
        comb.clear();

        let silence = vec![0.0; 4];
        let out = run_mono(&mut comb, &silence);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn applies_typed_updates() {
        let mut comb = bypassed_comb();
        comb.apply_update(ParamUpdate {
            id: ParamId::ModType,
            value: 1.0,
            forced: false,
        });
        assert_eq!(comb.mod_type, CombModulation::Tri);
    }
}
