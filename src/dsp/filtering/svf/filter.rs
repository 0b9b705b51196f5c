//! State variable filter with simultaneous lowpass, bandpass and highpass
//! outputs.

use crate::error::ConfigError;
use std::f64::consts::PI;

/// Resonance values below this are clamped to keep `1/q` finite.
const MIN_RESO: f64 = 0.01;

/// Blends the three filter outputs by a `[-1, 1]` mode control: `-1` is
/// pure lowpass, `0` pure bandpass, `+1` pure highpass.
///
/// Returns `(lpf, bpf, hpf)` mixing gains.
#[must_use]
pub fn mode_mix(mode: f64) -> (f64, f64, f64) {
    let mode = mode.clamp(-1.0, 1.0);

    (
        (-mode).max(0.0),
        (1.0 - mode.abs()).max(0.0),
        mode.max(0.0),
    )
}

/// A state variable filter producing simultaneous lowpass, bandpass and
/// highpass outputs from one input.
///
/// Cutoff frequency and resonance are control *signals*, not block
/// constants: [`process()`][Self::process()] takes per-sample `freq_in` and
/// `reso_in` buffers, so both can be modulated with sample accuracy. The
/// coefficients are recomputed every sample from those buffers.
#[derive(Debug, Clone, Default)]
pub struct StateVariableFilter {
    z1: f64,
    z2: f64,

    sample_rate: f64,
}

impl StateVariableFilter {
    /// Creates a new, unprepared `StateVariableFilter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the filter for a new sample rate, clearing its state.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is not positive.
    pub fn prepare(&mut self, sample_rate: f64) -> Result<(), ConfigError> {
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        self.sample_rate = sample_rate;
        self.clear();

        Ok(())
    }

    /// Zeroes the filter state.
    pub fn clear(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Processes a block, writing the three simultaneous outputs.
    ///
    /// `freq_in` carries the cutoff frequency in Hz and `reso_in` the
    /// resonance (quality factor) for each sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter has not been prepared, or if any
    /// buffer length differs from `input`'s.
    pub fn process(
        &mut self,
        lpf_out: &mut [f64],
        bpf_out: &mut [f64],
        hpf_out: &mut [f64],
        input: &[f64],
        freq_in: &[f64],
        reso_in: &[f64],
    ) -> Result<(), ConfigError> {
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::NotPrepared);
        }

        let num_samples = input.len();
        for len in [
            lpf_out.len(),
            bpf_out.len(),
            hpf_out.len(),
            freq_in.len(),
            reso_in.len(),
        ] {
            if len != num_samples {
                return Err(ConfigError::BufferSizeMismatch {
                    expected: num_samples,
                    got: len,
                });
            }
        }

        for n in 0..num_samples {
            let (lp, bp, hp) = self.tick(input[n], freq_in[n], reso_in[n]);
            lpf_out[n] = lp;
            bpf_out[n] = bp;
            hpf_out[n] = hp;
        }

        Ok(())
    }

    /// Advances the filter by one sample, returning `(lpf, bpf, hpf)`.
    pub fn tick(&mut self, input: f64, freq_hz: f64, reso: f64) -> (f64, f64, f64) {
        let g = (PI * (freq_hz / self.sample_rate).clamp(0.0, 0.49)).tan();
        let r2 = reso.max(MIN_RESO).recip();
        let h = (1.0 + r2 * g + g * g).recip();

        let hp = h * (input - self.z1 * (g + r2) - self.z2);

        let bp = hp * g + self.z1;
        self.z1 = hp * g + bp;

        let lp = bp * g + self.z2;
        self.z2 = bp * g + lp;

        (lp, bp, hp)
    }

    /// Returns the sample rate the filter was prepared with.
    #[must_use]
    pub fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    #[test]
    fn mode_mix_blends_between_outputs() {
        assert_eq!(mode_mix(-1.0), (1.0, 0.0, 0.0));
        assert_eq!(mode_mix(0.0), (0.0, 1.0, 0.0));
        assert_eq!(mode_mix(1.0), (0.0, 0.0, 1.0));
        assert_eq!(mode_mix(0.5), (0.0, 0.5, 0.5));
        assert_eq!(mode_mix(-0.5), (0.5, 0.5, 0.0));
        // out-of-range modes clamp
        assert_eq!(mode_mix(4.0), (0.0, 0.0, 1.0));
    }

    #[test]
    fn requires_prepare() {
        let mut svf = StateVariableFilter::new();
        let mut buf = [0.0; 4];
        let mut bp = [0.0; 4];
        let mut hp = [0.0; 4];
        assert_eq!(
            svf.process(&mut buf, &mut bp, &mut hp, &[0.0; 4], &[0.0; 4], &[0.0; 4]),
            Err(ConfigError::NotPrepared)
        );
    }

    #[test]
    fn dc_separates_into_lowpass() {
        let mut svf = StateVariableFilter::new();
        svf.prepare(48000.0).unwrap();

        let n = 4096;
        let input = vec![1.0; n];
        let freq = vec![1000.0; n];
        let reso = vec![0.707; n];
        let mut lp = vec![0.0; n];
        let mut bp = vec![0.0; n];
        let mut hp = vec![0.0; n];

        svf.process(&mut lp, &mut bp, &mut hp, &input, &freq, &reso)
            .unwrap();

        // once settled, DC passes the lowpass untouched and leaves the
        // bandpass/highpass outputs empty
        assert!(within_tolerance(lp[n - 1], 1.0, 1e-6));
        assert!(within_tolerance(bp[n - 1], 0.0, 1e-6));
        assert!(within_tolerance(hp[n - 1], 0.0, 1e-6));
    }

    #[test]
    fn control_buffers_must_match_input_length() {
        let mut svf = StateVariableFilter::new();
        svf.prepare(48000.0).unwrap();

        let mut lp = [0.0; 4];
        let mut bp = [0.0; 4];
        let mut hp = [0.0; 4];
        assert_eq!(
            svf.process(&mut lp, &mut bp, &mut hp, &[0.0; 4], &[0.0; 3], &[0.0; 4]),
            Err(ConfigError::BufferSizeMismatch { expected: 4, got: 3 })
        );
    }

    #[test]
    fn clear_zeroes_state() {
        let mut svf = StateVariableFilter::new();
        svf.prepare(48000.0).unwrap();

        svf.tick(1.0, 1000.0, 0.707);
        svf.tick(1.0, 1000.0, 0.707);
        svf.clear();

        let (lp, bp, _) = svf.tick(0.0, 1000.0, 0.707);
        assert_eq!(lp, 0.0);
        assert_eq!(bp, 0.0);
    }
}
