//! Multi-channel circular delay buffer with fractional read positions.

use crate::error::ConfigError;
use crate::util::lerp;

/// A multi-channel circular buffer supporting a fixed baseline delay plus a
/// per-channel fractional modulation offset, read with linear interpolation.
///
/// All channels share one write index; storage is channel-major
/// (`[ch0_s0, ch0_s1, ..., ch1_s0, ...]`).
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    data: Vec<f64>,
    buffer_len: usize,
    num_channels: usize,

    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    /// Returns a new, unprepared `DelayLine`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reallocates storage for `max_delay_samples` samples per channel and
    /// clears all state.
    ///
    /// # Errors
    ///
    /// Returns an error if either size is zero.
    pub fn prepare(
        &mut self,
        max_delay_samples: usize,
        num_channels: usize,
    ) -> Result<(), ConfigError> {
        if max_delay_samples == 0 {
            return Err(ConfigError::ZeroDelayLength);
        }
        if num_channels == 0 {
            return Err(ConfigError::ZeroChannels);
        }

        self.buffer_len = max_delay_samples;
        self.num_channels = num_channels;

        self.data.clear();
        self.data.resize(max_delay_samples * num_channels, 0.0);

        self.write_pos = 0;
        self.delay_samples = self.delay_samples.min(max_delay_samples - 1);

        Ok(())
    }

    /// Sets the baseline integer delay in samples, clamped to the buffer
    /// length.
    pub fn set_delay_samples(&mut self, delay_samples: usize) {
        self.delay_samples = if self.buffer_len == 0 {
            delay_samples
        } else {
            delay_samples.min(self.buffer_len - 1)
        };
    }

    /// Processes one frame: writes `input[ch]` into the buffer, then reads
    /// each channel back at `delay_samples + mod_offsets[ch]` samples of
    /// delay, linearly interpolating between the two nearest stored samples.
    ///
    /// Offsets must lie within `[0, buffer_len)` after adding the baseline
    /// delay; the read position is wrapped into the buffer either way.
    pub fn process(
        &mut self,
        output: &mut [f64],
        input: &[f64],
        mod_offsets: &[f64],
    ) {
        let num_channels = output.len().min(self.num_channels);
        debug_assert!(self.buffer_len > 0);
        debug_assert!(input.len() >= num_channels);
        debug_assert!(mod_offsets.len() >= num_channels);

        let len = self.buffer_len as f64;

        for ch in 0..num_channels {
            let base = ch * self.buffer_len;
            self.data[base + self.write_pos] = input[ch];

            let mut read_pos = (self.write_pos as f64
                - (self.delay_samples as f64 + mod_offsets[ch]))
                .rem_euclid(len);
            // rem_euclid rounds up to the modulus for tiny negative inputs
            if read_pos >= len {
                read_pos = 0.0;
            }

            let idx = read_pos.floor() as usize;
            let frac = read_pos - read_pos.floor();
            let next = (idx + 1) % self.buffer_len;

            output[ch] = lerp(self.data[base + idx], self.data[base + next], frac);
        }

        self.increment_write_pos();
    }

    /// Clears the contents of the buffer without deallocating.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
    }

    /// Returns the number of samples held per channel.
    #[must_use]
    pub fn max_delay_samples(&self) -> usize {
        self.buffer_len
    }

    /// Returns the number of allocated channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Returns the current baseline delay in samples.
    #[must_use]
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    fn increment_write_pos(&mut self) {
        self.write_pos += 1;
        if self.buffer_len <= self.write_pos {
            self.write_pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    fn impulse_response(delay: usize, offsets: [f64; 1], len: usize) -> Vec<f64> {
        let mut dl = DelayLine::new();
        dl.prepare(16, 1).unwrap();
        dl.set_delay_samples(delay);

        let mut response = Vec::with_capacity(len);
        for n in 0..len {
            let input = [if n == 0 { 1.0 } else { 0.0 }];
            let mut output = [0.0];
            dl.process(&mut output, &input, &offsets);
            response.push(output[0]);
        }

        response
    }

    #[test]
    fn rejects_zero_sizes() {
        let mut dl = DelayLine::new();
        assert_eq!(dl.prepare(0, 2), Err(ConfigError::ZeroDelayLength));
        assert_eq!(dl.prepare(16, 0), Err(ConfigError::ZeroChannels));
    }

    #[test]
    fn integer_delay_reproduces_impulse() {
        let response = impulse_response(3, [0.0], 8);

        for (n, &sample) in response.iter().enumerate() {
            let expected = if n == 3 { 1.0 } else { 0.0 };
            assert!(
                within_tolerance(sample, expected, f64::EPSILON),
                "sample {n} was {sample}"
            );
        }
    }

    #[test]
    fn fractional_delay_averages_neighbouring_taps() {
        // delay of 2.5 samples: the impulse energy is split equally
        // between output samples 2 and 3
        let response = impulse_response(2, [0.5], 8);

        assert!(within_tolerance(response[2], 0.5, f64::EPSILON));
        assert!(within_tolerance(response[3], 0.5, f64::EPSILON));
        assert!(within_tolerance(response[4], 0.0, f64::EPSILON));
    }

    #[test]
    fn zero_delay_returns_current_input() {
        let response = impulse_response(0, [0.0], 3);
        assert_eq!(response[0], 1.0);
        assert_eq!(response[1], 0.0);
    }

    #[test]
    fn channels_are_independent() {
        let mut dl = DelayLine::new();
        dl.prepare(8, 2).unwrap();
        dl.set_delay_samples(1);

        let mut output = [0.0; 2];
        dl.process(&mut output, &[1.0, -1.0], &[0.0; 2]);
        dl.process(&mut output, &[0.0, 0.0], &[0.0; 2]);

        assert_eq!(output, [1.0, -1.0]);
    }

    #[test]
    fn clear_zeroes_without_resizing() {
        let mut dl = DelayLine::new();
        dl.prepare(8, 1).unwrap();
        dl.set_delay_samples(1);

        let mut output = [0.0];
        dl.process(&mut output, &[1.0], &[0.0]);
        dl.clear();
        dl.process(&mut output, &[0.0], &[0.0]);

        assert_eq!(output[0], 0.0);
        assert_eq!(dl.max_delay_samples(), 8);
    }
}
