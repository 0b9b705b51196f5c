//! Linear segment generator for sample-accurate parameter smoothing.

use super::smoothable_types::Smoothable;
use crate::error::ConfigError;
use crate::settings::DEFAULT_RAMP_TIME_MS;

/// A linear segment generator ("ramp") which smooths discrete parameter
/// changes into per-sample trajectories.
///
/// Each call to [`set_target()`][Self::set_target()] recomputes a constant
/// step size so that the current value reaches the target in exactly
/// `ramp_length_samples` steps, snapping to the target on the final step.
#[derive(Debug, Clone)]
pub struct Ramp<T: Smoothable> {
    current_value: T,
    target_value: T,

    step_size: f64,
    steps_remaining: u32,

    ramp_length_samples: u32,
    duration_ms: f64,
    sample_rate: f64,
}

impl<T: Smoothable> Ramp<T> {
    /// Returns a new `Ramp` with the provided smoothing duration in
    /// milliseconds. Call [`prepare()`][Self::prepare()] before use.
    pub fn new(duration_ms: f64) -> Self {
        Self {
            current_value: T::default(),
            target_value: T::default(),

            step_size: 0.0,
            steps_remaining: 0,

            ramp_length_samples: 0,
            duration_ms,
            sample_rate: 0.0,
        }
    }

    /// Resets the `Ramp` for a new sample rate.
    ///
    /// If `skip` is `true` the ramp snaps to `initial_value` with no steps
    /// remaining; otherwise it begins ramping toward it.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is not positive, or if the
    /// configured duration is shorter than one sample.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        skip: bool,
        initial_value: T,
    ) -> Result<(), ConfigError> {
        if !(sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        self.sample_rate = sample_rate;
        self.ramp_length_samples = self.duration_samples()?;

        self.set_target(initial_value, skip);

        Ok(())
    }

    /// Resets the smoothing duration of the `Ramp` in milliseconds. Does not
    /// affect a segment already in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the new duration is shorter than one sample at
    /// the prepared sample rate.
    pub fn set_duration(&mut self, duration_ms: f64) -> Result<(), ConfigError> {
        self.duration_ms = duration_ms;

        if self.sample_rate > 0.0 {
            self.ramp_length_samples = self.duration_samples()?;
        }

        Ok(())
    }

    /// Sets the new target value of the `Ramp`, recomputing its step size
    /// over the configured ramp length. `force` snaps the current value to
    /// the target immediately, with zero steps remaining.
    pub fn set_target(&mut self, target_value: T, force: bool) {
        self.target_value = target_value;

        if force || self.ramp_length_samples == 0 {
            self.current_value = target_value;
            self.step_size = 0.0;
            self.steps_remaining = 0;
            return;
        }

        self.step_size = (target_value.to_f64() - self.current_value.to_f64())
            / f64::from(self.ramp_length_samples);
        self.steps_remaining = self.ramp_length_samples;
    }

    /// Advances the `Ramp` by one step, returning its new value. Clamps to
    /// the target once the final step is taken.
    pub fn next(&mut self) -> T {
        if self.steps_remaining == 0 {
            return self.current_value;
        }

        self.steps_remaining -= 1;

        if self.steps_remaining == 0 {
            self.current_value = self.target_value;
        } else {
            self.current_value =
                T::from_f64(self.current_value.to_f64() + self.step_size);
        }

        self.current_value
    }

    /// Advances one step and multiplies every channel of `frame` in place
    /// by the new value. Intended to be called once per sample.
    pub fn apply_gain(&mut self, frame: &mut [T]) {
        let gain = self.next().to_f64();

        for sample in frame {
            *sample = T::from_f64(sample.to_f64() * gain);
        }
    }

    /// Advances one step and adds the new value to every channel of `frame`
    /// in place. Intended to be called once per sample.
    pub fn apply_sum(&mut self, frame: &mut [T]) {
        let value = self.next().to_f64();

        for sample in frame {
            *sample = T::from_f64(sample.to_f64() + value);
        }
    }

    /// Multiplies `buffer` in place by the ramp's evolving value, advancing
    /// one step per sample.
    pub fn apply_gain_buffer(&mut self, buffer: &mut [T]) {
        for sample in buffer {
            let gain = self.next().to_f64();
            *sample = T::from_f64(sample.to_f64() * gain);
        }
    }

    /// Adds the ramp's evolving value to `buffer` in place, advancing one
    /// step per sample. Useful for filling control-signal buffers.
    pub fn apply_sum_buffer(&mut self, buffer: &mut [T]) {
        for sample in buffer {
            let value = self.next().to_f64();
            *sample = T::from_f64(sample.to_f64() + value);
        }
    }

    /// Returns the `Ramp`'s current value, i.e. the last value returned by
    /// its [`next()`][Self::next()] method.
    pub fn current_value(&self) -> T {
        self.current_value
    }

    /// Returns the current target value of the `Ramp`.
    pub fn target_value(&self) -> T {
        self.target_value
    }

    /// Returns whether the `Ramp` is actively smoothing or not.
    pub fn is_active(&self) -> bool {
        self.steps_remaining > 0
    }

    /// Returns how many steps the `Ramp` has remaining.
    pub fn steps_remaining(&self) -> u32 {
        self.steps_remaining
    }

    /// Computes the total number of steps required to reach the target
    /// value (i.e. the duration as samples).
    fn duration_samples(&self) -> Result<u32, ConfigError> {
        let samples =
            (self.sample_rate * self.duration_ms / 1000.0).round() as u32;

        if samples == 0 {
            return Err(ConfigError::InvalidRampLength);
        }

        Ok(samples)
    }
}

impl<T: Smoothable> Default for Ramp<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RAMP_TIME_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    #[test]
    fn reaches_target_in_exact_step_count() {
        let mut ramp = Ramp::<f64>::new(10.0);
        // 10 ms at 1 kHz: 10 steps
        ramp.prepare(1000.0, true, 0.0).unwrap();
        ramp.set_target(1.0, false);

        assert_eq!(ramp.steps_remaining(), 10);

        for _ in 0..9 {
            ramp.next();
        }
        assert!(ramp.is_active());
        assert!(ramp.current_value() < 1.0);

        assert_eq!(ramp.next(), 1.0);
        assert!(!ramp.is_active());

        // further steps hold the target
        assert_eq!(ramp.next(), 1.0);
    }

    #[test]
    fn force_snaps_immediately() {
        let mut ramp = Ramp::<f32>::new(50.0);
        ramp.prepare(44100.0, true, 0.0).unwrap();

        ramp.set_target(0.25, true);
        assert_eq!(ramp.current_value(), 0.25);
        assert!(!ramp.is_active());
    }

    #[test]
    fn prepare_without_skip_ramps_toward_initial() {
        let mut ramp = Ramp::<f64>::new(1.0);
        ramp.prepare(1000.0, false, 1.0).unwrap();

        assert!(ramp.is_active());
        assert_eq!(ramp.next(), 1.0);
    }

    #[test]
    fn zero_length_ramp_is_rejected() {
        let mut ramp = Ramp::<f64>::new(0.0);
        assert_eq!(
            ramp.prepare(48000.0, true, 0.0),
            Err(ConfigError::InvalidRampLength)
        );

        let mut ramp = Ramp::<f64>::new(50.0);
        assert!(matches!(
            ramp.prepare(0.0, true, 0.0),
            Err(ConfigError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn apply_gain_advances_once_per_frame() {
        let mut ramp = Ramp::<f64>::new(2.0);
        ramp.prepare(1000.0, true, 1.0).unwrap();
        ramp.set_target(0.0, false);

        // both channels of the frame receive the same gain
        let mut frame = [2.0, 4.0];
        ramp.apply_gain(&mut frame);
        assert!(within_tolerance(frame[0], 1.0, 1e-12));
        assert!(within_tolerance(frame[1], 2.0, 1e-12));

        ramp.apply_gain(&mut frame);
        assert!(within_tolerance(frame[0], 0.0, 1e-12));
        assert!(within_tolerance(frame[1], 0.0, 1e-12));
    }

    #[test]
    fn apply_sum_buffer_fills_control_signal() {
        let mut ramp = Ramp::<f64>::new(4.0);
        ramp.prepare(1000.0, true, 0.0).unwrap();
        ramp.set_target(8.0, false);

        let mut buffer = [0.0; 6];
        ramp.apply_sum_buffer(&mut buffer);

        assert_eq!(buffer, [2.0, 4.0, 6.0, 8.0, 8.0, 8.0]);
    }
}
