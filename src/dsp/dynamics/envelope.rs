//! ADSR envelope generator.

use crate::error::ConfigError;
use crate::util::ms_to_samples;
use EnvelopeStage as ES;

const DEFAULT_ATTACK_TIME_MS: f64 = 100.0;
const DEFAULT_DECAY_TIME_MS: f64 = 100.0;
const DEFAULT_SUSTAIN_LEVEL: f64 = 0.7;
const DEFAULT_RELEASE_TIME_MS: f64 = 100.0;

/// The possible stages of the envelope generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// An envelope generator with attack, decay, sustain and release stages.
///
/// Each stage advances the output level by a constant per-sample increment
/// derived from its time parameter. [`start()`][Self::start()] retriggers
/// from `Idle` or `Release`, continuing from the current level rather than
/// resetting to zero, so the envelope never jumps.
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    attack_time_ms: f64,
    decay_time_ms: f64,
    sustain_level: f64,
    release_time_ms: f64,

    stage: ES,
    level: f64,
    step: f64,

    sample_rate: f64,
}

impl EnvelopeGenerator {
    /// Creates a new envelope generator in the idle stage, with the default
    /// timing parameters. Call [`prepare()`][Self::prepare()] before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attack_time_ms: DEFAULT_ATTACK_TIME_MS,
            decay_time_ms: DEFAULT_DECAY_TIME_MS,
            sustain_level: DEFAULT_SUSTAIN_LEVEL,
            release_time_ms: DEFAULT_RELEASE_TIME_MS,

            stage: ES::Idle,
            level: 0.0,
            step: 0.0,

            sample_rate: 0.0,
        }
    }

    /// Resets the envelope for a new sample rate, returning it to the idle
    /// stage at level zero.
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

    /// Returns the envelope to the idle stage at level zero.
    pub fn clear(&mut self) {
        self.stage = ES::Idle;
        self.level = 0.0;
        self.step = 0.0;
    }

    /// Begins the attack stage. Only effective from `Idle` or `Release`;
    /// retriggering from release continues from the current level.
    pub fn start(&mut self) {
        if matches!(self.stage, ES::Idle | ES::Release) {
            self.enter_attack();
        }
    }

    /// Begins the release stage. Only effective from `Attack`, `Decay` or
    /// `Sustain`.
    pub fn end(&mut self) {
        if matches!(self.stage, ES::Attack | ES::Decay | ES::Sustain) {
            self.enter_release();
        }
    }

    /// Multiplies `buffer` in place by the envelope level, advancing the
    /// state machine one step per sample.
    pub fn process(&mut self, buffer: &mut [f64]) {
        for sample in buffer {
            *sample *= self.next();
        }
    }

    /// Advances the envelope by one sample, returning its new level.
    pub fn next(&mut self) -> f64 {
        match self.stage {
            ES::Idle => self.level = 0.0,
            ES::Sustain => self.level = self.sustain_level,
            ES::Attack => {
                self.level += self.step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.enter_decay();
                }
            }
            ES::Decay => {
                self.level -= self.step;
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = ES::Sustain;
                }
            }
            ES::Release => {
                self.level -= self.step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = ES::Idle;
                }
            }
        }

        self.level
    }

    /// Sets the attack time in milliseconds, clamped to be non-negative.
    /// Takes effect on the next attack stage.
    pub fn set_attack_time(&mut self, attack_time_ms: f64) {
        self.attack_time_ms = attack_time_ms.max(0.0);
    }

    /// Sets the decay time in milliseconds, clamped to be non-negative.
    pub fn set_decay_time(&mut self, decay_time_ms: f64) {
        self.decay_time_ms = decay_time_ms.max(0.0);
    }

    /// Sets the sustain level, clamped to `[0, 1]`.
    pub fn set_sustain_level(&mut self, sustain_level: f64) {
        self.sustain_level = sustain_level.clamp(0.0, 1.0);
    }

    /// Sets the release time in milliseconds, clamped to be non-negative.
    pub fn set_release_time(&mut self, release_time_ms: f64) {
        self.release_time_ms = release_time_ms.max(0.0);
    }

    /// Returns the current stage of the envelope generator.
    #[must_use]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Returns the current level of the envelope.
    #[must_use]
    pub fn current_level(&self) -> f64 {
        self.level
    }

    /// Returns whether the envelope is in its idle stage.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.stage, ES::Idle)
    }

    /* PRIVATE METHODS */

    fn enter_attack(&mut self) {
        let samples = ms_to_samples(self.attack_time_ms, self.sample_rate).round();

        if samples < 1.0 {
            self.level = 1.0;
            self.enter_decay();
        } else {
            self.step = (1.0 - self.level) / samples;
            self.stage = ES::Attack;
        }
    }

    fn enter_decay(&mut self) {
        let samples = ms_to_samples(self.decay_time_ms, self.sample_rate).round();

        if samples < 1.0 {
            self.level = self.sustain_level;
            self.stage = ES::Sustain;
        } else {
            self.step = (1.0 - self.sustain_level) / samples;
            self.stage = ES::Decay;
        }
    }

    fn enter_release(&mut self) {
        let samples =
            ms_to_samples(self.release_time_ms, self.sample_rate).round();

        if samples < 1.0 {
            self.level = 0.0;
            self.stage = ES::Idle;
        } else {
            self.step = self.level / samples;
            self.stage = ES::Release;
        }
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
