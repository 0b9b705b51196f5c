//! Complete synthesizer voice: oscillator through envelope into a
//! mode-mixed state variable filter.

use super::oscillator::{OscType, Oscillator};
use crate::dsp::dynamics::EnvelopeGenerator;
use crate::dsp::filtering::svf::{mode_mix, StateVariableFilter};
use crate::error::ConfigError;
use crate::params::{ParamId, ParamInfo, ParamReceiver, ParamUpdate};
use crate::prelude::*;
use log::debug;

const DEFAULT_FREQ_HZ: f64 = 1000.0;
const DEFAULT_RESO: f64 = 1.0;
const DEFAULT_MODE: f64 = 0.0;

/// A mono synthesizer voice.
///
/// The oscillator output is shaped by the envelope generator, then run
/// through the state variable filter. The filter's cutoff and resonance
/// are smoothed into per-sample control buffers, and the three filter
/// outputs are blended by the smoothed mode-mix gains, so every control
/// moves with sample accuracy.
///
/// Construct with an explicit parameter table; incoming updates are
/// clamped against it before they are applied.
#[derive(Debug, Clone)]
pub struct SynthVoice {
    sample_rate: f64,
    max_block_size: usize,

    osc: Oscillator,
    env: EnvelopeGenerator,
    svf: StateVariableFilter,

    freq_hz: f64,
    reso: f64,
    mode: f64,
    velocity: f64,

    freq_ramp: Ramp<f64>,
    reso_ramp: Ramp<f64>,
    lpf_ramp: Ramp<f64>,
    bpf_ramp: Ramp<f64>,
    hpf_ramp: Ramp<f64>,

    // control and aux buffers, sized by prepare()
    freq_in: Vec<f64>,
    reso_in: Vec<f64>,
    lpf_out: Vec<f64>,
    bpf_out: Vec<f64>,
    hpf_out: Vec<f64>,

    params: Vec<ParamInfo>,
}

impl SynthVoice {
    /// Creates a new voice with the provided parameter table. Call
    /// [`prepare()`][Self::prepare()] before use.
    #[must_use]
    pub fn new(params: Vec<ParamInfo>) -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: 0,

            osc: Oscillator::new(),
            env: EnvelopeGenerator::new(),
            svf: StateVariableFilter::new(),

            freq_hz: DEFAULT_FREQ_HZ,
            reso: DEFAULT_RESO,
            mode: DEFAULT_MODE,
            velocity: 1.0,

            freq_ramp: Ramp::default(),
            reso_ramp: Ramp::default(),
            lpf_ramp: Ramp::default(),
            bpf_ramp: Ramp::default(),
            hpf_ramp: Ramp::default(),

            freq_in: Vec::new(),
            reso_in: Vec::new(),
            lpf_out: Vec::new(),
            bpf_out: Vec::new(),
            hpf_out: Vec::new(),

            params,
        }
    }

    /// The parameter set this voice responds to, with the ranges its host
    /// controls should use.
    #[must_use]
    pub fn default_params() -> Vec<ParamInfo> {
        vec![
            // Filter parameters
            ParamInfo::new(ParamId::Freq, "Frequency", "Hz", 1000.0, 100.0, 10000.0, 1.0, 0.4),
            ParamInfo::new(ParamId::Reso, "Resonance", "", 1.0, 0.5, 5.0, 0.01, 0.4),
            ParamInfo::new(ParamId::Mode, "Mode", "", 0.0, -1.0, 1.0, 0.01, 1.0),
            // Envelope parameters
            ParamInfo::new(ParamId::Gate, "Gate", "", 0.0, 0.0, 1.0, 1.0, 1.0),
            ParamInfo::new(ParamId::AttackTime, "Att. Time", "ms", 100.0, 1.0, 1000.0, 0.1, 0.5),
            ParamInfo::new(ParamId::DecayTime, "Dec. Time", "ms", 100.0, 1.0, 1000.0, 0.1, 0.5),
            ParamInfo::new(ParamId::SustainLevel, "Sus. Level", "", 0.7, 0.0, 1.0, 0.01, 1.0),
            ParamInfo::new(ParamId::ReleaseTime, "Rel. Time", "ms", 100.0, 1.0, 1000.0, 0.1, 0.5),
            // Source parameters
            ParamInfo::new(ParamId::WaveType, "Wave Type", "", 1.0, 0.0, 4.0, 1.0, 1.0),
        ]
    }

    /// Reconfigures the voice for a new sample rate and maximum block
    /// size, resetting all internal state and snapping every ramp to its
    /// current parameter value.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is not positive or
    /// `max_block_size` is zero.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
    ) -> Result<(), ConfigError> {
        if max_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;

        self.osc.prepare(sample_rate)?;
        self.env.prepare(sample_rate)?;
        self.svf.prepare(sample_rate)?;

        self.freq_ramp.prepare(sample_rate, true, self.freq_hz)?;
        self.reso_ramp.prepare(sample_rate, true, self.reso)?;

        let (lpf, bpf, hpf) = mode_mix(self.mode);
        self.lpf_ramp.prepare(sample_rate, true, lpf)?;
        self.bpf_ramp.prepare(sample_rate, true, bpf)?;
        self.hpf_ramp.prepare(sample_rate, true, hpf)?;

        for buffer in [
            &mut self.freq_in,
            &mut self.reso_in,
            &mut self.lpf_out,
            &mut self.bpf_out,
            &mut self.hpf_out,
        ] {
            buffer.clear();
            buffer.resize(max_block_size, 0.0);
        }

        debug!("prepared synth voice: {max_block_size} samples at {sample_rate} Hz");

        Ok(())
    }

    /// Drains a parameter queue into the voice. Intended to be called once
    /// at the top of each block, before [`process()`][Self::process()].
    pub fn drain_updates(&mut self, rx: &ParamReceiver) {
        rx.drain(|update| self.apply_update(update));
    }

    /// Applies a typed parameter update, clamping the value into the
    /// voice's configured ranges.
    pub fn apply_update(&mut self, update: ParamUpdate) {
        let value = self
            .param_info(update.id)
            .map_or(update.value, |info| info.clamp(update.value));

        match update.id {
            ParamId::Freq => {
                self.freq_hz = value;
                self.freq_ramp.set_target(value, update.forced);
            }
            ParamId::Reso => {
                self.reso = value;
                self.reso_ramp.set_target(value, update.forced);
            }
            ParamId::Mode => {
                self.mode = value;
                let (lpf, bpf, hpf) = mode_mix(value);
                self.lpf_ramp.set_target(lpf, update.forced);
                self.bpf_ramp.set_target(bpf, update.forced);
                self.hpf_ramp.set_target(hpf, update.forced);
            }
            ParamId::Gate => {
                if value > 0.5 {
                    self.env.start();
                } else {
                    self.env.end();
                }
            }
            ParamId::AttackTime => self.env.set_attack_time(value),
            ParamId::DecayTime => self.env.set_decay_time(value),
            ParamId::SustainLevel => self.env.set_sustain_level(value),
            ParamId::ReleaseTime => self.env.set_release_time(value),
            ParamId::WaveType => self
                .osc
                .set_osc_type(OscType::from_index(value.round() as usize)),
            // parameters owned by other processors
            _ => {}
        }
    }

    /// Starts a note: tunes the oscillator to the MIDI note, stores the
    /// velocity, and opens the envelope.
    pub fn note_on(&mut self, midi_note: u8, velocity: f64) {
        self.osc.set_freq(note_to_freq(f64::from(midi_note)));
        self.velocity = velocity.clamp(0.0, 1.0);
        self.env.start();
    }

    /// Releases the current note.
    pub fn note_off(&mut self) {
        self.env.end();
    }

    /// Returns whether the voice is producing signal (i.e. its envelope
    /// has not returned to idle).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.env.is_idle()
    }

    /// Renders one block of the voice into `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the voice has not been prepared, or if the
    /// block exceeds the prepared maximum size.
    pub fn process(&mut self, output: &mut [f64]) -> Result<(), ConfigError> {
        if self.max_block_size == 0 {
            return Err(ConfigError::NotPrepared);
        }

        let num_samples = output.len();
        if num_samples > self.max_block_size {
            return Err(ConfigError::BlockTooLarge {
                requested: num_samples,
                max: self.max_block_size,
            });
        }

        // build the per-sample control signals
        for buffer in [&mut self.freq_in, &mut self.reso_in] {
            buffer[..num_samples].iter_mut().for_each(|x| *x = 0.0);
        }
        self.freq_ramp.apply_sum_buffer(&mut self.freq_in[..num_samples]);
        self.reso_ramp.apply_sum_buffer(&mut self.reso_in[..num_samples]);

        // source and amplitude shaping
        self.osc.fill(&mut output[..num_samples]);
        self.env.process(&mut output[..num_samples]);

        self.svf.process(
            &mut self.lpf_out[..num_samples],
            &mut self.bpf_out[..num_samples],
            &mut self.hpf_out[..num_samples],
            &output[..num_samples],
            &self.freq_in[..num_samples],
            &self.reso_in[..num_samples],
        )?;

        // blend the three filter outputs under their smoothed mode gains
        self.lpf_ramp.apply_gain_buffer(&mut self.lpf_out[..num_samples]);
        self.bpf_ramp.apply_gain_buffer(&mut self.bpf_out[..num_samples]);
        self.hpf_ramp.apply_gain_buffer(&mut self.hpf_out[..num_samples]);

        for n in 0..num_samples {
            output[n] =
                (self.lpf_out[n] + self.bpf_out[n] + self.hpf_out[n])
                    * self.velocity;
        }

        Ok(())
    }

    /// Zeroes all sample state, leaving parameters and allocations intact.
    pub fn clear(&mut self) {
        self.env.clear();
        self.svf.clear();
    }

    fn param_info(&self, id: ParamId) -> Option<&ParamInfo> {
        self.params.iter().find(|info| info.id == id)
    }
}

impl Default for SynthVoice {
    fn default() -> Self {
        Self::new(Self::default_params())
    }
}
