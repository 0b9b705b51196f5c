//! Digital signal processors and utilities.

pub mod delay;
pub mod dynamics;
pub mod filtering;
pub mod modulation;
pub mod neural;
pub mod synthesis;
pub mod util;

pub use delay::DelayLine;
pub use dynamics::{EnvelopeGenerator, EnvelopeStage};
pub use filtering::{
    biquad::{design, Biquad, COEFFS_PER_SECTION, STATES_PER_SECTION},
    svf::{mode_mix, StateVariableFilter},
};
pub use modulation::{Comb, CombModulation, RingMod, RingModCarrier};
pub use neural::{Mlp, MlpParameters};
pub use synthesis::{OscType, Oscillator, SynthVoice};
pub use util::Effect;
