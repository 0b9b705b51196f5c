//! Synthesizer-side signal path.

mod oscillator;
mod voice;

pub use oscillator::{OscType, Oscillator};
pub use voice::SynthVoice;
