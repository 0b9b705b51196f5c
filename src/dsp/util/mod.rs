//! DSP-specific utilities.

mod effect_trait;

pub use effect_trait::Effect;
