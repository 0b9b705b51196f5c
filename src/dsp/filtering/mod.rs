//! Filtering processors.

pub mod biquad;
pub mod svf;

pub use biquad::Biquad;
pub use svf::StateVariableFilter;
