//! Sample-accurate parameter smoothing.

mod ramp;
/// Smoothable scalar trait and type implementations.
pub mod smoothable_types;

pub use ramp::Ramp;
pub use smoothable_types::Smoothable;
