//! Cascaded second-order-section IIR filtering.

pub mod design;
mod filter;

pub use filter::{Biquad, COEFFS_PER_SECTION, STATES_PER_SECTION};
