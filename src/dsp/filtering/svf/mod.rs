//! State variable filtering.

mod filter;

pub use filter::{mode_mix, StateVariableFilter};
