#![allow(
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::return_self_not_must_use
)]

// Signal processing
pub mod dsp;

// Parameter configuration and cross-thread exchange
pub mod params;

// General utilities
pub mod util;

// Some widely-used re-exports
pub mod prelude;

// Crate-wide constants
pub mod settings;

// Configuration error taxonomy
pub mod error;
