//! Project-wide exports for easy access.

pub use crate::error::ConfigError;
pub use crate::settings::*;
pub use crate::util::*;
pub use atomic_float::{AtomicF32, AtomicF64};
pub use crossbeam_channel::{
    bounded as bounded_channel, Receiver as CCReceiver, Sender as CCSender,
};
pub use std::f64::consts::{FRAC_PI_2, PI, TAU};
