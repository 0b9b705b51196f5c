//! Modulation effects.

mod comb;
mod ring_mod;

pub use comb::{Comb, CombModulation};
pub use ring_mod::{RingMod, RingModCarrier};
