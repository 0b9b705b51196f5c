//! Delay-based processors.

mod delay_line;

pub use delay_line::DelayLine;
