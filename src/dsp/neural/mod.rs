//! Neural inference blocks.

mod mlp;

pub use mlp::{Mlp, MlpParameters};
