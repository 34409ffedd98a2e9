//! Inter-coder reliability: a simulated second coder and agreement statistics.

mod agreement;
mod second_coder;

pub use agreement::*;
pub use second_coder::*;
