//! Pipeline module - stage functions and the end-to-end runner.

mod runner;
mod stages;

pub use runner::*;
pub use stages::*;
