//! Mixed-methods integration: simulated indicators joined with theme flags.

mod indicators;
mod summary;

pub use indicators::*;
pub use summary::*;
