//! Core data models for qualmix.
//!
//! - Survey records flow from the generator through coding
//! - Aggregate rows are what the stages persist as tables
//! - Configuration and errors are shared by every stage

mod config;
mod error;
mod stats;
mod survey;

pub use config::*;
pub use error::*;
pub use stats::*;
pub use survey::*;
