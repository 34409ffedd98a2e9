//! qualmix - Synthetic qualitative survey coding with mixed-methods reporting.
//!
//! ## Architecture
//!
//! Every stage reads its inputs from the artifact tree and writes its
//! outputs back:
//! - **Generation**: seeded household and provider open-ended responses
//! - **Coding**: keyword matching against a fixed codebook, aggregates, exemplars
//! - **Mixed methods**: simulated indicators summarized by theme presence
//! - **Reliability**: simulated second coder, percent agreement and Cohen's kappa
//! - **Reporting**: Markdown brief, HTML fact sheet, SVG figures
//!
//! ## Determinism
//!
//! One run seed threads through every random stage. Equal seeds and
//! configuration produce identical tables.

pub mod codebook;
pub mod coding;
pub mod generate;
pub mod mixed;
pub mod models;
pub mod pipeline;
pub mod reliability;
pub mod report;
pub mod store;
pub mod text;

// Re-exports for convenience
pub use codebook::{Codebook, Theme};
pub use models::{Config, QualmixError, Result, RunStats};
pub use pipeline::{Pipeline, RunManifest};
pub use store::Layout;
