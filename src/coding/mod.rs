//! Thematic coding: keyword matching, aggregation and exemplar selection.
//!
//! Coded responses feed the aggregator and the exemplar selector; the
//! exploded long table is the shared input of both.

mod aggregate;
mod coder;
mod exemplars;

pub use aggregate::*;
pub use coder::*;
pub use exemplars::*;
