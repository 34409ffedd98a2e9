//! Artifact persistence.
//!
//! Provides:
//! - `Layout`: where each artifact lives under the base directory
//! - `Record`: header-carrying CSV rows, read and written through serde
//! - Coded table codecs for the narrow, wide and long forms

mod coded;
mod layout;
mod table;

pub use coded::*;
pub use layout::*;
pub use table::*;
