//! Rendered outputs: the Markdown brief, the HTML fact sheet and SVG figures.
//!
//! Reporting reads whatever tables exist; a missing input renders as
//! "pending" or "no data" text instead of failing the run.

mod brief;
mod factsheet;
mod figures;

pub use brief::*;
pub use factsheet::*;
pub use figures::*;

use crate::models::{
    CooccurrencePair, Exemplar, Frame, ReliabilityRecord, Result, SummaryRecord, ThemeCount,
    ThemeFrequency,
};
use crate::store::{read_optional_table, read_optional_text, Layout};
use std::collections::BTreeMap;

/// Persisted tables reporting draws on; absent tables load as empty.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub theme_counts: Vec<ThemeCount>,
    pub frequencies: Vec<ThemeFrequency>,
    pub cooccurrence: Vec<CooccurrencePair>,
    pub exemplars: Vec<Exemplar>,
    pub summary: Vec<SummaryRecord>,
    pub reliability: Vec<ReliabilityRecord>,
    pub reliability_note: Option<String>,
}

impl ReportData {
    pub fn load(layout: &Layout) -> Result<Self> {
        Ok(Self {
            theme_counts: read_optional_table(&layout.theme_counts())?.unwrap_or_default(),
            frequencies: read_optional_table(&layout.theme_frequencies())?.unwrap_or_default(),
            cooccurrence: read_optional_table(&layout.cooccurrence())?.unwrap_or_default(),
            exemplars: read_optional_table(&layout.exemplars())?.unwrap_or_default(),
            summary: read_optional_table(&layout.mixed_summary())?.unwrap_or_default(),
            reliability: read_optional_table(&layout.reliability())?.unwrap_or_default(),
            reliability_note: read_optional_text(&layout.reliability_summary())?,
        })
    }
}

/// Total mentions per theme, largest first; equal totals keep theme order.
pub(crate) fn theme_totals<'a>(
    counts: impl IntoIterator<Item = &'a ThemeCount>,
) -> Vec<(String, usize)> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for c in counts {
        *totals.entry(c.theme.as_str()).or_default() += c.count;
    }
    let mut totals: Vec<(String, usize)> = totals
        .into_iter()
        .map(|(theme, count)| (theme.to_string(), count))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}

/// Totals for one frame.
pub(crate) fn frame_totals(counts: &[ThemeCount], frame: Frame) -> Vec<(String, usize)> {
    theme_totals(counts.iter().filter(|c| c.frame == frame))
}

/// "A (12), B (9), C (4)" for the first `n` totals.
pub(crate) fn format_totals(totals: &[(String, usize)], n: usize) -> String {
    totals
        .iter()
        .take(n)
        .map(|(theme, count)| format!("{theme} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}
