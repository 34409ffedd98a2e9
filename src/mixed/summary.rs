//! Indicator means and rates split by theme presence.

use crate::models::{CodedTable, Frame, Group, IndicatorRecord, Metric, SummaryRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Running sum for one group.
#[derive(Default)]
struct Accumulator {
    sum: f64,
    n: usize,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.n += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

/// Compare each metric between respondents with and without each theme.
///
/// Rows join indicators by respondent id; respondents without indicators are
/// skipped. Output order is theme, metric, frame, wave, then the absent group
/// before the present one. Empty groups are omitted.
pub fn summarize(table: &CodedTable, indicators: &[IndicatorRecord]) -> Vec<SummaryRecord> {
    let by_id: HashMap<&str, &IndicatorRecord> = indicators
        .iter()
        .map(|r| (r.respondent_id.as_str(), r))
        .collect();

    let joined: Vec<_> = table
        .rows
        .iter()
        .filter_map(|row| {
            by_id
                .get(row.response.respondent_id.as_str())
                .map(|record| (row, *record))
        })
        .collect();

    let waves: BTreeSet<u8> = joined.iter().map(|(row, _)| row.response.wave).collect();

    let mut records = Vec::new();
    for theme in &table.themes {
        for metric in Metric::ALL {
            for &frame in metric.frames() {
                for &wave in &waves {
                    let mut groups = [Accumulator::default(), Accumulator::default()];
                    for (row, record) in joined
                        .iter()
                        .filter(|(row, _)| row.response.frame == frame && row.response.wave == wave)
                    {
                        let present = row.has_theme(theme);
                        groups[usize::from(present)].add(metric.value(record));
                    }

                    for (present, acc) in groups.iter().enumerate() {
                        if let Some(estimate) = acc.mean() {
                            records.push(SummaryRecord {
                                frame,
                                wave,
                                theme: theme.clone(),
                                metric,
                                group: Group::from_flag(present == 1),
                                estimate,
                                n: acc.n,
                            });
                        }
                    }
                }
            }
        }
    }

    debug!(
        joined = joined.len(),
        records = records.len(),
        "Summarized indicators by theme presence"
    );
    records
}

/// Absent and present estimates per theme, averaged over waves (and over
/// frames when `frame` is `None`).
///
/// Only themes with both groups are returned, in theme order.
pub fn theme_group_means(
    summary: &[SummaryRecord],
    metric: Metric,
    frame: Option<Frame>,
) -> Vec<(String, f64, f64)> {
    let mut sides: BTreeMap<&str, [Accumulator; 2]> = BTreeMap::new();
    for record in summary
        .iter()
        .filter(|r| r.metric == metric && frame.map_or(true, |f| r.frame == f))
    {
        let side = usize::from(record.group == Group::ThemePresent);
        sides.entry(record.theme.as_str()).or_default()[side].add(record.estimate);
    }

    sides
        .into_iter()
        .filter_map(|(theme, [absent, present])| {
            Some((theme.to_string(), absent.mean()?, present.mean()?))
        })
        .collect()
}

/// Present-minus-absent gap per theme, largest first; equal gaps keep theme order.
pub fn theme_gaps(summary: &[SummaryRecord], metric: Metric, frame: Option<Frame>) -> Vec<(String, f64)> {
    let mut gaps: Vec<(String, f64)> = theme_group_means(summary, metric, frame)
        .into_iter()
        .map(|(theme, absent, present)| (theme, present - absent))
        .collect();
    gaps.sort_by(|a, b| b.1.total_cmp(&a.1));
    gaps
}
