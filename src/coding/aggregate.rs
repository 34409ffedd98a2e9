//! Theme counts, frequencies and pairwise co-occurrence.
//!
//! Group keys live in ordered maps, so every output is deterministic for a
//! given input.

use crate::models::{CodedResponse, CooccurrencePair, Frame, ThemeCount, ThemeFrequency, ThemeMention};
use std::collections::BTreeMap;

/// Count long-table rows per (theme, frame, wave), sorted by that key.
pub fn theme_counts(mentions: &[ThemeMention]) -> Vec<ThemeCount> {
    let mut counts: BTreeMap<(&str, Frame, u8), usize> = BTreeMap::new();
    for m in mentions {
        *counts.entry((m.theme.as_str(), m.frame, m.wave)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((theme, frame, wave), count)| ThemeCount {
            theme: theme.to_string(),
            frame,
            wave,
            count,
        })
        .collect()
}

/// Number of responses observed in each (frame, wave) bucket.
pub fn bucket_sizes(rows: &[CodedResponse]) -> BTreeMap<(Frame, u8), usize> {
    let mut sizes = BTreeMap::new();
    for row in rows {
        *sizes.entry((row.response.frame, row.response.wave)).or_default() += 1;
    }
    sizes
}

/// Attach bucket sizes to counts; the ratio is undefined for empty buckets.
pub fn theme_frequencies(counts: &[ThemeCount], rows: &[CodedResponse]) -> Vec<ThemeFrequency> {
    let sizes = bucket_sizes(rows);
    counts
        .iter()
        .map(|c| {
            let n_responses = sizes.get(&(c.frame, c.wave)).copied().unwrap_or(0);
            let percent = (n_responses > 0).then(|| c.count as f64 / n_responses as f64);
            ThemeFrequency {
                theme: c.theme.clone(),
                frame: c.frame,
                wave: c.wave,
                count: c.count,
                n_responses,
                percent,
            }
        })
        .collect()
}

/// Count unordered pairs of distinct themes carried by the same response.
///
/// Sorted by count descending; equal counts keep ascending (theme_a, theme_b)
/// order.
pub fn cooccurrence(rows: &[CodedResponse], total_responses: usize) -> Vec<CooccurrencePair> {
    let mut counter: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for row in rows {
        // BTreeSet iteration is sorted and unique, so a < b and a != b.
        let themes: Vec<&str> = row.themes.iter().map(String::as_str).collect();
        for (i, &a) in themes.iter().enumerate() {
            for &b in &themes[i + 1..] {
                *counter.entry((a, b)).or_default() += 1;
            }
        }
    }

    let denominator = total_responses.max(1) as f64;
    let mut pairs: Vec<CooccurrencePair> = counter
        .into_iter()
        .map(|((a, b), count)| CooccurrencePair {
            theme_a: a.to_string(),
            theme_b: b.to_string(),
            count,
            normalized_rate: count as f64 / denominator,
        })
        .collect();
    // Stable sort keeps the map's key order among ties.
    pairs.sort_by(|x, y| y.count.cmp(&x.count));
    pairs
}
