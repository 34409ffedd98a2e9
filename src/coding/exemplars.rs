//! Exemplar quote selection with a geographic-diversity preference.

use crate::models::{Exemplar, ThemeMention};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

/// Seed for one theme's draw: the run seed plus a stable theme-derived offset.
///
/// Each theme's selection is reproducible regardless of which other themes
/// are drawn or in what order.
pub fn theme_seed(seed: u64, theme: &str) -> u64 {
    seed.wrapping_add(xxh3_64(theme.as_bytes()) % (1u64 << 32))
}

/// Select up to `k` quotes for `theme`.
///
/// Candidates are deduplicated by cleaned text and shuffled; one quote per
/// distinct state is taken first, then any remaining candidates fill up to
/// `k`. Output is ordered by (frame, wave, state). Fewer than `k` candidates
/// simply returns all of them.
pub fn select_exemplars(
    mentions: &[ThemeMention],
    theme: &str,
    k: usize,
    seed: u64,
) -> Vec<Exemplar> {
    let mut seen = HashSet::new();
    let mut candidates: Vec<&ThemeMention> = mentions
        .iter()
        .filter(|m| m.theme == theme && !m.open_response_text.trim().is_empty())
        .filter(|m| seen.insert(m.cleaned_text.as_str()))
        .collect();

    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(theme_seed(seed, theme));
    candidates.shuffle(&mut rng);

    let mut taken = vec![false; candidates.len()];
    let mut states = HashSet::new();
    let mut selected: Vec<&ThemeMention> = Vec::with_capacity(k);

    for (i, candidate) in candidates.iter().enumerate() {
        if selected.len() == k {
            break;
        }
        if states.insert(candidate.state.as_str()) {
            taken[i] = true;
            selected.push(*candidate);
        }
    }

    for (i, candidate) in candidates.iter().enumerate() {
        if selected.len() == k {
            break;
        }
        if !taken[i] {
            selected.push(*candidate);
        }
    }

    selected.sort_by(|a, b| (a.frame, a.wave, &a.state).cmp(&(b.frame, b.wave, &b.state)));

    selected
        .into_iter()
        .map(|m| Exemplar {
            theme: theme.to_string(),
            frame: m.frame,
            wave: m.wave,
            state: m.state.clone(),
            quote: m.open_response_text.trim().to_string(),
        })
        .collect()
}

/// Exemplars for every theme, concatenated in theme order.
pub fn select_all_exemplars(
    mentions: &[ThemeMention],
    themes: &[String],
    k: usize,
    seed: u64,
) -> Vec<Exemplar> {
    themes
        .iter()
        .flat_map(|theme| select_exemplars(mentions, theme, k, seed))
        .collect()
}
