use crate::models::{ReliabilityConfig, ThemeLabels};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use tracing::debug;

/// Label-flip probabilities of the simulated second coder.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipConfig {
    pub base_flip: f64,
    pub ambiguous_flip: f64,
    pub ambiguous_themes: BTreeSet<String>,
}

impl FlipConfig {
    pub fn rate(&self, theme: &str) -> f64 {
        if self.ambiguous_themes.contains(theme) {
            self.ambiguous_flip
        } else {
            self.base_flip
        }
    }
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self::from(&ReliabilityConfig::default())
    }
}

impl From<&ReliabilityConfig> for FlipConfig {
    fn from(config: &ReliabilityConfig) -> Self {
        Self {
            base_flip: config.base_flip,
            ambiguous_flip: config.ambiguous_flip,
            ambiguous_themes: config.ambiguous_themes.iter().cloned().collect(),
        }
    }
}

/// Copy `labels`, flipping each one independently at its theme's rate.
///
/// Draws go theme by theme in sorted order, then respondent by respondent, one
/// uniform per label.
pub fn simulate_second_coder(labels: &ThemeLabels, flips: &FlipConfig, seed: u64) -> ThemeLabels {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flipped = 0usize;

    let coder2 = labels
        .labels
        .iter()
        .map(|(theme, column)| {
            let rate = flips.rate(theme);
            let values = column
                .iter()
                .map(|&value| {
                    if rng.gen::<f64>() < rate {
                        flipped += 1;
                        !value
                    } else {
                        value
                    }
                })
                .collect();
            (theme.clone(), values)
        })
        .collect();

    debug!(flipped, seed, "Simulated second coder");
    ThemeLabels {
        respondent_ids: labels.respondent_ids.clone(),
        labels: coder2,
    }
}
