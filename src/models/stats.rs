//! Aggregate row types persisted by the pipeline stages.

use super::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Responses in one (frame, wave) bucket carrying a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub theme: String,
    pub frame: Frame,
    pub wave: u8,
    pub count: usize,
}

/// Theme count with the bucket size it is relative to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeFrequency {
    pub theme: String,
    pub frame: Frame,
    pub wave: u8,
    pub count: usize,

    /// Responses observed in the (frame, wave) bucket
    pub n_responses: usize,

    /// `count / n_responses`, undefined for an empty bucket
    pub percent: Option<f64>,
}

/// Unordered theme pair carried together by responses.
///
/// Always `theme_a < theme_b`; no self pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooccurrencePair {
    pub theme_a: String,
    pub theme_b: String,
    pub count: usize,

    /// `count / max(total_responses, 1)`
    pub normalized_rate: f64,
}

/// Representative quote for a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub theme: String,
    pub frame: Frame,
    pub wave: u8,
    pub state: String,
    pub quote: String,
}

/// Simulated quantitative indicators for one respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub respondent_id: String,
    pub frame: Frame,
    pub wave: u8,

    /// Perceived stress, 0-40
    pub stress_score: f64,

    /// 0 or 1
    pub food_insecurity: u8,

    /// 0 or 1; always 0 for providers
    pub employment_disruption: u8,

    /// 0-3; always 0 for households
    pub provider_closure_risk: u8,

    /// 1 when closure risk is 2 or more
    pub closure_risk_high: u8,
}

/// Quantitative metric summarized by theme presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    StressScoreMean,
    FoodInsecurityRate,
    ClosureRiskHighRate,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::StressScoreMean,
        Metric::FoodInsecurityRate,
        Metric::ClosureRiskHighRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StressScoreMean => "stress_score_mean",
            Self::FoodInsecurityRate => "food_insecurity_rate",
            Self::ClosureRiskHighRate => "closure_risk_high_rate",
        }
    }

    /// Frames the metric is meaningful for.
    pub fn frames(&self) -> &'static [Frame] {
        match self {
            Self::ClosureRiskHighRate => &[Frame::Provider],
            _ => &Frame::ALL,
        }
    }

    /// Value of the metric for one respondent.
    pub fn value(&self, record: &IndicatorRecord) -> f64 {
        match self {
            Self::StressScoreMean => record.stress_score,
            Self::FoodInsecurityRate => f64::from(record.food_insecurity),
            Self::ClosureRiskHighRate => f64::from(record.closure_risk_high),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the theme-presence partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    ThemeAbsent,
    ThemePresent,
}

impl Group {
    pub fn from_flag(present: bool) -> Self {
        if present {
            Self::ThemePresent
        } else {
            Self::ThemeAbsent
        }
    }
}

/// Group mean (or rate) of a metric within one (frame, wave) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub frame: Frame,
    pub wave: u8,
    pub theme: String,
    pub metric: Metric,
    pub group: Group,
    pub estimate: f64,
    pub n: usize,
}

/// Inter-coder agreement for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityRecord {
    pub theme: String,

    /// Fraction of respondents with matching labels, 0-1
    pub percent_agreement: f64,

    /// Cohen's kappa, roughly -1 to 1
    pub kappa: f64,
}

/// Statistics for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Responses generated
    pub total_responses: usize,

    /// Responses with at least one theme
    pub coded_responses: usize,

    /// Rows of the long (response x theme) table
    pub theme_mentions: usize,

    /// Distinct co-occurring theme pairs
    pub cooccurring_pairs: usize,

    /// Exemplar quotes selected across themes
    pub exemplars: usize,

    /// Mean percent agreement across themes
    pub mean_agreement: f64,

    /// Mean Cohen's kappa across themes
    pub mean_kappa: f64,

    /// Figures rendered
    pub figures: usize,

    /// Total runtime in seconds
    pub runtime_secs: f64,

    /// Share of responses with at least one theme (0.0 - 1.0)
    pub coverage_rate: f64,

    /// Average number of themes per response
    pub themes_per_response: f64,
}

impl RunStats {
    /// Calculate derived stats.
    pub fn finalize(&mut self) {
        if self.total_responses > 0 {
            self.coverage_rate = self.coded_responses as f64 / self.total_responses as f64;
            self.themes_per_response = self.theme_mentions as f64 / self.total_responses as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_guards_empty_run() {
        let mut stats = RunStats::default();
        stats.finalize();
        assert_eq!(stats.coverage_rate, 0.0);
        assert_eq!(stats.themes_per_response, 0.0);
    }

    #[test]
    fn test_finalize_rates() {
        let mut stats = RunStats {
            total_responses: 10,
            coded_responses: 8,
            theme_mentions: 15,
            ..Default::default()
        };
        stats.finalize();
        assert!((stats.coverage_rate - 0.8).abs() < 1e-12);
        assert!((stats.themes_per_response - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_closure_metric_is_provider_only() {
        assert_eq!(Metric::ClosureRiskHighRate.frames(), &[Frame::Provider]);
        assert_eq!(Metric::StressScoreMean.frames().len(), 2);
    }
}
