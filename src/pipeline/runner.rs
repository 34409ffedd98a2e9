//! End-to-end pipeline run.
//!
//! Pipeline flow:
//! Generate → Code → Indicators → Summary → Second coder → Reliability → Reports → Manifest

use super::stages::*;
use crate::codebook::Codebook;
use crate::generate::SyntheticConfig;
use crate::models::{Config, Result, RunStats};
use crate::reliability::{mean_of, FlipConfig};
use crate::store::{write_json, Layout};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Stage labels in execution order; drives the progress bar length.
const STAGES: [&str; 11] = [
    "generate",
    "code",
    "indicators",
    "summary",
    "second coder",
    "reliability",
    "codebook",
    "figures",
    "brief",
    "factsheet",
    "manifest",
];

/// Record of one run, persisted next to the output tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub responses: usize,
    pub waves: u8,
    pub stats: RunStats,
    pub artifacts: Vec<PathBuf>,
}

/// Full qualitative and mixed-methods pipeline.
pub struct Pipeline {
    config: Config,
    codebook: Codebook,
    show_progress: bool,
}

impl Pipeline {
    /// Create a pipeline after validating the configuration against the codebook.
    pub fn new(config: Config, codebook: Codebook) -> Result<Self> {
        config.validate()?;
        config.validate_themes(&codebook)?;
        Ok(Self {
            config,
            codebook,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.config.output.base_dir)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(STAGES.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        pb.set_style(style);
        pb
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self) -> Result<RunStats> {
        let start = Instant::now();
        let generation = &self.config.generation;
        let seed = generation.seed;
        let layout = self.layout();

        info!(
            responses = generation.responses,
            waves = generation.waves,
            seed,
            base_dir = %layout.base().display(),
            "Starting qualmix pipeline"
        );

        layout.ensure_directories()?;
        let pb = self.progress_bar();
        let mut stats = RunStats::default();
        let mut artifacts = Vec::new();

        let advance = |stage: &str| {
            debug!(stage, "Stage complete");
            pb.inc(1);
            pb.set_message(stage.to_string());
        };

        let responses = generate_stage(&layout, &SyntheticConfig::from(generation))?;
        info!(count = responses.len(), "Synthetic responses generated");
        artifacts.push(layout.raw_responses());
        advance(STAGES[0]);

        let coding = coding_stage(
            &layout,
            &self.codebook,
            self.config.coding.exemplars_per_theme,
            seed,
        )?;
        stats.total_responses = coding.responses;
        stats.coded_responses = coding.coded;
        stats.theme_mentions = coding.mentions;
        stats.cooccurring_pairs = coding.pairs;
        stats.exemplars = coding.exemplars;
        artifacts.extend([
            layout.coded(),
            layout.coded_wide(),
            layout.coded_long(),
            layout.theme_counts(),
            layout.theme_frequencies(),
            layout.cooccurrence(),
            layout.exemplars(),
        ]);
        advance(STAGES[1]);

        indicator_stage(&layout, seed)?;
        artifacts.push(layout.indicators());
        advance(STAGES[2]);

        summary_stage(&layout)?;
        artifacts.push(layout.mixed_summary());
        advance(STAGES[3]);

        second_coder_stage(&layout, &FlipConfig::from(&self.config.reliability), seed)?;
        artifacts.push(layout.coded_wide_coder2());
        advance(STAGES[4]);

        let reliability = reliability_stage(&layout)?;
        stats.mean_agreement = mean_of(&reliability, |r| r.percent_agreement);
        stats.mean_kappa = mean_of(&reliability, |r| r.kappa);
        artifacts.extend([layout.reliability(), layout.reliability_summary()]);
        advance(STAGES[5]);

        artifacts.push(codebook_stage(&layout, &self.codebook)?);
        advance(STAGES[6]);

        let figures = if self.config.output.figures {
            figures_stage(&layout)?
        } else {
            Vec::new()
        };
        stats.figures = figures.len();
        artifacts.extend(figures.iter().map(|f| f.path.clone()));
        advance(STAGES[7]);

        let generated_at = Utc::now();
        artifacts.push(brief_stage(&layout, generated_at)?);
        advance(STAGES[8]);

        if self.config.output.factsheet {
            artifacts.push(factsheet_stage(&layout, &figures, generated_at)?);
        }
        advance(STAGES[9]);

        stats.runtime_secs = start.elapsed().as_secs_f64();
        stats.finalize();

        artifacts.push(layout.manifest());
        let manifest = RunManifest {
            generated_at,
            seed,
            responses: generation.responses,
            waves: generation.waves,
            stats: stats.clone(),
            artifacts,
        };
        write_json(&layout.manifest(), &manifest)?;
        advance(STAGES[10]);

        pb.finish_with_message(format!(
            "Done! {} responses, {} coded",
            stats.total_responses, stats.coded_responses
        ));

        info!(
            coded = stats.coded_responses,
            mentions = stats.theme_mentions,
            coverage = format!("{:.1}%", stats.coverage_rate * 100.0),
            mean_kappa = format!("{:.2}", stats.mean_kappa),
            runtime = format!("{:.2}s", stats.runtime_secs),
            "Pipeline complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigError, QualmixError};
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir, responses: usize) -> Config {
        let mut config = Config::default();
        config.generation.responses = responses;
        config.output.base_dir = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_invalid_config_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, 10);
        config.generation.waves = 4;
        let err = Pipeline::new(config, Codebook::standard()).err().unwrap();
        assert!(matches!(
            err,
            QualmixError::Config(ConfigError::InvalidWaveCount(4))
        ));
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_run_writes_manifest() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, 60);
        config.output.figures = false;
        config.output.factsheet = false;

        let pipeline = Pipeline::new(config, Codebook::standard())
            .unwrap()
            .with_progress(false);
        let stats = pipeline.run().unwrap();
        assert_eq!(stats.total_responses, 60);
        assert_eq!(stats.figures, 0);

        let layout = pipeline.layout();
        let manifest: RunManifest =
            serde_json::from_str(&fs::read_to_string(layout.manifest()).unwrap()).unwrap();
        assert_eq!(manifest.seed, 42);
        assert_eq!(manifest.responses, 60);
        assert_eq!(manifest.stats.total_responses, 60);
        assert!(manifest.artifacts.contains(&layout.brief()));
        assert!(!manifest.artifacts.contains(&layout.factsheet()));
        assert!(!layout.factsheet().exists());
    }
}
