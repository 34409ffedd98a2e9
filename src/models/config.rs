//! Configuration models for qualmix.
//!
//! Every tunable of a run is parameterized here and resolved from an
//! optional TOML file, then overridden by CLI flags.

use crate::codebook::Codebook;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest wave count supported (January through March 2024).
pub const MAX_WAVES: u8 = 3;

/// Top-level configuration for qualmix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Synthetic survey generation
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Thematic coding settings
    #[serde(default)]
    pub coding: CodingConfig,

    /// Simulated second coder
    #[serde(default)]
    pub reliability: ReliabilityConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Synthetic survey generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Total number of synthetic responses
    #[serde(default = "default_responses")]
    pub responses: usize,

    /// Number of survey waves (1-3)
    #[serde(default = "default_waves")]
    pub waves: u8,

    /// Deterministic seed threaded through every random stage
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_responses() -> usize {
    2000
}

fn default_waves() -> u8 {
    MAX_WAVES
}

fn default_seed() -> u64 {
    42
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            responses: default_responses(),
            waves: default_waves(),
            seed: default_seed(),
        }
    }
}

/// Thematic coding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingConfig {
    /// Exemplar quotes selected per theme
    #[serde(default = "default_exemplars_per_theme")]
    pub exemplars_per_theme: usize,
}

fn default_exemplars_per_theme() -> usize {
    5
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            exemplars_per_theme: default_exemplars_per_theme(),
        }
    }
}

/// Second-coder noise model.
///
/// Labels of ambiguous themes are flipped more often than the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Flip probability for unambiguous themes
    #[serde(default = "default_base_flip")]
    pub base_flip: f64,

    /// Flip probability for ambiguous themes
    #[serde(default = "default_ambiguous_flip")]
    pub ambiguous_flip: f64,

    /// Themes coders tend to disagree on
    #[serde(default = "default_ambiguous_themes")]
    pub ambiguous_themes: Vec<String>,
}

fn default_base_flip() -> f64 {
    0.05
}

fn default_ambiguous_flip() -> f64 {
    0.08
}

fn default_ambiguous_themes() -> Vec<String> {
    vec!["AFFORDABILITY".to_string(), "FOOD_INSECURITY".to_string()]
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            base_flip: default_base_flip(),
            ambiguous_flip: default_ambiguous_flip(),
            ambiguous_themes: default_ambiguous_themes(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the artifact tree (data/, docs/, reports/)
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Whether to render SVG figures
    #[serde(default = "default_true")]
    pub figures: bool,

    /// Whether to render the HTML fact sheet
    #[serde(default = "default_true")]
    pub factsheet: bool,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            figures: true,
            factsheet: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Check every value before any data is generated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.responses == 0 {
            return Err(ConfigError::InvalidResponseCount(self.generation.responses));
        }
        if !(1..=MAX_WAVES).contains(&self.generation.waves) {
            return Err(ConfigError::InvalidWaveCount(self.generation.waves));
        }
        for (name, value) in [
            ("base_flip", self.reliability.base_flip),
            ("ambiguous_flip", self.reliability.ambiguous_flip),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Check that every ambiguous theme names a codebook theme.
    pub fn validate_themes(&self, codebook: &Codebook) -> Result<(), ConfigError> {
        match self
            .reliability
            .ambiguous_themes
            .iter()
            .find(|theme| !codebook.contains(theme))
        {
            Some(unknown) => Err(ConfigError::UnknownTheme(unknown.clone())),
            None => Ok(()),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Response count must be positive (got {0})")]
    InvalidResponseCount(usize),

    #[error("Wave count must be between 1 and {max} (got {0})", max = MAX_WAVES)]
    InvalidWaveCount(u8),

    #[error("{name} must be a probability in [0, 1] (got {value})")]
    InvalidRate { name: String, value: f64 },

    #[error("Theme '{0}' is not in the codebook")]
    UnknownTheme(String),
}
