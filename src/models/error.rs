//! Error types for qualmix.
//!
//! Taxonomy:
//! - Configuration: rejected before any data is generated
//! - Missing dependency: a stage's input artifact does not exist yet
//! - Infrastructure: file, table, template and plotting failures
//! - Internal: invariant violations (bugs)

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for qualmix.
#[derive(Debug, Error)]
pub enum QualmixError {
    // ═══════════════════════════════════════════════════════════════════
    // CONFIGURATION — rejected synchronously, nothing written
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ═══════════════════════════════════════════════════════════════════
    // MISSING DEPENDENCY — upstream stage has not produced its artifact
    // ═══════════════════════════════════════════════════════════════════

    #[error("{artifact} must exist before {stage} (expected at {path})")]
    MissingDependency {
        artifact: String,
        path: PathBuf,
        stage: String,
    },

    #[error("Column '{column}' missing from {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // INFRASTRUCTURE — filesystem, tables, rendering
    // ═══════════════════════════════════════════════════════════════════

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Table error: {context}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════
    // INTERNAL — invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QualmixError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a table error with context.
    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    /// Create a plotting error from any displayable backend error.
    pub fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }

    /// Create a missing-dependency error for a stage input.
    pub fn missing(artifact: &str, path: impl Into<PathBuf>, stage: &str) -> Self {
        Self::MissingDependency {
            artifact: artifact.to_string(),
            path: path.into(),
            stage: stage.to_string(),
        }
    }

    /// Whether the failure is an upstream artifact that has not been produced.
    ///
    /// Stages are never retried; callers re-run the pipeline from the start.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }
}

/// Result type alias for qualmix.
pub type Result<T> = std::result::Result<T, QualmixError>;
