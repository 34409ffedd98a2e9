use crate::models::{QualmixError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Artifact locations under one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.base.join("data").join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.base.join("data").join("processed")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.base.join("data").join("outputs")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.base.join("docs")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.base.join("reports")
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.reports_dir().join("figures")
    }

    pub fn factsheet_assets_dir(&self) -> PathBuf {
        self.reports_dir().join("factsheet_assets").join("figures")
    }

    pub fn raw_responses(&self) -> PathBuf {
        self.raw_dir().join("open_ended_responses.csv")
    }

    pub fn coded(&self) -> PathBuf {
        self.processed_dir().join("coded_responses.csv")
    }

    pub fn coded_wide(&self) -> PathBuf {
        self.processed_dir().join("coded_responses_wide.csv")
    }

    pub fn coded_long(&self) -> PathBuf {
        self.processed_dir().join("coded_responses_long.csv")
    }

    pub fn theme_counts(&self) -> PathBuf {
        self.processed_dir().join("theme_counts.csv")
    }

    pub fn theme_frequencies(&self) -> PathBuf {
        self.outputs_dir().join("theme_frequencies.csv")
    }

    pub fn cooccurrence(&self) -> PathBuf {
        self.outputs_dir().join("theme_cooccurrence.csv")
    }

    pub fn exemplars(&self) -> PathBuf {
        self.outputs_dir().join("exemplar_quotes.csv")
    }

    pub fn indicators(&self) -> PathBuf {
        self.outputs_dir().join("quantitative_indicators.csv")
    }

    pub fn mixed_summary(&self) -> PathBuf {
        self.outputs_dir().join("mixed_methods_summary.csv")
    }

    pub fn coded_wide_coder2(&self) -> PathBuf {
        self.outputs_dir().join("coded_responses_wide_coder2.csv")
    }

    pub fn reliability(&self) -> PathBuf {
        self.outputs_dir().join("reliability_by_theme.csv")
    }

    pub fn reliability_summary(&self) -> PathBuf {
        self.outputs_dir().join("reliability_summary.md")
    }

    pub fn manifest(&self) -> PathBuf {
        self.outputs_dir().join("run_manifest.json")
    }

    pub fn codebook_doc(&self) -> PathBuf {
        self.docs_dir().join("codebook.md")
    }

    pub fn brief(&self) -> PathBuf {
        self.docs_dir().join("qualitative_brief.md")
    }

    pub fn factsheet(&self) -> PathBuf {
        self.reports_dir().join("qual_factsheet_latest.html")
    }

    /// Create every artifact directory.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.raw_dir(),
            self.processed_dir(),
            self.outputs_dir(),
            self.docs_dir(),
            self.figures_dir(),
        ] {
            fs::create_dir_all(&dir)
                .map_err(|e| QualmixError::io(format!("creating {}", dir.display()), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_under_base() {
        let layout = Layout::new("/srv/run");
        assert_eq!(
            layout.coded_wide(),
            Path::new("/srv/run/data/processed/coded_responses_wide.csv")
        );
        assert_eq!(
            layout.reliability_summary(),
            Path::new("/srv/run/data/outputs/reliability_summary.md")
        );
        assert_eq!(
            layout.factsheet(),
            Path::new("/srv/run/reports/qual_factsheet_latest.html")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_directories().unwrap();
        layout.ensure_directories().unwrap();
        assert!(layout.raw_dir().is_dir());
        assert!(layout.figures_dir().is_dir());
        assert!(layout.docs_dir().is_dir());
    }
}
