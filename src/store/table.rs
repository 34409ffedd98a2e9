//! Header-carrying CSV tables and atomic file writes.
//!
//! Every table is written to a temporary sibling and renamed into place, so
//! a reader never sees a half-written artifact. Empty tables still carry
//! their header row.

use crate::models::{
    CooccurrencePair, Exemplar, IndicatorRecord, QualmixError, ReliabilityRecord, Response,
    Result, SummaryRecord, ThemeCount, ThemeFrequency, ThemeMention,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A row type persisted as one CSV table.
pub trait Record: Serialize + DeserializeOwned {
    /// Column names, in serialization order.
    const HEADERS: &'static [&'static str];
}

impl Record for Response {
    const HEADERS: &'static [&'static str] = &Response::FIELDS;
}

impl Record for ThemeMention {
    const HEADERS: &'static [&'static str] = &[
        "respondent_id",
        "frame",
        "wave",
        "survey_month",
        "state",
        "open_response_text",
        "cleaned_text",
        "theme",
    ];
}

impl Record for ThemeCount {
    const HEADERS: &'static [&'static str] = &["theme", "frame", "wave", "count"];
}

impl Record for ThemeFrequency {
    const HEADERS: &'static [&'static str] =
        &["theme", "frame", "wave", "count", "n_responses", "percent"];
}

impl Record for CooccurrencePair {
    const HEADERS: &'static [&'static str] = &["theme_a", "theme_b", "count", "normalized_rate"];
}

impl Record for Exemplar {
    const HEADERS: &'static [&'static str] = &["theme", "frame", "wave", "state", "quote"];
}

impl Record for IndicatorRecord {
    const HEADERS: &'static [&'static str] = &[
        "respondent_id",
        "frame",
        "wave",
        "stress_score",
        "food_insecurity",
        "employment_disruption",
        "provider_closure_risk",
        "closure_risk_high",
    ];
}

impl Record for SummaryRecord {
    const HEADERS: &'static [&'static str] =
        &["frame", "wave", "theme", "metric", "group", "estimate", "n"];
}

impl Record for ReliabilityRecord {
    const HEADERS: &'static [&'static str] = &["theme", "percent_agreement", "kappa"];
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write through `write` into a temp file, then rename it over `path`.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| QualmixError::io(format!("creating {}", parent.display()), e))?;
    }

    let temp = temp_path(path);
    let file = File::create(&temp)
        .map_err(|e| QualmixError::io(format!("creating {}", temp.display()), e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .map_err(|e| QualmixError::io(format!("flushing {}", temp.display()), e))?;
    drop(writer);

    fs::rename(&temp, path)
        .map_err(|e| QualmixError::io(format!("renaming into {}", path.display()), e))
}

/// Write raw string rows under an explicit header.
pub fn write_rows<I>(path: &Path, headers: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let context = || format!("writing {}", path.display());
    write_atomic(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer
            .write_record(headers)
            .map_err(|e| QualmixError::csv(context(), e))?;
        for row in rows {
            writer
                .write_record(&row)
                .map_err(|e| QualmixError::csv(context(), e))?;
        }
        writer
            .flush()
            .map_err(|e| QualmixError::io(context(), e))
    })
}

/// Write a typed table; the header row is present even with no rows.
pub fn write_table<R: Record>(path: &Path, rows: &[R]) -> Result<()> {
    let context = || format!("writing {}", path.display());
    write_atomic(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer
            .write_record(R::HEADERS)
            .map_err(|e| QualmixError::csv(context(), e))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| QualmixError::csv(context(), e))?;
        }
        writer
            .flush()
            .map_err(|e| QualmixError::io(context(), e))
    })?;

    debug!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Open a table a stage depends on, failing with `MissingDependency` if absent.
pub fn open_table(path: &Path, artifact: &str, stage: &str) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(QualmixError::missing(artifact, path, stage));
    }
    csv::Reader::from_path(path).map_err(|e| QualmixError::csv(format!("opening {}", path.display()), e))
}

/// Fail with `MissingColumn` unless every required column is present.
pub fn require_columns(headers: &csv::StringRecord, required: &[&str], path: &Path) -> Result<()> {
    match required.iter().find(|col| !headers.iter().any(|h| h == **col)) {
        Some(column) => Err(QualmixError::MissingColumn {
            column: column.to_string(),
            path: path.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Read a typed table a stage depends on.
pub fn read_table<R: Record>(path: &Path, artifact: &str, stage: &str) -> Result<Vec<R>> {
    let mut reader = open_table(path, artifact, stage)?;
    let headers = reader
        .headers()
        .map_err(|e| QualmixError::csv(format!("reading {}", path.display()), e))?
        .clone();
    require_columns(&headers, R::HEADERS, path)?;

    reader
        .deserialize()
        .map(|row| row.map_err(|e| QualmixError::csv(format!("parsing {}", path.display()), e)))
        .collect()
}

/// Read a table that reporting can do without; `None` when it does not exist.
pub fn read_optional_table<R: Record>(path: &Path) -> Result<Option<Vec<R>>> {
    if !path.exists() {
        return Ok(None);
    }
    read_table(path, "optional table", "reporting").map(Some)
}

/// Write a text artifact atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, |out| {
        out.write_all(content.as_bytes())
            .map_err(|e| QualmixError::io(format!("writing {}", path.display()), e))
    })?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote document");
    Ok(())
}

/// Write a value as pretty JSON atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, |out| {
        serde_json::to_writer_pretty(&mut *out, value)?;
        out.write_all(b"\n")
            .map_err(|e| QualmixError::io(format!("writing {}", path.display()), e))
    })
}

/// Read a text artifact if it exists.
pub fn read_optional_text(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| QualmixError::io(format!("reading {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frame, Group, Metric};
    use tempfile::TempDir;

    #[test]
    fn test_empty_table_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pairs.csv");
        write_table::<CooccurrencePair>(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "theme_a,theme_b,count,normalized_rate\n");
        assert!(read_table::<CooccurrencePair>(&path, "pairs", "test")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_typed_table_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("summary.csv");
        let rows = vec![SummaryRecord {
            frame: Frame::Provider,
            wave: 2,
            theme: "AFFORDABILITY".to_string(),
            metric: Metric::ClosureRiskHighRate,
            group: Group::ThemeAbsent,
            estimate: 0.25,
            n: 4,
        }];
        write_table(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("provider,2,AFFORDABILITY,closure_risk_high_rate,theme_absent,0.25,4"));
        assert_eq!(read_table::<SummaryRecord>(&path, "summary", "test").unwrap(), rows);
    }

    #[test]
    fn test_undefined_percent_is_empty_cell() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("freq.csv");
        let rows = vec![ThemeFrequency {
            theme: "A".to_string(),
            frame: Frame::Household,
            wave: 1,
            count: 1,
            n_responses: 0,
            percent: None,
        }];
        write_table(&path, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("A,household,1,1,0,\n"));
        assert_eq!(read_table::<ThemeFrequency>(&path, "freq", "test").unwrap(), rows);
    }

    #[test]
    fn test_missing_table_is_missing_dependency() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        let err = read_table::<IndicatorRecord>(&path, "indicators", "mixed methods").unwrap_err();
        assert!(err.is_missing_dependency());
        assert!(err.to_string().contains("mixed methods"));
        assert!(read_optional_table::<IndicatorRecord>(&path).unwrap().is_none());
    }

    #[test]
    fn test_missing_column_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rel.csv");
        fs::write(&path, "theme,kappa\nA,0.5\n").unwrap();
        let err = read_table::<ReliabilityRecord>(&path, "reliability", "test").unwrap_err();
        assert!(matches!(err, QualmixError::MissingColumn { ref column, .. } if column == "percent_agreement"));
    }

    #[test]
    fn test_write_text_replaces_and_cleans_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        write_text(&path, "first").unwrap();
        write_text(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path(&path).exists());
        assert_eq!(read_optional_text(&path).unwrap().as_deref(), Some("second"));
        assert!(read_optional_text(&dir.path().join("none.md")).unwrap().is_none());
    }
}
