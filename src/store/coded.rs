//! Coded table codecs.
//!
//! The wide table carries one boolean column per theme. Theme columns are
//! recognized on read by their all-uppercase header.

use super::{open_table, require_columns, write_rows};
use crate::models::{CodedResponse, CodedTable, QualmixError, Response, Result};
use crate::text::preprocess_text;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

const CLEANED_TEXT: &str = "cleaned_text";
const THEMES: &str = "themes";

/// Whether a header names a theme column.
pub fn is_theme_column(header: &str) -> bool {
    header != "ID"
        && header.chars().any(char::is_alphabetic)
        && !header.chars().any(char::is_lowercase)
}

fn bool_cell(value: bool) -> String {
    let cell = if value { "True" } else { "False" };
    cell.to_string()
}

fn parse_bool(cell: &str, column: &str, path: &Path) -> Result<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(QualmixError::ParseError(format!(
            "{}: column {column} holds '{other}', expected a boolean",
            path.display()
        ))),
    }
}

fn base_headers() -> Vec<String> {
    Response::FIELDS
        .iter()
        .chain(&[CLEANED_TEXT])
        .map(|s| s.to_string())
        .collect()
}

fn base_cells(row: &CodedResponse) -> Vec<String> {
    let mut cells = row.response.fields();
    cells.push(row.cleaned_text.clone());
    cells
}

/// Narrow form: response fields, cleaned text and `|`-joined themes.
pub fn write_coded_narrow(path: &Path, table: &CodedTable) -> Result<()> {
    let mut headers = base_headers();
    headers.push(THEMES.to_string());

    write_rows(
        path,
        &headers,
        table.rows.iter().map(|row| {
            let mut cells = base_cells(row);
            cells.push(row.themes_joined());
            cells
        }),
    )?;
    debug!(path = %path.display(), rows = table.len(), "Wrote narrow coded table");
    Ok(())
}

/// Wide form: response fields, cleaned text and one boolean column per theme.
pub fn write_coded_wide(path: &Path, table: &CodedTable) -> Result<()> {
    let mut headers = base_headers();
    headers.extend(table.themes.iter().cloned());

    write_rows(
        path,
        &headers,
        table.rows.iter().map(|row| {
            let mut cells = base_cells(row);
            cells.extend(table.themes.iter().map(|t| bool_cell(row.has_theme(t))));
            cells
        }),
    )?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        themes = table.themes.len(),
        "Wrote wide coded table"
    );
    Ok(())
}

/// Read a wide coded table a stage depends on.
///
/// A missing `cleaned_text` column is rebuilt from the response text.
pub fn read_coded_wide(path: &Path, artifact: &str, stage: &str) -> Result<CodedTable> {
    let mut reader = open_table(path, artifact, stage)?;
    let headers = reader
        .headers()
        .map_err(|e| QualmixError::csv(format!("reading {}", path.display()), e))?
        .clone();
    require_columns(&headers, &Response::FIELDS, path)?;

    let theme_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| is_theme_column(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();
    let cleaned_index = headers.iter().position(|h| h == CLEANED_TEXT);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| QualmixError::csv(format!("reading {}", path.display()), e))?;
        let response: Response = record
            .deserialize(Some(&headers))
            .map_err(|e| QualmixError::csv(format!("parsing {}", path.display()), e))?;

        let cleaned_text = match cleaned_index.and_then(|i| record.get(i)) {
            Some(text) => text.to_string(),
            None => preprocess_text(&response.open_response_text),
        };

        let mut themes = BTreeSet::new();
        for (i, theme) in &theme_columns {
            if parse_bool(record.get(*i).unwrap_or_default(), theme, path)? {
                themes.insert(theme.clone());
            }
        }

        rows.push(CodedResponse {
            response,
            cleaned_text,
            themes,
        });
    }

    let mut themes: Vec<String> = theme_columns.into_iter().map(|(_, t)| t).collect();
    themes.sort();
    Ok(CodedTable::new(themes, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frame, IncomeBracket, ProviderSetting};
    use std::fs;
    use tempfile::TempDir;

    fn table() -> CodedTable {
        let household = Response {
            respondent_id: "R00001".to_string(),
            frame: Frame::Household,
            wave: 1,
            survey_month: "January 2024".to_string(),
            state: "CA".to_string(),
            income_bracket: Some(IncomeBracket::Under30k),
            provider_setting: None,
            open_response_text: "Tuition is too expensive, we skip meals.".to_string(),
        };
        let provider = Response {
            respondent_id: "R00002".to_string(),
            frame: Frame::Provider,
            wave: 3,
            survey_month: "March 2024".to_string(),
            state: "TX".to_string(),
            income_bracket: None,
            provider_setting: Some(ProviderSetting::FamilyHome),
            open_response_text: "All fine.".to_string(),
        };
        CodedTable::new(
            vec!["AFFORDABILITY".to_string(), "FOOD_INSECURITY".to_string()],
            vec![
                CodedResponse {
                    cleaned_text: preprocess_text(&household.open_response_text),
                    response: household,
                    themes: ["AFFORDABILITY", "FOOD_INSECURITY"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                CodedResponse {
                    cleaned_text: preprocess_text(&provider.open_response_text),
                    response: provider,
                    themes: BTreeSet::new(),
                },
            ],
        )
    }

    #[test]
    fn test_theme_column_detection() {
        assert!(is_theme_column("STRESS_BURNOUT"));
        assert!(!is_theme_column("respondent_id"));
        assert!(!is_theme_column("ID"));
        assert!(!is_theme_column("___"));
    }

    #[test]
    fn test_wide_table_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        let original = table();
        write_coded_wide(&path, &original).unwrap();

        let header = fs::read_to_string(&path).unwrap().lines().next().unwrap().to_string();
        assert!(header.ends_with("cleaned_text,AFFORDABILITY,FOOD_INSECURITY"));

        let loaded = read_coded_wide(&path, "wide table", "test").unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_narrow_joins_themes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("narrow.csv");
        write_coded_narrow(&path, &table()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("AFFORDABILITY|FOOD_INSECURITY"));
        assert!(content.lines().next().unwrap().ends_with(",themes"));
    }

    #[test]
    fn test_foreign_wide_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        fs::write(
            &path,
            "respondent_id,frame,wave,survey_month,state,income_bracket,provider_setting,open_response_text,HOUSING\n\
             R00009,household,2,February 2024,NY,30-60k,,Rent went up again,1\n",
        )
        .unwrap();
        let loaded = read_coded_wide(&path, "wide table", "test").unwrap();
        assert_eq!(loaded.themes, vec!["HOUSING"]);
        assert!(loaded.rows[0].has_theme("HOUSING"));
        assert_eq!(loaded.rows[0].cleaned_text, "rent went up again");
        assert_eq!(loaded.rows[0].response.income_bracket, Some(IncomeBracket::From30To60k));
    }

    #[test]
    fn test_missing_wide_table() {
        let dir = TempDir::new().unwrap();
        let err = read_coded_wide(&dir.path().join("none.csv"), "wide table", "indicators")
            .unwrap_err();
        assert!(err.is_missing_dependency());
    }

    #[test]
    fn test_missing_response_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        fs::write(&path, "respondent_id,AFFORDABILITY\nR1,True\n").unwrap();
        let err = read_coded_wide(&path, "wide table", "test").unwrap_err();
        assert!(matches!(err, QualmixError::MissingColumn { .. }));
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        fs::write(
            &path,
            "respondent_id,frame,wave,survey_month,state,income_bracket,provider_setting,open_response_text,A_B\n\
             R1,provider,1,January 2024,GA,,center,text,maybe\n",
        )
        .unwrap();
        assert!(matches!(
            read_coded_wide(&path, "wide table", "test"),
            Err(QualmixError::ParseError(_))
        ));
    }
}
