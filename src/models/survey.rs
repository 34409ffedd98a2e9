//! Survey record types.
//!
//! A `Response` is created once by the generator and never mutated; coding
//! wraps it in a `CodedResponse` carrying the derived fields.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Survey respondent category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Household,
    Provider,
}

impl Frame {
    pub const ALL: [Frame; 2] = [Frame::Household, Frame::Provider];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Household => "household",
            Self::Provider => "provider",
        }
    }

    /// Capitalized label for rendered documents.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Household => "Household",
            Self::Provider => "Provider",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Household income bracket (household frame only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeBracket {
    #[serde(rename = "<30k")]
    Under30k,
    #[serde(rename = "30-60k")]
    From30To60k,
    #[serde(rename = "60-100k")]
    From60To100k,
    #[serde(rename = ">100k")]
    Over100k,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 4] = [
        IncomeBracket::Under30k,
        IncomeBracket::From30To60k,
        IncomeBracket::From60To100k,
        IncomeBracket::Over100k,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under30k => "<30k",
            Self::From30To60k => "30-60k",
            Self::From60To100k => "60-100k",
            Self::Over100k => ">100k",
        }
    }
}

/// Care setting of a provider respondent (provider frame only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSetting {
    Center,
    FamilyHome,
    Informal,
    AfterSchool,
}

impl ProviderSetting {
    pub const ALL: [ProviderSetting; 4] = [
        ProviderSetting::Center,
        ProviderSetting::FamilyHome,
        ProviderSetting::Informal,
        ProviderSetting::AfterSchool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::FamilyHome => "family_home",
            Self::Informal => "informal",
            Self::AfterSchool => "after_school",
        }
    }
}

/// One open-ended survey response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier (R00001, R00002, ...)
    pub respondent_id: String,

    /// Household or provider
    pub frame: Frame,

    /// Survey round, 1-based
    pub wave: u8,

    /// Month label of the wave
    pub survey_month: String,

    /// Two-letter state code
    pub state: String,

    /// Household respondents only
    pub income_bracket: Option<IncomeBracket>,

    /// Provider respondents only
    pub provider_setting: Option<ProviderSetting>,

    /// Free text answer
    pub open_response_text: String,
}

impl Response {
    /// Column names in table order.
    pub const FIELDS: [&'static str; 8] = [
        "respondent_id",
        "frame",
        "wave",
        "survey_month",
        "state",
        "income_bracket",
        "provider_setting",
        "open_response_text",
    ];

    /// Field values in `FIELDS` order; absent options become empty cells.
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.respondent_id.clone(),
            self.frame.as_str().to_string(),
            self.wave.to_string(),
            self.survey_month.clone(),
            self.state.clone(),
            self.income_bracket
                .map(|b| b.as_str().to_string())
                .unwrap_or_default(),
            self.provider_setting
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            self.open_response_text.clone(),
        ]
    }
}

/// A response with its derived coding fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedResponse {
    pub response: Response,

    /// Normalized, stopword-free text used for matching
    pub cleaned_text: String,

    /// Assigned themes; sorted and unique
    pub themes: BTreeSet<String>,
}

impl CodedResponse {
    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.contains(theme)
    }

    /// Themes joined the way the narrow table stores them.
    pub fn themes_joined(&self) -> String {
        self.themes.iter().map(String::as_str).collect::<Vec<_>>().join("|")
    }
}

/// The coded survey in wide form: every response plus the theme columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodedTable {
    /// Theme column names, sorted
    pub themes: Vec<String>,
    pub rows: Vec<CodedResponse>,
}

impl CodedTable {
    pub fn new(themes: Vec<String>, rows: Vec<CodedResponse>) -> Self {
        Self { themes, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Boolean label matrix, one vector per theme column.
    pub fn labels(&self) -> ThemeLabels {
        let respondent_ids = self
            .rows
            .iter()
            .map(|r| r.response.respondent_id.clone())
            .collect();
        let labels = self
            .themes
            .iter()
            .map(|theme| {
                let column = self.rows.iter().map(|r| r.has_theme(theme)).collect();
                (theme.clone(), column)
            })
            .collect();
        ThemeLabels {
            respondent_ids,
            labels,
        }
    }

    /// Copy of this table whose theme assignments come from `labels`.
    ///
    /// Respondents missing from `labels` keep no themes.
    pub fn with_labels(&self, labels: &ThemeLabels) -> Self {
        let position: BTreeMap<&str, usize> = labels
            .respondent_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let themes = match position.get(row.response.respondent_id.as_str()) {
                    Some(&i) => labels
                        .labels
                        .iter()
                        .filter(|(_, column)| column[i])
                        .map(|(theme, _)| theme.clone())
                        .collect(),
                    None => BTreeSet::new(),
                };
                CodedResponse {
                    response: row.response.clone(),
                    cleaned_text: row.cleaned_text.clone(),
                    themes,
                }
            })
            .collect();

        Self {
            themes: self.themes.clone(),
            rows,
        }
    }
}

/// Per-theme boolean labels aligned to an ordered respondent list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeLabels {
    pub respondent_ids: Vec<String>,

    /// theme -> one label per respondent, in `respondent_ids` order
    pub labels: BTreeMap<String, Vec<bool>>,
}

impl ThemeLabels {
    pub fn len(&self) -> usize {
        self.respondent_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.respondent_ids.is_empty()
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn column(&self, theme: &str) -> Option<&[bool]> {
        self.labels.get(theme).map(Vec::as_slice)
    }
}

/// One row of the exploded (response x assigned theme) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeMention {
    pub respondent_id: String,
    pub frame: Frame,
    pub wave: u8,
    pub survey_month: String,
    pub state: String,
    pub open_response_text: String,
    pub cleaned_text: String,
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(id: &str, themes: &[&str]) -> CodedResponse {
        CodedResponse {
            response: Response {
                respondent_id: id.to_string(),
                frame: Frame::Household,
                wave: 1,
                survey_month: "January 2024".to_string(),
                state: "CA".to_string(),
                income_bracket: Some(IncomeBracket::Under30k),
                provider_setting: None,
                open_response_text: "text".to_string(),
            },
            cleaned_text: "text".to_string(),
            themes: themes.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_themes_joined_sorted() {
        let row = coded("R00001", &["STRESS_BURNOUT", "AFFORDABILITY"]);
        assert_eq!(row.themes_joined(), "AFFORDABILITY|STRESS_BURNOUT");
    }

    #[test]
    fn test_labels_follow_row_order() {
        let table = CodedTable::new(
            vec!["A".to_string(), "B".to_string()],
            vec![coded("R00001", &["A"]), coded("R00002", &["A", "B"])],
        );
        let labels = table.labels();
        assert_eq!(labels.respondent_ids, vec!["R00001", "R00002"]);
        assert_eq!(labels.column("A"), Some(&[true, true][..]));
        assert_eq!(labels.column("B"), Some(&[false, true][..]));
    }

    #[test]
    fn test_with_labels_replaces_assignments() {
        let table = CodedTable::new(
            vec!["A".to_string(), "B".to_string()],
            vec![coded("R00001", &["A"]), coded("R00002", &["B"])],
        );
        let mut labels = table.labels();
        labels.labels.insert("A".to_string(), vec![false, true]);

        let relabeled = table.with_labels(&labels);
        assert!(relabeled.rows[0].themes.is_empty());
        assert!(relabeled.rows[1].has_theme("A"));
        assert!(relabeled.rows[1].has_theme("B"));
    }

    #[test]
    fn test_frame_order_household_first() {
        assert!(Frame::Household < Frame::Provider);
        assert_eq!(Frame::Provider.to_string(), "provider");
    }
}
