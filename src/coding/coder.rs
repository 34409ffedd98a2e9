//! Rule-based thematic coder.
//!
//! Matching is naive substring search over the preprocessed text, so the
//! keyword "shift" also matches inside "nightshift". This over-matching is
//! kept as-is for compatibility with earlier coded outputs.

use crate::codebook::Codebook;
use crate::models::{CodedResponse, CodedTable, Response, ThemeMention};
use crate::text::preprocess_text;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Preprocessed keywords per theme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMap {
    keywords: BTreeMap<String, Vec<String>>,
}

impl KeywordMap {
    /// Preprocess every keyword with the same pipeline as response text.
    ///
    /// Keywords that normalize to nothing are dropped.
    pub fn from_codebook(codebook: &Codebook) -> Self {
        let keywords = codebook
            .themes()
            .map(|theme| {
                let normalized = theme
                    .keywords
                    .iter()
                    .map(|k| preprocess_text(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                (theme.name.clone(), normalized)
            })
            .collect();
        Self { keywords }
    }

    /// Theme names in sorted order.
    pub fn themes(&self) -> Vec<String> {
        self.keywords.keys().cloned().collect()
    }

    pub fn keywords(&self, theme: &str) -> Option<&[String]> {
        self.keywords.get(theme).map(Vec::as_slice)
    }

    /// Themes with at least one keyword occurring in `text`.
    ///
    /// `text` is expected to be preprocessed already. An empty set is valid.
    pub fn match_themes(&self, text: &str) -> BTreeSet<String> {
        self.keywords
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(theme, _)| theme.clone())
            .collect()
    }
}

/// Derive cleaned text and theme assignments for one response.
pub fn code_response(response: Response, keyword_map: &KeywordMap) -> CodedResponse {
    let cleaned_text = preprocess_text(&response.open_response_text);
    let themes = keyword_map.match_themes(&cleaned_text);
    CodedResponse {
        response,
        cleaned_text,
        themes,
    }
}

/// Code every response against the codebook.
///
/// The returned table has one theme column per codebook theme.
pub fn code_responses(responses: Vec<Response>, codebook: &Codebook) -> CodedTable {
    let keyword_map = KeywordMap::from_codebook(codebook);
    let rows: Vec<CodedResponse> = responses
        .into_iter()
        .map(|r| code_response(r, &keyword_map))
        .collect();

    debug!(
        responses = rows.len(),
        uncoded = rows.iter().filter(|r| r.themes.is_empty()).count(),
        "Applied thematic coding"
    );
    CodedTable::new(keyword_map.themes(), rows)
}

/// Explode coded responses into one row per (response, theme).
///
/// Responses without themes contribute no rows.
pub fn explode(rows: &[CodedResponse]) -> Vec<ThemeMention> {
    rows.iter()
        .flat_map(|row| {
            row.themes.iter().map(move |theme| ThemeMention {
                respondent_id: row.response.respondent_id.clone(),
                frame: row.response.frame,
                wave: row.response.wave,
                survey_month: row.response.survey_month.clone(),
                state: row.response.state.clone(),
                open_response_text: row.response.open_response_text.clone(),
                cleaned_text: row.cleaned_text.clone(),
                theme: theme.clone(),
            })
        })
        .collect()
}
