//! Structured qualitative codebook.
//!
//! The codebook is an immutable value passed explicitly to the coder; there
//! is no ambient global instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// A named qualitative category with its keyword triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub example_quotes: Vec<String>,
}

impl Theme {
    fn new(name: &str, description: &str, keywords: &[&str], example_quotes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            example_quotes: example_quotes.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// All themes, keyed and iterated by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codebook {
    themes: BTreeMap<String, Theme>,
}

impl Codebook {
    /// Build a codebook; a later theme with the same name replaces an earlier one.
    pub fn new(themes: impl IntoIterator<Item = Theme>) -> Self {
        Self {
            themes: themes.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    /// The seven-theme rule-based codebook.
    pub fn standard() -> Self {
        Self::new([
            Theme::new(
                "STRESS_BURNOUT",
                "References to stress, burnout, or deteriorating mental health tied to care/work juggling.",
                &["stress", "burned out", "overwhelmed", "mental health", "exhausted"],
                &["I am exhausted trying to keep up with work and caregiving, and my mental health is suffering."],
            ),
            Theme::new(
                "FOOD_INSECURITY",
                "Households or providers describing lack of consistent access to nutritious food.",
                &["food insecurity", "skip meals", "pantry", "groceries", "food budget"],
                &["We stretch groceries thin and sometimes skip meals to pay tuition."],
            ),
            Theme::new(
                "CHILDCARE_ACCESS",
                "Difficulty finding, keeping, or affording reliable childcare slots.",
                &["waitlist", "no slots", "childcare access", "center closed", "after-school"],
                &["We have been on a childcare waitlist for months since the center closed."],
            ),
            Theme::new(
                "AFFORDABILITY",
                "Comments about tuition, fees, or essential costs being too high.",
                &["too expensive", "tuition", "afford", "rising costs", "fees"],
                &["Tuition is too expensive and every increase pushes us closer to debt."],
            ),
            Theme::new(
                "EMPLOYMENT_DISRUPTION",
                "Work schedule disruptions or job instability tied to care responsibilities.",
                &["miss work", "cut hours", "lost job", "shift", "employment"],
                &["I miss work almost weekly because schedules fall apart when care falls through."],
            ),
            Theme::new(
                "PROVIDER_STAFF_SHORTAGE",
                "Providers (or families describing providers) struggling to hire or retain staff.",
                &["short staffed", "no subs", "can't hire", "burnout on staff", "positions open"],
                &["We are short staffed and can't hire assistants, so classrooms merge daily."],
            ),
            Theme::new(
                "SCHEDULING_CONSTRAINTS",
                "Irregular or conflicting schedules that limit access or service provision.",
                &["schedule", "nights", "weekend", "split shift", "no coverage"],
                &["My split shift schedule means there is no coverage for evenings or weekends."],
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    /// Theme names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.themes.keys().cloned().collect()
    }

    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.values()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Render the codebook as a Markdown reference document.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Qualitative codebook\n\n");
        out.push_str("Rule-based, multi-label coding: a response carries a theme when any of its keywords appears in the normalized text.\n");
        for theme in self.themes() {
            let _ = write!(out, "\n## {}\n\n{}\n\n", theme.name, theme.description);
            let keywords = theme
                .keywords
                .iter()
                .map(|k| format!("`{k}`"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "**Keywords:** {keywords}");
            for quote in &theme.example_quotes {
                let _ = write!(out, "\n> {quote}\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_has_seven_sorted_themes() {
        let codebook = Codebook::standard();
        assert_eq!(codebook.len(), 7);
        let names = codebook.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "AFFORDABILITY");
    }

    #[test]
    fn test_every_theme_has_keywords() {
        for theme in Codebook::standard().themes() {
            assert!(!theme.keywords.is_empty(), "{} has no keywords", theme.name);
        }
    }

    #[test]
    fn test_markdown_lists_every_theme() {
        let codebook = Codebook::standard();
        let doc = codebook.to_markdown();
        for name in codebook.names() {
            assert!(doc.contains(&format!("## {name}")));
        }
        assert!(doc.contains("`split shift`"));
    }
}
