//! Markdown briefing of the coded survey.

use super::{format_totals, frame_totals, theme_totals, ReportData};
use crate::mixed::theme_gaps;
use crate::models::{CooccurrencePair, Exemplar, Frame, Metric, SummaryRecord, ThemeCount};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

const MAX_QUOTES: usize = 5;

fn top_themes_section(counts: &[ThemeCount]) -> String {
    if counts.is_empty() {
        return "No coded themes available.".to_string();
    }

    let mut lines = vec!["### Overall leaders".to_string()];
    for (theme, count) in theme_totals(counts).into_iter().take(5) {
        lines.push(format!("- {theme}: {count} mentions"));
    }

    lines.push("\n### By frame".to_string());
    for frame in Frame::ALL {
        let totals = frame_totals(counts, frame);
        if !totals.is_empty() {
            lines.push(format!("- {}: {}", frame.title(), format_totals(&totals, 3)));
        }
    }
    lines.join("\n")
}

/// One quote per theme first, then the remaining quotes in table order.
pub(crate) fn brief_quotes(exemplars: &[Exemplar], max_quotes: usize) -> Vec<&Exemplar> {
    let mut seen = HashSet::new();
    let (mut selected, rest): (Vec<&Exemplar>, Vec<&Exemplar>) =
        exemplars.iter().partition(|e| seen.insert(e.theme.as_str()));
    selected.extend(rest);
    selected.truncate(max_quotes);
    selected
}

fn quotes_section(exemplars: &[Exemplar]) -> String {
    if exemplars.is_empty() {
        return "No exemplar quotes captured.".to_string();
    }
    brief_quotes(exemplars, MAX_QUOTES)
        .into_iter()
        .map(|e| {
            format!(
                "> **{} ({}, wave {}, {}):** {}",
                e.theme,
                e.frame,
                e.wave,
                e.state,
                e.quote.trim().replace('\n', " ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn cooccurrence_section(pairs: &[CooccurrencePair]) -> String {
    if pairs.is_empty() {
        return "No theme pairings detected.".to_string();
    }
    pairs
        .iter()
        .take(3)
        .map(|p| {
            format!(
                "- {} + {}: {} co-mentions ({:.1}% of responses)",
                p.theme_a,
                p.theme_b,
                p.count,
                p.normalized_rate * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn mixed_methods_section(summary: &[SummaryRecord]) -> String {
    if summary.is_empty() {
        return "No mixed-methods statistics yet.".to_string();
    }

    let mut lines = Vec::new();
    for (theme, delta) in theme_gaps(summary, Metric::StressScoreMean, None).into_iter().take(3) {
        lines.push(format!("- {theme}: {delta:+.1} stress pts when theme is present"));
    }
    for (theme, delta) in theme_gaps(summary, Metric::FoodInsecurityRate, None)
        .into_iter()
        .take(3)
    {
        lines.push(format!(
            "- {theme}: {:+.1} pp in food insecurity when present",
            delta * 100.0
        ));
    }
    for (theme, delta) in theme_gaps(summary, Metric::ClosureRiskHighRate, Some(Frame::Provider))
        .into_iter()
        .take(2)
    {
        lines.push(format!(
            "- Providers citing {theme}: {:+.1} pp risk of closure",
            delta * 100.0
        ));
    }
    lines.join("\n")
}

/// Render the qualitative brief.
pub fn render_brief(data: &ReportData, generated_at: DateTime<Utc>) -> String {
    format!(
        "# Qualitative + Mixed-Methods Brief\n\
         _Generated on {} from deterministic synthetic data._\n\
         \n\
         ## Top themes\n\
         {}\n\
         \n\
         ## Exemplar quotes\n\
         {}\n\
         \n\
         ## Theme co-occurrence insights\n\
         {}\n\
         \n\
         ## Mixed-methods highlights\n\
         {}\n\
         \n\
         ## Methods & limitations\n\
         - Rule-based keywords from a transparent codebook (see docs/codebook.md) drive multi-label tagging.\n\
         - Quantitative indicators are simulated with interpretable correlations; they approximate but do not replace observed data.\n\
         - Synthetic sample mirrors Jan-Mar 2024 household/provider frames; interpret directional signals, not literal magnitudes.\n",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        top_themes_section(&data.theme_counts),
        quotes_section(&data.exemplars),
        cooccurrence_section(&data.cooccurrence),
        mixed_methods_section(&data.summary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;
    use chrono::TimeZone;

    fn exemplar(theme: &str, state: &str) -> Exemplar {
        Exemplar {
            theme: theme.to_string(),
            frame: Frame::Household,
            wave: 1,
            state: state.to_string(),
            quote: format!("{theme} quote from {state}"),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_brief_has_placeholders() {
        let brief = render_brief(&ReportData::default(), timestamp());
        assert!(brief.starts_with("# Qualitative + Mixed-Methods Brief\n"));
        assert!(brief.contains("_Generated on 2024-04-01 12:30 UTC"));
        assert!(brief.contains("No coded themes available."));
        assert!(brief.contains("No exemplar quotes captured."));
        assert!(brief.contains("No theme pairings detected."));
        assert!(brief.contains("No mixed-methods statistics yet."));
        assert!(brief.contains("## Methods & limitations"));
    }

    #[test]
    fn test_quotes_cover_themes_first() {
        let exemplars = vec![
            exemplar("A", "CA"),
            exemplar("A", "NY"),
            exemplar("A", "TX"),
            exemplar("B", "GA"),
            exemplar("C", "OH"),
            exemplar("C", "PA"),
        ];
        let picked: Vec<_> = brief_quotes(&exemplars, 5)
            .iter()
            .map(|e| (e.theme.as_str(), e.state.as_str()))
            .collect();
        assert_eq!(
            picked,
            vec![("A", "CA"), ("B", "GA"), ("C", "OH"), ("A", "NY"), ("A", "TX")]
        );
    }

    #[test]
    fn test_sections_with_data() {
        let data = ReportData {
            theme_counts: vec![
                ThemeCount {
                    theme: "AFFORDABILITY".to_string(),
                    frame: Frame::Household,
                    wave: 1,
                    count: 7,
                },
                ThemeCount {
                    theme: "PROVIDER_STAFF_SHORTAGE".to_string(),
                    frame: Frame::Provider,
                    wave: 1,
                    count: 4,
                },
            ],
            cooccurrence: vec![CooccurrencePair {
                theme_a: "AFFORDABILITY".to_string(),
                theme_b: "FOOD_INSECURITY".to_string(),
                count: 3,
                normalized_rate: 0.125,
            }],
            exemplars: vec![exemplar("AFFORDABILITY", "CA")],
            summary: vec![
                SummaryRecord {
                    frame: Frame::Household,
                    wave: 1,
                    theme: "AFFORDABILITY".to_string(),
                    metric: Metric::StressScoreMean,
                    group: Group::ThemeAbsent,
                    estimate: 17.0,
                    n: 10,
                },
                SummaryRecord {
                    frame: Frame::Household,
                    wave: 1,
                    theme: "AFFORDABILITY".to_string(),
                    metric: Metric::StressScoreMean,
                    group: Group::ThemePresent,
                    estimate: 19.5,
                    n: 5,
                },
            ],
            ..Default::default()
        };
        let brief = render_brief(&data, timestamp());
        assert!(brief.contains("- AFFORDABILITY: 7 mentions"));
        assert!(brief.contains("- Household: AFFORDABILITY (7)"));
        assert!(brief.contains("- Provider: PROVIDER_STAFF_SHORTAGE (4)"));
        assert!(brief.contains("> **AFFORDABILITY (household, wave 1, CA):** AFFORDABILITY quote from CA"));
        assert!(brief.contains("3 co-mentions (12.5% of responses)"));
        assert!(brief.contains("- AFFORDABILITY: +2.5 stress pts when theme is present"));
    }
}
