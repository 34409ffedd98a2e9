//! Publication-style HTML fact sheet.

use super::{format_totals, frame_totals, theme_totals, FigureKind, RenderedFigure, ReportData};
use crate::mixed::theme_gaps;
use crate::models::{Exemplar, Frame, Metric, QualmixError, Result};
use crate::reliability::mean_of;
use crate::store::{write_text, Layout};
use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

const TEMPLATE_NAME: &str = "qual_factsheet";
const TEMPLATE: &str = include_str!("../../templates/qual_factsheet.html.hbs");

pub const FACTSHEET_TITLE: &str =
    "Qualitative Themes & Mixed-Methods Insights (Synthetic RAPID-style Survey)";

const MAX_FINDINGS: usize = 5;
const QUOTES_PER_FRAME: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteCard {
    pub theme: String,
    pub quote: String,
    pub wave: u8,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameQuotes {
    pub household: Vec<QuoteCard>,
    pub provider: Vec<QuoteCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityRow {
    pub theme: String,
    pub percent_agreement: String,
    pub kappa: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureCard {
    /// Path relative to the fact sheet
    pub src: String,
    pub caption: String,
}

/// Everything the template renders.
#[derive(Debug, Clone, Serialize)]
pub struct FactsheetContext {
    pub header_title: String,
    pub key_findings: Vec<String>,
    pub exemplar_quotes: FrameQuotes,
    pub reliability_note: String,
    pub reliability_rows: Vec<ReliabilityRow>,
    pub figure_cards: Vec<FigureCard>,
    pub generated_ts: String,
}

/// Up to five headline findings.
pub fn key_findings(data: &ReportData) -> Vec<String> {
    let mut findings = Vec::new();

    let or_na = |s: String| if s.is_empty() { "n/a".to_string() } else { s };
    findings.push(format!(
        "Top themes overall: {}. Household focus: {}. Provider focus: {}.",
        or_na(format_totals(&theme_totals(&data.theme_counts), 3)),
        or_na(format_totals(&frame_totals(&data.theme_counts, Frame::Household), 3)),
        or_na(format_totals(&frame_totals(&data.theme_counts, Frame::Provider), 3)),
    ));

    if data.cooccurrence.is_empty() {
        findings.push("Theme co-occurrence signals pending additional data.".to_string());
    } else {
        let pairs: Vec<String> = data
            .cooccurrence
            .iter()
            .take(2)
            .map(|p| format!("{} + {} ({} co-mentions)", p.theme_a, p.theme_b, p.count))
            .collect();
        findings.push(format!("Theme pairs surfacing together: {}.", pairs.join(", ")));
    }

    let stress_gaps: Vec<String> = Frame::ALL
        .into_iter()
        .filter_map(|frame| {
            let (theme, delta) = theme_gaps(&data.summary, Metric::StressScoreMean, Some(frame))
                .into_iter()
                .next()?;
            Some(format!("{}: {theme} {delta:+.1} stress pts", frame.title()))
        })
        .collect();
    if stress_gaps.is_empty() {
        findings.push("Stress score gaps pending future waves.".to_string());
    } else {
        findings.push(format!("Biggest stress gaps: {}.", stress_gaps.join("; ")));
    }

    match theme_gaps(&data.summary, Metric::FoodInsecurityRate, None).first() {
        Some((theme, delta)) => findings.push(format!(
            "Food insecurity shifts by {:+.1} pp when {theme} is present.",
            delta * 100.0
        )),
        None => findings.push("Food insecurity deltas pending additional data.".to_string()),
    }

    if data.reliability.is_empty() {
        findings.push("Coder reliability summary will populate after coding outputs exist.".to_string());
    } else {
        findings.push(format!(
            "Simulated coder agreement averages {:.0}% with κ={:.2}.",
            mean_of(&data.reliability, |r| r.percent_agreement) * 100.0,
            mean_of(&data.reliability, |r| r.kappa)
        ));
    }

    findings.truncate(MAX_FINDINGS);
    findings
}

/// First quote of each theme within a frame, up to `k`.
pub fn frame_quotes(exemplars: &[Exemplar], frame: Frame, k: usize) -> Vec<QuoteCard> {
    let mut seen = HashSet::new();
    exemplars
        .iter()
        .filter(|e| e.frame == frame)
        .filter(|e| seen.insert(e.theme.as_str()))
        .take(k)
        .map(|e| QuoteCard {
            theme: e.theme.clone(),
            quote: e.quote.clone(),
            wave: e.wave,
            state: e.state.clone(),
        })
        .collect()
}

/// Assemble the template context.
pub fn factsheet_context(
    data: &ReportData,
    figure_cards: Vec<FigureCard>,
    generated_at: DateTime<Utc>,
) -> FactsheetContext {
    FactsheetContext {
        header_title: FACTSHEET_TITLE.to_string(),
        key_findings: key_findings(data),
        exemplar_quotes: FrameQuotes {
            household: frame_quotes(&data.exemplars, Frame::Household, QUOTES_PER_FRAME),
            provider: frame_quotes(&data.exemplars, Frame::Provider, QUOTES_PER_FRAME),
        },
        reliability_note: data
            .reliability_note
            .clone()
            .unwrap_or_else(|| "Simulated coder reliability forthcoming.".to_string()),
        reliability_rows: data
            .reliability
            .iter()
            .map(|r| ReliabilityRow {
                theme: r.theme.clone(),
                percent_agreement: format!("{:.0}%", r.percent_agreement * 100.0),
                kappa: format!("{:.2}", r.kappa),
            })
            .collect(),
        figure_cards,
        generated_ts: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}

/// Render the context through the bundled template.
pub fn render_factsheet_html(context: &FactsheetContext) -> Result<String> {
    let mut registry = Handlebars::new();
    registry.register_template_string(TEMPLATE_NAME, TEMPLATE)?;
    Ok(registry.render(TEMPLATE_NAME, context)?)
}

/// Copy existing figures next to the fact sheet and describe them as cards.
pub fn stage_figures(figures: &[RenderedFigure], layout: &Layout) -> Result<Vec<FigureCard>> {
    let assets = layout.factsheet_assets_dir();
    fs::create_dir_all(&assets)
        .map_err(|e| QualmixError::io(format!("creating {}", assets.display()), e))?;

    let mut cards = Vec::new();
    for figure in figures.iter().filter(|f| f.path.exists()) {
        let Some(name) = figure.path.file_name() else {
            continue;
        };
        let dest = assets.join(name);
        fs::copy(&figure.path, &dest)
            .map_err(|e| QualmixError::io(format!("copying {}", figure.path.display()), e))?;
        cards.push(FigureCard {
            src: format!("factsheet_assets/figures/{}", name.to_string_lossy()),
            caption: figure.kind.caption().to_string(),
        });
    }
    debug!(figures = cards.len(), "Staged fact sheet figures");
    Ok(cards)
}

/// Write the HTML fact sheet and return its path.
pub fn write_factsheet(
    data: &ReportData,
    figures: &[RenderedFigure],
    layout: &Layout,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    let cards = stage_figures(figures, layout)?;
    let context = factsheet_context(data, cards, generated_at);
    let html = render_factsheet_html(&context)?;

    let path = layout.factsheet();
    write_text(&path, &html)?;
    info!(
        path = %path.display(),
        findings = context.key_findings.len(),
        figures = context.figure_cards.len(),
        "Fact sheet written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReliabilityRecord, ThemeCount};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn exemplar(theme: &str, frame: Frame, state: &str) -> Exemplar {
        Exemplar {
            theme: theme.to_string(),
            frame,
            wave: 2,
            state: state.to_string(),
            quote: format!("{theme} <{state}>"),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_findings_with_no_data() {
        let findings = key_findings(&ReportData::default());
        assert_eq!(findings.len(), 5);
        assert!(findings[0].contains("Top themes overall: n/a."));
        assert!(findings[1].contains("pending"));
        assert!(findings[4].contains("will populate"));
    }

    #[test]
    fn test_findings_report_reliability() {
        let data = ReportData {
            theme_counts: vec![ThemeCount {
                theme: "AFFORDABILITY".to_string(),
                frame: Frame::Household,
                wave: 1,
                count: 4,
            }],
            reliability: vec![ReliabilityRecord {
                theme: "AFFORDABILITY".to_string(),
                percent_agreement: 0.9,
                kappa: 0.75,
            }],
            ..Default::default()
        };
        let findings = key_findings(&data);
        assert!(findings[0].starts_with("Top themes overall: AFFORDABILITY (4). Household focus: AFFORDABILITY (4). Provider focus: n/a."));
        assert_eq!(findings[4], "Simulated coder agreement averages 90% with κ=0.75.");
    }

    #[test]
    fn test_frame_quotes_one_per_theme() {
        let exemplars = vec![
            exemplar("A", Frame::Household, "CA"),
            exemplar("A", Frame::Household, "NY"),
            exemplar("B", Frame::Provider, "TX"),
            exemplar("C", Frame::Household, "GA"),
            exemplar("D", Frame::Household, "OH"),
        ];
        let quotes = frame_quotes(&exemplars, Frame::Household, 2);
        let themes: Vec<_> = quotes.iter().map(|q| q.theme.as_str()).collect();
        assert_eq!(themes, vec!["A", "C"]);
        assert_eq!(frame_quotes(&exemplars, Frame::Provider, 2).len(), 1);
    }

    #[test]
    fn test_html_escapes_and_renders_sections() {
        let data = ReportData {
            exemplars: vec![exemplar("A", Frame::Household, "CA")],
            reliability: vec![ReliabilityRecord {
                theme: "A".to_string(),
                percent_agreement: 0.962,
                kappa: 0.812,
            }],
            ..Default::default()
        };
        let cards = vec![FigureCard {
            src: "factsheet_assets/figures/x.svg".to_string(),
            caption: "Caption".to_string(),
        }];
        let html = render_factsheet_html(&factsheet_context(&data, cards, timestamp())).unwrap();
        assert!(html.contains("Generated 2024-04-01 09:00 UTC"));
        assert!(html.contains("A &lt;CA&gt;"));
        assert!(html.contains("<td>96%</td>"));
        assert!(html.contains("<td>0.81</td>"));
        assert!(html.contains("src=\"factsheet_assets/figures/x.svg\""));
        assert!(html.contains("No provider quotes yet."));
        assert!(html.contains("Simulated coder reliability forthcoming."));
    }

    #[test]
    fn test_write_factsheet_copies_figures() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_directories().unwrap();
        let svg = layout.figures_dir().join("theme_cooccurrence_heatmap.svg");
        fs::write(&svg, "<svg/>").unwrap();
        let figures = vec![
            RenderedFigure {
                kind: FigureKind::CooccurrenceHeatmap,
                path: svg,
            },
            RenderedFigure {
                kind: FigureKind::StressByTheme,
                path: layout.figures_dir().join("missing.svg"),
            },
        ];

        let path = write_factsheet(&ReportData::default(), &figures, &layout, timestamp()).unwrap();
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("Theme co-occurrence heatmap"));
        assert!(!html.contains("Stress score gap by theme"));
        assert!(layout
            .factsheet_assets_dir()
            .join("theme_cooccurrence_heatmap.svg")
            .exists());
    }
}
