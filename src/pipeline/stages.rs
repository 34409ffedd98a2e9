//! Individual pipeline stages.
//!
//! Every stage reads its inputs from the artifact tree and writes its outputs
//! back, so stages can run alone once their upstream artifacts exist. A
//! required input that is absent fails with `MissingDependency`.

use crate::codebook::Codebook;
use crate::coding::{
    code_responses, cooccurrence, explode, select_all_exemplars, theme_counts, theme_frequencies,
};
use crate::generate::{generate_responses, SyntheticConfig};
use crate::mixed::{simulate_indicators, summarize};
use crate::models::{CodedResponse, ReliabilityRecord, Response, Result};
use crate::reliability::{
    compute_reliability, reliability_summary, simulate_second_coder, FlipConfig,
};
use crate::report::{render_brief, render_figures, write_factsheet, RenderedFigure, ReportData};
use crate::store::{
    read_coded_wide, read_table, write_coded_narrow, write_coded_wide, write_table, write_text,
    Layout,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Row counts of the coding stage's outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodingSummary {
    pub responses: usize,
    pub coded: usize,
    pub mentions: usize,
    pub pairs: usize,
    pub exemplars: usize,
}

/// Generate the synthetic survey and persist the raw table.
pub fn generate_stage(layout: &Layout, config: &SyntheticConfig) -> Result<Vec<Response>> {
    let responses = generate_responses(config)?;
    write_table(&layout.raw_responses(), &responses)?;
    Ok(responses)
}

/// Code the raw responses and persist every coded and aggregate table.
pub fn coding_stage(
    layout: &Layout,
    codebook: &Codebook,
    exemplars_per_theme: usize,
    seed: u64,
) -> Result<CodingSummary> {
    let responses: Vec<Response> =
        read_table(&layout.raw_responses(), "raw responses", "thematic coding")?;
    let total = responses.len();

    let table = code_responses(responses, codebook);
    write_coded_narrow(&layout.coded(), &table)?;
    write_coded_wide(&layout.coded_wide(), &table)?;

    let mentions = explode(&table.rows);
    write_table(&layout.coded_long(), &mentions)?;

    let counts = theme_counts(&mentions);
    write_table(&layout.theme_counts(), &counts)?;
    write_table(&layout.theme_frequencies(), &theme_frequencies(&counts, &table.rows))?;

    let pairs = cooccurrence(&table.rows, total);
    write_table(&layout.cooccurrence(), &pairs)?;

    let exemplars = select_all_exemplars(&mentions, &codebook.names(), exemplars_per_theme, seed);
    write_table(&layout.exemplars(), &exemplars)?;

    let summary = CodingSummary {
        responses: total,
        coded: table.rows.iter().filter(|r| !r.themes.is_empty()).count(),
        mentions: mentions.len(),
        pairs: pairs.len(),
        exemplars: exemplars.len(),
    };
    info!(
        responses = summary.responses,
        coded = summary.coded,
        mentions = summary.mentions,
        pairs = summary.pairs,
        exemplars = summary.exemplars,
        "Thematic coding complete"
    );
    Ok(summary)
}

/// Simulate indicators for every raw respondent.
///
/// Respondents absent from the wide table carry no themes.
pub fn indicator_stage(layout: &Layout, seed: u64) -> Result<usize> {
    const STAGE: &str = "indicator simulation";
    let responses: Vec<Response> = read_table(&layout.raw_responses(), "raw responses", STAGE)?;
    let coded = read_coded_wide(&layout.coded_wide(), "coded wide table", STAGE)?;

    let by_id: HashMap<&str, &CodedResponse> = coded
        .rows
        .iter()
        .map(|r| (r.response.respondent_id.as_str(), r))
        .collect();
    let rows: Vec<CodedResponse> = responses
        .into_iter()
        .map(|response| match by_id.get(response.respondent_id.as_str()) {
            Some(row) => CodedResponse {
                response,
                cleaned_text: row.cleaned_text.clone(),
                themes: row.themes.clone(),
            },
            None => CodedResponse {
                response,
                cleaned_text: String::new(),
                themes: Default::default(),
            },
        })
        .collect();

    let indicators = simulate_indicators(&rows, seed)?;
    write_table(&layout.indicators(), &indicators)?;
    info!(respondents = indicators.len(), "Quantitative indicators simulated");
    Ok(indicators.len())
}

/// Summarize indicators by theme presence.
pub fn summary_stage(layout: &Layout) -> Result<usize> {
    const STAGE: &str = "mixed-methods summary";
    let coded = read_coded_wide(&layout.coded_wide(), "coded wide table", STAGE)?;
    let indicators = read_table(&layout.indicators(), "quantitative indicators", STAGE)?;

    let summary = summarize(&coded, &indicators);
    write_table(&layout.mixed_summary(), &summary)?;
    info!(records = summary.len(), "Mixed-methods summary written");
    Ok(summary.len())
}

/// Persist a simulated second coder's wide table.
pub fn second_coder_stage(layout: &Layout, flips: &FlipConfig, seed: u64) -> Result<()> {
    let coded = read_coded_wide(
        &layout.coded_wide(),
        "coded wide table",
        "second coder simulation",
    )?;
    let coder2 = simulate_second_coder(&coded.labels(), flips, seed);
    write_coded_wide(&layout.coded_wide_coder2(), &coded.with_labels(&coder2))
}

/// Compare both coders and persist the table and narrative.
pub fn reliability_stage(layout: &Layout) -> Result<Vec<ReliabilityRecord>> {
    const STAGE: &str = "reliability";
    let coder1 = read_coded_wide(&layout.coded_wide(), "coded wide table", STAGE)?;
    let coder2 = read_coded_wide(&layout.coded_wide_coder2(), "second coder table", STAGE)?;

    let records = compute_reliability(&coder1.labels(), &coder2.labels());
    write_table(&layout.reliability(), &records)?;
    write_text(&layout.reliability_summary(), &reliability_summary(&records))?;
    info!(themes = records.len(), "Reliability computed");
    Ok(records)
}

/// Write the codebook document.
pub fn codebook_stage(layout: &Layout, codebook: &Codebook) -> Result<PathBuf> {
    let path = layout.codebook_doc();
    write_text(&path, &codebook.to_markdown())?;
    Ok(path)
}

/// Render the figures from whatever tables exist.
pub fn figures_stage(layout: &Layout) -> Result<Vec<RenderedFigure>> {
    render_figures(&ReportData::load(layout)?, &layout.figures_dir())
}

/// Write the Markdown brief.
pub fn brief_stage(layout: &Layout, generated_at: DateTime<Utc>) -> Result<PathBuf> {
    let path = layout.brief();
    write_text(&path, &render_brief(&ReportData::load(layout)?, generated_at))?;
    info!(path = %path.display(), "Brief written");
    Ok(path)
}

/// Write the HTML fact sheet.
pub fn factsheet_stage(
    layout: &Layout,
    figures: &[RenderedFigure],
    generated_at: DateTime<Utc>,
) -> Result<PathBuf> {
    write_factsheet(&ReportData::load(layout)?, figures, layout, generated_at)
}
