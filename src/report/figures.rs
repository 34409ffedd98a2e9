//! SVG figures rendered with plotters.
//!
//! Each figure falls back to a single-message placeholder when its input is
//! empty, so the fact sheet always has the same three images.

use super::{theme_totals, ReportData};
use crate::mixed::theme_group_means;
use crate::models::{
    CooccurrencePair, Frame, Metric, QualmixError, Result, SummaryRecord, ThemeCount,
    ThemeFrequency,
};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TOP_THEMES: usize = 6;

const PALETTE: [RGBColor; 7] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
];

const ABSENT_COLOR: RGBColor = RGBColor(207, 216, 220);
const PRESENT_COLOR: RGBColor = RGBColor(84, 110, 122);

/// The figures a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureKind {
    FrequencyTrend,
    CooccurrenceHeatmap,
    StressByTheme,
}

impl FigureKind {
    pub const ALL: [FigureKind; 3] = [
        FigureKind::FrequencyTrend,
        FigureKind::CooccurrenceHeatmap,
        FigureKind::StressByTheme,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::FrequencyTrend => "theme_frequencies_trend.svg",
            Self::CooccurrenceHeatmap => "theme_cooccurrence_heatmap.svg",
            Self::StressByTheme => "mixed_methods_theme_vs_stress.svg",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Self::FrequencyTrend => "Theme frequencies across waves",
            Self::CooccurrenceHeatmap => "Theme co-occurrence heatmap",
            Self::StressByTheme => "Stress score gap by theme",
        }
    }
}

/// A figure written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFigure {
    pub kind: FigureKind,
    pub path: PathBuf,
}

fn placeholder(path: &Path, message: &str) -> Result<()> {
    let root = SVGBackend::new(path, (600, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(QualmixError::plot)?;
    let style = TextStyle::from(("sans-serif", 20).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw_text(message, &style, (300, 200))
        .map_err(QualmixError::plot)?;
    root.present().map_err(QualmixError::plot)
}

/// Percent of responses per wave for the most-mentioned themes, one panel per frame.
pub fn plot_frequency_trend(frequencies: &[ThemeFrequency], path: &Path) -> Result<()> {
    if frequencies.is_empty() {
        return placeholder(path, "No frequency data");
    }

    let counts: Vec<_> = frequencies
        .iter()
        .map(|f| ThemeCount {
            theme: f.theme.clone(),
            frame: f.frame,
            wave: f.wave,
            count: f.count,
        })
        .collect();
    let top: Vec<String> = theme_totals(&counts)
        .into_iter()
        .take(TOP_THEMES)
        .map(|(theme, _)| theme)
        .collect();

    let frames: Vec<Frame> = frequencies
        .iter()
        .map(|f| f.frame)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let max_wave = frequencies.iter().map(|f| f.wave).max().unwrap_or(1);
    let max_percent = frequencies
        .iter()
        .filter(|f| top.contains(&f.theme))
        .map(|f| f.percent.unwrap_or(0.0) * 100.0)
        .fold(0.0_f64, f64::max);
    let y_max = (max_percent * 1.1).max(1.0);

    let root = SVGBackend::new(path, (600 * frames.len() as u32, 420)).into_drawing_area();
    root.fill(&WHITE).map_err(QualmixError::plot)?;
    let root = root
        .titled("Theme frequency trends by frame", ("sans-serif", 22))
        .map_err(QualmixError::plot)?;
    let panels = root.split_evenly((1, frames.len()));

    for (idx, (panel, frame)) in panels.iter().zip(&frames).enumerate() {
        let mut chart = ChartBuilder::on(panel)
            .caption(format!("{} themes", frame.title()), ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(0.5f64..(f64::from(max_wave) + 0.5), 0f64..y_max)
            .map_err(QualmixError::plot)?;

        chart
            .configure_mesh()
            .x_labels(usize::from(max_wave))
            .x_label_formatter(&|x| format!("{x:.0}"))
            .x_desc("Wave")
            .y_desc("Percent of responses")
            .draw()
            .map_err(QualmixError::plot)?;

        for (i, theme) in top.iter().enumerate() {
            let mut points: Vec<(f64, f64)> = frequencies
                .iter()
                .filter(|f| f.frame == *frame && &f.theme == theme)
                .map(|f| (f64::from(f.wave), f.percent.unwrap_or(0.0) * 100.0))
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by(|a, b| a.0.total_cmp(&b.0));

            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(QualmixError::plot)?
                .label(theme.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));
            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                .map_err(QualmixError::plot)?;
        }

        if idx == 0 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font(("sans-serif", 11))
                .draw()
                .map_err(QualmixError::plot)?;
        }
    }

    root.present().map_err(QualmixError::plot)
}

/// Symmetric theme-by-theme pair counts.
pub fn plot_cooccurrence_heatmap(pairs: &[CooccurrencePair], path: &Path) -> Result<()> {
    if pairs.is_empty() {
        return placeholder(path, "No co-occurrence data");
    }

    let themes: Vec<&str> = pairs
        .iter()
        .flat_map(|p| [p.theme_a.as_str(), p.theme_b.as_str()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: BTreeMap<&str, usize> = themes.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let size = themes.len();

    let mut matrix = vec![vec![0usize; size]; size];
    for p in pairs {
        let (i, j) = (index[p.theme_a.as_str()], index[p.theme_b.as_str()]);
        matrix[i][j] = p.count;
        matrix[j][i] = p.count;
    }
    let max_count = pairs.iter().map(|p| p.count).max().unwrap_or(1).max(1) as f64;

    let root = SVGBackend::new(path, (720, 640)).into_drawing_area();
    root.fill(&WHITE).map_err(QualmixError::plot)?;

    let extent = size as f64 - 0.5;
    let mut chart = ChartBuilder::on(&root)
        .caption("Theme co-occurrence counts", ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(170)
        .y_label_area_size(170)
        .build_cartesian_2d(-0.5f64..extent, -0.5f64..extent)
        .map_err(QualmixError::plot)?;

    let label = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < size {
            themes[i as usize].to_string()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(size)
        .y_labels(size)
        .x_label_formatter(&label)
        .y_label_formatter(&label)
        .x_label_style(
            ("sans-serif", 11)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", 11))
        .draw()
        .map_err(QualmixError::plot)?;

    let cells = (0..size).flat_map(|i| (0..size).map(move |j| (i, j)));
    chart
        .draw_series(cells.clone().map(|(i, j)| {
            let t = matrix[i][j] as f64 / max_count;
            let shade = |full: u8| (255.0 - t * (255.0 - f64::from(full))) as u8;
            let color = RGBColor(shade(8), shade(81), shade(156));
            let (x, y) = (j as f64, i as f64);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
        }))
        .map_err(QualmixError::plot)?;

    let text_style = TextStyle::from(("sans-serif", 12).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(cells.filter(|&(i, j)| matrix[i][j] > 0).map(|(i, j)| {
            Text::new(
                matrix[i][j].to_string(),
                (j as f64, i as f64),
                text_style.clone(),
            )
        }))
        .map_err(QualmixError::plot)?;

    root.present().map_err(QualmixError::plot)
}

/// Mean stress score with and without each theme, for the widest gaps.
pub fn plot_stress_by_theme(summary: &[SummaryRecord], path: &Path) -> Result<()> {
    if !summary.iter().any(|r| r.metric == Metric::StressScoreMean) {
        return placeholder(path, "No mixed-methods data");
    }

    let mut means = theme_group_means(summary, Metric::StressScoreMean, None);
    if means.is_empty() {
        return placeholder(path, "Insufficient stress data");
    }
    means.sort_by(|a, b| (b.2 - b.1).abs().total_cmp(&(a.2 - a.1).abs()));
    means.truncate(TOP_THEMES);

    let y_max = means
        .iter()
        .map(|(_, absent, present)| absent.max(*present))
        .fold(0.0_f64, f64::max)
        * 1.15;
    let y_max = y_max.max(1.0);
    let n = means.len();

    let root = SVGBackend::new(path, (860, 460)).into_drawing_area();
    root.fill(&WHITE).map_err(QualmixError::plot)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Stress score by theme presence", ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(140)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
        .map_err(QualmixError::plot)?;

    let label = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
            means[i as usize].0.clone()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label)
        .x_label_style(
            ("sans-serif", 11)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_desc("Mean stress score")
        .draw()
        .map_err(QualmixError::plot)?;

    let width = 0.35;
    chart
        .draw_series(means.iter().enumerate().map(|(i, (_, absent, _))| {
            let x = i as f64;
            Rectangle::new([(x - width, 0.0), (x, *absent)], ABSENT_COLOR.filled())
        }))
        .map_err(QualmixError::plot)?
        .label("Theme absent")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], ABSENT_COLOR.filled()));
    chart
        .draw_series(means.iter().enumerate().map(|(i, (_, _, present))| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + width, *present)], PRESENT_COLOR.filled())
        }))
        .map_err(QualmixError::plot)?
        .label("Theme present")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], PRESENT_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(QualmixError::plot)?;

    root.present().map_err(QualmixError::plot)
}

/// Render all three figures into `dir`.
pub fn render_figures(data: &ReportData, dir: &Path) -> Result<Vec<RenderedFigure>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| QualmixError::io(format!("creating {}", dir.display()), e))?;

    let mut rendered = Vec::with_capacity(FigureKind::ALL.len());
    for kind in FigureKind::ALL {
        let path = dir.join(kind.file_name());
        match kind {
            FigureKind::FrequencyTrend => plot_frequency_trend(&data.frequencies, &path)?,
            FigureKind::CooccurrenceHeatmap => plot_cooccurrence_heatmap(&data.cooccurrence, &path)?,
            FigureKind::StressByTheme => plot_stress_by_theme(&data.summary, &path)?,
        }
        debug!(figure = kind.file_name(), "Rendered figure");
        rendered.push(RenderedFigure { kind, path });
    }

    info!(figures = rendered.len(), dir = %dir.display(), "Figures rendered");
    Ok(rendered)
}
