//! Per-mob scatter plots of reward against success rate.
//!
//! Charting is optional. `renderer()` hands back the plotters-backed
//! renderer when the crate is built with the `plots` feature and a disabled
//! one otherwise, which turns `generate_plots` into a logged no-op.

use crate::document::TacticsDocument;
use std::path::{Path, PathBuf};

/// One labeled point: x = avgReward, y = successRate.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Everything a renderer needs to draw one mob's chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<LabeledPoint>,
}

impl ScatterPlot {
    /// Build the chart for a document, or `None` when it has no tactics.
    pub fn for_document(doc: &TacticsDocument) -> Option<Self> {
        if doc.tactics.is_empty() {
            return None;
        }
        Some(Self {
            title: format!("{}: Tactics Reward vs Success Rate", mob_name(doc)),
            x_label: "avgReward",
            y_label: "successRate",
            points: doc
                .tactics
                .iter()
                .map(|t| LabeledPoint {
                    x: t.avg_reward,
                    y: t.success_rate_or_zero(),
                    label: t.action.clone(),
                })
                .collect(),
        })
    }

    /// Axis ranges covering every point with 10% padding. A degenerate
    /// axis (all values equal) is widened by 0.5 each way. Non-finite values
    /// are ignored.
    #[cfg(any(test, feature = "plots"))]
    pub fn bounds(&self) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let xs = self.points.iter().map(|p| p.x);
        let ys = self.points.iter().map(|p| p.y);
        (padded_range(xs), padded_range(ys))
    }
}

#[cfg(any(test, feature = "plots"))]
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span == 0.0 { 0.5 } else { span * 0.1 };
    (min - pad)..(max + pad)
}

/// Mob name for titles and file names. An empty `mobType` (missing or
/// explicitly `""`) becomes `unknown`, so no file is ever named just
/// `_reward_vs_success.png`.
fn mob_name(doc: &TacticsDocument) -> &str {
    if doc.mob_type.is_empty() {
        "unknown"
    } else {
        &doc.mob_type
    }
}

/// `<mob>_reward_vs_success.png`, with path separators in the mob name
/// replaced so the file always lands inside the plot directory.
pub fn plot_file_name(doc: &TacticsDocument) -> String {
    let safe: String = mob_name(doc)
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{safe}_reward_vs_success.png")
}

/// Draws a scatter plot to an image file.
pub trait PlotRenderer {
    fn name(&self) -> &str;

    /// Whether this renderer can draw at all.
    fn available(&self) -> bool {
        true
    }

    fn render(&self, plot: &ScatterPlot, out_file: &Path) -> Result<(), PlotError>;
}

/// Stand-in used when charting support is not compiled in.
pub struct DisabledRenderer;

impl PlotRenderer for DisabledRenderer {
    fn name(&self) -> &str {
        "disabled"
    }

    fn available(&self) -> bool {
        false
    }

    fn render(&self, _plot: &ScatterPlot, out_file: &Path) -> Result<(), PlotError> {
        Err(PlotError::Render {
            path: out_file.to_path_buf(),
            message: "charting support not compiled in".to_string(),
        })
    }
}

#[cfg(feature = "plots")]
pub use chart::PlottersRenderer;

/// The best renderer this build offers.
pub fn renderer() -> Box<dyn PlotRenderer> {
    #[cfg(feature = "plots")]
    {
        Box::new(PlottersRenderer)
    }
    #[cfg(not(feature = "plots"))]
    {
        Box::new(DisabledRenderer)
    }
}

/// What `generate_plots` produced.
#[derive(Debug, Default)]
pub struct PlotReport {
    pub written: Vec<PathBuf>,
    pub skipped_empty: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub disabled: bool,
}

/// Render one chart per document with tactics into `out_dir`.
///
/// Failing to create `out_dir` is an error. A failure on one chart is
/// logged and the rest are still drawn.
pub fn generate_plots(
    documents: &[TacticsDocument],
    out_dir: &Path,
    renderer: &dyn PlotRenderer,
) -> Result<PlotReport, PlotError> {
    if !renderer.available() {
        tracing::warn!(
            "charting support not available; rebuild with `--features plots` or omit --plots"
        );
        return Ok(PlotReport {
            disabled: true,
            ..Default::default()
        });
    }

    std::fs::create_dir_all(out_dir).map_err(|e| PlotError::Io {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut report = PlotReport::default();
    for doc in documents {
        let Some(plot) = ScatterPlot::for_document(doc) else {
            report.skipped_empty += 1;
            continue;
        };
        let out_file = out_dir.join(plot_file_name(doc));
        match renderer.render(&plot, &out_file) {
            Ok(()) => {
                tracing::info!(file = %out_file.display(), "Wrote plot");
                report.written.push(out_file);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file = %out_file.display(),
                    renderer = renderer.name(),
                    "failed to render plot"
                );
                report.failed.push((out_file, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(feature = "plots")]
mod chart {
    use super::{PlotError, PlotRenderer, ScatterPlot};
    use plotters::prelude::*;
    use std::path::Path;

    /// 600x400 PNG charts drawn with plotters.
    pub struct PlottersRenderer;

    impl PlotRenderer for PlottersRenderer {
        fn name(&self) -> &str {
            "plotters"
        }

        fn render(&self, plot: &ScatterPlot, out_file: &Path) -> Result<(), PlotError> {
            draw(plot, out_file).map_err(|e| PlotError::Render {
                path: out_file.to_path_buf(),
                message: e.to_string(),
            })
        }
    }

    fn draw(plot: &ScatterPlot, out_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(out_file, (600, 400)).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_range, y_range) = plot.bounds();
        let mut chart = ChartBuilder::on(&root)
            .caption(&plot.title, ("sans-serif", 18))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(plot.x_label)
            .y_desc(plot.y_label)
            .bold_line_style(BLACK.mix(0.15))
            .light_line_style(BLACK.mix(0.05))
            .draw()?;

        let label_style = ("sans-serif", 11).into_font().color(&BLACK.mix(0.7));
        chart.draw_series(plot.points.iter().map(|p| {
            EmptyElement::at((p.x, p.y))
                + Circle::new((0, 0), 4, BLUE.filled())
                + Text::new(p.label.clone(), (6, -6), label_style.clone())
        }))?;

        root.present()?;
        Ok(())
    }
}

/// Errors from plot generation.
#[derive(Debug)]
pub enum PlotError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Render {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for PlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotError::Io { path, source } => {
                write!(f, "failed to create plot directory {}: {source}", path.display())
            }
            PlotError::Render { path, message } => {
                write!(f, "failed to render {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io { source, .. } => Some(source),
            PlotError::Render { .. } => None,
        }
    }
}
