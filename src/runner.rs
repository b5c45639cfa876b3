//! One end-to-end run: load, summarize, write CSV, optionally plot.

use crate::config::{Settings, SourceSelection};
use crate::csv_report::{self, CsvError, CsvOutcome};
use crate::plot::{self, PlotError, PlotRenderer, PlotReport};
use crate::source::local::LocalSource;
use crate::source::remote::{HttpContentApi, RemoteSource};
use crate::source::{self, LoadOutcome, Skipped, SourceError};
use crate::summary::{self, SummaryRecord};

/// What a completed run did.
#[derive(Debug)]
pub struct RunReport {
    pub rows: Vec<SummaryRecord>,
    pub skipped: Vec<Skipped>,
    pub csv: CsvOutcome,
    pub plots: Option<PlotReport>,
}

impl RunReport {
    /// One-line account of the run for the final log line.
    pub fn summary_line(&self) -> String {
        let csv = match &self.csv {
            CsvOutcome::Empty => "no CSV written".to_string(),
            CsvOutcome::Written { path, .. } => format!("CSV at {}", path.display()),
        };
        let mut line = format!(
            "{} mobs summarized, {} files skipped, {csv}",
            self.rows.len(),
            self.skipped.len()
        );
        match &self.plots {
            Some(p) if p.disabled => line.push_str(", plots unavailable"),
            Some(p) => line.push_str(&format!(", {} plots", p.written.len())),
            None => {}
        }
        line
    }
}

/// Execute a run with the given settings.
///
/// Loading and plotting happen strictly one document at a time.
pub fn run(settings: &Settings, renderer: &dyn PlotRenderer) -> Result<RunReport, RunError> {
    let outcome = load(settings)?;

    for s in &outcome.skipped {
        tracing::warn!(item = %s.item, reason = %s.reason, "Failed to load tactics file, skipping");
    }
    tracing::info!(
        loaded = outcome.documents.len(),
        skipped = outcome.skipped.len(),
        "loaded tactics documents"
    );

    let rows: Vec<SummaryRecord> = outcome.documents.iter().map(summary::summarize).collect();

    let csv = csv_report::write_summary_csv(&rows, &settings.csv_path)?;
    match &csv {
        CsvOutcome::Empty => tracing::info!("No data to write."),
        CsvOutcome::Written { path, rows } => {
            tracing::info!(path = %path.display(), rows, "Wrote CSV summary")
        }
    }

    let plots = if settings.plots {
        let report = plot::generate_plots(&outcome.documents, &settings.plots_dir, renderer)?;
        if !report.disabled {
            tracing::info!(
                written = report.written.len(),
                skipped_empty = report.skipped_empty,
                failed = report.failed.len(),
                "plot generation finished"
            );
        }
        Some(report)
    } else {
        None
    };

    Ok(RunReport {
        rows,
        skipped: outcome.skipped,
        csv,
        plots,
    })
}

fn load(settings: &Settings) -> Result<LoadOutcome, SourceError> {
    match &settings.source {
        SourceSelection::Local { path } => {
            let src = LocalSource::new(path, settings.suffix.as_str());
            tracing::info!(dir = %src.dir().display(), "reading local tactics files");
            source::load_all(&src)
        }
        SourceSelection::Remote { owner, repo } => {
            let api = HttpContentApi::new(&settings.user_agent).map_err(|e| {
                SourceError::Listing {
                    url: settings.api_base.clone(),
                    source: e,
                }
            })?;
            let src = RemoteSource::new(
                api,
                settings.api_base.as_str(),
                owner.as_str(),
                repo.as_str(),
                settings.remote_directory.as_str(),
                settings.suffix.as_str(),
            );
            tracing::info!(
                url = %src.contents_url(&settings.remote_directory),
                "listing remote tactics files"
            );
            source::load_all(&src)
        }
    }
}

/// Fatal run errors.
#[derive(Debug)]
pub enum RunError {
    Source(SourceError),
    Csv(CsvError),
    Plot(PlotError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Source(e) => write!(f, "{e}"),
            RunError::Csv(e) => write!(f, "{e}"),
            RunError::Plot(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Source(e) => Some(e),
            RunError::Csv(e) => Some(e),
            RunError::Plot(e) => Some(e),
        }
    }
}

impl From<SourceError> for RunError {
    fn from(e: SourceError) -> Self {
        RunError::Source(e)
    }
}

impl From<CsvError> for RunError {
    fn from(e: CsvError) -> Self {
        RunError::Csv(e)
    }
}

impl From<PlotError> for RunError {
    fn from(e: PlotError) -> Self {
        RunError::Plot(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, Overrides};
    use crate::plot::{DisabledRenderer, ScatterPlot};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct TouchRenderer;

    impl PlotRenderer for TouchRenderer {
        fn name(&self) -> &str {
            "touch"
        }

        fn render(&self, _plot: &ScatterPlot, out_file: &Path) -> Result<(), PlotError> {
            std::fs::write(out_file, b"").map_err(|e| PlotError::Io {
                path: out_file.to_path_buf(),
                source: e,
            })
        }
    }

    fn local_settings(data: &Path, out: &Path, plots: bool) -> Settings {
        Settings::resolve(
            SourceSelection::Local {
                path: data.to_path_buf(),
            },
            AnalysisConfig::default(),
            Overrides {
                output: Some(out.join("analysis_summary.csv")),
                plots_dir: Some(out.join("plots")),
                plots,
            },
        )
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn seed_partial(dir: &Path) {
        write(
            dir,
            "zombie-tactics.json",
            r#"{"mobType":"zombie","submissions":42,"tactics":[{"action":"charge","avgReward":1.23456,"successRate":0.8765,"count":10}]}"#,
        );
        write(
            dir,
            "skeleton-tactics.json",
            r#"{"mobType":"skeleton","submissions":7,"syncedAt":1700000000000,"tactics":[{"action":"strafe","avgReward":0.5,"successRate":null,"count":4}],"batchReport":{"trend":"improving"}}"#,
        );
        write(
            dir,
            "creeper-tactics.json",
            r#"{"mobType":"creeper","submissions":1,"tactics":[]}"#,
        );
        write(dir, "broken-tactics.json", r#"{"mobType": "broken", "#);
        write(dir, "notes.txt", "ignored");
    }

    #[test]
    fn partial_failure_yields_three_rows_one_skip() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        seed_partial(data.path());

        let settings = local_settings(data.path(), out.path(), false);
        let report = run(&settings, &DisabledRenderer).unwrap();

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].item.ends_with("broken-tactics.json"));
        assert!(report.plots.is_none());

        let mut reader = csv::Reader::from_path(out.path().join("analysis_summary.csv")).unwrap();
        let back: Vec<SummaryRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        let mobs: Vec<_> = back.iter().map(|r| r.mob_type.as_str()).collect();
        assert_eq!(mobs, vec!["creeper", "skeleton", "zombie"]);

        let zombie = &back[2];
        assert_eq!(zombie.submissions, 42);
        assert_eq!(zombie.top_avg_reward, 1.2346);
        assert_eq!(zombie.top_success_rate, 0.8765);

        let skeleton = &back[1];
        assert_eq!(skeleton.synced_at, "2023-11-14T22:13:20+00:00");
        assert_eq!(skeleton.top_success_rate, 0.0);
        assert_eq!(skeleton.trend, "improving");
    }

    #[test]
    fn empty_dataset_writes_no_csv() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let settings = local_settings(data.path(), out.path(), false);
        let report = run(&settings, &DisabledRenderer).unwrap();

        assert_eq!(report.csv, CsvOutcome::Empty);
        assert!(report.rows.is_empty());
        assert!(!out.path().join("analysis_summary.csv").exists());
    }

    #[test]
    fn missing_directory_is_fatal_before_output() {
        let out = TempDir::new().unwrap();
        let settings = local_settings(&out.path().join("missing"), out.path(), false);

        let err = run(&settings, &DisabledRenderer).unwrap_err();
        assert!(matches!(
            err,
            RunError::Source(SourceError::DirectoryNotFound(_))
        ));
        assert!(!out.path().join("analysis_summary.csv").exists());
    }

    #[test]
    fn plots_written_for_mobs_with_tactics() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        seed_partial(data.path());

        let settings = local_settings(data.path(), out.path(), true);
        let report = run(&settings, &TouchRenderer).unwrap();

        let plots = report.plots.unwrap();
        let mut names: Vec<PathBuf> = plots
            .written
            .iter()
            .map(|p| PathBuf::from(p.file_name().unwrap()))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                PathBuf::from("skeleton_reward_vs_success.png"),
                PathBuf::from("zombie_reward_vs_success.png"),
            ]
        );
        assert_eq!(plots.skipped_empty, 1);
        assert!(out.path().join("plots").is_dir());
    }

    #[test]
    fn plots_without_charting_still_succeed() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        seed_partial(data.path());

        let settings = local_settings(data.path(), out.path(), true);
        let report = run(&settings, &DisabledRenderer).unwrap();

        assert!(report.plots.unwrap().disabled);
        assert!(out.path().join("analysis_summary.csv").exists());
        assert!(!out.path().join("plots").exists());
    }

    #[test]
    fn summary_line_counts_rows_skips_and_plots() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        seed_partial(data.path());

        let report = run(&local_settings(data.path(), out.path(), true), &TouchRenderer).unwrap();
        let csv_path = out.path().join("analysis_summary.csv");
        assert_eq!(
            report.summary_line(),
            format!(
                "3 mobs summarized, 1 files skipped, CSV at {}, 2 plots",
                csv_path.display()
            )
        );

        let empty = TempDir::new().unwrap();
        let report = run(&local_settings(empty.path(), out.path(), false), &DisabledRenderer).unwrap();
        assert_eq!(report.summary_line(), "0 mobs summarized, 0 files skipped, no CSV written");
    }
}
