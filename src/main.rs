mod config;
mod csv_report;
mod document;
mod plot;
mod runner;
mod source;
mod summary;

use clap::{Parser, ValueEnum};
use config::{ConfigError, Overrides, Settings, SourceKind, SourceSelection};
use std::path::PathBuf;
use std::process::ExitCode;

/// Analyze federated mob tactics data: summarize the top tactic per mob
/// into a CSV file and optionally plot reward against success rate.
#[derive(Parser, Debug)]
#[command(name = "mob-tactics", version, about)]
pub struct Cli {
    /// Data source: a GitHub repository or a local directory
    #[arg(long, value_enum)]
    source: SourceArg,

    /// GitHub owner (required if source=remote)
    #[arg(long)]
    owner: Option<String>,

    /// GitHub repo (required if source=remote)
    #[arg(long)]
    repo: Option<String>,

    /// Local path to the federated-data directory (required if source=local)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Generate PNG plots (needs a build with the `plots` feature)
    #[arg(long)]
    plots: bool,

    /// Config file path
    #[arg(short, long, default_value = "mob-tactics.toml")]
    config: PathBuf,

    /// CSV output path (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plot output directory (overrides config)
    #[arg(long)]
    plots_dir: Option<PathBuf>,

    /// Resolve config and print settings, don't load any data
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (requests, candidate counts)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SourceArg {
    #[value(alias = "github")]
    Remote,
    Local,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Remote => SourceKind::Remote,
            SourceArg::Local => SourceKind::Local,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let settings = match resolve_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    if cli.dry_run {
        print_settings(&settings);
        println!("Dry run: settings resolved, no data loaded.");
        return ExitCode::SUCCESS;
    }

    let renderer = plot::renderer();
    match runner::run(&settings, renderer.as_ref()) {
        Ok(report) => {
            tracing::info!("{}", report.summary_line());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Check selector flags first so a usage error never touches the filesystem,
/// then load the config file and apply CLI overrides.
fn resolve_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let source = SourceSelection::from_args(
        cli.source.into(),
        cli.owner.as_deref(),
        cli.repo.as_deref(),
        cli.path.as_deref(),
    )?;
    let config = config::load_config(&cli.config)?;
    Ok(Settings::resolve(
        source,
        config,
        Overrides {
            output: cli.output.clone(),
            plots_dir: cli.plots_dir.clone(),
            plots: cli.plots,
        },
    ))
}

fn print_settings(settings: &Settings) {
    println!("mob-tactics v{}", env!("CARGO_PKG_VERSION"));
    match &settings.source {
        SourceSelection::Remote { owner, repo } => {
            println!("Source: remote {owner}/{repo} ({}/{})", settings.api_base, settings.remote_directory);
        }
        SourceSelection::Local { path } => {
            println!("Source: local {}", path.display());
        }
    }
    println!("File suffix: {}", settings.suffix);
    println!("CSV output: {}", settings.csv_path.display());
    if settings.plots {
        println!("Plots: {}", settings.plots_dir.display());
    } else {
        println!("Plots: off");
    }
}
