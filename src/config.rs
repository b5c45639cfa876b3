use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from mob-tactics.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub remote: RemoteConfig,
    pub files: FilesConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_base: String,
    pub directory: String,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub suffix: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: PathBuf,
    pub plots_dir: PathBuf,
}

// --- Default implementations ---

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            directory: "federated-data".to_string(),
            user_agent: "MCA-AI-Analysis".to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            suffix: "-tactics.json".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("analysis_summary.csv"),
            plots_dir: PathBuf::from("plots"),
        }
    }
}

/// Load config from `path`. A missing file yields defaults; a file that
/// exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AnalysisConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Which acquisition strategy a run uses, with the selector fields it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    Remote { owner: String, repo: String },
    Local { path: PathBuf },
}

/// Source kind as chosen on the command line, before its selector fields
/// have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Remote,
    Local,
}

impl SourceSelection {
    /// Pair the chosen source kind with its required selector fields.
    ///
    /// Empty strings count as missing.
    pub fn from_args(
        kind: SourceKind,
        owner: Option<&str>,
        repo: Option<&str>,
        path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let present = |s: Option<&str>| s.filter(|v| !v.trim().is_empty()).map(str::to_string);
        match kind {
            SourceKind::Remote => match (present(owner), present(repo)) {
                (Some(owner), Some(repo)) => Ok(SourceSelection::Remote { owner, repo }),
                _ => Err(ConfigError::MissingSelector {
                    message: "--owner and --repo are required for source=remote",
                }),
            },
            SourceKind::Local => match path.filter(|p| !p.as_os_str().is_empty()) {
                Some(p) => Ok(SourceSelection::Local {
                    path: p.to_path_buf(),
                }),
                None => Err(ConfigError::MissingSelector {
                    message: "--path is required for source=local",
                }),
            },
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceSelection,
    pub api_base: String,
    pub remote_directory: String,
    pub user_agent: String,
    pub suffix: String,
    pub csv_path: PathBuf,
    pub plots_dir: PathBuf,
    pub plots: bool,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub plots_dir: Option<PathBuf>,
    pub plots: bool,
}

impl Settings {
    /// Merge a loaded config with CLI overrides.
    pub fn resolve(source: SourceSelection, config: AnalysisConfig, overrides: Overrides) -> Self {
        Self {
            source,
            api_base: config.remote.api_base.trim_end_matches('/').to_string(),
            remote_directory: config.remote.directory,
            user_agent: config.remote.user_agent,
            suffix: config.files.suffix,
            csv_path: overrides.output.unwrap_or(config.output.csv_path),
            plots_dir: overrides.plots_dir.unwrap_or(config.output.plots_dir),
            plots: overrides.plots,
        }
    }
}

/// Errors from configuration and argument resolution.
#[derive(Debug)]
pub enum ConfigError {
    MissingSelector {
        message: &'static str,
    },
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingSelector { message } => write!(f, "{message}"),
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::MissingSelector { .. } => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
