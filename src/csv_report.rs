//! CSV summary output.
//!
//! Written to a temp file in the destination directory, then persisted over
//! the target so a previous summary is replaced whole.

use crate::summary::SummaryRecord;
use std::path::{Path, PathBuf};

/// What `write_summary_csv` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvOutcome {
    /// No rows; nothing was written.
    Empty,
    Written { path: PathBuf, rows: usize },
}

/// Write a header plus one row per record, in input order.
pub fn write_summary_csv(rows: &[SummaryRecord], path: &Path) -> Result<CsvOutcome, CsvError> {
    if rows.is_empty() {
        return Ok(CsvOutcome::Empty);
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| CsvError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CsvError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(tmp.as_file_mut());
        for row in rows {
            writer.serialize(row).map_err(CsvError::Csv)?;
        }
        writer.flush().map_err(|e| CsvError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    tmp.persist(path).map_err(|e| CsvError::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(CsvOutcome::Written {
        path: path.to_path_buf(),
        rows: rows.len(),
    })
}

/// Errors from writing the summary CSV.
#[derive(Debug)]
pub enum CsvError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::Io { path, source } => {
                write!(f, "failed to write CSV at {}: {source}", path.display())
            }
            CsvError::Csv(e) => write!(f, "failed to serialize CSV row: {e}"),
            CsvError::Persist { path, source } => {
                write!(f, "failed to move CSV into place at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CsvError::Io { source, .. } => Some(source),
            CsvError::Csv(e) => Some(e),
            CsvError::Persist { source, .. } => Some(source),
        }
    }
}
