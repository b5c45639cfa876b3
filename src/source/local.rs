use super::{LoadError, SourceError, TacticsSource};
use crate::document::TacticsDocument;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reads tactics files from a directory on disk.
///
/// Only the top level is scanned. Entries are matched on file name suffix
/// alone; a matching entry that is not a readable file is skipped at load
/// time like any other unreadable file.
pub struct LocalSource {
    dir: PathBuf,
    suffix: String,
}

/// A tactics file found in the local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile(pub PathBuf);

impl fmt::Display for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl LocalSource {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TacticsSource for LocalSource {
    type Item = LocalFile;

    fn name(&self) -> &str {
        "local"
    }

    /// Matching entries sorted by file name.
    fn candidates(&self) -> Result<Vec<LocalFile>, SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::DirectoryNotFound(self.dir.clone()));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| SourceError::ReadDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&self.suffix))
            })
            .collect();
        files.sort();

        Ok(files.into_iter().map(LocalFile).collect())
    }

    fn load(&self, item: &LocalFile) -> Result<TacticsDocument, LoadError> {
        let text = std::fs::read_to_string(&item.0)?;
        Ok(TacticsDocument::from_json(&text)?)
    }
}
