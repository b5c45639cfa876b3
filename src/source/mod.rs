pub mod local;
pub mod remote;

use crate::document::TacticsDocument;
use std::fmt::Display;
use std::path::PathBuf;

/// A place tactics documents can be loaded from.
///
/// Enumeration and per-item loading are split so that a failure to list
/// aborts the run while a failure on one item only skips that item.
pub trait TacticsSource {
    /// One enumerable item (a file path, a repository path).
    type Item: Display;

    /// Short name used in log lines (e.g., "local", "remote").
    fn name(&self) -> &str;

    /// List candidate items, in the order they should be loaded.
    fn candidates(&self) -> Result<Vec<Self::Item>, SourceError>;

    /// Read and parse a single candidate.
    fn load(&self, item: &Self::Item) -> Result<TacticsDocument, LoadError>;
}

/// A candidate that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub item: String,
    pub reason: String,
}

/// Result of loading every candidate from a source.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<TacticsDocument>,
    pub skipped: Vec<Skipped>,
}

/// Load every candidate from `source`, collecting failures instead of
/// stopping on them. Only a failure to enumerate is returned as an error.
pub fn load_all<S: TacticsSource>(source: &S) -> Result<LoadOutcome, SourceError> {
    let items = source.candidates()?;
    tracing::debug!(source = source.name(), candidates = items.len(), "enumerated tactics files");

    Ok(items
        .iter()
        .fold(LoadOutcome::default(), |mut outcome, item| {
            match source.load(item) {
                Ok(doc) => outcome.documents.push(doc),
                Err(e) => outcome.skipped.push(Skipped {
                    item: item.to_string(),
                    reason: e.to_string(),
                }),
            }
            outcome
        }))
}

/// Fatal errors: the source could not be enumerated at all.
#[derive(Debug)]
pub enum SourceError {
    DirectoryNotFound(PathBuf),
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Listing {
        url: String,
        source: remote::FetchError,
    },
    ListingFormat {
        url: String,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::DirectoryNotFound(path) => {
                write!(f, "directory not found: {}", path.display())
            }
            SourceError::ReadDir { path, source } => {
                write!(f, "failed to read directory {}: {source}", path.display())
            }
            SourceError::Listing { url, source } => {
                write!(f, "failed to list remote directory {url}: {source}")
            }
            SourceError::ListingFormat { url, source } => {
                write!(f, "unexpected directory listing from {url}: {source}")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::DirectoryNotFound(_) => None,
            SourceError::ReadDir { source, .. } => Some(source),
            SourceError::Listing { source, .. } => Some(source),
            SourceError::ListingFormat { source, .. } => Some(source),
        }
    }
}

/// Per-item errors: this one file is skipped.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Fetch(remote::FetchError),
    MissingContent,
    Decode(String),
    Parse(serde_json::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {e}"),
            LoadError::Fetch(e) => write!(f, "{e}"),
            LoadError::MissingContent => {
                write!(f, "unexpected API response: missing content")
            }
            LoadError::Decode(msg) => write!(f, "decode error: {msg}"),
            LoadError::Parse(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Fetch(e) => Some(e),
            LoadError::Parse(e) => Some(e),
            LoadError::MissingContent | LoadError::Decode(_) => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Parse(e)
    }
}

impl From<remote::FetchError> for LoadError {
    fn from(e: remote::FetchError) -> Self {
        LoadError::Fetch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory source: each item is a name plus the JSON text it yields.
    struct FixedSource {
        items: Vec<(&'static str, &'static str)>,
        list_fails: bool,
    }

    impl TacticsSource for FixedSource {
        type Item = String;

        fn name(&self) -> &str {
            "fixed"
        }

        fn candidates(&self) -> Result<Vec<String>, SourceError> {
            if self.list_fails {
                return Err(SourceError::DirectoryNotFound(PathBuf::from("/gone")));
            }
            Ok(self.items.iter().map(|(n, _)| n.to_string()).collect())
        }

        fn load(&self, item: &String) -> Result<TacticsDocument, LoadError> {
            let (_, text) = self
                .items
                .iter()
                .find(|(n, _)| n == item)
                .expect("item listed by candidates");
            Ok(TacticsDocument::from_json(text)?)
        }
    }

    #[test]
    fn load_all_splits_successes_and_skips() {
        let source = FixedSource {
            items: vec![
                ("a", r#"{"mobType":"zombie"}"#),
                ("b", "not json"),
                ("c", r#"{"mobType":"husk"}"#),
            ],
            list_fails: false,
        };
        let outcome = load_all(&source).unwrap();
        let mobs: Vec<_> = outcome.documents.iter().map(|d| d.mob_type.as_str()).collect();
        assert_eq!(mobs, vec!["zombie", "husk"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].item, "b");
        assert!(outcome.skipped[0].reason.starts_with("invalid JSON"));
    }

    #[test]
    fn load_all_propagates_listing_failure() {
        let source = FixedSource {
            items: vec![("a", "{}")],
            list_fails: true,
        };
        let err = load_all(&source).unwrap_err();
        assert_eq!(err.to_string(), "directory not found: /gone");
    }

    #[test]
    fn load_all_empty_source() {
        let source = FixedSource {
            items: vec![],
            list_fails: false,
        };
        let outcome = load_all(&source).unwrap();
        assert!(outcome.documents.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
