//! Tactics files published to a GitHub repository, read through the
//! contents API.

use super::{LoadError, SourceError, TacticsSource};
use crate::document::TacticsDocument;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Fetches JSON from an HTTP endpoint. Injected so the remote source can be
/// driven without a network.
pub trait ContentApi {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Blocking reqwest client with the headers the contents API expects.
///
/// No timeout is set beyond the client default, and requests are anonymous.
pub struct HttpContentApi {
    client: reqwest::blocking::Client,
}

impl HttpContentApi {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.to_string())
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl ContentApi for HttpContentApi {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: e,
        })
    }
}

/// A `<repo>/contents/<dir>` listing entry. Fields not needed are ignored.
#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Single-file response of the contents API.
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: Option<String>,
}

/// A repository-relative path of a tactics file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath(pub String);

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lists one repository directory and fetches the tactics files in it.
pub struct RemoteSource<A> {
    api: A,
    api_base: String,
    owner: String,
    repo: String,
    directory: String,
    suffix: String,
}

impl<A: ContentApi> RemoteSource<A> {
    pub fn new(
        api: A,
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        directory: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            api,
            api_base: api_base.into(),
            owner: owner.into(),
            repo: repo.into(),
            directory: directory.into(),
            suffix: suffix.into(),
        }
    }

    /// `{base}/repos/{owner}/{repo}/contents/{path}`
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }
}

impl<A: ContentApi> TacticsSource for RemoteSource<A> {
    type Item = RemotePath;

    fn name(&self) -> &str {
        "remote"
    }

    /// One listing request, no pagination.
    fn candidates(&self) -> Result<Vec<RemotePath>, SourceError> {
        let url = self.contents_url(&self.directory);
        let listing = self
            .api
            .get_json(&url)
            .map_err(|e| SourceError::Listing {
                url: url.clone(),
                source: e,
            })?;
        let entries: Vec<DirectoryEntry> = serde_json::from_value(listing)
            .map_err(|e| SourceError::ListingFormat { url, source: e })?;

        Ok(entries
            .into_iter()
            .filter(|e| e.kind == "file" && e.name.ends_with(&self.suffix))
            .map(|e| RemotePath(e.path))
            .collect())
    }

    fn load(&self, item: &RemotePath) -> Result<TacticsDocument, LoadError> {
        let body = self.api.get_json(&self.contents_url(&item.0))?;
        let envelope: ContentEnvelope = serde_json::from_value(body)?;
        let encoded = envelope.content.ok_or(LoadError::MissingContent)?;
        let text = decode_content(&encoded)?;
        Ok(TacticsDocument::from_json(&text)?)
    }
}

/// Decode the base64 `content` field. The API wraps it at 60 columns, so
/// whitespace is dropped before decoding.
pub fn decode_content(encoded: &str) -> Result<String, LoadError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LoadError::Decode(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| LoadError::Decode(format!("invalid UTF-8: {e}")))
}

/// Errors from a single HTTP fetch.
#[derive(Debug)]
pub enum FetchError {
    Client(reqwest::Error),
    Request { url: String, source: reqwest::Error },
    Status { url: String, status: u16 },
    Body { url: String, source: reqwest::Error },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Client(e) => write!(f, "failed to build HTTP client: {e}"),
            FetchError::Request { url, source } => write!(f, "request to {url} failed: {source}"),
            FetchError::Status { url, status } => write!(f, "HTTP {status} from {url}"),
            FetchError::Body { url, source } => {
                write!(f, "failed to read JSON body from {url}: {source}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Client(e) => Some(e),
            FetchError::Request { source, .. } => Some(source),
            FetchError::Body { source, .. } => Some(source),
            FetchError::Status { .. } => None,
        }
    }
}
