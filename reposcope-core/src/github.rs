//! GitHub repository client.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{RepoEntry, RepositoryMetadata};
use crate::error::{ReposcopeError, Result};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = "reposcope";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Access to a hosted repository.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryClient {
    /// Fetch repository metadata and its top-level listing.
    fn fetch_metadata(&self, repo: &str) -> Result<RepositoryMetadata>;
    /// Fetch the decoded bytes of a file in the repository.
    fn fetch_file(&self, repo: &str, path: &str) -> Result<Vec<u8>>;
}

/// Split a repository identifier into `(owner, name)`.
///
/// The identifier is path-like; its last two non-empty segments are taken as
/// owner and repository, and a trailing `.git` is ignored.
pub fn parse_repo_identifier(identifier: &str) -> Result<(String, String)> {
    let segments: Vec<&str> = identifier
        .trim()
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    let (owner, name) = match segments.as_slice() {
        [.., owner, name] => (*owner, *name),
        _ => {
            return Err(ReposcopeError::Other(format!(
                "repository identifier must end with owner/name: {identifier}"
            )));
        }
    };
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return Err(ReposcopeError::Other(format!(
            "repository identifier is missing a name: {identifier}"
        )));
    }
    Ok((owner.to_string(), name.to_string()))
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilePayload {
    content: Option<String>,
    encoding: Option<String>,
}

/// GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
    user_agent: String,
}

impl GitHubApiClient {
    /// Build a client against an explicit API base URL.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            token: token.filter(|token| !token.trim().is_empty()),
            client,
            user_agent: user_agent.into(),
        })
    }

    fn repo_url(&self, repo: &str) -> Result<String> {
        let (owner, name) = parse_repo_identifier(repo)?;
        Ok(format!(
            "{}/repos/{owner}/{name}",
            self.base_url.trim_end_matches('/')
        ))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", ACCEPT_HEADER);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        let response = request
            .send()
            .map_err(|err| ReposcopeError::Network(format!("github request failed: {err}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ReposcopeError::Network(format!(
                "github api error ({status}): {body}"
            )));
        }
        response
            .json()
            .map_err(|err| ReposcopeError::Decode(format!("github response decode failed: {err}")))
    }
}

impl RepositoryClient for GitHubApiClient {
    fn fetch_metadata(&self, repo: &str) -> Result<RepositoryMetadata> {
        let base = self.repo_url(repo)?;
        log::info!("Fetching repository information for {repo}");
        let payload: RepoPayload = self.get_json(&base)?;
        if payload.name.trim().is_empty() {
            return Err(ReposcopeError::Decode(
                "github response missing repository name".to_string(),
            ));
        }
        let listing: Vec<ContentEntry> = self.get_json(&format!("{base}/contents"))?;
        let entries = listing
            .into_iter()
            .map(|entry| match (entry.kind.as_deref(), entry.size) {
                (Some("file"), Some(size)) => RepoEntry::sized(entry.name, size),
                _ => RepoEntry::named(entry.name),
            })
            .collect();

        Ok(RepositoryMetadata {
            name: payload.name,
            description: payload.description,
            language: payload.language,
            stars: payload.stargazers_count,
            entries,
        })
    }

    fn fetch_file(&self, repo: &str, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/contents/{}", self.repo_url(repo)?, encode_path(path));
        log::info!("Retrieving contents of {path}");
        let payload: FilePayload = self.get_json(&url)?;
        let encoding = payload.encoding.as_deref().unwrap_or("none");
        let content = match (encoding, payload.content) {
            ("base64", Some(content)) => content,
            _ => {
                return Err(ReposcopeError::Decode(format!(
                    "file content unavailable for {path} (encoding {encoding})"
                )));
            }
        };
        let compact: String = content.split_whitespace().collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| ReposcopeError::Decode(format!("invalid base64 for {path}: {err}")))
    }
}

/// Percent-encode each segment of a repository path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
