//! Error types for RepoScope core.

use std::{error::Error, fmt, io};

use serde::{Deserialize, Serialize};

/// Error type for RepoScope core operations.
#[derive(Debug)]
pub enum ReposcopeError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A remote request failed or returned an unexpected status.
    Network(String),
    /// A payload could not be decoded.
    Decode(String),
    /// Source text could not be parsed.
    Parse(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for ReposcopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Decode(message) => write!(f, "decode error: {message}"),
            Self::Parse(message) => write!(f, "parse error: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ReposcopeError {}

impl From<io::Error> for ReposcopeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for ReposcopeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

/// Convenience result type for RepoScope core.
pub type Result<T> = std::result::Result<T, ReposcopeError>;

/// Per-file analysis stage that can abort a file's analysis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Cyclomatic complexity, the load-bearing metric.
    Complexity,
}

impl AnalysisStage {
    /// Stable stage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Complexity => "complexity",
        }
    }
}

/// A file could not be analyzed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    /// Stage that failed.
    pub stage: AnalysisStage,
    /// Underlying error message.
    pub message: String,
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed: {}", self.stage.as_str(), self.message)
    }
}

impl Error for AnalysisFailure {}

/// Run-level stage that aborts the whole pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    /// Repository metadata retrieval.
    Metadata,
}

impl RunStage {
    /// Stable stage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Metadata => "metadata",
        }
    }
}

/// Fatal pipeline failure; no report is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Stage that failed.
    pub stage: RunStage,
    /// Underlying error message.
    pub message: String,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed: {}", self.stage.as_str(), self.message)
    }
}

impl Error for RunFailure {}
