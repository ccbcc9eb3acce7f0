//! Drives filtering and analysis across a repository listing.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::analyzer::FileAnalyzer;
use crate::config::GithubConfig;
use crate::domain::{AnalysisResult, MetricRecord, RepositoryMetadata};
use crate::error::{AnalysisFailure, RunFailure, RunStage};
use crate::events::PipelineEvents;
use crate::filter::{is_eligible, within_size_limit};
use crate::github::RepositoryClient;
use crate::lint::LintEngine;
use crate::metrics::MetricsEngine;

/// Shared cancellation request, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a file was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be retrieved.
    Fetch(String),
    /// The fetched content exceeds the size ceiling.
    TooLarge {
        /// Fetched length in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
    /// The content is not UTF-8 text.
    NotUtf8,
    /// The complexity stage failed.
    Analysis(AnalysisFailure),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(message) => write!(f, "fetch failed: {message}"),
            SkipReason::TooLarge { size, limit } => {
                write!(f, "file is {size} bytes, limit is {limit}")
            }
            SkipReason::NotUtf8 => write!(f, "content is not valid UTF-8"),
            SkipReason::Analysis(failure) => write!(f, "{failure}"),
        }
    }
}

/// A skipped file and its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// File name from the listing.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// How a run ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every listed entry was considered.
    Completed,
    /// The run stopped early on request.
    Cancelled,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Repository metadata.
    pub metadata: RepositoryMetadata,
    /// Analyzed files in listing order.
    pub result: AnalysisResult,
    /// Files left out, in listing order.
    pub skipped: Vec<SkippedFile>,
    /// How the run ended.
    pub status: RunStatus,
}

/// Runs the analysis pipeline against a repository client.
#[derive(Debug)]
pub struct Orchestrator<C, M, L> {
    client: C,
    analyzer: FileAnalyzer<M, L>,
    config: GithubConfig,
}

impl<C, M, L> Orchestrator<C, M, L>
where
    C: RepositoryClient,
    M: MetricsEngine,
    L: LintEngine,
{
    /// Create an orchestrator.
    pub fn new(client: C, analyzer: FileAnalyzer<M, L>, config: GithubConfig) -> Self {
        Self {
            client,
            analyzer,
            config,
        }
    }

    /// Fetch repository metadata.
    pub fn metadata(&self, repo: &str) -> std::result::Result<RepositoryMetadata, RunFailure> {
        self.client.fetch_metadata(repo).map_err(|err| RunFailure {
            stage: RunStage::Metadata,
            message: err.to_string(),
        })
    }

    /// Analyze every eligible entry of the repository, in listing order.
    pub fn run(
        &self,
        repo: &str,
        cancel: &CancelFlag,
        events: &dyn PipelineEvents,
    ) -> std::result::Result<RunOutcome, RunFailure> {
        let metadata = self.metadata(repo)?;
        Ok(self.run_with_metadata(repo, metadata, cancel, events))
    }

    /// Analyze the entries of already fetched metadata.
    pub fn run_with_metadata(
        &self,
        repo: &str,
        metadata: RepositoryMetadata,
        cancel: &CancelFlag,
        events: &dyn PipelineEvents,
    ) -> RunOutcome {
        let mut result = AnalysisResult::new();
        let mut skipped = Vec::new();
        let mut status = RunStatus::Completed;

        for entry in &metadata.entries {
            if cancel.is_cancelled() {
                status = RunStatus::Cancelled;
                events.cancelled(result.len());
                break;
            }
            if !is_eligible(&entry.name, entry.size, &self.config) {
                continue;
            }
            match self.process(repo, &entry.name, events) {
                Ok(record) => {
                    result.insert(entry.name.clone(), record);
                    events.file_analyzed(&entry.name);
                }
                Err(reason) => {
                    events.file_skipped(&entry.name, &reason);
                    skipped.push(SkippedFile {
                        name: entry.name.clone(),
                        reason,
                    });
                }
            }
        }

        RunOutcome {
            metadata,
            result,
            skipped,
            status,
        }
    }

    /// Fetch and analyze a single file by path.
    pub fn inspect_file(
        &self,
        repo: &str,
        path: &str,
        events: &dyn PipelineEvents,
    ) -> std::result::Result<MetricRecord, SkipReason> {
        self.process(repo, path, events)
    }

    /// Fetch a file as text, applying the size ceiling.
    pub fn fetch_text(&self, repo: &str, path: &str) -> std::result::Result<String, SkipReason> {
        let bytes = self
            .client
            .fetch_file(repo, path)
            .map_err(|err| SkipReason::Fetch(err.to_string()))?;
        let size = bytes.len() as u64;
        if !within_size_limit(size, &self.config) {
            return Err(SkipReason::TooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }
        String::from_utf8(bytes).map_err(|_| SkipReason::NotUtf8)
    }

    fn process(
        &self,
        repo: &str,
        name: &str,
        events: &dyn PipelineEvents,
    ) -> std::result::Result<MetricRecord, SkipReason> {
        let text = self.fetch_text(repo, name)?;
        self.analyzer
            .analyze(&text, name, events)
            .map_err(SkipReason::Analysis)
    }
}
