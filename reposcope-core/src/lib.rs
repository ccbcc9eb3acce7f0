#![deny(missing_docs)]
//! RepoScope core library.
//!
//! This crate holds the analysis-and-reporting pipeline: eligibility
//! filtering, per-file metrics, orchestration over a remote repository, and
//! rendering of the resulting report.

/// Per-file analysis with isolated metric failures.
pub mod analyzer;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod filter;
pub mod fs;
pub mod github;
pub mod halstead;
pub mod lint;
pub mod metrics;
pub mod orchestrator;
pub mod output;
pub mod render;
pub mod report;

pub use analyzer::FileAnalyzer;
pub use config::{
    AppConfig, ConfigLoad, GithubConfig, LintConfig, LoggingConfig, OutputFormat, ReportConfig,
    ReportSection, load_config, parse_config,
};
pub use domain::{
    AnalysisResult, FileMetrics, MetricRecord, RepoEntry, RepositoryMetadata, SymbolComplexity,
    VolumeMetrics,
};
pub use error::{AnalysisFailure, AnalysisStage, ReposcopeError, Result, RunFailure, RunStage};
pub use events::{LogEvents, PipelineEvents};
pub use filter::{eligible_entries, is_eligible, select_default_file};
pub use fs::{FileSystem, StdFileSystem};
pub use github::{GitHubApiClient, RepositoryClient, parse_repo_identifier};
pub use lint::{BuiltinLinter, CommandLinter, LintEngine, build_linter};
pub use metrics::{MetricsEngine, PythonMetricsEngine};
pub use orchestrator::{CancelFlag, Orchestrator, RunOutcome, RunStatus, SkipReason, SkippedFile};
pub use output::{ReportWriter, report_stem};
pub use render::{render_json, render_markdown, render_styled};
pub use report::{Block, ReportDocument, Section, build as build_report};
