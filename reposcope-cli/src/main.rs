#![deny(missing_docs)]
//! RepoScope command-line interface.
//!
//! Analyzes a GitHub repository and writes Markdown and HTML quality reports.

mod input;

use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reposcope_core::config::DEFAULT_CONFIG_PATH;
use reposcope_core::github::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use reposcope_core::{
    AppConfig, CancelFlag, FileAnalyzer, GitHubApiClient, LintEngine, LogEvents, LoggingConfig,
    MetricRecord, Orchestrator, PythonMetricsEngine, RepositoryMetadata, ReportWriter,
    RunOutcome, RunStatus, StdFileSystem, build_linter, build_report, load_config, render_json,
    report_stem, select_default_file,
};
use serde::Serialize;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

type CliOrchestrator =
    Orchestrator<GitHubApiClient, PythonMetricsEngine, Box<dyn LintEngine + Send + Sync>>;

const PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "reposcope", version, about = "RepoScope repository analysis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct RepoArgs {
    /// GitHub repository URL; prompted for when omitted.
    url: Option<String>,
    /// Path to the YAML configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Token for authenticated GitHub requests.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// User agent sent with GitHub requests.
    #[arg(long, env = "GITHUB_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum SummaryFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every eligible file and write reports.
    Analyze {
        #[command(flatten)]
        repo: RepoArgs,
        /// Directory receiving reports; overrides the configured one.
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Console summary format.
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,
    },
    /// Analyze a single file, by default the most entry-point-like one.
    File {
        #[command(flatten)]
        repo: RepoArgs,
        /// Repository path of the file to analyze.
        #[arg(long)]
        path: Option<String>,
        /// Console output format.
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,
    },
    /// Show repository metadata and listing, optionally previewing a file.
    Info {
        #[command(flatten)]
        repo: RepoArgs,
        /// Repository path of a file to preview.
        #[arg(long)]
        preview: Option<String>,
    },
}

impl Commands {
    fn repo(&self) -> &RepoArgs {
        match self {
            Commands::Analyze { repo, .. }
            | Commands::File { repo, .. }
            | Commands::Info { repo, .. } => repo,
        }
    }
}

/// Connection settings plus configuration for one invocation.
struct Session {
    url: String,
    api_url: String,
    token: Option<String>,
    user_agent: String,
    config: AppConfig,
}

impl Session {
    fn orchestrator(&self) -> CliResult<CliOrchestrator> {
        let github = &self.config.github;
        let client = GitHubApiClient::new(
            self.api_url.clone(),
            self.token.clone(),
            self.user_agent.clone(),
            Duration::from_secs(github.timeout_secs),
        )?;
        let linter = build_linter(&self.config.lint, &github.source_suffix)?;
        Ok(Orchestrator::new(
            client,
            FileAnalyzer::new(PythonMetricsEngine::new(), linter),
            github.clone(),
        ))
    }
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let load = load_config(&cli.command.repo().config);
    init_logging(&load.config.logging);
    for warning in &load.warnings {
        log::warn!("{warning}");
    }

    let repo = cli.command.repo().clone();
    let session = Session {
        url: input::resolve_url(repo.url)?,
        api_url: repo.api_url,
        token: repo.token,
        user_agent: repo.user_agent,
        config: load.config,
    };

    match cli.command {
        Commands::Analyze {
            output_dir, format, ..
        } => {
            let cancel = CancelFlag::new();
            let listener = spawn_cancel_listener(cancel.clone());
            let analysis = run_analysis(session, output_dir, cancel).await;
            listener.abort();
            let analysis = analysis?;
            print!("{}", render_analysis(&analysis, format)?);
        }
        Commands::File { path, format, .. } => {
            let (path, record) = run_file(session, path).await?;
            print!("{}", render_file(&path, &record, format)?);
        }
        Commands::Info { preview, .. } => {
            print!("{}", run_info(session, preview).await?);
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

fn init_logging(logging: &LoggingConfig) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(logging.filter()),
    )
    .try_init();
}

fn spawn_cancel_listener(cancel: CancelFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Operation cancelled");
            log::warn!("Cancellation requested; stopping after the current file");
            cancel.cancel();
        }
    })
}

/// Result of the `analyze` command.
#[derive(Debug, Serialize)]
struct Analysis {
    #[serde(flatten)]
    outcome: RunOutcome,
    reports: Vec<PathBuf>,
}

async fn run_analysis(
    session: Session,
    output_dir: Option<PathBuf>,
    cancel: CancelFlag,
) -> CliResult<Analysis> {
    tokio::task::spawn_blocking(move || -> CliResult<Analysis> {
        let orchestrator = session.orchestrator()?;
        let metadata = orchestrator.metadata(&session.url)?;
        print!("{}", render_info_text(&metadata));
        let outcome = orchestrator.run_with_metadata(&session.url, metadata, &cancel, &LogEvents);

        let report = &session.config.report;
        let generated_at = Local::now().naive_local();
        let writer = ReportWriter::new(
            StdFileSystem::new(),
            output_dir.unwrap_or_else(|| PathBuf::from(&report.output_dir)),
        );
        let reports = write_reports(&writer, &outcome, &session.config, generated_at)?;
        Ok(Analysis { outcome, reports })
    })
    .await?
}

fn write_reports(
    writer: &ReportWriter<StdFileSystem>,
    outcome: &RunOutcome,
    config: &AppConfig,
    generated_at: NaiveDateTime,
) -> CliResult<Vec<PathBuf>> {
    let document = build_report(
        &outcome.metadata,
        &outcome.result,
        generated_at,
        &config.report.sections(),
    );
    let stem = report_stem(&outcome.metadata.name, generated_at);
    Ok(writer.write(&document, &stem, &config.report.formats())?)
}

async fn run_file(session: Session, path: Option<String>) -> CliResult<(String, MetricRecord)> {
    tokio::task::spawn_blocking(move || -> CliResult<(String, MetricRecord)> {
        let orchestrator = session.orchestrator()?;
        let path = match path {
            Some(path) => path,
            None => {
                let metadata = orchestrator.metadata(&session.url)?;
                select_default_file(&metadata.entries, &session.config.github)
                    .map(str::to_string)
                    .ok_or("no eligible files found in repository")?
            }
        };
        log::info!("Analyzing {path}");
        let record = orchestrator
            .inspect_file(&session.url, &path, &LogEvents)
            .map_err(|reason| format!("{path} was not analyzed: {reason}"))?;
        Ok((path, record))
    })
    .await?
}

async fn run_info(session: Session, preview: Option<String>) -> CliResult<String> {
    tokio::task::spawn_blocking(move || -> CliResult<String> {
        let orchestrator = session.orchestrator()?;
        let metadata = orchestrator.metadata(&session.url)?;
        let mut output = render_info_text(&metadata);
        if let Some(path) = preview {
            let text = orchestrator
                .fetch_text(&session.url, &path)
                .map_err(|reason| format!("cannot preview {path}: {reason}"))?;
            let _ = writeln!(output, "\nPreview of {path}:");
            let _ = writeln!(output, "{}", preview_text(&text));
        }
        Ok(output)
    })
    .await?
}

fn preview_text(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn render_info_text(metadata: &RepositoryMetadata) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Repository: {}", metadata.name);
    let _ = writeln!(
        output,
        "Description: {}",
        metadata.description.as_deref().unwrap_or("No description")
    );
    let _ = writeln!(
        output,
        "Language: {}",
        metadata.language.as_deref().unwrap_or("Unknown")
    );
    let _ = writeln!(output, "Stars: {}", metadata.stars);
    if metadata.entries.is_empty() {
        let _ = writeln!(output, "Files: none");
        return output;
    }
    let _ = writeln!(output, "Files:");
    for entry in &metadata.entries {
        match entry.size {
            Some(size) => {
                let _ = writeln!(output, "- {} ({size} bytes)", entry.name);
            }
            None => {
                let _ = writeln!(output, "- {}", entry.name);
            }
        }
    }
    output
}

fn render_analysis(analysis: &Analysis, format: SummaryFormat) -> CliResult<String> {
    Ok(match format {
        SummaryFormat::Text => render_summary_text(analysis),
        SummaryFormat::Json => render_json(analysis)?,
    })
}

fn render_summary_text(analysis: &Analysis) -> String {
    let outcome = &analysis.outcome;
    let mut output = String::new();
    let status = match outcome.status {
        RunStatus::Completed => "completed",
        RunStatus::Cancelled => "cancelled",
    };
    let _ = writeln!(output, "\nAnalysis {status}: {}", outcome.metadata.name);
    let _ = writeln!(output, "Files analyzed: {}", outcome.result.len());
    if outcome.skipped.is_empty() {
        let _ = writeln!(output, "Files skipped: none");
    } else {
        let _ = writeln!(output, "Files skipped:");
        for skipped in &outcome.skipped {
            let _ = writeln!(output, "- {}: {}", skipped.name, skipped.reason);
        }
    }
    if analysis.reports.is_empty() {
        let _ = writeln!(output, "Reports: none written");
    } else {
        let _ = writeln!(output, "Reports:");
        for path in &analysis.reports {
            let _ = writeln!(output, "- {}", path.display());
        }
    }
    output
}

fn render_file(path: &str, record: &MetricRecord, format: SummaryFormat) -> CliResult<String> {
    if format == SummaryFormat::Json {
        return Ok(render_json(record)?);
    }
    let mut output = String::new();
    let _ = writeln!(output, "File: {path}");
    if record.complexity.is_empty() {
        let _ = writeln!(output, "Complexity: none");
    } else {
        let _ = writeln!(output, "Complexity:");
        for item in &record.complexity {
            let _ = writeln!(output, "- {}: {}", item.symbol, item.score);
        }
    }
    let _ = writeln!(
        output,
        "Halstead: volume {:.2}, difficulty {:.2}, effort {:.2}",
        record.volume.volume, record.volume.difficulty, record.volume.effort
    );
    if record.diagnostics.trim().is_empty() {
        let _ = writeln!(output, "Issues: none");
    } else {
        let _ = writeln!(output, "Issues:\n{}", record.diagnostics.trim_end());
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use reposcope_core::{
        AnalysisResult, RepoEntry, SkipReason, SkippedFile, SymbolComplexity, VolumeMetrics,
    };

    const MAIN_PY: &str = "\"\"\"Entry point.\"\"\"\n\n\ndef main(argv):\n    \"\"\"Run.\"\"\"\n    if argv and len(argv) > 1:\n        return 1\n    return 0\n";
    const BROKEN_PY: &str = "def broken(:\n    pass\n";

    fn metadata() -> RepositoryMetadata {
        RepositoryMetadata {
            name: "demo".to_string(),
            description: None,
            language: Some("Python".to_string()),
            stars: 5,
            entries: vec![RepoEntry::sized("main.py", 120), RepoEntry::named("docs")],
        }
    }

    fn session(server: &MockServer, config: AppConfig) -> Session {
        Session {
            url: "https://github.com/octo/demo".to_string(),
            api_url: server.base_url(),
            token: None,
            user_agent: "reposcope-test".to_string(),
            config,
        }
    }

    fn encoded(text: &str) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    async fn mock_repository(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo");
                then.status(200).json_body(serde_json::json!({
                    "name": "demo",
                    "description": "Demo repo",
                    "language": "Python",
                    "stargazers_count": 3
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contents");
                then.status(200).json_body(serde_json::json!([
                    {"name": "main.py", "size": MAIN_PY.len(), "type": "file"},
                    {"name": "broken.py", "size": BROKEN_PY.len(), "type": "file"},
                    {"name": "README.md", "size": 10, "type": "file"}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contents/main.py");
                then.status(200).json_body(serde_json::json!({
                    "content": encoded(MAIN_PY),
                    "encoding": "base64"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contents/broken.py");
                then.status(200).json_body(serde_json::json!({
                    "content": encoded(BROKEN_PY),
                    "encoding": "base64"
                }));
            })
            .await;
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("reposcope_cli_test_{nanos}"))
    }

    #[tokio::test]
    async fn run_analysis_writes_reports_and_skips_broken_files() {
        let server = MockServer::start_async().await;
        mock_repository(&server).await;
        let output_dir = std::env::temp_dir().join(unique_dir_name());

        let analysis = run_analysis(
            session(&server, AppConfig::default()),
            Some(output_dir.clone()),
            CancelFlag::new(),
        )
        .await
        .expect("analysis");

        let outcome = &analysis.outcome;
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.result.names().collect::<Vec<_>>(), vec!["main.py"]);
        assert_eq!(
            outcome.result.get("main.py").expect("main.py").complexity,
            vec![SymbolComplexity::new("main", 3)]
        );
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "broken.py");
        assert_eq!(analysis.reports.len(), 2);

        let markdown = std::fs::read_to_string(&analysis.reports[0]).expect("markdown");
        assert!(markdown.starts_with("# Repository Analysis Report: demo"));
        assert!(markdown.contains("- **Description**: Demo repo"));
        assert!(markdown.contains("## File: main.py"));
        assert!(!markdown.contains("broken.py"));
        let html = std::fs::read_to_string(&analysis.reports[1]).expect("html");
        assert!(html.contains("<h2>File: main.py</h2>"));

        std::fs::remove_dir_all(&output_dir).expect("cleanup");
    }

    #[tokio::test]
    async fn run_analysis_honors_cancellation_and_still_writes_report() {
        let server = MockServer::start_async().await;
        mock_repository(&server).await;
        let output_dir = std::env::temp_dir().join(unique_dir_name());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut config = AppConfig::default();
        config.report.output_formats = vec!["markdown".to_string()];

        let analysis = run_analysis(session(&server, config), Some(output_dir.clone()), cancel)
            .await
            .expect("analysis");

        assert_eq!(analysis.outcome.status, RunStatus::Cancelled);
        assert!(analysis.outcome.result.is_empty());
        assert_eq!(analysis.reports.len(), 1);
        assert!(render_summary_text(&analysis).contains("Analysis cancelled: demo"));

        std::fs::remove_dir_all(&output_dir).expect("cleanup");
    }

    #[tokio::test]
    async fn run_analysis_fails_when_metadata_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo");
                then.status(404).body("Not Found");
            })
            .await;

        let err = run_analysis(
            session(&server, AppConfig::default()),
            Some(std::env::temp_dir().join(unique_dir_name())),
            CancelFlag::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("metadata stage failed"));
    }

    #[tokio::test]
    async fn run_file_picks_default_entry_point() {
        let server = MockServer::start_async().await;
        mock_repository(&server).await;

        let (path, record) = run_file(session(&server, AppConfig::default()), None)
            .await
            .expect("file");

        assert_eq!(path, "main.py");
        assert_eq!(record.complexity[0].score, 3);
        assert_eq!(record.diagnostics, "");
    }

    #[tokio::test]
    async fn run_file_reports_skip_reason() {
        let server = MockServer::start_async().await;
        mock_repository(&server).await;

        let err = run_file(
            session(&server, AppConfig::default()),
            Some("broken.py".to_string()),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("broken.py was not analyzed"));
    }

    #[tokio::test]
    async fn run_info_lists_entries_and_previews() {
        let server = MockServer::start_async().await;
        mock_repository(&server).await;

        let output = run_info(
            session(&server, AppConfig::default()),
            Some("main.py".to_string()),
        )
        .await
        .expect("info");

        assert!(output.contains("Repository: demo"));
        assert!(output.contains("Description: Demo repo"));
        assert!(output.contains("- README.md (10 bytes)"));
        assert!(output.contains("Preview of main.py:"));
        assert!(output.contains("def main(argv):"));
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(PREVIEW_CHARS + 10);
        let preview = preview_text(&long);
        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(preview_text("short"), "short");
        assert_eq!(preview_text(&"é".repeat(PREVIEW_CHARS)), "é".repeat(PREVIEW_CHARS));
    }

    #[test]
    fn render_info_text_uses_fallbacks() {
        let mut metadata = metadata();
        metadata.language = None;
        let output = render_info_text(&metadata);
        assert!(output.contains("Description: No description"));
        assert!(output.contains("Language: Unknown"));
        assert!(output.contains("- main.py (120 bytes)"));
        assert!(output.contains("- docs\n"));

        metadata.entries.clear();
        assert!(render_info_text(&metadata).contains("Files: none"));
    }

    #[test]
    fn render_summary_covers_skips_and_reports() {
        let mut result = AnalysisResult::new();
        result.insert(
            "a.py",
            MetricRecord {
                complexity: Vec::new(),
                volume: VolumeMetrics::default(),
                diagnostics: String::new(),
            },
        );
        let analysis = Analysis {
            outcome: RunOutcome {
                metadata: metadata(),
                result,
                skipped: vec![SkippedFile {
                    name: "big.py".to_string(),
                    reason: SkipReason::TooLarge {
                        size: 500,
                        limit: 100,
                    },
                }],
                status: RunStatus::Completed,
            },
            reports: vec![PathBuf::from("out/demo.md")],
        };

        let text = render_analysis(&analysis, SummaryFormat::Text).expect("text");
        assert!(text.contains("Analysis completed: demo"));
        assert!(text.contains("Files analyzed: 1"));
        assert!(text.contains("- big.py: file is 500 bytes, limit is 100"));
        assert!(text.contains("- out/demo.md"));

        let json = render_analysis(&analysis, SummaryFormat::Json).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["status"], "completed");
        assert_eq!(parsed["skipped"][0]["reason"]["reason"], "too_large");
        assert_eq!(parsed["reports"][0], "out/demo.md");
    }

    #[test]
    fn render_file_text_and_json() {
        let record = MetricRecord {
            complexity: vec![SymbolComplexity::new("main", 3)],
            volume: VolumeMetrics::new(10.0, 1.25, 12.5),
            diagnostics: "main.py:1:0: C0114: Missing module docstring (missing-module-docstring)\n"
                .to_string(),
        };

        let text = render_file("main.py", &record, SummaryFormat::Text).expect("text");
        assert!(text.contains("- main: 3"));
        assert!(text.contains("volume 10.00, difficulty 1.25, effort 12.50"));
        assert!(text.contains("Issues:\nmain.py:1:0: C0114"));

        let json = render_file("main.py", &record, SummaryFormat::Json).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["complexity"][0]["symbol"], "main");
    }

    #[tokio::test]
    async fn cancel_listener_can_be_aborted() {
        let cancel = CancelFlag::new();
        let listener = spawn_cancel_listener(cancel.clone());
        listener.abort();
        assert!(listener.await.is_err());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn init_logging_tolerates_repeat_calls() {
        let logging = LoggingConfig::default();
        init_logging(&logging);
        init_logging(&logging);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "reposcope",
            "analyze",
            "https://github.com/octo/demo",
            "--output-dir",
            "out",
            "--format",
            "json",
        ])
        .expect("parse");
        match cli.command {
            Commands::Analyze {
                repo,
                output_dir,
                format,
            } => {
                assert_eq!(repo.url.as_deref(), Some("https://github.com/octo/demo"));
                assert_eq!(repo.config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert_eq!(format, SummaryFormat::Json);
            }
            _ => panic!("expected analyze"),
        }

        let cli = Cli::try_parse_from(["reposcope", "info", "--preview", "main.py"]).expect("parse");
        assert!(cli.command.repo().url.is_none());
    }
}
