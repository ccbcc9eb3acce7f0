//! Configuration loading with fallback to documented defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReposcopeError, Result};

/// Default upper bound for analyzed file sizes, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;
/// Default suffix of analyzed source files.
pub const DEFAULT_SOURCE_SUFFIX: &str = ".py";
/// Default directory for generated reports.
pub const DEFAULT_OUTPUT_DIR: &str = "repository_analysis";
/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository host settings.
    pub github: GithubConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Report generation settings.
    pub report: ReportConfig,
    /// Lint engine settings.
    #[serde(default)]
    pub lint: LintConfig,
}

/// Repository host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Files larger than this many bytes are not analyzed.
    pub max_file_size: u64,
    /// Only entries ending with this suffix are analyzed.
    pub source_suffix: String,
    /// Timeout applied to each API request.
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            source_suffix: DEFAULT_SOURCE_SUFFIX.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level name (`ERROR`, `WARN`, `INFO`, `DEBUG`, `TRACE`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Level filter string understood by `env_logger`, defaulting to `info`.
    pub fn filter(&self) -> &'static str {
        match self.level.trim().to_lowercase().as_str() {
            "off" => "off",
            "error" | "critical" => "error",
            "warn" | "warning" => "warn",
            "debug" => "debug",
            "trace" => "trace",
            _ => "info",
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Enabled output formats.
    pub output_formats: Vec<String>,
    /// Per-file subsections to include.
    pub include_sections: Vec<String>,
    /// Directory receiving generated reports.
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_formats: vec!["markdown".to_string(), "html".to_string()],
            include_sections: vec![
                "complexity".to_string(),
                "halstead_metrics".to_string(),
                "pylint_issues".to_string(),
            ],
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

/// Rendered report formats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Markdown document.
    Markdown,
    /// Self-contained styled HTML document.
    Styled,
}

impl OutputFormat {
    /// Parse a configured format name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(Self::Markdown),
            "styled" | "html" => Some(Self::Styled),
            _ => None,
        }
    }

    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Styled => "html",
        }
    }
}

/// Per-file report subsections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    /// Cyclomatic complexity per symbol.
    Complexity,
    /// Halstead volume triple.
    VolumeMetrics,
    /// Lint diagnostics.
    Diagnostics,
}

impl ReportSection {
    /// All subsections in report order.
    pub const ALL: [ReportSection; 3] = [
        ReportSection::Complexity,
        ReportSection::VolumeMetrics,
        ReportSection::Diagnostics,
    ];

    /// Parse a configured section name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "complexity" | "cyclomatic_complexity" => Some(Self::Complexity),
            "volume_metrics" | "halstead_metrics" | "halstead" => Some(Self::VolumeMetrics),
            "diagnostics" | "pylint_issues" | "lint" => Some(Self::Diagnostics),
            _ => None,
        }
    }
}

impl ReportConfig {
    /// Enabled formats, deduplicated; falls back to both when none are valid.
    pub fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        for format in self.output_formats.iter().filter_map(|v| OutputFormat::parse(v)) {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            return vec![OutputFormat::Markdown, OutputFormat::Styled];
        }
        formats
    }

    /// Enabled subsections in report order; falls back to all when none are valid.
    pub fn sections(&self) -> Vec<ReportSection> {
        let selected: Vec<ReportSection> = self
            .include_sections
            .iter()
            .filter_map(|v| ReportSection::parse(v))
            .collect();
        if selected.is_empty() {
            return ReportSection::ALL.to_vec();
        }
        ReportSection::ALL
            .into_iter()
            .filter(|section| selected.contains(section))
            .collect()
    }

    fn unknown_values(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for value in &self.output_formats {
            if OutputFormat::parse(value).is_none() {
                warnings.push(format!("Ignoring unknown output format: {value}"));
            }
        }
        for value in &self.include_sections {
            if ReportSection::parse(value).is_none() {
                warnings.push(format!("Ignoring unknown report section: {value}"));
            }
        }
        warnings
    }
}

/// Lint engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// External linter command; empty selects the builtin linter.
    pub command: Vec<String>,
    /// Directory for the external linter's scratch files; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

/// A loaded configuration plus warnings to log once logging is set up.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLoad {
    /// Effective configuration.
    pub config: AppConfig,
    /// Problems encountered while loading.
    pub warnings: Vec<String>,
}

/// Parse configuration from YAML text.
pub fn parse_config(text: &str) -> Result<AppConfig> {
    serde_yaml::from_str(text).map_err(|err| ReposcopeError::Parse(err.to_string()))
}

/// Load configuration from a file, falling back to defaults on any problem.
pub fn load_config(path: &Path) -> ConfigLoad {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return defaults_with(format!(
                "Configuration file not found at {}. Using default settings.",
                path.display()
            ));
        }
        Err(err) => {
            return defaults_with(format!(
                "Unable to read configuration at {}: {err}. Using default settings.",
                path.display()
            ));
        }
    };

    match parse_config(&text) {
        Ok(config) => {
            let warnings = config.report.unknown_values();
            ConfigLoad { config, warnings }
        }
        Err(err) => defaults_with(format!(
            "Error parsing configuration at {}: {err}. Using default settings.",
            path.display()
        )),
    }
}

fn defaults_with(warning: String) -> ConfigLoad {
    ConfigLoad {
        config: AppConfig::default(),
        warnings: vec![warning],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_full_config() {
        let config = parse_config(
            "github:\n  max_file_size: 100\n  source_suffix: .src\nlogging:\n  level: DEBUG\nreport:\n  output_formats: [markdown]\n  include_sections: [complexity]\n  output_dir: out\nlint:\n  command: [pylint, --score=n]\n  scratch_dir: /var/tmp/reposcope\n",
        )
        .expect("config");

        assert_eq!(config.github.max_file_size, 100);
        assert_eq!(config.github.source_suffix, ".src");
        assert_eq!(config.github.timeout_secs, 30);
        assert_eq!(config.logging.filter(), "debug");
        assert_eq!(config.report.formats(), vec![OutputFormat::Markdown]);
        assert_eq!(config.report.sections(), vec![ReportSection::Complexity]);
        assert_eq!(config.report.output_dir, "out");
        assert_eq!(config.lint.command, vec!["pylint", "--score=n"]);
        assert_eq!(
            config.lint.scratch_dir.as_deref(),
            Some(Path::new("/var/tmp/reposcope"))
        );
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let err = parse_config("github:\n  max_file_size: 5\n").unwrap_err();
        assert!(err.to_string().contains("logging") || err.to_string().contains("report"));
    }

    #[test]
    fn defaults_cover_all_formats_and_sections() {
        let config = AppConfig::default();
        assert_eq!(config.github.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(
            config.report.formats(),
            vec![OutputFormat::Markdown, OutputFormat::Styled]
        );
        assert_eq!(config.report.sections(), ReportSection::ALL.to_vec());
        assert!(config.lint.command.is_empty());
        assert!(config.lint.scratch_dir.is_none());
    }

    #[test]
    fn sections_follow_report_order_and_aliases() {
        let report = ReportConfig {
            include_sections: vec!["pylint_issues".to_string(), "halstead".to_string()],
            ..ReportConfig::default()
        };
        assert_eq!(
            report.sections(),
            vec![ReportSection::VolumeMetrics, ReportSection::Diagnostics]
        );
    }

    #[test]
    fn unknown_only_selection_falls_back() {
        let report = ReportConfig {
            output_formats: vec!["pdf".to_string()],
            include_sections: vec!["nope".to_string()],
            output_dir: "out".to_string(),
        };
        assert_eq!(report.formats().len(), 2);
        assert_eq!(report.sections().len(), 3);
        assert_eq!(report.unknown_values().len(), 2);
    }

    #[test]
    fn level_filter_maps_python_names() {
        let logging = LoggingConfig {
            level: "warning".to_string(),
        };
        assert_eq!(logging.filter(), "warn");
        let logging = LoggingConfig {
            level: "verbose".to_string(),
        };
        assert_eq!(logging.filter(), "info");
    }

    #[test]
    fn load_config_falls_back_when_missing() {
        let path = std::env::temp_dir().join(unique_name("missing.yaml"));
        let load = load_config(&path);
        assert_eq!(load.config, AppConfig::default());
        assert_eq!(load.warnings.len(), 1);
        assert!(load.warnings[0].contains("not found"));
    }

    #[test]
    fn load_config_falls_back_when_malformed() {
        let path = std::env::temp_dir().join(unique_name("bad.yaml"));
        std::fs::write(&path, "github: [unclosed\n").expect("write config");

        let load = load_config(&path);
        assert_eq!(load.config, AppConfig::default());
        assert!(load.warnings[0].contains("Error parsing configuration"));

        std::fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn load_config_reports_unknown_values() {
        let path = std::env::temp_dir().join(unique_name("ok.yaml"));
        std::fs::write(
            &path,
            "github: {}\nlogging: {}\nreport:\n  output_formats: [markdown, pdf]\n",
        )
        .expect("write config");

        let load = load_config(&path);
        assert_eq!(load.config.report.formats(), vec![OutputFormat::Markdown]);
        assert_eq!(load.warnings, vec!["Ignoring unknown output format: pdf"]);

        std::fs::remove_file(&path).expect("cleanup");
    }

    fn unique_name(suffix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("reposcope_config_test_{nanos}_{suffix}"))
    }
}
