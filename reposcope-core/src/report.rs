//! Renderer-agnostic report document built from analysis results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::ReportSection;
use crate::domain::{AnalysisResult, MetricRecord, RepositoryMetadata};

/// Timestamp format used in the overview.
pub const ANALYSIS_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A report as a title and ordered sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Document title.
    pub title: String,
    /// Top-level sections in order.
    pub sections: Vec<Section>,
}

/// A headed section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading.
    pub heading: String,
    /// Section contents in order.
    pub body: Vec<Block>,
}

impl Section {
    fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: Vec::new(),
        }
    }

    fn line(mut self, text: impl Into<String>) -> Self {
        self.body.push(Block::Line(text.into()));
        self
    }
}

/// One element of a section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// A single line of text.
    Line(String),
    /// Preformatted text.
    Code(String),
    /// A nested section.
    Section(Section),
}

/// Build the report document for a run.
///
/// `sections` selects the per-file subsections; they always appear in the
/// order complexity, volume metrics, diagnostics.
pub fn build(
    metadata: &RepositoryMetadata,
    result: &AnalysisResult,
    generated_at: NaiveDateTime,
    sections: &[ReportSection],
) -> ReportDocument {
    let mut document = ReportDocument {
        title: format!("Repository Analysis Report: {}", escape_inline(&metadata.name)),
        sections: vec![overview(metadata, result, generated_at)],
    };
    for file in result.iter() {
        let mut section = Section::new(format!("File: {}", escape_inline(&file.name)));
        for kind in ReportSection::ALL {
            if sections.contains(&kind) {
                section.body.push(Block::Section(subsection(kind, &file.record)));
            }
        }
        document.sections.push(section);
    }
    document
}

fn overview(
    metadata: &RepositoryMetadata,
    result: &AnalysisResult,
    generated_at: NaiveDateTime,
) -> Section {
    Section::new("Repository Overview")
        .line(format!("- **Name**: {}", escape_inline(&metadata.name)))
        .line(format!(
            "- **Description**: {}",
            escape_inline(metadata.description.as_deref().unwrap_or("No description"))
        ))
        .line(format!(
            "- **Primary Language**: {}",
            escape_inline(metadata.language.as_deref().unwrap_or("Unknown"))
        ))
        .line(format!("- **Stars**: {}", metadata.stars))
        .line(format!(
            "- **Analysis Date**: {}",
            generated_at.format(ANALYSIS_DATE_FORMAT)
        ))
        .line(format!("- **Files Analyzed**: {}", result.len()))
}

fn subsection(kind: ReportSection, record: &MetricRecord) -> Section {
    match kind {
        ReportSection::Complexity => {
            let mut section = Section::new("Cyclomatic Complexity");
            if record.complexity.is_empty() {
                return section.line("- No complexity data available");
            }
            for item in &record.complexity {
                section = section.line(format!(
                    "- **{}**: {} complexity",
                    escape_inline(&item.symbol),
                    item.score
                ));
            }
            section
        }
        ReportSection::VolumeMetrics => Section::new("Halstead Metrics")
            .line(format!("- **Volume**: {:.2}", record.volume.volume))
            .line(format!("- **Difficulty**: {:.2}", record.volume.difficulty))
            .line(format!("- **Effort**: {:.2}", record.volume.effort)),
        ReportSection::Diagnostics => {
            let mut section = Section::new("Code Quality Issues");
            if record.diagnostics.trim().is_empty() {
                return section.line("- No significant issues detected");
            }
            section.body.push(Block::Code(record.diagnostics.clone()));
            section
        }
    }
}

/// Escape text for use inside a single Markdown line.
///
/// Line breaks collapse to spaces and inline metacharacters, including raw
/// HTML delimiters, are backslash-escaped.
pub fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.split_whitespace().collect::<Vec<_>>().join(" ").chars() {
        if matches!(
            ch,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '#' | '!' | '|' | '~' | '&'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
