//! Persisting rendered reports.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::render::{render_markdown, render_styled};
use crate::report::ReportDocument;

/// Timestamp format used in report file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File stem for a report: `{repo}_analysis_{YYYYMMDD_HHMMSS}`.
///
/// Characters outside `[A-Za-z0-9._-]` in the repository name become `_`.
pub fn report_stem(repo_name: &str, generated_at: NaiveDateTime) -> String {
    let safe: String = repo_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{safe}_analysis_{}",
        generated_at.format(FILE_TIMESTAMP_FORMAT)
    )
}

/// Writes rendered reports into an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter<F> {
    fs: F,
    output_dir: PathBuf,
}

impl<F: FileSystem> ReportWriter<F> {
    /// Create a writer targeting `output_dir`.
    pub fn new(fs: F, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            output_dir: output_dir.into(),
        }
    }

    /// Directory receiving reports.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render the document in each format and write it under `stem`.
    ///
    /// Returns the written paths in `formats` order.
    pub fn write(
        &self,
        document: &ReportDocument,
        stem: &str,
        formats: &[OutputFormat],
    ) -> Result<Vec<PathBuf>> {
        self.fs.create_dir_all(&self.output_dir)?;
        let markdown = render_markdown(document);
        let mut written = Vec::new();
        for format in formats {
            let contents = match format {
                OutputFormat::Markdown => markdown.clone(),
                OutputFormat::Styled => render_styled(&markdown),
            };
            let path = self
                .output_dir
                .join(format!("{stem}.{}", format.extension()));
            self.fs.write(&path, &contents)?;
            log::info!("Report written to {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
