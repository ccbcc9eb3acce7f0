//! Per-file analysis with isolated metric failures.

use crate::domain::{MetricRecord, VolumeMetrics};
use crate::error::{AnalysisFailure, AnalysisStage};
use crate::events::PipelineEvents;
use crate::lint::LintEngine;
use crate::metrics::MetricsEngine;

/// Runs the metrics and lint engines over one file's text.
#[derive(Debug, Clone)]
pub struct FileAnalyzer<M, L> {
    metrics: M,
    linter: L,
}

impl<M: MetricsEngine, L: LintEngine> FileAnalyzer<M, L> {
    /// Create an analyzer from its engines.
    pub fn new(metrics: M, linter: L) -> Self {
        Self { metrics, linter }
    }

    /// Analyze one file.
    ///
    /// Only a complexity failure aborts; the volume and lint stages fall back
    /// to defaults and report a degradation through `events`.
    pub fn analyze(
        &self,
        text: &str,
        file_name: &str,
        events: &dyn PipelineEvents,
    ) -> std::result::Result<MetricRecord, AnalysisFailure> {
        let complexity = self
            .metrics
            .complexity(text)
            .map_err(|err| AnalysisFailure {
                stage: AnalysisStage::Complexity,
                message: err.to_string(),
            })?;

        let volume = match self.metrics.volume_metrics(text) {
            Ok(volume) => volume,
            Err(err) => {
                events.metric_degraded(file_name, "volume", &err.to_string());
                VolumeMetrics::default()
            }
        };

        let diagnostics = match self.linter.lint(text, file_name) {
            Ok(diagnostics) => diagnostics,
            Err(err) => {
                events.metric_degraded(file_name, "lint", &err.to_string());
                format!("Unable to perform lint analysis: {err}")
            }
        };

        Ok(MetricRecord {
            complexity,
            volume,
            diagnostics,
        })
    }
}
