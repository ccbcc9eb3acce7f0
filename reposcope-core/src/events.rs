//! Pipeline event sinks.

use crate::orchestrator::SkipReason;

/// Receives pipeline outcomes as they happen.
///
/// The orchestrator and analyzer report through this handle instead of the
/// global logger, so callers decide where skips and degradations go.
pub trait PipelineEvents {
    /// A file was analyzed and recorded.
    fn file_analyzed(&self, name: &str);
    /// A file was left out of the result.
    fn file_skipped(&self, name: &str, reason: &SkipReason);
    /// A non-essential metric failed and its default was substituted.
    fn metric_degraded(&self, name: &str, metric: &str, error: &str);
    /// The run stopped early; `analyzed` files were recorded before that.
    fn cancelled(&self, analyzed: usize);
}

/// Forwards pipeline events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl PipelineEvents for LogEvents {
    fn file_analyzed(&self, name: &str) {
        log::info!("Analyzed {name}");
    }

    fn file_skipped(&self, name: &str, reason: &SkipReason) {
        log::warn!("Skipping {name}: {reason}");
    }

    fn metric_degraded(&self, name: &str, metric: &str, error: &str) {
        log::warn!("{metric} analysis failed for {name}: {error}");
    }

    fn cancelled(&self, analyzed: usize) {
        log::warn!("Analysis cancelled after {analyzed} file(s)");
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;

    use super::PipelineEvents;
    use crate::orchestrator::SkipReason;

    /// Collects events as readable strings for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingEvents {
        events: RefCell<Vec<String>>,
    }

    impl RecordingEvents {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }

        fn push(&self, event: String) {
            self.events.borrow_mut().push(event);
        }
    }

    impl PipelineEvents for RecordingEvents {
        fn file_analyzed(&self, name: &str) {
            self.push(format!("analyzed {name}"));
        }

        fn file_skipped(&self, name: &str, reason: &SkipReason) {
            self.push(format!("skipped {name}: {reason}"));
        }

        fn metric_degraded(&self, name: &str, metric: &str, error: &str) {
            self.push(format!("degraded {name} {metric}: {error}"));
        }

        fn cancelled(&self, analyzed: usize) {
            self.push(format!("cancelled after {analyzed}"));
        }
    }
}
