//! Pipeline lifecycle management.
//!
//! The [`PipelineGuard`] owns a running pipeline. When dropped, it flushes
//! pending records and shuts the pipeline down gracefully, so telemetry is
//! not lost when the host application exits.

use crate::error::PipelineError;
use crate::logger::{Logger, Pipeline};

/// Guard that manages pipeline lifecycle.
///
/// On drop, flushes pending records and shuts the pipeline down.
/// Use [`shutdown()`](Self::shutdown) for explicit error handling.
#[derive(Debug)]
pub struct PipelineGuard {
    pipeline: Pipeline,
}

impl PipelineGuard {
    pub(crate) fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Returns the managed pipeline.
    ///
    /// The pipeline is `Clone`, so producers can keep their own handle
    /// while the guard retains lifecycle ownership.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Creates a logger for the given channel.
    #[must_use]
    pub fn logger(&self, channel: impl Into<String>) -> Logger {
        self.pipeline.logger(channel)
    }

    /// Flushes buffered records. Errors are logged but not returned.
    pub fn flush(&self) {
        if let Err(e) = self.pipeline.force_flush() {
            tracing::error!(
                target: "emitter_lifecycle",
                error = %e,
                "failed to flush pipeline"
            );
        }
    }

    /// Shuts the pipeline down, returning the first error if any.
    ///
    /// Shutdown is synchronous: it blocks until the final flush completes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerPanicked`] if the flush worker
    /// panicked during the final drain.
    pub fn shutdown(self) -> Result<(), PipelineError> {
        // Drop runs afterwards; pipeline shutdown is idempotent.
        self.pipeline.shutdown()
    }
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.shutdown() {
            tracing::error!(
                target: "emitter_lifecycle",
                error = %e,
                "failed to shut down pipeline"
            );
        }
    }
}
