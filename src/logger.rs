//! The pipeline object and producer-facing logger handles.
//!
//! There is no global handler and no ambient mutable configuration: a
//! [`Pipeline`] is constructed explicitly (via
//! [`PipelineBuilder`](crate::PipelineBuilder)) and producers opt in by
//! asking it for a [`Logger`] handle per channel. Pipeline failures never
//! reach the instrumentation call site; they are reported via `tracing`
//! under the `emitter_lifecycle` target.

use crate::context::ContextTracker;
use crate::error::PipelineError;
use crate::processor::BatchProcessor;
use crate::record::{AttributeValue, Record, Severity};
use crate::resource::Resource;
use std::sync::Arc;
use std::time::SystemTime;

/// An explicitly constructed emission pipeline.
///
/// Cheap to clone; clones share the same processor and resource.
#[derive(Clone)]
pub struct Pipeline {
    processor: Arc<BatchProcessor>,
    resource: Arc<Resource>,
    min_severity: Severity,
}

impl Pipeline {
    pub(crate) fn new(
        processor: Arc<BatchProcessor>,
        resource: Arc<Resource>,
        min_severity: Severity,
    ) -> Self {
        Self {
            processor,
            resource,
            min_severity,
        }
    }

    /// Creates a logger for the given channel.
    ///
    /// Channels are purely logical names ("myapp.area1"); creating a logger
    /// allocates nothing in the pipeline itself.
    #[must_use]
    pub fn logger(&self, channel: impl Into<String>) -> Logger {
        Logger {
            channel: channel.into(),
            processor: Arc::clone(&self.processor),
            min_severity: self.min_severity,
        }
    }

    /// The resource attached to every exported batch.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The severity threshold applied to all loggers of this pipeline.
    #[must_use]
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Access to the underlying processor, for state inspection.
    #[must_use]
    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// Drains buffered records through the exporter.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FlushTimeout`] if the drain does not
    /// complete within the configured export timeout.
    pub fn force_flush(&self) -> Result<(), PipelineError> {
        self.processor.force_flush()
    }

    /// Shuts the pipeline down: one final flush, then no further records
    /// are accepted. Idempotent and synchronous.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerPanicked`] if the flush worker
    /// panicked.
    pub fn shutdown(&self) -> Result<(), PipelineError> {
        self.processor.shutdown()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("min_severity", &self.min_severity)
            .field("state", &self.processor.state())
            .finish_non_exhaustive()
    }
}

/// Producer handle for one channel.
///
/// All emission methods are infallible and non-blocking (up to the
/// configured overflow bound): a logger call can never fail or panic at
/// the call site.
#[derive(Clone)]
pub struct Logger {
    channel: String,
    processor: Arc<BatchProcessor>,
    min_severity: Severity,
}

impl Logger {
    /// The channel this logger emits on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Emits a record at the given severity.
    ///
    /// The record is stamped with the current time and, if a span is active
    /// on this thread, its trace/span ids. Records below the pipeline's
    /// severity threshold are discarded before enqueue.
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.log_with(severity, message, Vec::new());
    }

    /// Emits a record with per-event structured attributes.
    pub fn log_with(
        &self,
        severity: Severity,
        message: impl Into<String>,
        attributes: Vec<(String, AttributeValue)>,
    ) {
        if severity < self.min_severity {
            return;
        }

        self.processor.enqueue(Record {
            timestamp: SystemTime::now(),
            channel: self.channel.clone(),
            severity,
            body: message.into(),
            attributes,
            trace_context: ContextTracker::current(),
        });
    }

    /// Emits at [`Severity::Trace`].
    pub fn trace(&self, message: impl Into<String>) {
        self.log(Severity::Trace, message);
    }

    /// Emits at [`Severity::Debug`].
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    /// Emits at [`Severity::Info`].
    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    /// Emits at [`Severity::Warn`].
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warn, message);
    }

    /// Emits at [`Severity::Error`].
    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    /// Emits at [`Severity::Fatal`].
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Severity::Fatal, message);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("channel", &self.channel)
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}
