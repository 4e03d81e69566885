//! Error types for pipeline construction and lifecycle.
//!
//! Producer-facing calls (`Logger::log`, `BatchProcessor::enqueue`) never
//! return these: instrumentation sites stay infallible and failures are
//! reported out-of-band via `tracing` under the `emitter_lifecycle` target.

use figment::Error as FigmentError;

/// Errors from pipeline construction and lifecycle operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Failed to extract configuration from sources.
    #[error("configuration error: {0}")]
    Config(#[source] Box<FigmentError>),

    /// Invalid endpoint URL format.
    #[error("invalid endpoint URL: {url} (must start with http:// or https://)")]
    InvalidEndpoint {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A batch size knob was configured as zero.
    #[error("invalid batch configuration: {field} must be at least 1")]
    InvalidBatchSize {
        /// The offending configuration field.
        field: &'static str,
    },

    /// Failed to construct the HTTP exporter.
    #[error("failed to create exporter")]
    Exporter(#[source] reqwest::Error),

    /// Failed to spawn the background flush worker.
    #[error("failed to spawn flush worker")]
    Worker(#[source] std::io::Error),

    /// A flush did not complete within the configured export timeout.
    #[error("flush timed out")]
    FlushTimeout,

    /// The background flush worker panicked.
    #[error("flush worker panicked")]
    WorkerPanicked,
}

/// Errors surfaced by an [`Exporter`](crate::Exporter) for a single batch.
///
/// Serialization and transport failures are distinct variants so the
/// processor (and operators reading self-logs) can tell a malformed payload
/// from an unreachable collector. Exporters perform no retries; bounded
/// retry is the batch processor's responsibility.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The batch could not be serialized into the wire format.
    #[error("failed to serialize batch")]
    Serialization(#[source] serde_json::Error),

    /// The export request failed to reach the endpoint.
    #[error("failed to reach collector endpoint")]
    Transport(#[source] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector rejected export with status {status}")]
    Rejected {
        /// HTTP status code returned by the collector.
        status: u16,
    },
}
