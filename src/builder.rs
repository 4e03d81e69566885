//! Builder for the emission pipeline.
//!
//! The builder supports layered configuration from multiple sources:
//! 1. Compiled defaults
//! 2. Configuration files (TOML)
//! 3. Environment variables
//! 4. Programmatic overrides
//!
//! Sources are merged in order, with later sources taking precedence.

use crate::config::{OverflowPolicy, PipelineConfig};
use crate::error::PipelineError;
use crate::export::{Exporter, OtlpHttpExporter};
use crate::guard::PipelineGuard;
use crate::logger::Pipeline;
use crate::processor::BatchProcessor;
use crate::record::Severity;
use crate::resource::Resource;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and starting an emission pipeline.
///
/// # Example
///
/// ```no_run
/// use otlp_emitter::{PipelineBuilder, PipelineError};
///
/// fn main() -> Result<(), PipelineError> {
///     // Simple case - uses defaults (http://localhost:4318)
///     let _guard = PipelineBuilder::new().build()?;
///
///     // Full configuration
///     let guard = PipelineBuilder::new()
///         .with_file("/etc/emitter.toml")
///         .with_env("EMITTER_")
///         .endpoint("http://collector:4318")
///         .service_name("shoppingcart")
///         .instance_id("instance-12")
///         .build()?;
///
///     let logger = guard.logger("myapp.area1");
///     logger.info("How quickly daft jumping zebras vex.");
///     Ok(())
/// }
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct PipelineBuilder {
    figment: Figment,
    resource_attributes: HashMap<String, String>,
    exporter: Option<Box<dyn Exporter>>,
}

impl PipelineBuilder {
    /// Creates a new builder with default configuration.
    ///
    /// Defaults include:
    /// - Endpoint: `http://localhost:4318`
    /// - Batch: queue 2048, batch 512, delay 5s, 3 retries
    /// - Overflow: drop-newest
    /// - Severity threshold: info
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(PipelineConfig::default())),
            resource_attributes: HashMap::new(),
            exporter: None,
        }
    }

    /// Creates a builder from an existing figment.
    ///
    /// This allows power users to construct complex configuration chains
    /// before passing them to the pipeline builder.
    pub fn from_figment(figment: Figment) -> Self {
        Self {
            figment,
            resource_attributes: HashMap::new(),
            exporter: None,
        }
    }

    /// Merges configuration from a TOML file.
    ///
    /// If the file doesn't exist, it's silently skipped. This allows
    /// optional configuration files that may or may not be present.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.figment = self.figment.merge(Toml::file(path));
        }
        self
    }

    /// Merges configuration from environment variables with the given prefix.
    ///
    /// Variables are split on underscores to match nested config. For
    /// example, with prefix `EMITTER_`:
    /// - `EMITTER_ENDPOINT_URL` → `endpoint.url`
    /// - `EMITTER_ENDPOINT_INSECURE` → `endpoint.insecure`
    pub fn with_env(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(prefix).split("_"));
        self
    }

    /// Merges configuration from standard OpenTelemetry environment
    /// variables:
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT` → endpoint URL
    /// - `OTEL_SERVICE_NAME` → service name
    /// - `OTEL_LOG_LEVEL` → severity threshold
    /// - `OTEL_BLRP_SCHEDULE_DELAY` (ms) → scheduled delay
    /// - `OTEL_BLRP_MAX_QUEUE_SIZE` → queue size
    /// - `OTEL_BLRP_MAX_EXPORT_BATCH_SIZE` → batch size
    pub fn with_standard_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.url", endpoint));
        }

        if let Ok(service_name) = std::env::var("OTEL_SERVICE_NAME") {
            self.figment = self
                .figment
                .merge(Serialized::default("resource.service_name", service_name));
        }

        if let Ok(level) = std::env::var("OTEL_LOG_LEVEL") {
            let level = level.to_lowercase();
            // Unknown levels are ignored rather than failing extraction.
            if matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "fatal"
            ) {
                self.figment = self
                    .figment
                    .merge(Serialized::default("min_severity", level));
            }
        }

        if let Some(delay_ms) = env_u64("OTEL_BLRP_SCHEDULE_DELAY") {
            self.figment = self.figment.merge(Serialized::default(
                "batch.scheduled_delay",
                format!("{delay_ms}ms"),
            ));
        }

        if let Some(size) = env_u64("OTEL_BLRP_MAX_QUEUE_SIZE") {
            self.figment = self
                .figment
                .merge(Serialized::default("batch.max_queue_size", size));
        }

        if let Some(size) = env_u64("OTEL_BLRP_MAX_EXPORT_BATCH_SIZE") {
            self.figment = self
                .figment
                .merge(Serialized::default("batch.max_export_batch_size", size));
        }

        self
    }

    /// Sets the collector endpoint URL explicitly.
    ///
    /// The `/v1/logs` signal path is appended automatically.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.url", url.into()));
        self
    }

    /// Skips TLS certificate verification for `https://` endpoints.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.insecure", insecure));
        self
    }

    /// Adds an HTTP header to all export requests.
    ///
    /// Useful for authentication or custom routing.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let header_key = format!("endpoint.headers.{}", key.into());
        self.figment = self
            .figment
            .merge(Serialized::default(&header_key, value.into()));
        self
    }

    /// Sets the `service.name` resource attribute.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("resource.service_name", name.into()));
        self
    }

    /// Sets the `service.instance.id` resource attribute.
    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("resource.instance_id", id.into()));
        self
    }

    /// Adds a resource attribute.
    pub fn resource_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the severity threshold; records below it are discarded.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("min_severity", severity));
        self
    }

    /// Sets the overflow policy applied when the buffer is full.
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("batch.overflow_policy", policy));
        self
    }

    /// Sets the maximum number of buffered records.
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("batch.max_queue_size", size));
        self
    }

    /// Sets the flush threshold and maximum export batch size.
    pub fn max_export_batch_size(mut self, size: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("batch.max_export_batch_size", size));
        self
    }

    /// Sets the interval flush delay.
    pub fn scheduled_delay(mut self, delay: Duration) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "batch.scheduled_delay",
            humantime::format_duration(delay).to_string(),
        ));
        self
    }

    /// Sets the retry bound for failed exports.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("batch.max_retries", retries));
        self
    }

    /// Sets the delay between export retry attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "batch.retry_delay",
            humantime::format_duration(delay).to_string(),
        ));
        self
    }

    /// Installs a custom exporter instead of the OTLP/HTTP one.
    ///
    /// The endpoint configuration is ignored when a custom exporter is
    /// set. This is also the seam tests use to observe exported batches.
    pub fn with_exporter(mut self, exporter: Box<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Extracts the configuration for inspection or debugging.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails or if the
    /// endpoint URL is invalid.
    pub fn extract_config(&self) -> Result<PipelineConfig, PipelineError> {
        let mut config: PipelineConfig = self
            .figment
            .extract()
            .map_err(|e| PipelineError::Config(Box::new(e)))?;

        // Merge resource attributes that couldn't go through figment
        config
            .resource
            .attributes
            .extend(self.resource_attributes.clone());

        validate(&config)?;

        Ok(config)
    }

    /// Builds and starts the pipeline.
    ///
    /// Returns a [`PipelineGuard`] that manages the pipeline's lifecycle.
    /// When the guard is dropped, buffered records are flushed and the
    /// pipeline shuts down.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails, the endpoint is
    /// invalid, the exporter cannot be constructed, or the flush worker
    /// cannot be spawned.
    pub fn build(self) -> Result<PipelineGuard, PipelineError> {
        let mut config: PipelineConfig = self
            .figment
            .extract()
            .map_err(|e| PipelineError::Config(Box::new(e)))?;

        config.resource.attributes.extend(self.resource_attributes);

        validate(&config)?;

        let resource = Arc::new(Resource::from_config(&config.resource));

        let exporter: Box<dyn Exporter> = match self.exporter {
            Some(exporter) => exporter,
            None => Box::new(OtlpHttpExporter::from_config(&config)?),
        };

        let processor = Arc::new(BatchProcessor::start(
            config.batch.clone(),
            Arc::clone(&resource),
            exporter,
        )?);

        Ok(PipelineGuard::new(Pipeline::new(
            processor,
            resource,
            config.min_severity,
        )))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Startup validation: a bad endpoint or a zero-sized batch knob is fatal
/// here rather than degrading the pipeline later (a zero batch size would
/// keep the flush worker permanently due).
fn validate(config: &PipelineConfig) -> Result<(), PipelineError> {
    if let Some(ref url) = config.endpoint.url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::InvalidEndpoint { url: url.clone() });
        }
    }

    if config.batch.max_queue_size == 0 {
        return Err(PipelineError::InvalidBatchSize {
            field: "max_queue_size",
        });
    }

    if config.batch.max_export_batch_size == 0 {
        return Err(PipelineError::InvalidBatchSize {
            field: "max_export_batch_size",
        });
    }

    Ok(())
}
