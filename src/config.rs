//! Configuration types for the emission pipeline.
//!
//! These types are designed to be deserialised from multiple sources using
//! figment, supporting layered configuration from defaults, files, and
//! environment variables.

use crate::record::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default collector endpoint for OTLP/HTTP.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4318";

/// OTLP/HTTP path for log exports.
pub const LOGS_PATH: &str = "/v1/logs";

/// Policy applied when a record arrives and the buffer is full.
///
/// The buffer is strictly bounded; one of these is always in effect and
/// overflow is never silent growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Discard the incoming record. The producer is never delayed.
    #[default]
    #[serde(alias = "drop_newest", alias = "drop-newest")]
    DropNewest,
    /// Discard the oldest buffered record to make room.
    #[serde(alias = "drop_oldest", alias = "drop-oldest")]
    DropOldest,
    /// Wait up to [`BatchConfig::block_timeout`] for space, then discard
    /// the incoming record.
    Block,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Endpoint configuration.
    pub endpoint: EndpointConfig,

    /// Resource configuration.
    pub resource: ResourceConfig,

    /// Batch processor configuration.
    pub batch: BatchConfig,

    /// Records below this severity are filtered before enqueue.
    pub min_severity: Severity,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            resource: ResourceConfig::default(),
            batch: BatchConfig::default(),
            min_severity: Severity::Info,
        }
    }
}

impl PipelineConfig {
    /// Returns the effective endpoint URL, falling back to the default.
    #[must_use]
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Returns the full URL records are posted to.
    #[must_use]
    pub fn logs_endpoint(&self) -> String {
        let base = self.effective_endpoint();
        format!("{}{LOGS_PATH}", base.trim_end_matches('/'))
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Collector endpoint URL. Defaults to `http://localhost:4318`.
    pub url: Option<String>,

    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// HTTP headers for authentication or customisation.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Skip TLS certificate verification for `https://` endpoints.
    ///
    /// For collectors with self-signed certificates in closed networks.
    pub insecure: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(10),
            headers: HashMap::new(),
            insecure: false,
        }
    }
}

/// Resource configuration: static metadata identifying this process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Service name (`service.name`).
    pub service_name: Option<String>,

    /// Service instance id (`service.instance.id`).
    pub instance_id: Option<String>,

    /// Additional resource attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Batch processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of buffered records.
    pub max_queue_size: usize,

    /// Buffered count that triggers a flush; also the largest batch handed
    /// to the exporter in one call.
    pub max_export_batch_size: usize,

    /// Interval after which buffered records are flushed regardless of count.
    #[serde(with = "humantime_serde")]
    pub scheduled_delay: Duration,

    /// Maximum time a forced flush waits for the buffer to drain.
    #[serde(with = "humantime_serde")]
    pub export_timeout: Duration,

    /// Policy applied when the buffer is full.
    pub overflow_policy: OverflowPolicy,

    /// Bound on producer blocking under [`OverflowPolicy::Block`].
    #[serde(with = "humantime_serde")]
    pub block_timeout: Duration,

    /// Retries per failed export before the batch is dropped.
    pub max_retries: u32,

    /// Delay between retry attempts.
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_secs(5),
            export_timeout: Duration::from_secs(30),
            overflow_policy: OverflowPolicy::default(),
            block_timeout: Duration::from_millis(100),
            max_retries: 3,
            retry_delay: Duration::from_millis(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_endpoint_falls_back_to_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.effective_endpoint(), "http://localhost:4318");

        let mut config = PipelineConfig::default();
        config.endpoint.url = Some("http://collector:4318".to_string());
        assert_eq!(config.effective_endpoint(), "http://collector:4318");
    }

    #[test]
    fn logs_endpoint_appends_signal_path() {
        let config = PipelineConfig::default();
        assert_eq!(config.logs_endpoint(), "http://localhost:4318/v1/logs");
    }

    #[test]
    fn logs_endpoint_strips_trailing_slash_before_appending() {
        let mut config = PipelineConfig::default();
        config.endpoint.url = Some("http://collector:4318/".to_string());
        assert_eq!(config.logs_endpoint(), "http://collector:4318/v1/logs");
    }

    #[test]
    fn batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.max_queue_size, 2048);
        assert_eq!(config.max_export_batch_size, 512);
        assert_eq!(config.scheduled_delay, Duration::from_secs(5));
        assert_eq!(config.export_timeout, Duration::from_secs(30));
        assert_eq!(config.overflow_policy, OverflowPolicy::DropNewest);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn overflow_policy_accepts_snake_and_kebab_aliases() {
        let p: OverflowPolicy = serde_json::from_str("\"drop_oldest\"").unwrap();
        assert_eq!(p, OverflowPolicy::DropOldest);
        let p: OverflowPolicy = serde_json::from_str("\"drop-newest\"").unwrap();
        assert_eq!(p, OverflowPolicy::DropNewest);
        let p: OverflowPolicy = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(p, OverflowPolicy::Block);
    }

    #[test]
    fn min_severity_defaults_to_info() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_severity, Severity::Info);
    }

    #[test]
    fn durations_deserialize_from_humantime_strings() {
        let config: BatchConfig =
            serde_json::from_str(r#"{"scheduled_delay": "250ms", "retry_delay": "1s"}"#).unwrap();
        assert_eq!(config.scheduled_delay, Duration::from_millis(250));
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.max_queue_size, 2048);
    }
}
