//! Batch export.
//!
//! An [`Exporter`] serializes a batch plus the process [`Resource`] and
//! transmits it, reporting success or failure per batch. Exporters perform
//! no retries of their own; the batch processor owns retry policy.

use crate::config::{EndpointConfig, PipelineConfig};
use crate::error::{ExportError, PipelineError};
use crate::otlp;
use crate::record::Record;
use crate::resource::Resource;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

/// Sink for batches of records.
///
/// Implementations must be callable from the background flush worker, so
/// they are `Send + Sync`. A custom implementation can be installed via
/// [`PipelineBuilder::with_exporter`](crate::PipelineBuilder::with_exporter),
/// which is how the test suite observes exported batches.
pub trait Exporter: Send + Sync {
    /// Exports one batch. Called at most once per batch per flush attempt.
    fn export(&self, resource: &Resource, batch: &[Record]) -> Result<(), ExportError>;
}

/// Exporter that POSTs OTLP/HTTP JSON log requests to a collector.
pub struct OtlpHttpExporter {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl OtlpHttpExporter {
    /// Builds an exporter from pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Exporter`] if the HTTP client cannot be
    /// constructed. Headers that are not valid HTTP header names or values
    /// are skipped.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.endpoint.timeout)
            .danger_accept_invalid_certs(config.endpoint.insecure)
            .build()
            .map_err(PipelineError::Exporter)?;

        Ok(Self {
            client,
            url: config.logs_endpoint(),
            headers: build_headers(&config.endpoint),
        })
    }

    /// Returns the URL batches are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Exporter for OtlpHttpExporter {
    fn export(&self, resource: &Resource, batch: &[Record]) -> Result<(), ExportError> {
        let request = otlp::encode_request(resource, batch);
        let body = serde_json::to_vec(&request).map_err(ExportError::Serialization)?;

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(ExportError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

fn build_headers(endpoint: &EndpointConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in &endpoint.headers {
        match (
            key.parse::<HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::warn!(
                    target: "emitter_lifecycle",
                    header = %key,
                    "skipping invalid export header"
                );
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn exporter_targets_logs_path() {
        let mut config = PipelineConfig::default();
        config.endpoint.url = Some("http://collector:4318".to_string());

        let exporter = OtlpHttpExporter::from_config(&config).unwrap();
        assert_eq!(exporter.url(), "http://collector:4318/v1/logs");
    }

    #[test]
    fn build_headers_parses_valid_and_skips_invalid() {
        let mut raw = HashMap::new();
        raw.insert("authorization".to_string(), "Bearer token123".to_string());
        raw.insert("bad header".to_string(), "value".to_string());

        let endpoint = EndpointConfig {
            headers: raw,
            ..Default::default()
        };
        let headers = build_headers(&endpoint);

        assert_eq!(headers.len(), 1);
        assert!(headers.get("authorization").is_some());
    }

    #[test]
    fn build_headers_handles_empty_map() {
        let headers = build_headers(&EndpointConfig::default());
        assert!(headers.is_empty());
    }
}
