//! OTLP/HTTP JSON request shapes for log export.
//!
//! Plain serde structs mirroring the `ExportLogsServiceRequest` JSON
//! mapping: camelCase field names, 64-bit integers rendered as strings,
//! trace/span ids as lowercase hex. Batches are grouped into one
//! `scopeLogs` entry per channel, in first-seen order.

use crate::record::{AttributeValue, Record};
use crate::resource::Resource;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Top-level logs export request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogsServiceRequest {
    /// Resource-scoped log groups. This pipeline emits exactly one.
    pub resource_logs: Vec<ResourceLogs>,
}

/// Logs from one resource.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogs {
    /// The emitting process's resource attributes.
    pub resource: ResourceValue,
    /// Log groups per instrumentation scope (channel).
    pub scope_logs: Vec<ScopeLogs>,
}

/// Resource attributes envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValue {
    /// Resource key/value pairs.
    pub attributes: Vec<KeyValue>,
}

/// Logs from one channel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeLogs {
    /// The channel, as an instrumentation scope.
    pub scope: InstrumentationScope,
    /// The records themselves.
    pub log_records: Vec<LogRecord>,
}

/// Instrumentation scope identifying a channel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationScope {
    /// Channel name.
    pub name: String,
}

/// One log record on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Nanoseconds since the Unix epoch, as a decimal string.
    pub time_unix_nano: String,
    /// OTLP severity number.
    pub severity_number: i32,
    /// OTLP severity text.
    pub severity_text: &'static str,
    /// Message body.
    pub body: AnyValue,
    /// Record attributes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
    /// Correlated trace id as 32 hex characters, empty when uncorrelated.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trace_id: String,
    /// Correlated span id as 16 hex characters, empty when uncorrelated.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub span_id: String,
}

/// A keyed attribute value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: AnyValue,
}

/// A scalar value in OTLP JSON encoding.
///
/// Serializes externally tagged, e.g. `{"stringValue": "..."}`. Integers
/// are strings per the OTLP JSON mapping of 64-bit values.
#[derive(Debug, Serialize)]
pub enum AnyValue {
    /// A string value.
    #[serde(rename = "stringValue")]
    Str(String),
    /// A boolean value.
    #[serde(rename = "boolValue")]
    Bool(bool),
    /// A 64-bit integer, stringified.
    #[serde(rename = "intValue")]
    Int(String),
    /// A double value.
    #[serde(rename = "doubleValue")]
    Double(f64),
}

impl From<&AttributeValue> for AnyValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Str(s) => AnyValue::Str(s.clone()),
            AttributeValue::Bool(b) => AnyValue::Bool(*b),
            AttributeValue::Int(i) => AnyValue::Int(i.to_string()),
            AttributeValue::Double(d) => AnyValue::Double(*d),
        }
    }
}

/// Builds the export request for one batch.
pub fn encode_request(resource: &Resource, batch: &[Record]) -> ExportLogsServiceRequest {
    let mut scopes: Vec<ScopeLogs> = Vec::new();

    for record in batch {
        let wire = encode_record(record);
        match scopes.iter_mut().find(|s| s.scope.name == record.channel) {
            Some(scope) => scope.log_records.push(wire),
            None => scopes.push(ScopeLogs {
                scope: InstrumentationScope {
                    name: record.channel.clone(),
                },
                log_records: vec![wire],
            }),
        }
    }

    ExportLogsServiceRequest {
        resource_logs: vec![ResourceLogs {
            resource: ResourceValue {
                attributes: encode_attributes(resource.attributes()),
            },
            scope_logs: scopes,
        }],
    }
}

fn encode_record(record: &Record) -> LogRecord {
    let (trace_id, span_id) = match &record.trace_context {
        Some(ctx) => (ctx.trace_id.to_hex(), ctx.span_id.to_hex()),
        None => (String::new(), String::new()),
    };

    LogRecord {
        time_unix_nano: unix_nanos(record.timestamp).to_string(),
        severity_number: record.severity.number(),
        severity_text: record.severity.text(),
        body: AnyValue::Str(record.body.clone()),
        attributes: encode_attributes(&record.attributes),
        trace_id,
        span_id,
    }
}

fn encode_attributes(attrs: &[(String, AttributeValue)]) -> Vec<KeyValue> {
    attrs
        .iter()
        .map(|(key, value)| KeyValue {
            key: key.clone(),
            value: AnyValue::from(value),
        })
        .collect()
}

fn unix_nanos(timestamp: SystemTime) -> u128 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::context::{SpanContext, SpanId, TraceId};
    use crate::record::Severity;
    use std::time::Duration;

    fn record(channel: &str, body: &str) -> Record {
        Record {
            timestamp: UNIX_EPOCH + Duration::from_secs(1),
            channel: channel.to_string(),
            severity: Severity::Info,
            body: body.to_string(),
            attributes: Vec::new(),
            trace_context: None,
        }
    }

    fn resource() -> Resource {
        Resource::from_config(&ResourceConfig {
            service_name: Some("shoppingcart".to_string()),
            instance_id: Some("instance-12".to_string()),
            attributes: Default::default(),
        })
    }

    #[test]
    fn groups_records_by_channel_in_first_seen_order() {
        let batch = vec![
            record("myapp.area1", "a"),
            record("myapp.area2", "b"),
            record("myapp.area1", "c"),
        ];

        let request = encode_request(&resource(), &batch);
        let scopes = &request.resource_logs[0].scope_logs;

        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].scope.name, "myapp.area1");
        assert_eq!(scopes[0].log_records.len(), 2);
        assert_eq!(scopes[1].scope.name, "myapp.area2");
        assert_eq!(scopes[1].log_records.len(), 1);
    }

    #[test]
    fn serializes_camel_case_wire_fields() {
        let request = encode_request(&resource(), &[record("ch", "hello")]);
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"resourceLogs\""));
        assert!(json.contains("\"scopeLogs\""));
        assert!(json.contains("\"logRecords\""));
        assert!(json.contains("\"timeUnixNano\":\"1000000000\""));
        assert!(json.contains("\"severityNumber\":9"));
        assert!(json.contains("\"severityText\":\"INFO\""));
        assert!(json.contains("\"stringValue\":\"hello\""));
        assert!(json.contains("\"service.name\""));
    }

    #[test]
    fn int_attributes_serialize_as_strings() {
        let mut rec = record("ch", "x");
        rec.attributes
            .push(("count".to_string(), AttributeValue::Int(42)));

        let request = encode_request(&resource(), &[rec]);
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"intValue\":\"42\""));
    }

    #[test]
    fn correlated_record_carries_hex_ids() {
        let mut rec = record("ch", "x");
        rec.trace_context = Some(SpanContext {
            trace_id: TraceId([0xab; 16]),
            span_id: SpanId([0xcd; 8]),
            parent_span_id: None,
        });

        let request = encode_request(&resource(), &[rec]);
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains(&format!("\"traceId\":\"{}\"", "ab".repeat(16))));
        assert!(json.contains(&format!("\"spanId\":\"{}\"", "cd".repeat(8))));
    }

    #[test]
    fn uncorrelated_record_omits_ids() {
        let request = encode_request(&resource(), &[record("ch", "x")]);
        let json = serde_json::to_string(&request).unwrap();

        assert!(!json.contains("traceId"));
        assert!(!json.contains("spanId"));
    }
}
