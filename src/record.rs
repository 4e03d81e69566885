//! The record data model.
//!
//! A [`Record`] is a single structured log entry: timestamp, channel name,
//! severity, message body, optional attributes, and optional trace
//! correlation. Records are immutable once created and owned by the batch
//! processor until exported or dropped.

use crate::context::SpanContext;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Severity of a record, ordered from least to most severe.
///
/// Numbers and text follow the OTLP log data model so that records map
/// directly onto the wire without translation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Finest-grained diagnostic detail.
    Trace,
    /// Debugging detail.
    Debug,
    /// Routine operational messages.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// An operation failed.
    Error,
    /// The process is about to terminate.
    Fatal,
}

impl Severity {
    /// Returns the OTLP severity number for this level.
    #[must_use]
    pub fn number(self) -> i32 {
        match self {
            Severity::Trace => 1,
            Severity::Debug => 5,
            Severity::Info => 9,
            Severity::Warn => 13,
            Severity::Error => 17,
            Severity::Fatal => 21,
        }
    }

    /// Returns the OTLP severity text for this level.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

/// A scalar attribute value.
///
/// Attributes are intentionally restricted to scalars; nested structures
/// belong in the message body or in separate records.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A UTF-8 string.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Double(f64),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Str(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Str(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}

/// A single structured log entry.
///
/// Created by [`Logger`](crate::Logger) calls and handed to the batch
/// processor. The record carries everything the exporter needs except the
/// process-wide [`Resource`](crate::Resource), which is attached at export
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// When the record was produced.
    pub timestamp: SystemTime,
    /// Logical channel (logger name) that produced the record.
    pub channel: String,
    /// Severity level.
    pub severity: Severity,
    /// Message body.
    pub body: String,
    /// Structured attributes, in insertion order.
    pub attributes: Vec<(String, AttributeValue)>,
    /// Trace correlation stamped from the active span, if any.
    pub trace_context: Option<SpanContext>,
}
