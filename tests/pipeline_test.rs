//! Integration tests verifying the pipeline wires producers, batching, and
//! export together correctly.

use httpmock::prelude::*;
use otlp_emitter::{
    ContextTracker, ExportError, Exporter, PipelineBuilder, ProcessorState, Record, Resource,
    Severity,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Exporter that records every batch it receives.
#[derive(Default)]
struct RecordingExporter {
    batches: Mutex<Vec<Vec<Record>>>,
}

impl RecordingExporter {
    fn bodies(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|r| r.body.clone())
            .collect()
    }

    fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }
}

impl Exporter for RecordingExporter {
    fn export(&self, _resource: &Resource, batch: &[Record]) -> Result<(), ExportError> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}

/// Newtype so a shared [`RecordingExporter`] can be handed to the pipeline as
/// a `Box<dyn Exporter>` (the orphan rule forbids implementing `Exporter`
/// directly for `Arc<RecordingExporter>` outside the crate).
struct SharedExporter(Arc<RecordingExporter>);

impl Exporter for SharedExporter {
    fn export(&self, resource: &Resource, batch: &[Record]) -> Result<(), ExportError> {
        self.0.export(resource, batch)
    }
}

fn recording_pipeline(batch_size: usize) -> (otlp_emitter::PipelineGuard, Arc<RecordingExporter>) {
    let sink = Arc::new(RecordingExporter::default());
    let guard = PipelineBuilder::new()
        .min_severity(Severity::Trace)
        .max_export_batch_size(batch_size)
        .scheduled_delay(Duration::from_secs(60))
        .max_retries(0)
        .retry_delay(Duration::ZERO)
        .with_exporter(Box::new(SharedExporter(Arc::clone(&sink))))
        .build()
        .expect("pipeline should build");
    (guard, sink)
}

#[test]
fn threshold_two_flushes_pair_then_remainder_on_shutdown() {
    // threshold=2; enqueue A, B, C: one flush [A, B], then shutdown
    // flushes [C].
    let (guard, sink) = recording_pipeline(2);
    let logger = guard.logger("myapp.area1");

    logger.info("A");
    logger.info("B");
    guard.flush();
    logger.info("C");
    guard.shutdown().expect("shutdown should succeed");

    let batches = sink.batches.lock();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[0][0].body, "A");
    assert_eq!(batches[0][1].body, "B");
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches[1][0].body, "C");
}

#[test]
fn shutdown_below_threshold_forces_single_export() {
    let (guard, sink) = recording_pipeline(100);
    let logger = guard.logger("myapp.area1");

    for i in 0..5 {
        logger.info(format!("record-{i}"));
    }
    guard.shutdown().expect("shutdown should succeed");

    assert_eq!(sink.batch_count(), 1);
    assert_eq!(sink.bodies().len(), 5);
}

#[test]
fn export_order_matches_enqueue_order_within_context() {
    let (guard, sink) = recording_pipeline(3);
    let logger = guard.logger("ordered");

    let expected: Vec<String> = (0..10).map(|i| format!("r{i}")).collect();
    for body in &expected {
        logger.info(body.clone());
    }
    guard.shutdown().expect("shutdown should succeed");

    assert_eq!(sink.bodies(), expected);
}

#[test]
fn records_carry_channel_severity_and_span_context() {
    let (guard, sink) = recording_pipeline(100);
    let area1 = guard.logger("myapp.area1");
    let area2 = guard.logger("myapp.area2");

    let before = ContextTracker::current();
    area1.debug("Quick zephyrs blow, vexing daft Jim.");
    let span_context = {
        let span = ContextTracker::enter("foo");
        area2.error("Hyderabad, we have a major problem.");
        span.context()
    };
    assert_eq!(ContextTracker::current(), before, "span context leaked");

    guard.shutdown().expect("shutdown should succeed");

    let batches = sink.batches.lock();
    let records: Vec<_> = batches.iter().flatten().collect();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].channel, "myapp.area1");
    assert_eq!(records[0].severity, Severity::Debug);
    assert_eq!(records[0].trace_context, None);

    assert_eq!(records[1].channel, "myapp.area2");
    assert_eq!(records[1].severity, Severity::Error);
    assert_eq!(records[1].trace_context, Some(span_context));
}

#[test]
fn severity_threshold_filters_before_enqueue() {
    let sink = Arc::new(RecordingExporter::default());
    let guard = PipelineBuilder::new()
        .min_severity(Severity::Warn)
        .scheduled_delay(Duration::from_secs(60))
        .with_exporter(Box::new(SharedExporter(Arc::clone(&sink))))
        .build()
        .expect("pipeline should build");

    let logger = guard.logger("filtered");
    logger.debug("below threshold");
    logger.info("below threshold");
    logger.warn("at threshold");
    logger.error("above threshold");
    guard.shutdown().expect("shutdown should succeed");

    assert_eq!(sink.bodies(), vec!["at threshold", "above threshold"]);
}

/// Fails every export until `failures_left` reaches zero.
struct FailingExporter {
    failures_left: Mutex<usize>,
    sink: Arc<RecordingExporter>,
}

impl Exporter for FailingExporter {
    fn export(&self, resource: &Resource, batch: &[Record]) -> Result<(), ExportError> {
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(ExportError::Rejected { status: 503 });
        }
        drop(left);
        self.sink.export(resource, batch)
    }
}

#[test]
fn transport_failure_does_not_poison_later_batches() {
    let sink = Arc::new(RecordingExporter::default());
    let guard = PipelineBuilder::new()
        .min_severity(Severity::Trace)
        .scheduled_delay(Duration::from_secs(60))
        .max_retries(0)
        .retry_delay(Duration::ZERO)
        .with_exporter(Box::new(FailingExporter {
            failures_left: Mutex::new(1),
            sink: Arc::clone(&sink),
        }))
        .build()
        .expect("pipeline should build");

    let logger = guard.logger("resilient");
    logger.info("dropped by failing export");
    guard.flush();
    assert_eq!(
        guard.pipeline().processor().state(),
        ProcessorState::Running
    );

    logger.info("delivered afterwards");
    guard.shutdown().expect("shutdown should succeed");

    assert_eq!(sink.bodies(), vec!["delivered afterwards"]);
}

#[test]
fn http_exporter_posts_otlp_json_to_collector() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/logs")
            .header("content-type", "application/json")
            .body_includes("\"resourceLogs\"")
            .body_includes("\"service.name\"")
            .body_includes("shoppingcart")
            .body_includes("The five boxing wizards jump quickly.");
        then.status(200);
    });

    let guard = PipelineBuilder::new()
        .endpoint(server.base_url())
        .service_name("shoppingcart")
        .instance_id("instance-12")
        .min_severity(Severity::Trace)
        .scheduled_delay(Duration::from_secs(60))
        .max_retries(0)
        .build()
        .expect("pipeline should build");

    let logger = guard.logger("myapp.area2");
    logger.error("The five boxing wizards jump quickly.");
    guard.shutdown().expect("shutdown should succeed");

    mock.assert();
}

#[test]
fn guard_drop_flushes_pending_records() {
    let (guard, sink) = recording_pipeline(100);
    let logger = guard.logger("drop-flush");

    logger.info("flushed on drop");
    drop(guard);

    assert_eq!(sink.bodies(), vec!["flushed on drop"]);
}
