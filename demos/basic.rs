//! Basic example demonstrating the emission pipeline.
//!
//! Mirrors a typical setup: two namespaced loggers, a per-event attribute,
//! and a record correlated with an active span.
//!
//! Run with: cargo run --example basic

use otlp_emitter::{AttributeValue, ContextTracker, PipelineBuilder, PipelineError, Severity};

fn main() -> Result<(), PipelineError> {
    // Pipeline self-diagnostics (export failures, dropped records) are
    // reported via tracing under the `emitter_lifecycle` target.
    tracing_subscriber::fmt()
        .with_env_filter("emitter_lifecycle=debug")
        .init();

    let guard = PipelineBuilder::new()
        .service_name("shoppingcart")
        .instance_id("instance-12")
        .endpoint("http://localhost:4318")
        .min_severity(Severity::Trace)
        .build()?;

    let area1 = guard.logger("myapp.area1");
    let area2 = guard.logger("myapp.area2");

    area1.debug("Quick zephyrs blow, vexing daft Jim.");
    area1.info("How quickly daft jumping zebras vex.");
    area2.warn("Jail zesty vixen who grabbed pay from quack.");
    area2.error("The five boxing wizards jump quickly.");

    // Per-event attributes.
    area1.log_with(
        Severity::Error,
        "I have custom attributes.",
        vec![("user_id".to_string(), AttributeValue::from("user-123"))],
    );

    // Trace context correlation: records emitted inside the span carry its
    // trace/span ids.
    {
        let _span = ContextTracker::enter("foo");
        area2.error("Hyderabad, we have a major problem.");
    }

    // Guard flushes and shuts the pipeline down on drop.
    Ok(())
}
