//! Minimal client-side telemetry emission pipeline.
//!
//! Wires record producers, span-context tracking, in-memory batching, and
//! OTLP/HTTP JSON export into an explicitly constructed pipeline with
//! automatic lifecycle management. There is no global handler: producers
//! hold [`Logger`] handles obtained from a [`Pipeline`] they were given.
//!
//! # Example
//!
//! ```no_run
//! use otlp_emitter::{ContextTracker, PipelineBuilder, PipelineError};
//!
//! fn main() -> Result<(), PipelineError> {
//!     let guard = PipelineBuilder::new()
//!         .service_name("shoppingcart")
//!         .instance_id("instance-12")
//!         .endpoint("http://localhost:4318")
//!         .build()?;
//!
//!     let logger = guard.logger("myapp.area1");
//!     logger.info("How quickly daft jumping zebras vex.");
//!
//!     {
//!         let _span = ContextTracker::enter("checkout");
//!         // Records emitted here carry the span's trace/span ids.
//!         logger.error("Hyderabad, we have a major problem.");
//!     }
//!
//!     // Guard flushes and shuts the pipeline down on drop.
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod context;
mod error;
mod export;
mod guard;
mod logger;
pub mod otlp;
mod processor;
mod record;
mod resource;

pub use builder::PipelineBuilder;
pub use config::{
    BatchConfig, EndpointConfig, OverflowPolicy, PipelineConfig, ResourceConfig, DEFAULT_ENDPOINT,
    LOGS_PATH,
};
pub use context::{ActiveSpan, ContextTracker, SpanContext, SpanId, TraceId};
pub use error::{ExportError, PipelineError};
pub use export::{Exporter, OtlpHttpExporter};
pub use guard::PipelineGuard;
pub use logger::{Logger, Pipeline};
pub use processor::{BatchProcessor, ProcessorState};
pub use record::{AttributeValue, Record, Severity};
pub use resource::{Resource, SERVICE_INSTANCE_ID, SERVICE_NAME};

/// Re-exported for users who want to construct custom configuration providers.
pub use figment;
