//! Span context tracking.
//!
//! Maintains the currently active span per thread so that records produced
//! inside a span are automatically stamped with trace/span identifiers.
//!
//! The tracker is an explicitly scoped stack rather than free-floating
//! ambient state: [`ContextTracker::enter`] pushes a new context and returns
//! an [`ActiveSpan`] guard whose `Drop` pops it, so the prior context is
//! restored on every exit path, including panics. Guards are not `Send`;
//! each thread owns its own stack and a scope handle never crosses threads.

use rand::Rng;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;

/// A 128-bit trace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(pub [u8; 16]);

impl TraceId {
    fn generate() -> Self {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; 16] = rng.random();
            if bytes != [0; 16] {
                return Self(bytes);
            }
        }
    }

    /// Renders the id as 32 lowercase hex characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A 64-bit span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub [u8; 8]);

impl SpanId {
    fn generate() -> Self {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; 8] = rng.random();
            if bytes != [0; 8] {
                return Self(bytes);
            }
        }
    }

    /// Renders the id as 16 lowercase hex characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Identifiers correlating a record with a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanContext {
    /// Trace this span belongs to.
    pub trace_id: TraceId,
    /// This span's id.
    pub span_id: SpanId,
    /// The enclosing span's id, if any.
    pub parent_span_id: Option<SpanId>,
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<SpanContext>> = const { RefCell::new(Vec::new()) };
}

/// Per-thread tracker for the currently active span.
///
/// # Example
///
/// ```
/// use otlp_emitter::ContextTracker;
///
/// assert!(ContextTracker::current().is_none());
/// {
///     let span = ContextTracker::enter("checkout");
///     assert_eq!(ContextTracker::current(), Some(span.context()));
/// }
/// assert!(ContextTracker::current().is_none());
/// ```
#[derive(Debug)]
pub struct ContextTracker;

impl ContextTracker {
    /// Starts a span and makes it the current context on this thread.
    ///
    /// If a span is already active, the new span inherits its trace id and
    /// records it as parent; otherwise a fresh trace id is generated.
    /// Dropping the returned guard exits the span and restores the prior
    /// context.
    #[must_use = "dropping the guard immediately exits the span"]
    pub fn enter(name: impl Into<String>) -> ActiveSpan {
        let parent = Self::current();
        let context = match parent {
            Some(parent) => SpanContext {
                trace_id: parent.trace_id,
                span_id: SpanId::generate(),
                parent_span_id: Some(parent.span_id),
            },
            None => SpanContext {
                trace_id: TraceId::generate(),
                span_id: SpanId::generate(),
                parent_span_id: None,
            },
        };

        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(context));

        ActiveSpan {
            context,
            name: name.into(),
            started: Instant::now(),
            _not_send: PhantomData,
        }
    }

    /// Returns the current span context on this thread, if any.
    #[must_use]
    pub fn current() -> Option<SpanContext> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().copied())
    }

    /// Exits a span scope.
    ///
    /// Equivalent to dropping the guard; provided for callers that prefer
    /// an explicit call over a scope boundary.
    pub fn exit(scope: ActiveSpan) {
        drop(scope);
    }
}

/// Guard for an active span scope.
///
/// Holds the span's context while alive; on drop the span is popped from
/// the thread's context stack and its completion is reported via `tracing`.
/// Not `Send`: the guard must be dropped on the thread that created it.
#[derive(Debug)]
pub struct ActiveSpan {
    context: SpanContext,
    name: String,
    started: Instant,
    _not_send: PhantomData<*const ()>,
}

impl ActiveSpan {
    /// Returns this span's context.
    #[must_use]
    pub fn context(&self) -> SpanContext {
        self.context
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        let popped = CONTEXT_STACK.with(|stack| stack.borrow_mut().pop());
        debug_assert_eq!(popped, Some(self.context), "span scopes must nest");

        tracing::debug!(
            target: "emitter_lifecycle",
            span = %self.name,
            trace_id = %self.context.trace_id,
            span_id = %self.context.span_id,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "span ended"
        );
    }
}
