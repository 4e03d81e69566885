//! In-memory batching with a background flush worker.
//!
//! The [`BatchProcessor`] buffers records and hands them to the exporter in
//! bounded batches, either when the buffered count reaches the batch size
//! or when the scheduled delay elapses, whichever comes first. Producers
//! enqueue without blocking (subject to the configured overflow policy);
//! a single worker thread drains the buffer, so records leave in enqueue
//! order.
//!
//! Lifecycle: `Running → Draining → Stopped`. Draining is entered by
//! [`shutdown`](BatchProcessor::shutdown), rejects new records, flushes
//! the remaining buffer once, and ends in the terminal Stopped state.

use crate::config::{BatchConfig, OverflowPolicy};
use crate::error::PipelineError;
use crate::export::Exporter;
use crate::record::Record;
use crate::resource::Resource;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Lifecycle state of the batch processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Accepting records and flushing in the background.
    Running,
    /// Shutdown requested; new records are rejected while the remaining
    /// buffer is flushed.
    Draining,
    /// Terminal. The worker has exited.
    Stopped,
}

struct Inner {
    queue: VecDeque<Record>,
    state: ProcessorState,
    flush_requested: bool,
    exporting: bool,
    dropped: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Wakes the worker for threshold/forced/shutdown flushes.
    work: Condvar,
    /// Wakes producers blocked on a full buffer.
    space: Condvar,
    /// Signals flush completion to `force_flush` waiters.
    idle: Condvar,
}

/// Buffers records and flushes them to an exporter in the background.
pub struct BatchProcessor {
    shared: Arc<Shared>,
    config: BatchConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BatchProcessor {
    /// Starts the processor and its flush worker.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Worker`] if the worker thread cannot be
    /// spawned.
    pub fn start(
        config: BatchConfig,
        resource: Arc<Resource>,
        exporter: Box<dyn Exporter>,
    ) -> Result<Self, PipelineError> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(config.max_queue_size.min(1024)),
                state: ProcessorState::Running,
                flush_requested: false,
                exporting: false,
                dropped: 0,
            }),
            work: Condvar::new(),
            space: Condvar::new(),
            idle: Condvar::new(),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            let config = config.clone();
            std::thread::Builder::new()
                .name("otlp-emitter-flush".to_string())
                .spawn(move || flush_loop(&shared, &config, &resource, exporter.as_ref()))
                .map_err(PipelineError::Worker)?
        };

        Ok(Self {
            shared,
            config,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Appends a record to the buffer.
    ///
    /// Never blocks beyond the configured overflow bound and never fails at
    /// the call site: records that cannot be accepted (full buffer, or the
    /// processor is draining or stopped) are counted and reported via
    /// `tracing` instead.
    pub fn enqueue(&self, record: Record) {
        let mut inner = self.shared.inner.lock();

        if inner.state != ProcessorState::Running {
            inner.dropped += 1;
            tracing::debug!(
                target: "emitter_lifecycle",
                "record rejected: processor is shut down"
            );
            return;
        }

        if inner.queue.len() >= self.config.max_queue_size {
            match self.config.overflow_policy {
                OverflowPolicy::DropNewest => {
                    inner.dropped += 1;
                    return;
                }
                OverflowPolicy::DropOldest => {
                    inner.queue.pop_front();
                    inner.dropped += 1;
                }
                OverflowPolicy::Block => {
                    let deadline = Instant::now() + self.config.block_timeout;
                    while inner.queue.len() >= self.config.max_queue_size
                        && inner.state == ProcessorState::Running
                    {
                        if self
                            .shared
                            .space
                            .wait_until(&mut inner, deadline)
                            .timed_out()
                        {
                            break;
                        }
                    }
                    if inner.queue.len() >= self.config.max_queue_size
                        || inner.state != ProcessorState::Running
                    {
                        inner.dropped += 1;
                        return;
                    }
                }
            }
        }

        inner.queue.push_back(record);
        if inner.queue.len() >= self.config.max_export_batch_size {
            self.shared.work.notify_one();
        }
    }

    /// Drains the current buffer through the exporter.
    ///
    /// Blocks until the buffer is empty and no export is in flight, bounded
    /// by `export_timeout`. A no-op once the processor is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FlushTimeout`] if the drain does not
    /// complete in time.
    pub fn force_flush(&self) -> Result<(), PipelineError> {
        let mut inner = self.shared.inner.lock();
        if inner.state == ProcessorState::Stopped {
            return Ok(());
        }

        inner.flush_requested = true;
        self.shared.work.notify_one();

        let deadline = Instant::now() + self.config.export_timeout;
        while !(inner.queue.is_empty() && !inner.exporting)
            && inner.state != ProcessorState::Stopped
        {
            if self.shared.idle.wait_until(&mut inner, deadline).timed_out() {
                return Err(PipelineError::FlushTimeout);
            }
        }
        Ok(())
    }

    /// Shuts the processor down: rejects new records, performs one final
    /// flush, and joins the worker. Idempotent; blocks until the drain
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerPanicked`] if the flush worker
    /// panicked.
    pub fn shutdown(&self) -> Result<(), PipelineError> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state == ProcessorState::Running {
                inner.state = ProcessorState::Draining;
            }
            self.shared.work.notify_all();
            self.shared.space.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| PipelineError::WorkerPanicked)?;
        }
        Ok(())
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProcessorState {
        self.shared.inner.lock().state
    }

    /// Number of records dropped or rejected since the last flush cycle
    /// reported them. The worker logs and resets this count as it flushes.
    #[must_use]
    pub fn dropped_records(&self) -> u64 {
        self.shared.inner.lock().dropped
    }
}

impl Drop for BatchProcessor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(
                target: "emitter_lifecycle",
                error = %e,
                "failed to shut down batch processor"
            );
        }
    }
}

fn flush_loop(
    shared: &Shared,
    config: &BatchConfig,
    resource: &Resource,
    exporter: &dyn Exporter,
) {
    loop {
        let batch: Vec<Record>;
        {
            let mut inner = shared.inner.lock();
            loop {
                let due = inner.flush_requested
                    || inner.queue.len() >= config.max_export_batch_size
                    || inner.state != ProcessorState::Running;
                if due {
                    break;
                }
                // Interval flush: a timeout here drains whatever is buffered.
                if shared
                    .work
                    .wait_for(&mut inner, config.scheduled_delay)
                    .timed_out()
                {
                    break;
                }
            }

            if inner.state != ProcessorState::Running && inner.queue.is_empty() {
                inner.state = ProcessorState::Stopped;
                report_dropped(&mut inner);
                shared.idle.notify_all();
                return;
            }

            let take = inner.queue.len().min(config.max_export_batch_size);
            batch = inner.queue.drain(..take).collect();
            if inner.queue.is_empty() {
                inner.flush_requested = false;
            }
            if !batch.is_empty() {
                inner.exporting = true;
            }
            report_dropped(&mut inner);
            shared.space.notify_all();
        }

        if !batch.is_empty() {
            export_with_retry(config, resource, exporter, &batch);
            let mut inner = shared.inner.lock();
            inner.exporting = false;
            if inner.queue.is_empty() {
                shared.idle.notify_all();
            }
        } else {
            let mut inner = shared.inner.lock();
            if inner.queue.is_empty() {
                inner.flush_requested = false;
                shared.idle.notify_all();
            }
        }
    }
}

/// Exports one batch with bounded retries; on exhaustion the batch is
/// dropped and the failure reported. The processor keeps running either
/// way.
fn export_with_retry(
    config: &BatchConfig,
    resource: &Resource,
    exporter: &dyn Exporter,
    batch: &[Record],
) {
    let attempts = config.max_retries.saturating_add(1);
    for attempt in 1..=attempts {
        match exporter.export(resource, batch) {
            Ok(()) => {
                tracing::trace!(
                    target: "emitter_lifecycle",
                    records = batch.len(),
                    "batch exported"
                );
                return;
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    target: "emitter_lifecycle",
                    error = %e,
                    attempt,
                    "export failed; retrying"
                );
                std::thread::sleep(config.retry_delay);
            }
            Err(e) => {
                tracing::error!(
                    target: "emitter_lifecycle",
                    error = %e,
                    records = batch.len(),
                    "export failed; dropping batch"
                );
            }
        }
    }
}

fn report_dropped(inner: &mut Inner) {
    if inner.dropped > 0 {
        tracing::warn!(
            target: "emitter_lifecycle",
            dropped = inner.dropped,
            "records dropped since last flush"
        );
        inner.dropped = 0;
    }
}
