//! Pipeline runtime: one producer thread feeding N consumer threads.
//!
//! # Architecture
//!
//! [`Pipeline::spawn`] validates the configuration, creates a single
//! [`BoundedQueue`] shared by every worker, and spawns:
//! - **Producer thread**: pushes `0..items` in order, blocking on a full
//!   queue (backpressure — never drops, never grows the buffer).
//! - **N consumer threads**: each pops its fixed quota of items, blocking on
//!   an empty queue, and records what it received.
//!
//! Workers interact only through the queue; there is no other inter-thread
//! channel. [`Pipeline::join`] waits for the producer *and* every consumer,
//! then drains whatever the consumers left behind.
//!
//! # Quota accounting
//!
//! Spawn-time validation guarantees the run terminates:
//! - `consumers * quota > items` is rejected — the surplus consumers would
//!   wait on an item that never arrives.
//! - `items - consumers * quota > capacity` is rejected — the producer would
//!   wait on a pop that never comes once the consumers retire.
//! - `consumers * quota < items` (within capacity) is a legal run; the
//!   unconsumed remainder is drained at join and reported in the summary.
//!
//! # Example
//!
//! ```
//! use weir::runtime::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::spawn(PipelineConfig {
//!     capacity: 4,
//!     items: 6,
//!     consumers: 3,
//!     quota: 2,
//! })?;
//!
//! let summary = pipeline.join();
//! assert_eq!(summary.produced, 6);
//! assert_eq!(summary.consumed(), 6);
//! assert!(summary.leftover.is_empty());
//! # Ok::<(), weir::runtime::ConfigError>(())
//! ```

pub mod consumer;
pub mod producer;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::queue::{BoundedQueue, CapacityError};
use crate::trace::{debug, info, warn};

use consumer::ConsumerTask;
use producer::ProducerTask;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Fixed queue capacity.
    pub capacity: usize,
    /// Total number of items the producer pushes, labeled `0..items`.
    pub items: u64,
    /// Number of consumer threads.
    pub consumers: usize,
    /// Items each consumer pops before retiring.
    pub quota: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            items: 6,
            consumers: 3,
            quota: 2,
        }
    }
}

/// Error validating a pipeline configuration.
///
/// All variants are detected before any thread starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The queue could not be constructed.
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    /// Items were requested but no consumer exists to pop them.
    #[error("at least one consumer is required to drain {items} items")]
    NoConsumers {
        /// Number of items the producer was asked to push.
        items: u64,
    },
    /// Surplus consumers would block forever on an empty queue.
    #[error("total consumer quota {total_quota} exceeds {items} produced items")]
    QuotaExceedsItems {
        /// Sum of all consumer quotas.
        total_quota: u64,
        /// Number of items the producer was asked to push.
        items: u64,
    },
    /// The producer would block forever on a full queue after the consumers
    /// retire.
    #[error("{leftover} unconsumed items do not fit the queue capacity {capacity}")]
    LeftoverExceedsCapacity {
        /// Items produced but never popped by any consumer.
        leftover: u64,
        /// Fixed queue capacity.
        capacity: usize,
    },
}

/// Outcome of a completed pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Number of items the producer pushed.
    pub produced: u64,
    /// Items each consumer popped, indexed by consumer id, in pop order.
    pub receipts: Vec<Vec<u64>>,
    /// Items still queued after every consumer retired, in queue order.
    pub leftover: Vec<u64>,
}

impl RunSummary {
    /// Total number of items popped across all consumers.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.receipts.iter().map(|r| r.len() as u64).sum()
    }
}

/// Handle to a running pipeline.
///
/// Call [`Pipeline::join`] to wait for completion and collect the summary.
#[derive(Debug)]
pub struct Pipeline {
    queue: Arc<BoundedQueue<u64>>,
    produced: u64,
    producer_handle: JoinHandle<()>,
    consumer_handles: Vec<JoinHandle<Vec<u64>>>,
}

impl Pipeline {
    /// Validates `config`, creates the shared queue, and spawns the workers.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the capacity is zero or the quota
    /// accounting cannot terminate (see the module docs). No thread is
    /// started on the error path.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a thread.
    pub fn spawn(config: PipelineConfig) -> Result<Self, ConfigError> {
        let queue = Arc::new(BoundedQueue::new(config.capacity)?);

        if config.consumers == 0 && config.items > 0 {
            return Err(ConfigError::NoConsumers {
                items: config.items,
            });
        }
        let total_quota = config.consumers as u64 * config.quota;
        if total_quota > config.items {
            return Err(ConfigError::QuotaExceedsItems {
                total_quota,
                items: config.items,
            });
        }
        let leftover = config.items - total_quota;
        if leftover > config.capacity as u64 {
            return Err(ConfigError::LeftoverExceedsCapacity {
                leftover,
                capacity: config.capacity,
            });
        }

        info!(
            capacity = config.capacity,
            items = config.items,
            consumers = config.consumers,
            quota = config.quota,
            "pipeline starting"
        );

        let producer = ProducerTask::new(config.items, Arc::clone(&queue));
        debug!("spawning producer thread");
        let producer_handle = thread::Builder::new()
            .name("weir-producer".into())
            .spawn(move || {
                info!("producer thread started");
                producer.run();
                info!("producer thread exiting");
            })
            .expect("failed to spawn producer thread");

        let consumer_handles = (0..config.consumers)
            .map(|id| {
                let task = ConsumerTask::new(id, config.quota, Arc::clone(&queue));
                debug!(id, "spawning consumer thread");
                thread::Builder::new()
                    .name(format!("weir-consumer-{id}"))
                    .spawn(move || task.run())
                    .expect("failed to spawn consumer thread")
            })
            .collect();

        Ok(Self {
            queue,
            produced: config.items,
            producer_handle,
            consumer_handles,
        })
    }

    /// Waits for the producer and every consumer, then drains the queue.
    ///
    /// The producer is joined first: by the quota validation in
    /// [`Pipeline::spawn`] it can always finish its pushes, so this cannot
    /// hang even when the consumers have already retired.
    #[must_use]
    pub fn join(self) -> RunSummary {
        debug!("waiting for producer thread to exit");
        let _ = self.producer_handle.join();

        let receipts: Vec<Vec<u64>> = self
            .consumer_handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_default())
            .collect();

        let leftover = self.queue.drain();
        if !leftover.is_empty() {
            warn!(count = leftover.len(), "items left unconsumed at shutdown");
        }

        info!(
            produced = self.produced,
            consumed = receipts.iter().map(Vec::len).sum::<usize>(),
            leftover = leftover.len(),
            "pipeline complete"
        );

        RunSummary {
            produced: self.produced,
            receipts,
            leftover,
        }
    }
}
