//! weir: a blocking bounded queue for producer/consumer pipelines.
//!
//! The core is [`queue::BoundedQueue`], a fixed-capacity FIFO guarded by one
//! mutex and two condition variables. A full queue blocks producers and an
//! empty queue blocks consumers, so backpressure replaces drops and
//! unbounded growth. [`runtime::Pipeline`] wires one producer thread and a
//! configurable set of quota-bound consumer threads around a shared queue
//! and joins them all.

pub mod queue;
pub mod runtime;
pub mod trace;

#[doc(inline)]
pub use queue::{BoundedQueue, CapacityError, Timeout};

#[doc(inline)]
pub use runtime::{ConfigError, Pipeline, PipelineConfig, RunSummary};

pub use trace::init_tracing;
