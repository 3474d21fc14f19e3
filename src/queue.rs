//! Blocking bounded queues for inter-thread pipelines.

pub mod bounded;

pub use bounded::{BoundedQueue, CapacityError, Timeout};
