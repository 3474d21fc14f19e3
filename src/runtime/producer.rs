//! Producer worker: pushes a fixed run of labeled items.

use std::sync::Arc;

use crate::queue::BoundedQueue;
use crate::trace::trace;

/// Pushes the values `0..items` into the shared queue, in order.
///
/// Each push blocks while the queue is full; there is no retry or backoff
/// beyond the queue's own wait. The task retires after its last push.
pub struct ProducerTask {
    items: u64,
    queue: Arc<BoundedQueue<u64>>,
}

impl ProducerTask {
    /// Creates a producer that will push `items` values.
    #[must_use]
    pub fn new(items: u64, queue: Arc<BoundedQueue<u64>>) -> Self {
        Self { items, queue }
    }

    /// Runs the production loop to completion and returns the count pushed.
    pub fn run(self) -> u64 {
        for value in 0..self.items {
            self.queue.push(value);
            trace!(value, "placed item");
        }
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produces_in_label_order() {
        let queue = Arc::new(BoundedQueue::new(8).unwrap());
        let produced = ProducerTask::new(5, Arc::clone(&queue)).run();

        assert_eq!(produced, 5);
        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_items_pushes_nothing() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());
        assert_eq!(ProducerTask::new(0, Arc::clone(&queue)).run(), 0);
        assert!(queue.is_empty());
    }
}
