//! Consumer worker: pops a fixed quota of items and records them.

use std::sync::Arc;

use crate::queue::BoundedQueue;
use crate::trace::{debug, trace};

/// Pops exactly `quota` items from the shared queue.
///
/// Each pop blocks while the queue is empty. Consumers coordinate with the
/// producer and with each other only through the queue's lock; there is no
/// direct consumer-to-consumer channel.
pub struct ConsumerTask {
    id: usize,
    quota: u64,
    queue: Arc<BoundedQueue<u64>>,
}

impl ConsumerTask {
    /// Creates a consumer with a logging identity and a fixed quota.
    #[must_use]
    pub fn new(id: usize, quota: u64, queue: Arc<BoundedQueue<u64>>) -> Self {
        Self { id, quota, queue }
    }

    /// Runs the consumption loop and returns the popped items in pop order.
    #[must_use]
    pub fn run(self) -> Vec<u64> {
        debug!(id = self.id, quota = self.quota, "consumer started");
        let mut receipt = Vec::with_capacity(self.quota as usize);
        for _ in 0..self.quota {
            let value = self.queue.pop();
            trace!(id = self.id, value, "removed item");
            receipt.push(value);
        }
        debug!(id = self.id, "consumer retiring");
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_pops_exactly_quota() {
        let queue = Arc::new(BoundedQueue::new(8).unwrap());
        for i in 0..5u64 {
            queue.push(i);
        }

        let receipt = ConsumerTask::new(0, 3, Arc::clone(&queue)).run();

        assert_eq!(receipt, vec![0, 1, 2]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_blocks_until_producer_delivers() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());

        let rx = Arc::clone(&queue);
        let consumer = thread::spawn(move || ConsumerTask::new(0, 2, rx).run());

        queue.push(10u64);
        queue.push(11);

        assert_eq!(consumer.join().unwrap(), vec![10, 11]);
    }
}
