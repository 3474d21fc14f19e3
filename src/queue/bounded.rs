//! Blocking bounded MPMC queue for inter-thread communication.
//!
//! A fixed-capacity FIFO queue guarded by a single mutex and two condition
//! variables (`not_full`, `not_empty`). Producers block while the queue is
//! full, consumers block while it is empty — backpressure instead of drops
//! or unbounded growth.
//!
//! # Overview
//!
//! - [`BoundedQueue::push`] / [`BoundedQueue::pop`] — blocking endpoints
//! - [`BoundedQueue::try_push`] / [`BoundedQueue::try_pop`] — non-blocking probes
//! - [`BoundedQueue::push_timeout`] / [`BoundedQueue::pop_timeout`] — bounded waits
//!
//! Any number of threads may push and pop concurrently; the queue is shared
//! via `Arc`, there is no split into producer/consumer handles.
//!
//! # Ordering
//!
//! Removal is head-first: with a single producer and a single consumer, items
//! come out in exactly the order they went in. With multiple consumers no
//! assignment order is guaranteed, only that every item is delivered exactly
//! once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use weir::queue::BoundedQueue;
//!
//! let queue = Arc::new(BoundedQueue::new(4)?);
//!
//! let rx = Arc::clone(&queue);
//! let consumer = thread::spawn(move || rx.pop());
//!
//! queue.push(42u64);
//! assert_eq!(consumer.join().unwrap(), 42);
//! # Ok::<(), weir::queue::CapacityError>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minstant::Instant;

use thiserror::Error;

/// Construction failed because the requested capacity cannot hold any item.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue capacity must be at least 1")]
pub struct CapacityError;

/// Timeout specification for the bounded-wait operations.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Fixed-capacity blocking FIFO queue.
///
/// The mutex guards the item storage; `capacity` is immutable after
/// construction and read freely. Both condition variables are associated
/// with the same mutex — waiters release it atomically while suspended and
/// re-acquire it on wake, then re-check their predicate, so spurious wakes
/// and missed signals cannot violate the capacity bounds.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `capacity` is zero — a zero-capacity
    /// queue could never complete a `push`.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError);
        }
        Ok(Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Acquires the storage lock.
    ///
    /// Poisoning is not propagated: every mutation below leaves the deque
    /// structurally consistent before the guard drops, so a panicking peer
    /// cannot expose a half-updated queue to the survivors.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` at the tail, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut items = self.lock();
        while items.len() == self.capacity {
            items = self
                .not_full
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
        debug_assert!(items.len() < self.capacity);
        items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Removes and returns the head item, blocking while the queue is empty.
    #[must_use]
    pub fn pop(&self) -> T {
        let mut items = self.lock();
        while items.is_empty() {
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let item = items
            .pop_front()
            .expect("wait loop exited with an empty queue");
        self.not_full.notify_one();
        item
    }

    /// Attempts to push without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the queue is full, allowing retry.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut items = self.lock();
        if items.len() == self.capacity {
            return Err(item);
        }
        items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Attempts to pop without blocking.
    ///
    /// Returns `None` if the queue is empty.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        let mut items = self.lock();
        let item = items.pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    /// Pushes with a bounded wait.
    ///
    /// A timed-out wait leaves the queue untouched.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the queue is still full when the timeout
    /// expires.
    pub fn push_timeout(&self, item: T, timeout: Timeout) -> Result<(), T> {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };
        let mut items = self.lock();
        while items.len() == self.capacity {
            match deadline {
                None => {
                    items = self
                        .not_full
                        .wait(items)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(dl) => {
                    let now = Instant::now();
                    if now >= dl {
                        return Err(item);
                    }
                    let (guard, _timed_out) = self
                        .not_full
                        .wait_timeout(items, dl.duration_since(now))
                        .unwrap_or_else(PoisonError::into_inner);
                    items = guard;
                }
            }
        }
        items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops with a bounded wait.
    ///
    /// Returns `None` if the queue is still empty when the timeout expires;
    /// a timed-out wait leaves the queue untouched.
    #[must_use]
    pub fn pop_timeout(&self, timeout: Timeout) -> Option<T> {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };
        let mut items = self.lock();
        while items.is_empty() {
            match deadline {
                None => {
                    items = self
                        .not_empty
                        .wait(items)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(dl) => {
                    let now = Instant::now();
                    if now >= dl {
                        return None;
                    }
                    let (guard, _timed_out) = self
                        .not_empty
                        .wait_timeout(items, dl.duration_since(now))
                        .unwrap_or_else(PoisonError::into_inner);
                    items = guard;
                }
            }
        }
        let item = items
            .pop_front()
            .expect("wait loop exited with an empty queue");
        self.not_full.notify_one();
        Some(item)
    }

    /// Returns the number of items currently stored.
    ///
    /// Valid only for the instant the lock was held; other threads may have
    /// pushed or popped by the time the caller inspects the result.
    #[must_use]
    pub fn len(&self) -> usize {
        let items = self.lock();
        debug_assert!(items.len() <= self.capacity);
        items.len()
    }

    /// Returns `true` if no items are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lock().len() == self.capacity
    }

    /// Returns the fixed capacity set at construction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drains all currently stored items without blocking.
    ///
    /// Wakes any producers waiting for space.
    pub fn drain(&self) -> Vec<T> {
        let mut items = self.lock();
        let drained: Vec<T> = items.drain(..).collect();
        self.not_full.notify_all();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(BoundedQueue::<u64>::new(0).unwrap_err(), CapacityError);
    }

    #[test]
    fn test_basic_push_pop() {
        let queue = BoundedQueue::new(8).unwrap();

        queue.push(42u64);
        assert_eq!(queue.pop(), 42);
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(16).unwrap();

        for i in 0..10u64 {
            queue.push(i);
        }

        for i in 0..10u64 {
            assert_eq!(queue.pop(), i);
        }

        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_push_full() {
        let queue = BoundedQueue::new(4).unwrap();

        for i in 0..4u64 {
            assert!(queue.try_push(i).is_ok(), "failed to push item {i}");
        }
        assert!(queue.is_full());

        assert_eq!(queue.try_push(999), Err(999));

        assert_eq!(queue.pop(), 0);
        assert!(queue.try_push(4).is_ok());
        assert_eq!(queue.try_push(1000), Err(1000));
    }

    #[test]
    fn test_len_tracks_contents() {
        let queue = BoundedQueue::new(4).unwrap();
        assert_eq!(queue.len(), 0);

        queue.push(1u64);
        queue.push(2);
        assert_eq!(queue.len(), 2);

        let _ = queue.pop();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn test_push_timeout_expires_when_full() {
        let queue = BoundedQueue::new(1).unwrap();
        queue.push(1u64);

        let timeout = Timeout::Duration(Duration::from_millis(20));
        assert_eq!(queue.push_timeout(2, timeout), Err(2));
        // The failed push must not have disturbed the stored item.
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_pop_timeout_expires_when_empty() {
        let queue = BoundedQueue::<u64>::new(4).unwrap();

        let timeout = Timeout::Duration(Duration::from_millis(20));
        assert_eq!(queue.pop_timeout(timeout), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_timeout_infinite_completes() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.push(7u64);

        let tx = Arc::clone(&queue);
        let handle = thread::spawn(move || tx.push_timeout(8, Timeout::Infinite));

        assert_eq!(queue.pop(), 7);
        assert_eq!(handle.join().unwrap(), Ok(()));
        assert_eq!(queue.pop(), 8);
    }

    #[test]
    fn test_push_blocks_until_space() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.push(0u64);

        let tx = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            // Blocks: the queue is at capacity until the main thread pops.
            tx.push(1);
        });

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.pop(), 0);

        producer.join().unwrap();
        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_pop_blocks_until_item() {
        let queue = Arc::new(BoundedQueue::<u64>::new(4).unwrap());

        let rx = Arc::clone(&queue);
        let consumer = thread::spawn(move || rx.pop());

        thread::sleep(Duration::from_millis(20));
        queue.push(5);

        assert_eq!(consumer.join().unwrap(), 5);
    }

    #[test]
    fn test_concurrent_push_pop() {
        let queue = Arc::new(BoundedQueue::new(8).unwrap());
        let count = 10_000u64;

        let tx = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            for i in 0..count {
                tx.push(i);
            }
        });

        let rx = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            let mut received = Vec::with_capacity(count as usize);
            for _ in 0..count {
                received.push(rx.pop());
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        // Single producer, single consumer: FIFO order must hold.
        for (i, &val) in received.iter().enumerate() {
            assert_eq!(val, i as u64);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_many_consumers_no_loss_no_duplication() {
        let queue = Arc::new(BoundedQueue::new(4).unwrap());
        let total = 4_000u64;
        let consumers = 4;
        let per_consumer = total as usize / consumers;

        let handles: Vec<_> = (0..consumers)
            .map(|_| {
                let rx = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut received = Vec::with_capacity(per_consumer);
                    for _ in 0..per_consumer {
                        received.push(rx.pop());
                    }
                    received
                })
            })
            .collect();

        for i in 0..total {
            queue.push(i);
        }

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        let expected: Vec<u64> = (0..total).collect();
        assert_eq!(all, expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_returns_remaining() {
        let queue = BoundedQueue::new(8).unwrap();
        for i in 0..5u64 {
            queue.push(i);
        }

        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_non_copy_type() {
        let queue = BoundedQueue::new(8).unwrap();

        queue.push("hello".to_string());
        queue.push("world".to_string());

        assert_eq!(queue.pop(), "hello".to_string());
        assert_eq!(queue.pop(), "world".to_string());
        assert_eq!(queue.try_pop(), None);
    }
}
