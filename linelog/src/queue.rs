use std::collections::VecDeque;
use std::sync::Condvar;

use crate::mutex::{wait_while, Mutex};

/// Default capacity of the async dispatch queue.
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

struct QueueState<T> {
    items: VecDeque<T>,
    shutdown: bool,
}

/// Bounded FIFO handing items from many producers to one consumer.
///
/// `push` never blocks: a full queue rejects the item and the caller decides
/// what to do with it. `pop` blocks until an item arrives or the queue is shut
/// down; after shutdown the remaining items are still drained in order before
/// `pop` reports the end of the stream.
pub struct AsyncQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    max_size: usize,
}

impl<T> AsyncQueue<T> {
    pub fn new(max_size: usize) -> AsyncQueue<T> {
        AsyncQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues `item`, or hands it back when the queue is at capacity.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.items.len() >= self.max_size {
            return Err(item);
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Enqueues `item`; returns false if the queue was full.
    pub fn push(&self, item: T) -> bool {
        self.try_push(item).is_ok()
    }

    /// Blocks until an item is available. Returns `None` once the queue has
    /// been shut down and fully drained.
    pub fn pop(&self) -> Option<T> {
        let state = self.state.lock();
        let mut state = wait_while(&self.available, state, |state| {
            state.items.is_empty() && !state.shutdown
        });
        state.items.pop_front()
    }

    /// Wakes every waiter; items already queued are still delivered.
    pub fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.available.notify_all();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn overflow_rejects_only_the_extra_item() {
        let queue = AsyncQueue::new(4);
        for i in 0..4 {
            assert!(queue.push(i));
        }
        assert_eq!(queue.try_push(4), Err(4));
        assert_eq!(queue.len(), 4);
        queue.shutdown();
        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shutdown_drains_before_ending() {
        let queue = AsyncQueue::new(16);
        for i in 0..3 {
            queue.push(i);
        }
        queue.shutdown();
        queue.shutdown();
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let queue = AsyncQueue::new(0);
        assert!(!queue.push(()));
        assert!(queue.is_empty());
    }

    #[test]
    fn blocked_consumer_wakes_on_push_and_shutdown() {
        let queue = Arc::new(AsyncQueue::new(8));
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(item) = queue.pop() {
                    seen.push(item);
                }
                seen
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(queue.push("a"));
        assert!(queue.push("b"));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), vec!["a", "b"]);
    }
}
