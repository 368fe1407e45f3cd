use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A fixed-capacity FIFO shared between producer and consumer threads.
///
/// `push` blocks while the queue is full, `pop` blocks while it is empty.
/// After `shutdown` no new items are accepted, every blocked caller wakes up,
/// and `pop` keeps handing out the remaining items until the queue runs dry.
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        BoundedQueue {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Appends `item`, blocking until there is room.
    ///
    /// Returns the item back if the queue was shut down before or while waiting.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        while !state.closed && state.items.len() >= self.capacity {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(item);
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Appends `item` only if there is room right now; never blocks.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed || state.items.len() >= self.capacity {
            return Err(item);
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, blocking while the queue is empty and open.
    ///
    /// Returns `None` once the queue is both shut down and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        while !state.closed && state.items.is_empty() {
            self.not_empty.wait(&mut state);
        }
        let item = state.items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Closes the queue and wakes every blocked producer and consumer.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(3);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_push_fails_when_full() {
        let queue = BoundedQueue::new(2);
        assert!(queue.try_push('a').is_ok());
        assert!(queue.try_push('b').is_ok());
        assert_eq!(queue.try_push('c'), Err('c'));
        assert_eq!(queue.len(), 2);

        queue.pop();
        assert!(queue.try_push('c').is_ok());
    }

    #[test]
    fn test_push_blocks_until_capacity_frees() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(10).unwrap();

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let queue = Arc::clone(&queue);
            let pushed = Arc::clone(&pushed);
            thread::spawn(move || {
                queue.push(20).unwrap();
                pushed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!pushed.load(Ordering::SeqCst), "push must wait while the queue is full");

        assert_eq!(queue.pop(), Some(10));
        producer.join().unwrap();
        assert!(pushed.load(Ordering::SeqCst));
        assert_eq!(queue.pop(), Some(20));
    }

    #[test]
    fn test_pop_after_shutdown_on_empty_returns_none() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(4);
        queue.shutdown();
        assert_eq!(queue.pop(), None);
        assert!(queue.is_shutdown());
    }

    #[test]
    fn test_shutdown_drains_remaining_items() {
        let queue = BoundedQueue::new(4);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.shutdown();
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_push_after_shutdown_is_rejected() {
        let queue = BoundedQueue::new(4);
        queue.shutdown();
        assert_eq!(queue.push(7), Err(7));
        assert_eq!(queue.try_push(8), Err(8));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shutdown_wakes_blocked_consumer() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_shutdown_wakes_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert_eq!(producer.join().unwrap(), Err(2));
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _queue: BoundedQueue<u8> = BoundedQueue::new(0);
    }
}
