//! Deduplicating work queue with re-entrant dirtying
//!
//! An item is in one of three states:
//!
//! ```text
//! absent ──add──► queued ──get──► processing ──done──► absent
//!                                     │   ▲
//!                                 add │   │ done (re-queued once)
//!                                     ▼   │
//!                              processing + dirty
//! ```
//!
//! Adding an item that is already queued is a no-op. Adding an item that is
//! being processed marks it dirty; `done` then queues it exactly once more.
//! An item is never handed to two workers at the same time.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use parking_lot::Mutex;
use tokio::sync::Notify;

struct QueueState<T> {
    /// FIFO of items ready to be handed out
    queue: VecDeque<T>,
    /// Items that need a pass (queued, or re-dirtied while processing)
    dirty: HashSet<T>,
    /// Items currently handed out
    processing: HashSet<T>,
    shutting_down: bool,
}

/// Deduplicating FIFO of items awaiting reconciliation
pub struct DirtyQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

impl<T> Default for DirtyQueue<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DirtyQueue<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                shutting_down: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Mark an item dirty. Ignored once the queue is shutting down.
    pub fn add(&self, item: T) {
        let mut state = self.state.lock();
        if state.shutting_down || state.dirty.contains(&item) {
            return;
        }
        state.dirty.insert(item.clone());
        if state.processing.contains(&item) {
            return;
        }
        state.queue.push_back(item);
        self.notify.notify_one();
    }

    /// Wait for the next item. Returns `None` once the queue shuts down;
    /// items still queued at that point are abandoned.
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if state.shutting_down {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    state.dirty.remove(&item);
                    state.processing.insert(item.clone());
                    // permits coalesce, so pass the wakeup along
                    if !state.queue.is_empty() {
                        self.notify.notify_one();
                    }
                    return Some(item);
                }
            }
            notified.await;
        }
    }

    /// Report that processing of `item` finished
    pub fn done(&self, item: &T) {
        let mut state = self.state.lock();
        state.processing.remove(item);
        if state.dirty.contains(item) {
            state.queue.push_back(item.clone());
            self.notify.notify_one();
        }
    }

    /// Number of distinct items queued or being processed
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        let processing_only = state
            .processing
            .iter()
            .filter(|item| !state.dirty.contains(*item))
            .count();
        state.dirty.len() + processing_only
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop handing out items and wake every waiting worker
    pub fn shut_down(&self) {
        self.state.lock().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.lock().shutting_down
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn deduplicates_queued_items() {
        let queue = DirtyQueue::new();
        queue.add("a");
        queue.add("a");
        queue.add("b");
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, Some("b"));
        assert_eq!(queue.len(), 2);

        queue.done(&"a");
        queue.done(&"b");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn redirty_during_processing_requeues_once() {
        let queue = DirtyQueue::new();
        queue.add("a");
        let item = queue.get().await.unwrap();

        queue.add("a");
        queue.add("a");
        assert_eq!(queue.len(), 1);

        // not handed out again while still processing
        let second = tokio::time::timeout(Duration::from_millis(20), queue.get()).await;
        assert!(second.is_err());

        queue.done(&item);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("a"));
        queue.done(&"a");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn fifo_order() {
        let queue = DirtyQueue::new();
        for i in 0..5 {
            queue.add(i);
        }
        for i in 0..5 {
            assert_eq!(queue.get().await, Some(i));
        }
    }

    #[tokio::test]
    async fn shut_down_wakes_waiters_and_rejects_adds() {
        let queue = Arc::new(DirtyQueue::<u32>::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.shut_down();
        assert_eq!(waiter.await.unwrap(), None);

        queue.add(1);
        assert!(queue.is_empty());
        assert!(queue.is_shutting_down());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_workers_drain_everything() {
        let queue = Arc::new(DirtyQueue::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut workers = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            let seen = seen.clone();
            workers.push(tokio::spawn(async move {
                while let Some(item) = queue.get().await {
                    seen.lock().push(item);
                    queue.done(&item);
                }
            }));
        }

        for i in 0..100 {
            queue.add(i);
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !queue.is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(queue.is_empty());

        queue.shut_down();
        for worker in workers {
            worker.await.unwrap();
        }

        let mut seen = seen.lock().clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }
}
