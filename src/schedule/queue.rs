//! Per-document diagnostic queue
//!
//! Every request takes a generation from one queue-wide counter at enqueue
//! time. Analyses of the same document run one at a time, and a result is
//! only admitted if no newer request for that document arrived meanwhile.
//! The admission guard keeps the document's turn until it is dropped, so a
//! caller that publishes while holding it can never be overtaken by an
//! older result.

use std::future::Future;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Generation marking a cleared document
const CLEARED: u64 = 0;

#[derive(Debug, Clone)]
struct Slot {
    latest: Arc<AtomicU64>,
    turn: Arc<Mutex<()>>,
}

impl Slot {
    fn new() -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(CLEARED)),
            turn: Arc::new(Mutex::new(())),
        }
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }
}

/// A current result, holding the document's turn until dropped
#[derive(Debug)]
pub struct Admitted<T> {
    value: T,
    generation: u64,
    _turn: OwnedMutexGuard<()>,
}

impl<T> Admitted<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Deref for Admitted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Outcome of a queued analysis
#[derive(Debug)]
pub enum QueueOutcome<T> {
    /// Newest request for the document; publish while holding it
    Current(Admitted<T>),
    /// A newer request arrived, or the document was cleared
    Superseded,
}

impl<T> QueueOutcome<T> {
    pub fn is_current(&self) -> bool {
        matches!(self, QueueOutcome::Current(_))
    }
}

/// Latest-wins scheduling of analyses per document
#[derive(Debug)]
pub struct DiagnosticQueue<K: Eq + Hash> {
    next_generation: AtomicU64,
    slots: DashMap<K, Slot>,
}

impl<K: Eq + Hash> Default for DiagnosticQueue<K> {
    fn default() -> Self {
        Self {
            next_generation: AtomicU64::new(CLEARED + 1),
            slots: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash> DiagnosticQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an analysis for `key`.
    ///
    /// The generation is taken immediately, before the returned future is
    /// first polled.
    pub fn enqueue<F, T>(&self, key: K, analysis: F) -> impl Future<Output = QueueOutcome<T>> + Send
    where
        F: Future<Output = T> + Send,
        T: Send,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let slot = {
            let entry = self.slots.entry(key).or_insert_with(Slot::new);
            entry.latest.fetch_max(generation, Ordering::SeqCst);
            entry.clone()
        };

        async move {
            let turn = Arc::clone(&slot.turn).lock_owned().await;
            if !slot.is_latest(generation) {
                return QueueOutcome::Superseded;
            }

            let value = analysis.await;
            if !slot.is_latest(generation) {
                tracing::trace!("Discarding result of generation {}", generation);
                return QueueOutcome::Superseded;
            }

            QueueOutcome::Current(Admitted {
                value,
                generation,
                _turn: turn,
            })
        }
    }

    /// Stop tracking `key`; in-flight work for it resolves as superseded
    pub fn clear_queue(&self, key: &K) {
        if let Some((_, slot)) = self.slots.remove(key) {
            slot.latest.store(CLEARED, Ordering::SeqCst);
        }
    }

    /// Number of tracked documents
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_single_request_is_current() {
        let queue = DiagnosticQueue::new();
        match queue.enqueue("a.js", async { 42 }).await {
            QueueOutcome::Current(result) => assert_eq!(*result, 42),
            QueueOutcome::Superseded => panic!("expected current result"),
        }
    }

    #[tokio::test]
    async fn test_latest_wins() {
        let queue = DiagnosticQueue::new();
        let older = queue.enqueue("a.js", async { "old" });
        let newer = queue.enqueue("a.js", async { "new" });

        assert!(!older.await.is_current());
        match newer.await {
            QueueOutcome::Current(result) => assert_eq!(*result, "new"),
            QueueOutcome::Superseded => panic!("newest request must be current"),
        }
    }

    #[tokio::test]
    async fn test_generations_increase() {
        let queue = DiagnosticQueue::new();
        let first = match queue.enqueue("a.js", async {}).await {
            QueueOutcome::Current(a) => a.generation(),
            QueueOutcome::Superseded => panic!("expected current"),
        };
        let second = match queue.enqueue("b.js", async {}).await {
            QueueOutcome::Current(a) => a.generation(),
            QueueOutcome::Superseded => panic!("expected current"),
        };
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_documents_are_independent() {
        let queue = DiagnosticQueue::new();
        let a = queue.enqueue("a.js", async { 1 });
        let b = queue.enqueue("b.js", async { 2 });

        assert!(a.await.is_current());
        assert!(b.await.is_current());
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_queue_supersedes_in_flight() {
        let queue = DiagnosticQueue::new();
        let pending = queue.enqueue("a.js", async { 1 });
        queue.clear_queue(&"a.js");

        assert!(!pending.await.is_current());
        assert!(queue.is_empty());
        assert!(queue.enqueue("a.js", async { 2 }).await.is_current());
    }

    #[tokio::test]
    async fn test_admission_holds_turn() {
        let queue = Arc::new(DiagnosticQueue::new());
        let first = match queue.enqueue("a.js", async { 1 }).await {
            QueueOutcome::Current(admitted) => admitted,
            QueueOutcome::Superseded => panic!("expected current"),
        };

        let started = Arc::new(AtomicBool::new(false));
        let handle = {
            let queue = Arc::clone(&queue);
            let started = Arc::clone(&started);
            tokio::spawn(async move {
                queue
                    .enqueue("a.js", async move {
                        started.store(true, Ordering::SeqCst);
                        2
                    })
                    .await
                    .is_current()
            })
        };

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!started.load(Ordering::SeqCst));

        drop(first);
        assert!(handle.await.unwrap());
        assert!(started.load(Ordering::SeqCst));
    }
}
