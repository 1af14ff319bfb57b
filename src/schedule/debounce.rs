//! Trailing-edge debouncing of change events
//!
//! Each `schedule` call starts a new idle window and replaces the pending
//! callback. Superseded timers still wake up, see that their generation is
//! stale and exit without running anything.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

/// Default idle window before a scheduled callback runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Runs only the last callback of a burst, once the burst is over
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `callback` after the idle window, replacing any pending one
    pub fn schedule<F, Fut>(&self, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == ticket {
                callback().await;
            }
        });
    }

    /// Drop the pending callback, if any
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// One debouncer per key, so bursts on different keys do not cancel each other
#[derive(Debug)]
pub struct KeyedDebouncer<K: Eq + Hash> {
    delay_ms: AtomicU64,
    debouncers: DashMap<K, Debouncer>,
}

impl<K: Eq + Hash + Clone> KeyedDebouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            debouncers: DashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    /// Change the idle window for callbacks scheduled from now on
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
        for mut entry in self.debouncers.iter_mut() {
            let previous = std::mem::replace(entry.value_mut(), Debouncer::new(delay));
            previous.cancel();
        }
    }

    pub fn schedule<F, Fut>(&self, key: K, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay();
        self.debouncers
            .entry(key)
            .or_insert_with(|| Debouncer::new(delay))
            .schedule(callback);
    }

    /// Cancel and forget the debouncer for `key`
    pub fn remove(&self, key: &K) {
        if let Some((_, debouncer)) = self.debouncers.remove(key) {
            debouncer.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.debouncers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debouncers.is_empty()
    }
}
