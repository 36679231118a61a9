//! Debounce and throttle tables.
//!
//! Both are plain per-key tables driven by an injected clock; nothing here
//! spawns timers. The owner calls [`Debouncer::due`] from its poll loop and
//! can sleep until [`Debouncer::next_deadline`]. Dropping or clearing a table
//! cancels everything it holds.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::consts::{DEBOUNCE_QUIET, POINTER_INTERVAL};

// =============================================================================
// DEBOUNCER
// =============================================================================

#[derive(Debug)]
struct Pending<V> {
    value: V,
    deadline: Instant,
}

/// Coalesces bursts per key: only the latest value survives, and it fires
/// once the key has been quiet for the configured period.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    quiet: Duration,
    pending: HashMap<K, Pending<V>>,
}

impl<K: Eq + Hash + Clone, V> Default for Debouncer<K, V> {
    fn default() -> Self {
        Self::new(DEBOUNCE_QUIET)
    }
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: HashMap::new() }
    }

    /// Replace the pending value for `key` and push its deadline out.
    pub fn schedule(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(key, Pending { value, deadline: now + self.quiet });
    }

    /// Drain entries whose deadline has passed, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<(K, V)> {
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();

        let mut fired: Vec<(Instant, K, V)> = ready
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (p.deadline, k, p.value)))
            .collect();
        fired.sort_by_key(|(deadline, _, _)| *deadline);
        fired.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|p| p.value)
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// =============================================================================
// THROTTLE
// =============================================================================

/// Leading-edge throttle: the first call in each interval is admitted,
/// the rest are discarded.
#[derive(Debug)]
pub struct Throttle<K> {
    interval: Duration,
    last: HashMap<K, Instant>,
}

impl<K: Eq + Hash> Default for Throttle<K> {
    fn default() -> Self {
        Self::new(POINTER_INTERVAL)
    }
}

impl<K: Eq + Hash> Throttle<K> {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: HashMap::new() }
    }

    /// Whether an emission for `key` is allowed at `now`; records it if so.
    pub fn admit(&mut self, key: K, now: Instant) -> bool {
        let throttled = self
            .last
            .get(&key)
            .is_some_and(|prev| now.saturating_duration_since(*prev) < self.interval);
        if throttled {
            return false;
        }
        self.last.insert(key, now);
        true
    }

    pub fn forget(&mut self, key: &K) {
        self.last.remove(key);
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
