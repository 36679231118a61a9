//! Per-connection pointer throttle.
//!
//! DESIGN
//! ======
//! Leading-edge: the first pointer update after a quiet interval is relayed
//! immediately and everything inside the interval is discarded. Pointer
//! positions are superseded by the next one, so nothing is queued for a
//! trailing edge.
//!
//! LIFECYCLE
//! =========
//! A slot is created on the first admitted update and removed by `forget`
//! when the connection closes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

#[derive(Clone)]
pub struct PointerThrottle {
    inner: Arc<Mutex<HashMap<Uuid, Instant>>>,
    interval: Duration,
}

impl PointerThrottle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), interval }
    }

    /// Whether a pointer update from `connection_id` may be relayed now.
    pub fn admit(&self, connection_id: Uuid) -> bool {
        self.admit_at(connection_id, Instant::now())
    }

    pub(crate) fn admit_at(&self, connection_id: Uuid, now: Instant) -> bool {
        let mut last = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let throttled = last
            .get(&connection_id)
            .is_some_and(|prev| now.saturating_duration_since(*prev) < self.interval);
        if throttled {
            return false;
        }
        last.insert(connection_id, now);
        true
    }

    pub fn forget(&self, connection_id: Uuid) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;
