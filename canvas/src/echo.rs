//! Echo suppression side table.
//!
//! When an inbound event mutates the scene, the scene raises the same
//! added/modified/removed events a local edit would. Those must not be sent
//! back out. Instead of stamping a hidden field on the object, the session
//! records `remote-origin: sender` here and the outbound path consults the
//! table before emitting. A tag is settled as soon as the session has
//! drained the scene events of the apply that set it; the grace window
//! only bounds tags whose events never arrive.
//!
//! Pending tags mark local edits that were just transmitted. They are
//! diagnostic only: the session logs when a remote edit lands on a pending
//! object. They never gate emission and never block remote updates.

#[cfg(test)]
#[path = "echo_test.rs"]
mod echo_test;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::consts::ECHO_GRACE;

#[derive(Debug, Clone)]
struct RemoteTag {
    sender: String,
    expires: Instant,
}

/// Per-object origin tags with expiry.
#[derive(Debug)]
pub struct EchoGuard {
    grace: Duration,
    remote: HashMap<String, RemoteTag>,
    pending: HashMap<String, Instant>,
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(ECHO_GRACE)
    }
}

impl EchoGuard {
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self { grace, remote: HashMap::new(), pending: HashMap::new() }
    }

    /// A local mutation of `id` is about to be transmitted.
    pub fn mark_pending(&mut self, id: &str, now: Instant) {
        self.pending.insert(id.to_owned(), now + self.grace);
    }

    #[must_use]
    pub fn is_pending(&self, id: &str, now: Instant) -> bool {
        self.pending.get(id).is_some_and(|expires| now < *expires)
    }

    /// `id` was just changed because of an event from `sender`. Re-tagging
    /// restarts the window.
    pub fn mark_remote(&mut self, id: &str, sender: &str, now: Instant) {
        self.remote.insert(
            id.to_owned(),
            RemoteTag { sender: sender.to_owned(), expires: now + self.grace },
        );
    }

    /// Sender whose event last touched `id`, while the tag is live.
    #[must_use]
    pub fn remote_origin(&self, id: &str, now: Instant) -> Option<&str> {
        self.remote
            .get(id)
            .filter(|tag| now < tag.expires)
            .map(|tag| tag.sender.as_str())
    }

    /// Drop expired tags. Returns the ids whose remote tag expired.
    pub fn sweep(&mut self, now: Instant) -> Vec<String> {
        self.pending.retain(|_, expires| now < *expires);

        let mut expired = Vec::new();
        self.remote.retain(|id, tag| {
            let live = now < tag.expires;
            if !live {
                expired.push(id.clone());
            }
            live
        });
        expired.sort();
        expired
    }

    /// Drop the remote tag for `id` once the events raised by applying the
    /// remote edit have been drained. Later edits of `id` are local again.
    pub fn settle(&mut self, id: &str) {
        self.remote.remove(id);
    }

    pub fn forget(&mut self, id: &str) {
        self.remote.remove(id);
        self.pending.remove(id);
    }

    pub fn clear(&mut self) {
        self.remote.clear();
        self.pending.clear();
    }

    /// Number of live-or-unswept tags of either kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remote.len() + self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote.is_empty() && self.pending.is_empty()
    }
}
