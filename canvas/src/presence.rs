//! Collaborator roster as seen by one client.
//!
//! Seeded from `active-users`, then kept current by `user-joined`,
//! `user-left` and `user-mouse-move`. The local connection never appears in
//! its own roster, even if the server echoes it back.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::BTreeMap;

use frames::{Participant, Point};
use rand::Rng;

#[derive(Debug, Default)]
pub struct Roster {
    own_connection: Option<String>,
    peers: BTreeMap<String, Participant>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the local connection id and drop it from the peers if present.
    pub fn set_own_connection(&mut self, connection_id: &str) {
        self.peers.remove(connection_id);
        self.own_connection = Some(connection_id.to_owned());
    }

    /// Replace the whole roster (`active-users`).
    pub fn replace(&mut self, users: Vec<Participant>) {
        self.peers.clear();
        for user in users {
            self.upsert(user);
        }
    }

    /// Add or refresh one participant. Returns false for our own connection.
    pub fn upsert(&mut self, participant: Participant) -> bool {
        if self.is_own(&participant.connection_id) {
            return false;
        }
        self.peers.insert(participant.connection_id.clone(), participant);
        true
    }

    pub fn remove(&mut self, connection_id: &str) -> Option<Participant> {
        self.peers.remove(connection_id)
    }

    /// Update a peer's cursor. Unknown peers are ignored.
    pub fn move_pointer(&mut self, connection_id: &str, position: Point) -> bool {
        match self.peers.get_mut(connection_id) {
            Some(peer) => {
                peer.pointer = position;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, connection_id: &str) -> Option<&Participant> {
        self.peers.get(connection_id)
    }

    /// Peers ordered by connection id.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.peers.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    fn is_own(&self, connection_id: &str) -> bool {
        self.own_connection.as_deref() == Some(connection_id)
    }
}

/// Random `#rrggbb` cursor color for a user who has not picked one.
#[must_use]
pub fn random_user_color() -> String {
    let [r, g, b]: [u8; 3] = rand::rng().random();
    format!("#{r:02x}{g:02x}{b:02x}")
}
