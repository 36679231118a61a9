//! Presence registry: rooms, their participants, and outbound channels.
//!
//! DESIGN
//! ======
//! One `RwLock` guards every table, so each operation sees and leaves the
//! registry consistent: a connection is in at most one room, and a room
//! exists exactly while it has a participant. Rooms are created by the first
//! join and dropped by the last leave.
//!
//! ERROR HANDLING
//! ==============
//! Unknown connection ids are no-ops. Nothing here can fail.

use std::collections::HashMap;
use std::sync::Arc;

use frames::{Frame, Participant, Point};
use tokio::sync::{RwLock, mpsc};
use tracing::info;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// Who a connection claims to be when it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub user_id: String,
    pub display_name: String,
    pub color: String,
}

/// What a join changed.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Everyone else in the room, in join order.
    pub peers: Vec<Participant>,
    /// The joining connection's own entry.
    pub participant: Participant,
    /// Room the connection was moved out of, if it switched rooms.
    pub previous_room: Option<String>,
}

struct Member {
    participant: Participant,
    outbound: mpsc::Sender<Frame>,
    seq: u64,
}

#[derive(Default)]
struct Room {
    members: HashMap<Uuid, Member>,
}

#[derive(Default)]
struct Registry {
    rooms: HashMap<String, Room>,
    connections: HashMap<Uuid, String>,
    next_seq: u64,
}

impl Registry {
    fn member_mut(&mut self, connection_id: Uuid) -> Option<(&str, &mut Member)> {
        let room_id = self.connections.get(&connection_id)?;
        let member = self.rooms.get_mut(room_id)?.members.get_mut(&connection_id)?;
        Some((room_id.as_str(), member))
    }

    /// Remove `connection_id` from its room, dropping the room if it empties.
    fn detach(&mut self, connection_id: Uuid) -> Option<String> {
        let room_id = self.connections.remove(&connection_id)?;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.members.remove(&connection_id);
            if room.members.is_empty() {
                self.rooms.remove(&room_id);
                info!(%room_id, "presence: room closed");
            }
        }
        Some(room_id)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl PresenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection_id` in `room_id` and return the other members.
    ///
    /// Joining the same room again replaces the participant info and the
    /// outbound channel in place. Joining a different room leaves the old one
    /// first; that room is reported in `previous_room`.
    pub async fn join(
        &self,
        room_id: &str,
        connection_id: Uuid,
        info: ParticipantInfo,
        outbound: mpsc::Sender<Frame>,
    ) -> JoinOutcome {
        let mut registry = self.inner.write().await;

        let switching = registry
            .connections
            .get(&connection_id)
            .is_some_and(|current| current != room_id);
        let previous_room = if switching { registry.detach(connection_id) } else { None };

        let seq = registry.next_seq;
        registry.next_seq += 1;
        registry.connections.insert(connection_id, room_id.to_owned());

        let room = registry.rooms.entry(room_id.to_owned()).or_default();
        let participant = match room.members.get_mut(&connection_id) {
            Some(member) => {
                member.participant.user_id = info.user_id;
                member.participant.display_name = info.display_name;
                member.participant.color = info.color;
                member.outbound = outbound;
                member.participant.clone()
            }
            None => {
                let participant = Participant {
                    connection_id: connection_id.to_string(),
                    user_id: info.user_id,
                    display_name: info.display_name,
                    color: info.color,
                    pointer: Point::default(),
                    active_object_id: None,
                };
                room.members
                    .insert(connection_id, Member { participant: participant.clone(), outbound, seq });
                participant
            }
        };

        let mut others: Vec<&Member> = room
            .members
            .iter()
            .filter(|(id, _)| **id != connection_id)
            .map(|(_, member)| member)
            .collect();
        others.sort_by_key(|member| member.seq);
        let peers = others.into_iter().map(|member| member.participant.clone()).collect();

        info!(%room_id, %connection_id, members = room.members.len(), "presence: joined");
        JoinOutcome { peers, participant, previous_room }
    }

    /// Record the last-known pointer position. Returns the connection's room.
    pub async fn update_pointer(&self, connection_id: Uuid, position: Point) -> Option<String> {
        let mut registry = self.inner.write().await;
        let (room_id, member) = registry.member_mut(connection_id)?;
        member.participant.pointer = position;
        Some(room_id.to_owned())
    }

    /// Record which object the connection is editing. Returns the room.
    pub async fn set_active_object(&self, connection_id: Uuid, object_id: Option<String>) -> Option<String> {
        let mut registry = self.inner.write().await;
        let (room_id, member) = registry.member_mut(connection_id)?;
        member.participant.active_object_id = object_id;
        Some(room_id.to_owned())
    }

    /// Remove the connection. Returns the room it was in.
    pub async fn leave(&self, connection_id: Uuid) -> Option<String> {
        let mut registry = self.inner.write().await;
        let room_id = registry.detach(connection_id)?;
        info!(%room_id, %connection_id, "presence: left");
        Some(room_id)
    }

    /// Everyone in `room_id`, in join order.
    pub async fn participants(&self, room_id: &str) -> Vec<Participant> {
        let registry = self.inner.read().await;
        let Some(room) = registry.rooms.get(room_id) else {
            return Vec::new();
        };
        let mut members: Vec<&Member> = room.members.values().collect();
        members.sort_by_key(|member| member.seq);
        members.into_iter().map(|member| member.participant.clone()).collect()
    }

    #[cfg(test)]
    pub async fn room_of(&self, connection_id: Uuid) -> Option<String> {
        self.inner.read().await.connections.get(&connection_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.inner.read().await.rooms.len()
    }

    pub async fn contains_room(&self, room_id: &str) -> bool {
        self.inner.read().await.rooms.contains_key(room_id)
    }

    /// Outbound channels of everyone in `room_id`, for the broadcast router.
    pub(crate) async fn outbound(&self, room_id: &str) -> Vec<(Uuid, mpsc::Sender<Frame>)> {
        let registry = self.inner.read().await;
        registry.rooms.get(room_id).map_or_else(Vec::new, |room| {
            room.members
                .iter()
                .map(|(id, member)| (*id, member.outbound.clone()))
                .collect()
        })
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
