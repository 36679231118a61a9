//! Broadcast router: fan a frame out to a room's outbound channels.
//!
//! DESIGN
//! ======
//! Delivery is best-effort and at-most-once. Senders are snapshotted under
//! the registry read lock and `try_send` runs after it is released, so a slow
//! client never holds up the registry. A full or closed channel loses that
//! one frame for that one recipient.
//!
//! Ordering per sender follows from each connection handling its inbound
//! frames in one loop and each recipient draining one FIFO channel.

use frames::Frame;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use uuid::Uuid;

use super::presence::PresenceRegistry;

#[derive(Clone)]
pub struct BroadcastRouter {
    presence: PresenceRegistry,
}

impl BroadcastRouter {
    #[must_use]
    pub fn new(presence: PresenceRegistry) -> Self {
        Self { presence }
    }

    /// Deliver `frame` to everyone in `room_id` except `sender`.
    /// Returns how many recipients accepted it.
    pub async fn route(&self, room_id: &str, sender: Uuid, frame: &Frame) -> usize {
        self.deliver(room_id, Some(sender), frame).await
    }

    /// Deliver `frame` to everyone in `room_id`.
    pub async fn notify(&self, room_id: &str, frame: &Frame) -> usize {
        self.deliver(room_id, None, frame).await
    }

    async fn deliver(&self, room_id: &str, exclude: Option<Uuid>, frame: &Frame) -> usize {
        let mut delivered = 0;
        for (connection_id, tx) in self.presence.outbound(room_id).await {
            if exclude == Some(connection_id) {
                continue;
            }
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(%room_id, %connection_id, syscall = %frame.syscall, "broadcast: channel full, frame dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%room_id, %connection_id, syscall = %frame.syscall, "broadcast: channel closed, frame dropped");
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
