//! Per-table snapshot fan-out.
//!
//! Each subscriber gets its own bounded queue; delivery order per subscriber
//! follows the table's mutation order because the actor enqueues inside its
//! serialized command loop. A subscriber that falls too far behind loses the
//! oldest update it has not read yet (it will catch up on the next one); a
//! disconnected subscriber is dropped on the spot.

use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::game::entities::PlayerId;

use super::messages::Broadcast;

/// Outbound queue depth per subscriber.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 64;

#[derive(Default)]
pub struct Broadcaster {
    subscribers: HashMap<PlayerId, mpsc::Sender<Broadcast>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, player_id: PlayerId, sender: mpsc::Sender<Broadcast>) {
        debug!("subscriber {player_id} attached");
        self.subscribers.insert(player_id, sender);
    }

    pub fn unsubscribe(&mut self, player_id: PlayerId) {
        if self.subscribers.remove(&player_id).is_some() {
            debug!("subscriber {player_id} detached");
        }
    }

    pub fn subscriber_ids(&self) -> Vec<PlayerId> {
        self.subscribers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver one message to one subscriber. Returns false if the
    /// subscriber is gone and was removed.
    pub fn send_to(&mut self, player_id: PlayerId, message: Broadcast) -> bool {
        let Some(sender) = self.subscribers.get(&player_id) else {
            return false;
        };
        match sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("subscriber {player_id} queue full, dropping update");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.subscribers.remove(&player_id);
                debug!("subscriber {player_id} disconnected, removed");
                false
            }
        }
    }

    /// Deliver the same message to every subscriber, dropping the ones that
    /// have disconnected.
    pub fn send_all(&mut self, message: &Broadcast) {
        self.subscribers.retain(|player_id, sender| {
            match sender.try_send(message.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("subscriber {player_id} queue full, dropping update");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("subscriber {player_id} disconnected, removed");
                    false
                }
            }
        });
    }
}
