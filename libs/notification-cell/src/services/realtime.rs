// libs/notification-cell/src/services/realtime.rs
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

pub type ChannelSender = broadcast::Sender<String>;
pub type ChannelReceiver = broadcast::Receiver<String>;

const CHANNEL_CAPACITY: usize = 100;

/// Per-process registry of live owner channels. One broadcast sender per
/// owner; an owner with several open sessions has several subscribers on the
/// same sender. Senders whose receivers are all gone are dropped lazily when
/// a delivery attempt finds them stale.
pub struct RealtimeChannelRegistry {
    channels: Arc<RwLock<HashMap<Uuid, ChannelSender>>>,
}

impl RealtimeChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a session for `owner_id`, returning its event receiver.
    /// Reuses the owner's existing sender so all sessions see every event.
    pub async fn register(&self, owner_id: Uuid) -> ChannelReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(owner_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);

        debug!("Registered live channel for owner {}", owner_id);
        sender.subscribe()
    }

    /// Drop the owner's sender once no session is subscribed any more.
    pub async fn release(&self, owner_id: Uuid) {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(&owner_id) {
            if sender.receiver_count() == 0 {
                channels.remove(&owner_id);
                debug!("Removed idle channel for owner {}", owner_id);
            }
        }
    }

    /// Deliver `payload` to the owner's sessions. A missing channel is not an
    /// error: the owner will see the persisted notification on next poll.
    /// Returns whether at least one live session received the event.
    pub async fn send_to_owner(&self, owner_id: Uuid, payload: String) -> bool {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(&owner_id) {
                Some(sender) => sender.send(payload).is_ok(),
                None => {
                    debug!("No live channel for owner {}, skipping push", owner_id);
                    return false;
                }
            }
        };

        if !delivered {
            // All receivers disconnected without releasing; clean up now.
            warn!("Stale channel for owner {}, dropping it", owner_id);
            self.channels.write().await.remove(&owner_id);
        }

        delivered
    }

    pub async fn active_owner_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for RealtimeChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RealtimeChannelRegistry {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}
