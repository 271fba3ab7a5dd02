//! Broadcast Publisher - In-process `MARKET_UPDATE` Fan-out
//!
//! Implements the `UpdatePublisher` port over a `tokio::sync::broadcast`
//! channel. Sending never blocks; slow subscribers lag and skip old
//! updates, which the version-based merge on the consumer side absorbs.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::domain::update::MarketUpdate;
use crate::ports::update_publisher::UpdatePublisher;

/// Fan-out of market updates to any number of in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    update_tx: broadcast::Sender<MarketUpdate>,
}

impl BroadcastPublisher {
    /// Create a publisher buffering up to `capacity` updates per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (update_tx, _) = broadcast::channel(capacity.max(1));
        Self { update_tx }
    }

    /// Publisher sized by the configured `broadcast_capacity`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.broadcast_capacity)
    }

    /// Subscribe to every update published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MarketUpdate> {
        self.update_tx.subscribe()
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.update_tx.receiver_count()
    }
}

impl UpdatePublisher for BroadcastPublisher {
    fn publish(&self, update: MarketUpdate) {
        let market_id = update.market_id.clone();
        let version = update.version;
        match self.update_tx.send(update) {
            Ok(receivers) => {
                trace!(market_id = %market_id, version, receivers, "Market update published");
            }
            Err(_) => {
                debug!(market_id = %market_id, version, "No subscribers for market update");
            }
        }
    }
}
