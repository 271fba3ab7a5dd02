//! Update Publisher Port - Real-time Market Update Fan-out
//!
//! Pushes `MARKET_UPDATE` events to viewers. Publishing is synchronous
//! and must not block: the engine calls it after releasing the market
//! lock and never waits on delivery.

use crate::domain::update::MarketUpdate;

/// Trait for fire-and-forget update transports.
pub trait UpdatePublisher: Send + Sync + 'static {
  /// Hand `update` to the transport. Delivery is best-effort.
  fn publish(&self, update: MarketUpdate);
}
