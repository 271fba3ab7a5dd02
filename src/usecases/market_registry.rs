//! Market Registry - Authoritative Market State
//!
//! Holds every market behind its own async mutex. The map lock is only
//! taken to look up or insert a handle, so commits on different markets
//! never contend; commits on the same market queue on its mutex.
//!
//! The mutex is for writers. Each write also lands in a `watch` channel,
//! and readers (quotes, price snapshots, reconciliation) take the last
//! committed record from there without waiting on a pending commit.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, RwLock, watch};
use tracing::info;

use crate::domain::error::{MarketError, TradeRejection};
use crate::domain::market::{MarketId, MarketState, MarketStatus};

/// Everything the engine tracks about one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRecord {
  /// Market identifier.
  pub id: MarketId,
  /// Outstanding shares and liquidity.
  pub state: MarketState,
  /// Trading lifecycle.
  pub status: MarketStatus,
  /// Bumped on every trade and status change.
  pub version: u64,
  /// Sum of committed trade debits, in minor units.
  pub total_debits_minor_units: u64,
  /// Committed trades.
  pub trade_count: u64,
  /// Debits not absorbed by the curve because issued shares are
  /// truncated, summed over all trades, in minor units.
  pub retained_dust_minor_units: Decimal,
}

impl MarketRecord {
  fn new(id: MarketId, state: MarketState) -> Self {
    Self {
      id,
      state,
      status: MarketStatus::Open,
      version: 0,
      total_debits_minor_units: 0,
      trade_count: 0,
      retained_dust_minor_units: Decimal::ZERO,
    }
  }

  /// Rejects trading unless the market is open.
  pub fn ensure_open(&self) -> Result<(), TradeRejection> {
    if self.status == MarketStatus::Open {
      Ok(())
    } else {
      Err(TradeRejection::MarketClosed {
        market_id: self.id.clone(),
        status: self.status,
      })
    }
  }
}

/// One market: the writer lock plus the last committed copy.
#[derive(Debug)]
pub struct MarketSlot {
  record: Mutex<MarketRecord>,
  committed: watch::Sender<MarketRecord>,
}

impl MarketSlot {
  fn new(record: MarketRecord) -> Self {
    let (committed, _) = watch::channel(record.clone());
    Self {
      record: Mutex::new(record),
      committed,
    }
  }

  /// Exclusive access for writers. Write through [`Self::store`].
  pub async fn lock(&self) -> MutexGuard<'_, MarketRecord> {
    self.record.lock().await
  }

  /// Replace the locked record with `next` and publish it to readers.
  pub fn store(&self, guard: &mut MutexGuard<'_, MarketRecord>, next: MarketRecord) {
    self.committed.send_replace(next.clone());
    **guard = next;
  }

  /// Last committed record. Never waits on a writer.
  pub fn committed(&self) -> MarketRecord {
    self.committed.borrow().clone()
  }

  /// Receiver that sees every later commit.
  pub fn subscribe(&self) -> watch::Receiver<MarketRecord> {
    self.committed.subscribe()
  }
}

/// Shared handle to one market.
pub type MarketHandle = Arc<MarketSlot>;

/// Id -> market lookup.
#[derive(Debug, Default)]
pub struct MarketRegistry {
  markets: RwLock<HashMap<MarketId, MarketHandle>>,
}

impl MarketRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Open a fresh market `{0, 0, liquidity_b}`.
  ///
  /// # Errors
  /// `AlreadyExists` for a duplicate id, `Configuration` when
  /// `liquidity_b` is not positive.
  pub async fn open_market(
    &self,
    market_id: impl Into<MarketId>,
    liquidity_b: Decimal,
  ) -> Result<MarketRecord, MarketError> {
    let market_id = market_id.into();
    let state = MarketState::new(liquidity_b).map_err(|source| MarketError::Configuration {
      market_id: market_id.clone(),
      source,
    })?;

    let mut markets = self.markets.write().await;
    if markets.contains_key(&market_id) {
      return Err(MarketError::AlreadyExists(market_id));
    }
    let record = MarketRecord::new(market_id.clone(), state);
    markets.insert(market_id.clone(), Arc::new(MarketSlot::new(record.clone())));

    info!(market_id = %market_id, liquidity_b = %liquidity_b, "Market opened");
    Ok(record)
  }

  /// Handle to the market's slot.
  pub async fn handle(&self, market_id: &str) -> Result<MarketHandle, MarketError> {
    self
      .markets
      .read()
      .await
      .get(market_id)
      .cloned()
      .ok_or_else(|| MarketError::NotFound(market_id.to_string()))
  }

  /// Last committed record. An in-flight commit is not waited for.
  pub async fn snapshot(&self, market_id: &str) -> Result<MarketRecord, MarketError> {
    Ok(self.handle(market_id).await?.committed())
  }

  /// All market ids, sorted.
  pub async fn market_ids(&self) -> Vec<MarketId> {
    let mut ids: Vec<MarketId> = self.markets.read().await.keys().cloned().collect();
    ids.sort();
    ids
  }

  /// Number of markets.
  pub async fn len(&self) -> usize {
    self.markets.read().await.len()
  }

  /// Whether no market has been opened.
  pub async fn is_empty(&self) -> bool {
    self.markets.read().await.is_empty()
  }
}
