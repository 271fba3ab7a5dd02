//! `MARKET_UPDATE` events and their idempotent consumer-side merge.
//!
//! Updates travel over a fire-and-forget transport that may duplicate or
//! reorder them. Each carries the market's monotonic version, so a
//! consumer keeps the newest one per market and drops everything else.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;
use super::market::{MarketId, MarketState, MarketStatus};
use super::precision::PricingPolicy;

/// Broadcast after every committed trade or lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "MARKET_UPDATE", rename_all = "camelCase")]
pub struct MarketUpdate {
    pub market_id: MarketId,
    /// YES probability in percent.
    pub prob_yes: Decimal,
    /// NO probability in percent.
    pub prob_no: Decimal,
    pub q_yes: Decimal,
    pub q_no: Decimal,
    pub liquidity_b: Decimal,
    pub status: MarketStatus,
    /// Per-market counter, incremented on every mutation.
    pub version: u64,
    pub published_at: DateTime<Utc>,
}

impl MarketUpdate {
    /// Builds an update from the state a mutation just produced.
    pub fn from_state(
        market_id: &str,
        state: &MarketState,
        status: MarketStatus,
        version: u64,
        policy: &PricingPolicy,
    ) -> Result<Self, ConfigurationError> {
        let (prob_yes, _) = state.probabilities()?;
        let (prob_yes, prob_no) = policy.split_percent(prob_yes)?;
        Ok(Self {
            market_id: market_id.to_string(),
            prob_yes,
            prob_no,
            q_yes: state.q_yes,
            q_no: state.q_no,
            liquidity_b: state.liquidity_b,
            status,
            version,
            published_at: Utc::now(),
        })
    }

    /// Wire form: a JSON object tagged `"type": "MARKET_UPDATE"`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Whether this update should replace `current`.
    pub const fn supersedes(&self, current: &Self) -> bool {
        self.version > current.version
    }
}

/// Latest known update per market, as a viewer would hold it.
#[derive(Debug, Default)]
pub struct MarketBoard {
    markets: HashMap<MarketId, MarketUpdate>,
}

impl MarketBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `update`. Returns `false` for duplicates and stale versions.
    pub fn apply(&mut self, update: MarketUpdate) -> bool {
        match self.markets.get(&update.market_id) {
            Some(current) if !update.supersedes(current) => false,
            _ => {
                self.markets.insert(update.market_id.clone(), update);
                true
            }
        }
    }

    pub fn get(&self, market_id: &str) -> Option<&MarketUpdate> {
        self.markets.get(market_id)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
