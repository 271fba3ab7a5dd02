//! Quote/commit state machine.
//!
//! A quote is advisory: it was computed against a snapshot that may be
//! stale by the time it is committed, so it never authorizes a mutation
//! on its own. The only legal transitions are QUOTED -> COMMITTED and
//! QUOTED -> REJECTED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::QuoteStateError;
use super::market::{AccountId, MarketState, TradeEstimate, TradeRequest};

/// Lifecycle of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteState {
    Quoted,
    Committed,
    Rejected,
}

impl std::fmt::Display for QuoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quoted => write!(f, "QUOTED"),
            Self::Committed => write!(f, "COMMITTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An advisory estimate tied to the market version it was computed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub request: TradeRequest,
    pub estimate: TradeEstimate,
    /// Market version the estimate was computed against.
    pub snapshot_version: u64,
    pub quoted_at: DateTime<Utc>,
    state: QuoteState,
}

impl Quote {
    pub fn new(request: TradeRequest, estimate: TradeEstimate, snapshot_version: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            estimate,
            snapshot_version,
            quoted_at: Utc::now(),
            state: QuoteState::Quoted,
        }
    }

    pub const fn state(&self) -> QuoteState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == QuoteState::Quoted
    }

    /// QUOTED -> COMMITTED.
    pub fn mark_committed(&mut self) -> Result<(), QuoteStateError> {
        self.transition(QuoteState::Committed)
    }

    /// QUOTED -> REJECTED.
    pub fn mark_rejected(&mut self) -> Result<(), QuoteStateError> {
        self.transition(QuoteState::Rejected)
    }

    fn transition(&mut self, to: QuoteState) -> Result<(), QuoteStateError> {
        if self.state != QuoteState::Quoted || to == QuoteState::Quoted {
            return Err(QuoteStateError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// A committed trade: the estimate recomputed against live state and
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub trade_id: Uuid,
    /// Quote this fill committed, if it came through a quote.
    pub quote_id: Option<Uuid>,
    pub account: AccountId,
    pub request: TradeRequest,
    /// Authoritative estimate, computed on the live state under lock.
    pub estimate: TradeEstimate,
    /// Market state right after the mutation.
    pub state_after: MarketState,
    /// Market version after the mutation.
    pub version: u64,
    /// Whether the market moved between quote and commit.
    pub requoted: bool,
    pub executed_at: DateTime<Utc>,
}
