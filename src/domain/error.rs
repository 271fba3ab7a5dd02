//! Error taxonomy for pricing, trading and market lifecycle.
//!
//! Every failure here rejects a single request. None of them is fatal to
//! the engine; a [`ConfigurationError`] is fatal only to the market whose
//! parameters are wrong, until an operator corrects them.

use thiserror::Error;

use super::market::{MarketId, MarketStatus};
use super::quote::QuoteState;

/// Invalid curve parameters. Never silently coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("liquidity parameter b must be positive, got {0}")]
    NonPositiveLiquidity(f64),

    #[error("{field} must be non-negative, got {value}")]
    NegativeQuantity { field: &'static str, value: f64 },

    #[error("{field} is not a finite number: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} cannot be represented with fixed precision")]
    Unrepresentable { field: &'static str },
}

/// Failures of the pure trade math.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("trade amount must be a positive number of minor units")]
    NonPositiveAmount,

    #[error("infeasible trade: {reason}")]
    InfeasibleTrade { reason: &'static str },
}

/// Market registry and lifecycle failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    #[error("market {0} not found")]
    NotFound(MarketId),

    #[error("market {0} already exists")]
    AlreadyExists(MarketId),

    #[error("market {market_id} cannot move from {from} to {to}")]
    InvalidTransition {
        market_id: MarketId,
        from: MarketStatus,
        to: MarketStatus,
    },

    #[error("market {market_id} is misconfigured: {source}")]
    Configuration {
        market_id: MarketId,
        #[source]
        source: ConfigurationError,
    },
}

/// Why a quote or commit was refused. The market is never partially mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeRejection {
    #[error("market {0} not found")]
    MarketNotFound(MarketId),

    #[error("market {market_id} is {status}, not open for trading")]
    MarketClosed {
        market_id: MarketId,
        status: MarketStatus,
    },

    #[error("insufficient funds: need {required} minor units, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("commit on market {market_id} timed out after {timeout_ms} ms")]
    Timeout { market_id: MarketId, timeout_ms: u64 },

    #[error("wallet ledger failure: {0}")]
    Ledger(String),

    #[error("quote already {0}")]
    QuoteNotPending(QuoteState),
}

impl TradeRejection {
    /// Short label for metrics and logs.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MarketNotFound(_) => "market_not_found",
            Self::MarketClosed { .. } => "market_closed",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Pricing(PricingError::Configuration(_)) => "configuration",
            Self::Pricing(_) => "infeasible",
            Self::Timeout { .. } => "timeout",
            Self::Ledger(_) => "ledger",
            Self::QuoteNotPending(_) => "quote_not_pending",
        }
    }
}

/// Illegal quote state transition (anything other than `QUOTED -> *`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quote cannot move from {from} to {to}")]
pub struct QuoteStateError {
    pub from: QuoteState,
    pub to: QuoteState,
}

/// A client mirror's estimate diverged from the authoritative one.
///
/// Monitoring only: the authoritative result always wins.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "precision drift on market {market_id}: {field} mirror={mirror} authoritative={authoritative} (epsilon {epsilon})"
)]
pub struct PrecisionDriftError {
    pub market_id: MarketId,
    pub field: &'static str,
    pub mirror: String,
    pub authoritative: String,
    pub epsilon: f64,
}
