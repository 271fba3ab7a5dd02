//! Domain layer - LMSR pricing math and market models.
//!
//! Pure logic only: no I/O, no locks, no async. Everything here is
//! serializable and testable in isolation (hexagonal architecture inner
//! ring).

pub mod error;
pub mod lmsr;
pub mod market;
pub mod precision;
pub mod quote;
pub mod update;

// Re-export core types for convenience
pub use error::{
    ConfigurationError, MarketError, PrecisionDriftError, PricingError, QuoteStateError,
    TradeRejection,
};
pub use market::{
    AccountId, MarketId, MarketState, MarketStatus, PriceSnapshot, Side, TradeEstimate,
    TradeRequest,
};
pub use precision::PricingPolicy;
pub use quote::{Fill, Quote, QuoteState};
pub use update::{MarketBoard, MarketUpdate};
