//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the engine's workflows.
//!
//! Use cases:
//! - `MarketRegistry`: Per-market state behind per-market locks
//! - `TradingEngine`: Quotes, serialized commits, lifecycle, reconciliation
//! - `DriftMonitor`: Client mirror vs authoritative estimate comparison

pub mod drift_monitor;
pub mod market_registry;
pub mod trading_engine;

pub use drift_monitor::DriftMonitor;
pub use market_registry::{MarketHandle, MarketRecord, MarketRegistry, MarketSlot};
pub use trading_engine::{EngineSettings, MirroredQuote, ReconciliationReport, TradingEngine};
