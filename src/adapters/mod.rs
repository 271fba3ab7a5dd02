//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` and the
//! engine's observability plumbing.
//!
//! Adapter categories:
//! - `broadcast`: In-process `MARKET_UPDATE` fan-out over tokio broadcast
//! - `ledger`: In-memory wallet ledger
//! - `metrics`: Prometheus metrics registry

pub mod broadcast;
pub mod ledger;
pub mod metrics;

pub use broadcast::BroadcastPublisher;
pub use ledger::InMemoryLedger;
pub use metrics::EngineMetrics;
