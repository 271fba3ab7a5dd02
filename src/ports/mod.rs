//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the engine requires from the outside
//! world. Adapters implement these traits.
//!
//! Port categories:
//! - `WalletLedger`: Trader balance debits on commit
//! - `UpdatePublisher`: Fire-and-forget `MARKET_UPDATE` fan-out

pub mod update_publisher;
pub mod wallet_ledger;

pub use update_publisher::UpdatePublisher;
pub use wallet_ledger::{DebitReceipt, LedgerError, WalletLedger};
