//! Wallet Ledger Port - Trader Balance Debits
//!
//! The engine does not own balances. It asks the ledger to debit a
//! trader while it holds the market lock, and only mutates the market
//! once the debit has succeeded. Debits are keyed by trade id so a
//! commit that times out can be voided without knowing whether the
//! debit landed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::market::{AccountId, MarketId};

/// Proof of an applied debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitReceipt {
  /// Trade the debit belongs to.
  pub trade_id: Uuid,
  /// Account debited.
  pub account: AccountId,
  /// Market the funds went to.
  pub market_id: MarketId,
  /// Amount debited in minor units.
  pub amount_minor_units: u64,
  /// Balance left after the debit.
  pub balance_after: u64,
  /// When the ledger applied it.
  pub debited_at: DateTime<Utc>,
}

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
  #[error("account {account} has {available} minor units, needs {required}")]
  InsufficientFunds {
    account: AccountId,
    required: u64,
    available: u64,
  },

  #[error("unknown account {0}")]
  UnknownAccount(AccountId),

  #[error("ledger unavailable: {0}")]
  Unavailable(String),
}

/// Trait for wallet ledgers the engine debits on commit.
#[async_trait]
pub trait WalletLedger: Send + Sync + 'static {
  /// Spendable balance of `account`, in minor units.
  async fn balance(&self, account: &AccountId) -> Result<u64, LedgerError>;

  /// Debit `amount_minor_units` from `account` for trade `trade_id`.
  ///
  /// Must be idempotent per `trade_id`: a repeated call returns the
  /// original receipt without debiting twice.
  async fn debit(
    &self,
    account: &AccountId,
    market_id: &MarketId,
    trade_id: Uuid,
    amount_minor_units: u64,
  ) -> Result<DebitReceipt, LedgerError>;

  /// Reverse the debit recorded for `trade_id`, if any.
  ///
  /// Returns whether a debit was reversed.
  async fn void(&self, trade_id: Uuid) -> Result<bool, LedgerError>;
}
