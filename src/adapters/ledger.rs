//! In-memory Wallet Ledger - Balances for Embedding and Tests
//!
//! Implements the `WalletLedger` port over a mutex-guarded map. Debits
//! are recorded per trade id so repeated debits are idempotent and a
//! timed-out commit can be voided.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::market::{AccountId, MarketId};
use crate::ports::wallet_ledger::{DebitReceipt, LedgerError, WalletLedger};

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, u64>,
    debits: HashMap<Uuid, DebitReceipt>,
}

/// Process-local ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    book: Mutex<Book>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount_minor_units` to `account`, creating it if needed.
    pub async fn deposit(&self, account: &str, amount_minor_units: u64) -> u64 {
        let mut book = self.book.lock().await;
        let balance = book.balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount_minor_units);
        debug!(account, amount = amount_minor_units, balance = *balance, "Deposit");
        *balance
    }

    /// Total debited into `market_id` and not voided.
    pub async fn debited_to(&self, market_id: &str) -> u64 {
        let book = self.book.lock().await;
        book.debits
            .values()
            .filter(|r| r.market_id == market_id)
            .map(|r| r.amount_minor_units)
            .sum()
    }

    /// Number of live (non-voided) debits.
    pub async fn debit_count(&self) -> usize {
        self.book.lock().await.debits.len()
    }
}

#[async_trait]
impl WalletLedger for InMemoryLedger {
    async fn balance(&self, account: &AccountId) -> Result<u64, LedgerError> {
        let book = self.book.lock().await;
        book.balances
            .get(account)
            .copied()
            .ok_or_else(|| LedgerError::UnknownAccount(account.clone()))
    }

    async fn debit(
        &self,
        account: &AccountId,
        market_id: &MarketId,
        trade_id: Uuid,
        amount_minor_units: u64,
    ) -> Result<DebitReceipt, LedgerError> {
        let mut book = self.book.lock().await;

        if let Some(existing) = book.debits.get(&trade_id) {
            return Ok(existing.clone());
        }

        let balance = book
            .balances
            .get_mut(account)
            .ok_or_else(|| LedgerError::UnknownAccount(account.clone()))?;
        if *balance < amount_minor_units {
            return Err(LedgerError::InsufficientFunds {
                account: account.clone(),
                required: amount_minor_units,
                available: *balance,
            });
        }
        *balance -= amount_minor_units;

        let receipt = DebitReceipt {
            trade_id,
            account: account.clone(),
            market_id: market_id.clone(),
            amount_minor_units,
            balance_after: *balance,
            debited_at: Utc::now(),
        };
        book.debits.insert(trade_id, receipt.clone());
        Ok(receipt)
    }

    async fn void(&self, trade_id: Uuid) -> Result<bool, LedgerError> {
        let mut book = self.book.lock().await;
        let Some(receipt) = book.debits.remove(&trade_id) else {
            return Ok(false);
        };
        let balance = book.balances.entry(receipt.account.clone()).or_insert(0);
        *balance = balance.saturating_add(receipt.amount_minor_units);
        info!(
            trade_id = %trade_id,
            account = %receipt.account,
            amount = receipt.amount_minor_units,
            "Debit voided"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debit_reduces_balance() {
        let ledger = InMemoryLedger::new();
        ledger.deposit("alice", 1_000).await;
        let receipt = ledger
            .debit(&"alice".to_string(), &"m1".to_string(), Uuid::new_v4(), 400)
            .await
            .unwrap();
        assert_eq!(receipt.balance_after, 600);
        assert_eq!(ledger.balance(&"alice".to_string()).await.unwrap(), 600);
        assert_eq!(ledger.debited_to("m1").await, 400);
    }

    #[tokio::test]
    async fn test_debit_is_idempotent_per_trade() {
        let ledger = InMemoryLedger::new();
        ledger.deposit("alice", 1_000).await;
        let trade = Uuid::new_v4();
        let account = "alice".to_string();
        let market = "m1".to_string();
        ledger.debit(&account, &market, trade, 300).await.unwrap();
        ledger.debit(&account, &market, trade, 300).await.unwrap();
        assert_eq!(ledger.balance(&account).await.unwrap(), 700);
        assert_eq!(ledger.debit_count().await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let ledger = InMemoryLedger::new();
        ledger.deposit("bob", 50).await;
        let err = ledger
            .debit(&"bob".to_string(), &"m1".to_string(), Uuid::new_v4(), 51)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: "bob".to_string(),
                required: 51,
                available: 50,
            }
        );
        assert_eq!(ledger.balance(&"bob".to_string()).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_void_refunds_once() {
        let ledger = InMemoryLedger::new();
        ledger.deposit("carol", 500).await;
        let trade = Uuid::new_v4();
        ledger
            .debit(&"carol".to_string(), &"m1".to_string(), trade, 200)
            .await
            .unwrap();
        assert!(ledger.void(trade).await.unwrap());
        assert!(!ledger.void(trade).await.unwrap());
        assert_eq!(ledger.balance(&"carol".to_string()).await.unwrap(), 500);
        assert_eq!(ledger.debited_to("m1").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.balance(&"nobody".to_string()).await,
            Err(LedgerError::UnknownAccount(_))
        ));
    }
}
