//! Drift Monitor - Client Mirror vs Authoritative Estimates
//!
//! Clients render their own estimates before a quote comes back. This
//! compares such a mirror estimate with the engine's recomputation on
//! the same snapshot and reports every field that diverges by more than
//! epsilon. Reports are for monitoring only and never change a quote.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::error::PrecisionDriftError;
use crate::domain::market::TradeEstimate;

/// Compares mirror estimates against authoritative ones.
#[derive(Debug, Clone, Copy)]
pub struct DriftMonitor {
  epsilon: f64,
}

impl DriftMonitor {
  /// Create a monitor tolerating absolute differences up to `epsilon`.
  pub const fn new(epsilon: f64) -> Self {
    Self { epsilon }
  }

  pub const fn epsilon(&self) -> f64 {
    self.epsilon
  }

  /// Every field of `mirror` further than epsilon from `authoritative`.
  pub fn compare(
    &self,
    market_id: &str,
    mirror: &TradeEstimate,
    authoritative: &TradeEstimate,
  ) -> Vec<PrecisionDriftError> {
    [
      ("shares", mirror.shares, authoritative.shares),
      (
        "avg_price_minor_units",
        mirror.avg_price_minor_units,
        authoritative.avg_price_minor_units,
      ),
      (
        "price_impact_pct",
        mirror.price_impact_pct,
        authoritative.price_impact_pct,
      ),
      ("new_prob_yes", mirror.new_prob_yes, authoritative.new_prob_yes),
    ]
    .into_iter()
    .filter(|(_, m, a)| self.exceeds(*m, *a))
    .map(|(field, m, a)| PrecisionDriftError {
      market_id: market_id.to_string(),
      field,
      mirror: m.to_string(),
      authoritative: a.to_string(),
      epsilon: self.epsilon,
    })
    .collect()
  }

  fn exceeds(&self, mirror: Decimal, authoritative: Decimal) -> bool {
    // Unconvertible differences are out of any tolerance.
    (mirror - authoritative)
      .abs()
      .to_f64()
      .is_none_or(|diff| diff > self.epsilon)
  }
}
