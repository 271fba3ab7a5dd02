//! Fixed precision policy shared by the engine and any client mirror.
//!
//! Curve math runs in `f64`; everything that leaves the engine, and every
//! quantity written back into a market, is quantized here. Two
//! implementations that agree on this policy agree on their outputs to
//! within the last kept decimal.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// Largest scale rust_decimal can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Rounding and display rules for quotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Decimals kept on share quantities (truncated toward zero).
    pub share_decimals: u32,
    /// Decimals kept on minor-unit prices.
    pub price_decimals: u32,
    /// Decimals kept on percentages (probabilities, impact).
    pub probability_decimals: u32,
    /// Price impact above which an estimate carries a slippage warning.
    pub slippage_warning_pct: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            share_decimals: 8,
            price_decimals: 4,
            probability_decimals: 2,
            slippage_warning_pct: 1.0,
        }
    }
}

impl PricingPolicy {
    /// Truncates a share count toward zero.
    ///
    /// Truncation means a trader is never issued more than the curve
    /// prices; the sub-unit remainder stays with the market.
    pub fn quantize_shares(&self, shares: f64) -> Result<Decimal, ConfigurationError> {
        Ok(to_decimal("shares", shares)?
            .round_dp_with_strategy(self.share_decimals, RoundingStrategy::ToZero))
    }

    /// Rounds a minor-unit price.
    pub fn round_price(&self, price: f64) -> Result<Decimal, ConfigurationError> {
        Ok(to_decimal("price", price)?.round_dp(self.price_decimals))
    }

    /// Rounds a percentage.
    pub fn round_pct(&self, pct: f64) -> Result<Decimal, ConfigurationError> {
        Ok(to_decimal("percentage", pct)?.round_dp(self.probability_decimals))
    }

    /// Splits a YES probability into a `(yes, no)` percentage pair.
    ///
    /// Only YES is rounded; NO is its complement, so the pair always sums
    /// to exactly 100. Neither side is shown as 0 or 100: a side that
    /// rounds off the scale is held one step inside it.
    pub fn split_percent(&self, prob_yes: f64) -> Result<(Decimal, Decimal), ConfigurationError> {
        let yes = self.round_pct(prob_yes * 100.0)?;
        let yes = inside_scale(yes, Decimal::ONE_HUNDRED, self.probability_decimals);
        Ok((yes, Decimal::ONE_HUNDRED - yes))
    }

    /// Same pairing rule for minor-unit prices of one share per side.
    pub fn split_price(&self, prob_yes: f64) -> Result<(Decimal, Decimal), ConfigurationError> {
        #[allow(clippy::cast_precision_loss)]
        let per_share = super::lmsr::MINOR_UNITS_PER_SHARE as f64;
        let payout = Decimal::from(super::lmsr::MINOR_UNITS_PER_SHARE);
        let yes = self.round_price(prob_yes * per_share)?;
        let yes = inside_scale(yes, payout, self.price_decimals);
        Ok((yes, payout - yes))
    }
}

/// Clamps `value` to `[step, full - step]`, `step` being one unit in the
/// last kept decimal.
fn inside_scale(value: Decimal, full: Decimal, decimals: u32) -> Decimal {
    let step = Decimal::new(1, decimals);
    value.clamp(step, full - step)
}

/// Converts an `f64` into a `Decimal`, rejecting NaN, infinities and
/// values outside rust_decimal's range.
pub fn to_decimal(field: &'static str, value: f64) -> Result<Decimal, ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite { field, value });
    }
    Decimal::from_f64(value).ok_or(ConfigurationError::Unrepresentable { field })
}

/// Converts a `Decimal` into an `f64` for curve math.
pub fn to_f64(field: &'static str, value: Decimal) -> Result<f64, ConfigurationError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or(ConfigurationError::Unrepresentable { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shares_truncate_toward_zero() {
        let policy = PricingPolicy {
            share_decimals: 2,
            ..PricingPolicy::default()
        };
        assert_eq!(policy.quantize_shares(97.739).unwrap(), dec!(97.73));
    }

    #[test]
    fn test_split_percent_sums_to_hundred() {
        let policy = PricingPolicy::default();
        for p in [0.5, 1.0 / 3.0, 0.924_141_8, 0.000_04, 0.999_96] {
            let (yes, no) = policy.split_percent(p).unwrap();
            assert_eq!(yes + no, dec!(100), "pair for {p} was {yes}/{no}");
        }
    }

    #[test]
    fn test_split_percent_rounds_the_pair_not_each_side() {
        // 1/3 -> 33.33 / 66.67, not 33.33 / 66.66
        let (yes, no) = PricingPolicy::default().split_percent(1.0 / 3.0).unwrap();
        assert_eq!(yes, dec!(33.33));
        assert_eq!(no, dec!(66.67));
    }

    #[test]
    fn test_split_price_sums_to_payout() {
        let (yes, no) = PricingPolicy::default().split_price(0.524_979).unwrap();
        assert_eq!(yes, dec!(52.4979));
        assert_eq!(yes + no, dec!(100));
    }

    #[test]
    fn test_split_never_reaches_the_ends() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.split_percent(0.0).unwrap(), (dec!(0.01), dec!(99.99)));
        assert_eq!(policy.split_percent(1.0).unwrap(), (dec!(99.99), dec!(0.01)));
        assert_eq!(policy.split_price(0.0).unwrap(), (dec!(0.0001), dec!(99.9999)));

        let coarse = PricingPolicy {
            probability_decimals: 0,
            ..policy
        };
        assert_eq!(coarse.split_percent(0.999).unwrap(), (dec!(99), dec!(1)));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            to_decimal("x", f64::NAN),
            Err(ConfigurationError::NonFinite { .. })
        ));
        assert!(matches!(
            PricingPolicy::default().quantize_shares(f64::INFINITY),
            Err(ConfigurationError::NonFinite { .. })
        ));
    }
}
