//! Logarithmic Market Scoring Rule (LMSR) for binary outcome markets.
//!
//! Pure, stateless curve math. Every function here is safe to call from
//! any number of threads and never blocks.
//! Reference: Hanson (2003) "Combinatorial Information Market Design"
//!
//! Quantities and the liquidity parameter `b` are denominated in shares
//! (one share redeems for [`MINOR_UNITS_PER_SHARE`] if its side wins).
//! Cash amounts enter in minor units and are converted at the boundary.
//! All curve math runs in `f64` with the log-sum-exp trick; quantization
//! to fixed decimals happens one layer up, in [`super::market`].

use std::f64::consts::LN_2;

use super::error::{ConfigurationError, PricingError};

/// Minor currency units paid out per winning share (R$1 = 100 centavos).
pub const MINOR_UNITS_PER_SHARE: u64 = 100;

/// Ceiling on a reported price impact. A long shot whose spot price
/// underflows `f64` can move by more than any finite percentage.
pub const MAX_PRICE_IMPACT_PCT: f64 = 1.0e15;

/// Raw result of inverting the cost function for a purchase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuySimulation {
    /// Shares issued for the amount paid.
    pub shares: f64,
    /// Amount paid divided by shares, in minor units per share.
    pub avg_price_minor_units: f64,
    /// Spot price of the bought side before the trade.
    pub price_before: f64,
    /// Spot price of the bought side after the trade.
    pub price_after: f64,
    /// `|after - before| / before * 100`, from log prices, saturating
    /// at [`MAX_PRICE_IMPACT_PCT`].
    pub price_impact_pct: f64,
}

fn check_inputs(q_target: f64, q_other: f64, b: f64) -> Result<(), ConfigurationError> {
    if !b.is_finite() {
        return Err(ConfigurationError::NonFinite {
            field: "liquidity_b",
            value: b,
        });
    }
    if b <= 0.0 {
        return Err(ConfigurationError::NonPositiveLiquidity(b));
    }
    for (field, q) in [("q_target", q_target), ("q_other", q_other)] {
        if !q.is_finite() {
            return Err(ConfigurationError::NonFinite { field, value: q });
        }
        if q < 0.0 {
            return Err(ConfigurationError::NegativeQuantity { field, value: q });
        }
    }
    Ok(())
}

/// LMSR cost function: `C = b * ln(exp(q_yes/b) + exp(q_no/b))`.
///
/// Evaluated as `b * (m + ln(exp(x1 - m) + exp(x2 - m)))` with
/// `m = max(x1, x2)` so large quantities never overflow.
///
/// # Errors
/// [`ConfigurationError`] if `b <= 0`, a quantity is negative, or any
/// input is non-finite.
pub fn cost(q_yes: f64, q_no: f64, b: f64) -> Result<f64, ConfigurationError> {
    check_inputs(q_yes, q_no, b)?;
    let x1 = q_yes / b;
    let x2 = q_no / b;
    let m = x1.max(x2);
    Ok(b * (m + ((x1 - m).exp() + (x2 - m).exp()).ln()))
}

/// Spot price (instantaneous marginal cost) of the target outcome.
///
/// `P = exp(xt - u) / (exp(xt - u) + exp(xo - u))`, `u = max(xt, xo)`.
pub fn spot_price(q_target: f64, q_other: f64, b: f64) -> Result<f64, ConfigurationError> {
    let (target, _) = price_pair(q_target, q_other, b)?;
    Ok(target)
}

/// Spot prices of both outcomes over one shared denominator.
///
/// Returns `(p_target, p_other)`; the pair sums to one up to a single
/// rounding of the final division.
pub fn price_pair(q_target: f64, q_other: f64, b: f64) -> Result<(f64, f64), ConfigurationError> {
    check_inputs(q_target, q_other, b)?;
    let xt = q_target / b;
    let xo = q_other / b;
    let u = xt.max(xo);
    let et = (xt - u).exp();
    let eo = (xo - u).exp();
    let denom = et + eo;
    Ok((et / denom, eo / denom))
}

/// Natural log of the target's spot price.
///
/// `ln P = (xt - u) - ln(exp(xt - u) + exp(xo - u))`. One of the two
/// exponentials is always 1, so this stays finite where `P` itself
/// underflows to zero.
pub fn ln_spot_price(q_target: f64, q_other: f64, b: f64) -> Result<f64, ConfigurationError> {
    check_inputs(q_target, q_other, b)?;
    let xt = q_target / b;
    let xo = q_other / b;
    let u = xt.max(xo);
    Ok((xt - u) - ((xt - u).exp() + (xo - u).exp()).ln())
}

/// Collateral held beyond the operator subsidy: `max(0, C - b * ln 2)`.
///
/// Expressed in shares (major units). `b * ln 2` is the cost of the
/// fresh `{0, 0}` state.
pub fn net_invested(q_yes: f64, q_no: f64, b: f64) -> Result<f64, ConfigurationError> {
    let c = cost(q_yes, q_no, b)?;
    Ok((c - b * LN_2).max(0.0))
}

/// Sizes a purchase of `amount_minor_units` on the target side.
///
/// Inverts the cost function: after paying `A`, the new target quantity
/// satisfies `C(q_target_new, q_other) = C(q_target, q_other) + A`, i.e.
/// `q_target_new = b * (X + ln(1 - exp(Y - X)))` with `X = c_new / b`
/// and `Y = q_other / b`.
///
/// # Errors
/// - [`PricingError::NonPositiveAmount`] for a zero amount
/// - [`PricingError::Configuration`] for invalid curve inputs
/// - [`PricingError::InfeasibleTrade`] when `X <= Y`, the result is
///   non-finite, or no positive number of shares comes out
pub fn simulate_buy(
    amount_minor_units: u64,
    q_target: f64,
    q_other: f64,
    b: f64,
) -> Result<BuySimulation, PricingError> {
    if amount_minor_units == 0 {
        return Err(PricingError::NonPositiveAmount);
    }

    #[allow(clippy::cast_precision_loss)]
    let amount = amount_minor_units as f64 / MINOR_UNITS_PER_SHARE as f64;

    let c_old = cost(q_target, q_other, b)?;
    let c_new = c_old + amount;

    let x = c_new / b;
    let y = q_other / b;
    if !(x > y) {
        return Err(PricingError::InfeasibleTrade {
            reason: "cost after trade does not exceed the opposite side's share value",
        });
    }

    // ln(1 - e^(y - x)) without cancellation when e^(y - x) is tiny
    let q_target_new = b * (x + (-(y - x).exp()).ln_1p());
    let shares = q_target_new - q_target;
    if !shares.is_finite() {
        return Err(PricingError::InfeasibleTrade {
            reason: "share count is not finite",
        });
    }
    if shares <= 0.0 {
        return Err(PricingError::InfeasibleTrade {
            reason: "trade would issue no shares",
        });
    }

    let price_before = spot_price(q_target, q_other, b)?;
    let price_after = spot_price(q_target + shares, q_other, b)?;

    #[allow(clippy::cast_precision_loss)]
    let avg_price_minor_units = amount_minor_units as f64 / shares;

    Ok(BuySimulation {
        shares,
        avg_price_minor_units,
        price_before,
        price_after,
        price_impact_pct: price_impact_pct(q_target, q_other, shares, b)?,
    })
}

/// Percentage move of the target's spot price when `shares` are added to
/// it, relative to the price before.
///
/// Taken from the log-price difference, `|exp(ln_after - ln_before) - 1|`,
/// so a price that underflows to zero still yields a finite figure. The
/// result saturates at [`MAX_PRICE_IMPACT_PCT`].
pub fn price_impact_pct(
    q_target: f64,
    q_other: f64,
    shares: f64,
    b: f64,
) -> Result<f64, ConfigurationError> {
    let ln_before = ln_spot_price(q_target, q_other, b)?;
    let ln_after = ln_spot_price(q_target + shares, q_other, b)?;
    let pct = (ln_after - ln_before).exp_m1().abs() * 100.0;
    Ok(pct.min(MAX_PRICE_IMPACT_PCT))
}
