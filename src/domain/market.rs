//! Core market domain types.
//!
//! Defines the binary market state, trade requests and the quantized
//! estimates and price snapshots the engine hands back to callers.
//!
//! `MarketState` holds its quantities as `Decimal` so the authoritative
//! state is exact and reproducible; curve math converts to `f64` on the
//! way in and quantizes with a [`PricingPolicy`] on the way out.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::error::{ConfigurationError, PricingError};
use super::lmsr::{self, MINOR_UNITS_PER_SHARE};
use super::precision::{self, PricingPolicy};

/// Decimals kept on per-trade dust.
const DUST_DECIMALS: u32 = 8;

// ────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────

/// Market identifier used across the engine and its ports.
pub type MarketId = String;

/// Wallet account identifier passed through to the ledger port.
pub type AccountId = String;

// ────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────

/// Outcome side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// The other outcome.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trading lifecycle of a market. Only `Open` accepts trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Open,
    Closed,
    Settled,
}

impl MarketStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// OPEN -> CLOSED -> SETTLED, with OPEN -> SETTLED allowed directly.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed) | (Self::Open | Self::Closed, Self::Settled)
        )
    }
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

// ────────────────────────────────────────────
// Requests and results
// ────────────────────────────────────────────

/// A request to buy `amount_minor_units` worth of `side`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub market_id: MarketId,
    pub side: Side,
    pub amount_minor_units: u64,
}

impl TradeRequest {
    pub fn new(market_id: impl Into<MarketId>, side: Side, amount_minor_units: u64) -> Self {
        Self {
            market_id: market_id.into(),
            side,
            amount_minor_units,
        }
    }
}

/// Quantized outcome of simulating a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEstimate {
    /// Side bought.
    pub side: Side,
    /// Shares issued, truncated to the policy's share decimals.
    pub shares: Decimal,
    /// Amount paid per share, in minor units.
    pub avg_price_minor_units: Decimal,
    /// Amount debited, in minor units.
    pub total_cost: u64,
    /// Spot price move of the bought side, in percent.
    pub price_impact_pct: Decimal,
    /// YES probability after the trade, in percent.
    pub new_prob_yes: Decimal,
    /// NO probability after the trade, in percent (`100 - new_prob_yes`).
    pub new_prob_no: Decimal,
    /// Set when the price impact exceeds the policy threshold.
    pub slippage_warning: bool,
    /// What the shares redeem for if `side` wins: `floor(shares * 100)`.
    pub payout_minor_units: u64,
}

/// Current prices of both sides.
///
/// Prices are per share in minor units; probabilities are percentages.
/// Each pair sums to exactly 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub price_yes_minor_units: Decimal,
    pub price_no_minor_units: Decimal,
    pub prob_yes: Decimal,
    pub prob_no: Decimal,
}

// ────────────────────────────────────────────
// Market state
// ────────────────────────────────────────────

/// Outstanding shares per outcome plus the liquidity parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub q_yes: Decimal,
    pub q_no: Decimal,
    pub liquidity_b: Decimal,
}

impl MarketState {
    /// Fresh market: no shares outstanding.
    ///
    /// # Errors
    /// [`ConfigurationError::NonPositiveLiquidity`] unless `liquidity_b > 0`.
    pub fn new(liquidity_b: Decimal) -> Result<Self, ConfigurationError> {
        Self::with_quantities(Decimal::ZERO, Decimal::ZERO, liquidity_b)
    }

    /// State with existing quantities, validated.
    pub fn with_quantities(
        q_yes: Decimal,
        q_no: Decimal,
        liquidity_b: Decimal,
    ) -> Result<Self, ConfigurationError> {
        let state = Self {
            q_yes,
            q_no,
            liquidity_b,
        };
        state.validate()?;
        Ok(state)
    }

    /// Checks `b > 0` and `q_yes, q_no >= 0`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.curve_inputs(Side::Yes).map(|_| ())
    }

    /// Quantities ordered as `(target, other)` for `side`.
    pub const fn quantities_for(&self, side: Side) -> (Decimal, Decimal) {
        match side {
            Side::Yes => (self.q_yes, self.q_no),
            Side::No => (self.q_no, self.q_yes),
        }
    }

    fn curve_inputs(&self, side: Side) -> Result<(f64, f64, f64), ConfigurationError> {
        let b = precision::to_f64("liquidity_b", self.liquidity_b)?;
        if b <= 0.0 {
            return Err(ConfigurationError::NonPositiveLiquidity(b));
        }
        let (target, other) = self.quantities_for(side);
        let (target_field, other_field) = match side {
            Side::Yes => ("q_yes", "q_no"),
            Side::No => ("q_no", "q_yes"),
        };
        let target = precision::to_f64(target_field, target)?;
        let other = precision::to_f64(other_field, other)?;
        for (field, value) in [(target_field, target), (other_field, other)] {
            if value < 0.0 {
                return Err(ConfigurationError::NegativeQuantity { field, value });
            }
        }
        Ok((target, other, b))
    }

    /// Cost function value at this state, in shares.
    pub fn cost(&self) -> Result<f64, ConfigurationError> {
        let (q_yes, q_no, b) = self.curve_inputs(Side::Yes)?;
        lmsr::cost(q_yes, q_no, b)
    }

    /// Unrounded `(prob_yes, prob_no)`.
    pub fn probabilities(&self) -> Result<(f64, f64), ConfigurationError> {
        let (q_yes, q_no, b) = self.curve_inputs(Side::Yes)?;
        lmsr::price_pair(q_yes, q_no, b)
    }

    /// Rounded price snapshot under `policy`.
    pub fn price_snapshot(&self, policy: &PricingPolicy) -> Result<PriceSnapshot, ConfigurationError> {
        let (prob_yes, _) = self.probabilities()?;
        let (price_yes, price_no) = policy.split_price(prob_yes)?;
        let (pct_yes, pct_no) = policy.split_percent(prob_yes)?;
        Ok(PriceSnapshot {
            price_yes_minor_units: price_yes,
            price_no_minor_units: price_no,
            prob_yes: pct_yes,
            prob_no: pct_no,
        })
    }

    /// Collateral beyond the operator subsidy, in minor units.
    ///
    /// `max(0, floor(100 * (C - b ln 2) + 0.5))`. The half-unit guard
    /// absorbs float noise.
    pub fn net_invested_minor_units(&self) -> Result<u64, ConfigurationError> {
        self.accounted_minor_units(Decimal::ZERO)
    }

    /// Net invested plus `retained_dust_minor_units`, rounded like
    /// [`Self::net_invested_minor_units`].
    ///
    /// Truncating issued shares leaves every debit slightly above the
    /// cost increase it buys. With that remainder added back this equals
    /// the sum of debits at any share precision.
    pub fn accounted_minor_units(
        &self,
        retained_dust_minor_units: Decimal,
    ) -> Result<u64, ConfigurationError> {
        let (q_yes, q_no, b) = self.curve_inputs(Side::Yes)?;
        let major = lmsr::net_invested(q_yes, q_no, b)?;
        let dust = precision::to_f64("retained_dust", retained_dust_minor_units)?;
        #[allow(clippy::cast_precision_loss)]
        let minor = (major * MINOR_UNITS_PER_SHARE as f64 + dust + 0.5).floor();
        precision::to_decimal("net_invested", minor.max(0.0))?
            .to_u64()
            .ok_or(ConfigurationError::Unrepresentable {
                field: "net_invested",
            })
    }

    /// Part of `amount_minor_units` that moving from `self` to `after`
    /// does not absorb: `amount - 100 * (C(after) - C(self))`.
    pub fn dust_minor_units(
        &self,
        after: &Self,
        amount_minor_units: u64,
    ) -> Result<Decimal, ConfigurationError> {
        let delta = after.cost()? - self.cost()?;
        #[allow(clippy::cast_precision_loss)]
        let dust = amount_minor_units as f64 - delta * MINOR_UNITS_PER_SHARE as f64;
        Ok(precision::to_decimal("dust", dust)?.round_dp(DUST_DECIMALS))
    }

    /// Simulates buying `amount_minor_units` of `side` and quantizes the
    /// result under `policy`. Does not mutate the state.
    ///
    /// # Errors
    /// Any [`PricingError`]; additionally [`PricingError::InfeasibleTrade`]
    /// when the share count truncates to zero.
    pub fn estimate_buy(
        &self,
        side: Side,
        amount_minor_units: u64,
        policy: &PricingPolicy,
    ) -> Result<TradeEstimate, PricingError> {
        let (q_target, q_other, b) = self.curve_inputs(side)?;
        let sim = lmsr::simulate_buy(amount_minor_units, q_target, q_other, b)?;

        let shares = policy.quantize_shares(sim.shares)?;
        if shares <= Decimal::ZERO {
            return Err(PricingError::InfeasibleTrade {
                reason: "share count rounds to zero",
            });
        }
        let shares_f64 = precision::to_f64("shares", shares)?;

        // Post-trade figures come from the quantized shares, i.e. from the
        // exact state a commit would write.
        let (after_target, after_other) = lmsr::price_pair(q_target + shares_f64, q_other, b)?;
        let impact = lmsr::price_impact_pct(q_target, q_other, shares_f64, b)?;
        let prob_yes_after = match side {
            Side::Yes => after_target,
            Side::No => after_other,
        };
        let (new_prob_yes, new_prob_no) = policy.split_percent(prob_yes_after)?;

        #[allow(clippy::cast_precision_loss)]
        let avg_price = amount_minor_units as f64 / shares_f64;

        let payout_minor_units = (shares * Decimal::from(MINOR_UNITS_PER_SHARE))
            .floor()
            .to_u64()
            .ok_or(ConfigurationError::Unrepresentable { field: "payout" })?;

        Ok(TradeEstimate {
            side,
            shares,
            avg_price_minor_units: policy.round_price(avg_price)?,
            total_cost: amount_minor_units,
            price_impact_pct: policy.round_pct(impact)?,
            new_prob_yes,
            new_prob_no,
            slippage_warning: impact > policy.slippage_warning_pct,
            payout_minor_units,
        })
    }

    /// Adds `shares` to `side`. Callers pass the shares of an estimate
    /// computed against this exact state.
    pub fn apply_buy(&mut self, side: Side, shares: Decimal) {
        match side {
            Side::Yes => self.q_yes += shares,
            Side::No => self.q_no += shares,
        }
    }
}
