//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that the LMSR curve and the quantized
//! estimates built on it hold their invariants across random inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lmsr_engine::domain::lmsr;
use lmsr_engine::domain::market::{MarketState, Side};
use lmsr_engine::domain::precision::{self, PricingPolicy};

// ── Curve Properties ────────────────────────────────────────

proptest! {
    /// Prices stay strictly inside (0, 1) and sum to one.
    #[test]
    fn prices_in_unit_interval_and_sum_to_one(
        b in 1.0f64..10_000.0,
        yes_ratio in 0.0f64..30.0,
        no_ratio in 0.0f64..30.0,
    ) {
        let (p_yes, p_no) = lmsr::price_pair(yes_ratio * b, no_ratio * b, b).unwrap();
        prop_assert!(p_yes > 0.0 && p_yes < 1.0, "p_yes out of range: {p_yes}");
        prop_assert!(p_no > 0.0 && p_no < 1.0, "p_no out of range: {p_no}");
        prop_assert!((p_yes + p_no - 1.0).abs() < 1e-9, "sum drifted: {}", p_yes + p_no);
    }

    /// Cost strictly increases in each quantity.
    #[test]
    fn cost_strictly_increasing(
        b in 1.0f64..1_000.0,
        q_ratio in 0.0f64..10.0,
        other_ratio in 0.0f64..10.0,
        delta in 0.01f64..100.0,
    ) {
        let q = q_ratio * b;
        let other = other_ratio * b;
        let before = lmsr::cost(q, other, b).unwrap();
        prop_assert!(lmsr::cost(q + delta, other, b).unwrap() > before);
        prop_assert!(lmsr::cost(other, q + delta, b).unwrap() > lmsr::cost(other, q, b).unwrap());
    }

    /// Buying A minor units raises the cost by exactly A / 100.
    #[test]
    fn cost_is_conserved_by_buys(
        b in 10.0f64..5_000.0,
        q_ratio in 0.0f64..8.0,
        other_ratio in 0.0f64..8.0,
        amount in 1u64..1_000_000,
    ) {
        let q = q_ratio * b;
        let other = other_ratio * b;
        let sim = lmsr::simulate_buy(amount, q, other, b).unwrap();
        let before = lmsr::cost(q, other, b).unwrap();
        let after = lmsr::cost(q + sim.shares, other, b).unwrap();
        let paid = amount as f64 / 100.0;
        prop_assert!(
            (after - before - paid).abs() < 1e-7,
            "cost moved {} for a payment of {paid}",
            after - before
        );
    }

    /// A fresh market holds nothing beyond the subsidy.
    #[test]
    fn fresh_market_has_zero_net_invested(b in 0.001f64..1_000_000.0) {
        prop_assert!(lmsr::net_invested(0.0, 0.0, b).unwrap() < 1e-9);
        let state = MarketState::new(precision::to_decimal("b", b).unwrap()).unwrap();
        prop_assert_eq!(state.net_invested_minor_units().unwrap(), 0);
    }

    /// Larger buys move the price more.
    #[test]
    fn slippage_monotonic_in_amount(
        b in 10.0f64..5_000.0,
        q_ratio in 0.0f64..5.0,
        other_ratio in 0.0f64..5.0,
        small in 1u64..100_000,
        extra in 1u64..100_000,
    ) {
        let q = q_ratio * b;
        let other = other_ratio * b;
        let a = lmsr::simulate_buy(small, q, other, b).unwrap();
        let c = lmsr::simulate_buy(small + extra, q, other, b).unwrap();
        prop_assert!(c.price_impact_pct >= a.price_impact_pct);
        prop_assert!(c.shares > a.shares);
    }
}

// ── Quantized Estimate Properties ───────────────────────────

proptest! {
    /// On a fresh market YES and NO quotes mirror each other.
    #[test]
    fn fresh_market_is_symmetric(b in 1u32..100_000, amount in 1u64..10_000_000) {
        let state = MarketState::new(Decimal::from(b)).unwrap();
        let policy = PricingPolicy::default();
        let yes = state.estimate_buy(Side::Yes, amount, &policy).unwrap();
        let no = state.estimate_buy(Side::No, amount, &policy).unwrap();
        prop_assert_eq!(yes.shares, no.shares);
        prop_assert_eq!(yes.avg_price_minor_units, no.avg_price_minor_units);
        prop_assert_eq!(yes.price_impact_pct, no.price_impact_pct);
        prop_assert_eq!(yes.new_prob_yes, no.new_prob_no);
        prop_assert_eq!(yes.payout_minor_units, no.payout_minor_units);
    }

    /// Rounded pairs always add up to exactly 100.
    #[test]
    fn snapshot_pairs_sum_to_hundred(
        b in 1u32..10_000,
        q_yes in 0u32..50_000,
        q_no in 0u32..50_000,
    ) {
        prop_assume!(q_yes.abs_diff(q_no) < 30 * b);
        let state = MarketState::with_quantities(
            Decimal::from(q_yes),
            Decimal::from(q_no),
            Decimal::from(b),
        )
        .unwrap();
        let snapshot = state.price_snapshot(&PricingPolicy::default()).unwrap();
        prop_assert_eq!(snapshot.prob_yes + snapshot.prob_no, dec!(100));
        prop_assert_eq!(snapshot.price_yes_minor_units + snapshot.price_no_minor_units, dec!(100));
    }

    /// Net invested equals the sum of debits after any trade sequence.
    #[test]
    fn net_invested_reconciles_with_debits(
        b in 1_000u32..5_000,
        trades in prop::collection::vec((any::<bool>(), 1u64..100_000), 1..12),
    ) {
        let policy = PricingPolicy::default();
        let mut state = MarketState::new(Decimal::from(b)).unwrap();
        let mut debits = 0u64;
        for (yes, amount) in trades {
            let side = if yes { Side::Yes } else { Side::No };
            let estimate = state.estimate_buy(side, amount, &policy).unwrap();
            state.apply_buy(side, estimate.shares);
            debits += amount;
        }
        prop_assert_eq!(state.net_invested_minor_units().unwrap(), debits);
    }

    /// With retained dust added back, coarse share precision reconciles too.
    #[test]
    fn accounted_amount_reconciles_at_any_share_precision(
        share_decimals in 0u32..=3,
        b in 1_000u32..5_000,
        trades in prop::collection::vec((any::<bool>(), 1u64..100_000), 1..12),
    ) {
        let policy = PricingPolicy {
            share_decimals,
            ..PricingPolicy::default()
        };
        let mut state = MarketState::new(Decimal::from(b)).unwrap();
        let mut debits = 0u64;
        let mut dust = Decimal::ZERO;
        for (yes, amount) in trades {
            let side = if yes { Side::Yes } else { Side::No };
            // Too small to buy one whole unit at this precision
            let Ok(estimate) = state.estimate_buy(side, amount, &policy) else {
                continue;
            };
            let mut after = state.clone();
            after.apply_buy(side, estimate.shares);
            dust += state.dust_minor_units(&after, amount).unwrap();
            debits += amount;
            state = after;
        }
        prop_assert_eq!(state.accounted_minor_units(dust).unwrap(), debits);
    }
}
