mod common;

use chrono::Days;

use put_spread_scanner::model::{ChainFilter, PopModel, PutChain, PutQuote, SpreadParams};
use put_spread_scanner::spread::{self, Rejection};

use common::{expiration, put, scenario_a_chain, scenario_b_chain};

fn chain(quotes: Vec<PutQuote>) -> PutChain {
    PutChain::from_quotes(quotes, &ChainFilter::default())
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_scenario_a_values() {
    let params = SpreadParams::default();
    let chain = chain(scenario_a_chain());
    let candidates: Vec<_> = spread::enumerate(&chain, 100.0, 30.0, &params).collect();

    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert_eq!(c.short_strike, 95.0);
    assert_eq!(c.long_strike, 90.0);
    assert!(approx(c.credit, 0.40));
    assert!(approx(c.width, 5.0));
    assert!(approx(c.risk, 4.60));
    assert_eq!(c.reward_to_risk, 0.09);
}

#[test]
fn test_scenario_b_values() {
    let params = SpreadParams::default();
    let chain = chain(scenario_b_chain());
    let candidates: Vec<_> = spread::enumerate(&chain, 100.0, 30.0, &params).collect();

    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert!(approx(c.credit, 1.60));
    assert!(approx(c.risk, 3.40));
    assert_eq!(c.reward_to_risk, 0.47);
    assert!(approx(c.breakeven, 93.4));
    assert_eq!(c.probability_of_profit, 60);
    assert_eq!(c.short_bid, 2.00);
    assert_eq!(c.long_ask, 0.40);
    assert_eq!(c.expiration, expiration());
}

#[test]
fn test_candidates_satisfy_invariants() {
    let params = SpreadParams::default();
    let quotes: Vec<PutQuote> = (0..30)
        .map(|i| {
            let strike = 70.0 + i as f64 * 1.0;
            let bid = (0.002 * (strike - 60.0).powi(2)).max(0.06);
            put(strike, bid, bid + 0.05)
        })
        .collect();
    let chain = chain(quotes);

    let candidates: Vec<_> = spread::enumerate(&chain, 100.0, 30.0, &params).collect();
    assert!(!candidates.is_empty());
    for c in &candidates {
        assert!(c.width > 0.0);
        assert!(c.risk > 0.0);
        assert!(c.credit > 0.0);
        assert!(c.short_strike > c.long_strike);
        assert!(c.short_strike < 100.0 * params.near_otm_factor);
        assert!(c.width / 100.0 * 100.0 <= 30.0);
        assert!((45..=85).contains(&c.probability_of_profit));
    }
}

#[test]
fn test_pairs_are_adjacent_only() {
    let params = SpreadParams::default();
    let chain = chain(vec![
        put(85.0, 0.20, 0.25),
        put(90.0, 0.60, 0.65),
        put(95.0, 1.50, 1.60),
    ]);
    let pairs: Vec<(f64, f64)> = spread::enumerate(&chain, 100.0, 30.0, &params)
        .map(|c| (c.short_strike, c.long_strike))
        .collect();
    assert_eq!(pairs, vec![(90.0, 85.0), (95.0, 90.0)]);
}

#[test]
fn test_reward_to_risk_rises_with_credit() {
    let params = SpreadParams::default();
    let ratios: Vec<f64> = (0..40)
        .map(|i| {
            let short_bid = 0.50 + i as f64 * 0.10;
            let quotes = [put(95.0, short_bid, short_bid + 0.05), put(90.0, 0.20, 0.30)];
            spread::build_candidate(&quotes[0], &quotes[1], 100.0, 30.0, &params)
                .unwrap()
                .reward_to_risk
        })
        .collect();

    for w in ratios.windows(2) {
        assert!(w[1] >= w[0], "{} then {}", w[0], w[1]);
    }
}

#[test]
fn test_pop_stays_in_bounds_and_is_monotonic() {
    let pop = PopModel::default();
    let mut last = 0;
    for i in -200..=200 {
        let distance = i as f64 / 100.0;
        let p = pop.estimate(distance);
        assert!((45..=85).contains(&p), "distance {distance} → {p}");
        assert!(p >= last);
        last = p;
    }
    assert_eq!(pop.estimate(f64::NAN), 45);
    assert_eq!(pop.estimate(f64::INFINITY), 85);
}

#[test]
fn test_pop_model_is_tunable() {
    let params = SpreadParams {
        pop: PopModel {
            scale_factor: 300.0,
            lower_bound: 10,
            upper_bound: 95,
        },
        ..SpreadParams::default()
    };
    let quotes = scenario_b_chain();
    let c = spread::build_candidate(&quotes[0], &quotes[1], 100.0, 30.0, &params).unwrap();
    // 50 + 0.066 * 300 = 69.8
    assert_eq!(c.probability_of_profit, 70);
}

#[test]
fn test_rejection_rules() {
    let params = SpreadParams::default();
    let long = put(90.0, 0.30, 0.40);

    let near = put(99.5, 2.00, 2.10);
    assert_eq!(
        spread::build_candidate(&near, &long, 100.0, 30.0, &params).unwrap_err(),
        Rejection::NearTheMoney
    );

    let cheap = put(95.0, 0.42, 0.50);
    assert_eq!(
        spread::build_candidate(&cheap, &long, 100.0, 30.0, &params).unwrap_err(),
        Rejection::CreditBelowFloor
    );

    let short = put(95.0, 2.00, 2.10);
    assert_eq!(
        spread::build_candidate(&short, &long, 100.0, 4.0, &params).unwrap_err(),
        Rejection::TooWide
    );

    let rich = put(95.0, 5.60, 5.70);
    assert_eq!(
        spread::build_candidate(&rich, &long, 100.0, 30.0, &params).unwrap_err(),
        Rejection::NonPositiveRisk
    );

    let same = put(90.0, 2.00, 2.10);
    assert_eq!(
        spread::build_candidate(&same, &long, 100.0, 30.0, &params).unwrap_err(),
        Rejection::NonPositiveWidth
    );

    let mut later = short.clone();
    later.expiration = expiration() + Days::new(7);
    assert_eq!(
        spread::build_candidate(&later, &long, 100.0, 30.0, &params).unwrap_err(),
        Rejection::ExpirationMismatch
    );
}

#[test]
fn test_near_the_money_rule_comes_first() {
    // Also too wide and below the credit floor; the strike guard reports first.
    let params = SpreadParams::default();
    let short = put(99.5, 0.10, 0.20);
    let long = put(50.0, 0.10, 0.20);
    assert_eq!(
        spread::build_candidate(&short, &long, 100.0, 5.0, &params).unwrap_err(),
        Rejection::NearTheMoney
    );
}

#[test]
fn test_unusable_spot_yields_nothing() {
    let params = SpreadParams::default();
    let chain = chain(scenario_b_chain());
    assert_eq!(spread::enumerate(&chain, 0.0, 30.0, &params).count(), 0);
    assert_eq!(spread::enumerate(&chain, f64::NAN, 30.0, &params).count(), 0);
}

#[test]
fn test_short_chains_yield_nothing() {
    let params = SpreadParams::default();
    assert_eq!(spread::enumerate(&chain(vec![]), 100.0, 30.0, &params).count(), 0);
    assert_eq!(
        spread::enumerate(&chain(vec![put(95.0, 1.0, 1.1)]), 100.0, 30.0, &params).count(),
        0
    );
}
