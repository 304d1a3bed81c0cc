//! Property tests for the driver, metrics, grid search and walk-forward.
//!
//! Uses proptest to verify:
//! 1. Equity curve length equals the filtered candle count
//! 2. Max drawdown ≥ 0 and win rate ∈ [0, 1] for any run
//! 3. Grid search returns a combination drawn from the ranges
//! 4. For max_drawdown the winner is ≤ every candidate
//! 5. Walk-forward consistency never exceeds 1

use chrono::Duration;
use proptest::prelude::*;

use edgelab_core::domain::{candles_from_closes, Candle};
use edgelab_core::strategy::{create_strategy, StrategySpec};
use edgelab_runner::metrics::{max_drawdown, MetricField};
use edgelab_runner::runner::Backtester;
use edgelab_runner::sweep::{GridSearch, ParamGrid};
use edgelab_runner::walk_forward::{consistency, run_walk_forward, WalkForwardConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_candles(min: usize, max: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec(-15.0..15.0_f64, min..max).prop_map(|steps| {
        let mut price = 2000.0;
        let closes: Vec<f64> = steps
            .into_iter()
            .map(|s| {
                price = (price + s).max(50.0);
                price
            })
            .collect();
        candles_from_closes(&closes)
    })
}

fn arb_spec() -> impl Strategy<Value = StrategySpec> {
    prop_oneof![
        (2usize..20, 10.0..45.0_f64, 55.0..90.0_f64).prop_map(|(p, os, ob)| {
            StrategySpec::new("rsi")
                .with_param("period", p as f64)
                .with_param("oversold", os)
                .with_param("overbought", ob)
        }),
        (2usize..8, 9usize..25).prop_map(|(fast, slow)| {
            StrategySpec::new("ma_crossover")
                .with_param("fast", fast as f64)
                .with_param("slow", slow as f64)
        }),
    ]
}

// ── 1-2. Driver and metrics ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn equity_curve_covers_filtered_range(
        candles in arb_candles(30, 200),
        spec in arb_spec(),
        bounds in (0usize..30, 0usize..30),
    ) {
        let strategy = create_strategy(&spec).unwrap();
        let n = candles.len();
        let lo = bounds.0.min(n - 1);
        let hi = (n - 1).saturating_sub(bounds.1).max(lo);

        let result = Backtester::default().run(
            &strategy,
            &candles,
            candles[lo].timestamp,
            candles[hi].timestamp,
        );
        prop_assert_eq!(result.equity_curve.len(), hi - lo + 1);
        prop_assert_eq!(result.candle_count, hi - lo + 1);

        let m = result.metrics();
        prop_assert!(m.max_drawdown >= 0.0);
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert!(m.sharpe_ratio.is_finite());
        prop_assert!(m.sortino_ratio.is_finite());
        prop_assert!(m.calmar_ratio.is_finite());
        prop_assert!(m.winning_trades + m.losing_trades <= m.total_trades);
    }

    #[test]
    fn non_decreasing_equity_has_zero_drawdown(
        steps in prop::collection::vec(0.0..100.0_f64, 1..100),
    ) {
        let mut equity = 1_000.0;
        let curve: Vec<f64> = steps.iter().map(|s| { equity += s; equity }).collect();
        prop_assert_eq!(max_drawdown(&curve), 0.0);
    }
}

// ── 3-4. Grid search ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn grid_winner_comes_from_ranges(
        candles in arb_candles(60, 160),
        fasts in prop::collection::vec(2usize..8, 1..3),
        slows in prop::collection::vec(6usize..20, 1..3),
        target_idx in 0usize..MetricField::ALL.len(),
    ) {
        let target = MetricField::ALL[target_idx];
        let grid = ParamGrid::new()
            .with("fast", fasts.iter().map(|&f| f as f64).collect())
            .with("slow", slows.iter().map(|&s| s as f64).collect());
        let start = candles[0].timestamp;
        let end = candles[candles.len() - 1].timestamp;

        let result = GridSearch::new(Backtester::default(), target)
            .run_kind("ma_crossover", &grid, &candles, start, end)
            .unwrap();

        prop_assert_eq!(result.candidates.len() + result.failures.len(), grid.size());
        if let Some(best) = &result.best {
            prop_assert!(fasts.iter().any(|&f| f as f64 == best.params["fast"]));
            prop_assert!(slows.iter().any(|&s| s as f64 == best.params["slow"]));
            for c in &result.candidates {
                prop_assert!(!target.is_better(c.score, best.score));
            }
        } else {
            prop_assert!(result.candidates.is_empty());
        }
    }

    #[test]
    fn max_drawdown_winner_is_minimal(
        candles in arb_candles(60, 160),
        periods in prop::collection::vec(2usize..20, 1..5),
    ) {
        let grid = ParamGrid::new().with("period", periods.iter().map(|&p| p as f64).collect());
        let start = candles[0].timestamp;
        let end = candles[candles.len() - 1].timestamp;

        let result = GridSearch::new(Backtester::default(), MetricField::MaxDrawdown)
            .run_kind("rsi", &grid, &candles, start, end)
            .unwrap();

        let best = result.best_value().unwrap();
        for c in &result.candidates {
            prop_assert!(best <= c.score);
        }
    }
}

// ── 5. Walk-forward ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn consistency_never_exceeds_one(train in -5.0..5.0_f64, test in -5.0..5.0_f64) {
        prop_assert!(consistency(train, test) <= 1.0);
    }

    #[test]
    fn walk_forward_windows_are_capped(
        candles in arb_candles(100, 300),
        spec in arb_spec(),
        train_days in 1u32..4,
        test_days in 1u32..3,
    ) {
        let strategy = create_strategy(&spec).unwrap();
        let config = WalkForwardConfig { train_days, test_days };
        let start = candles[0].timestamp;
        let end = candles[candles.len() - 1].timestamp;

        let report = run_walk_forward(&Backtester::default(), &config, &strategy, &candles, start, end);

        prop_assert!(report.average_consistency <= 1.0);
        for w in &report.windows {
            prop_assert!(w.consistency <= 1.0);
            prop_assert!(w.window.test_end <= end);
            prop_assert_eq!(w.window.test_start, w.window.train_end);
            prop_assert_eq!(
                w.window.test_end - w.window.test_start,
                Duration::days(i64::from(test_days))
            );
        }
    }
}
