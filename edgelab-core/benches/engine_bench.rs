//! Criterion benchmarks for EdgeLab hot paths.
//!
//! Benchmarks:
//! 1. Tracker signal loop (apply + mark per candle)
//! 2. Strategy decision over a sliding 21-candle window
//! 3. Indicator precompute (RSI, MACD, ATR batch used by the environment)
//! 4. Environment episode (reset + step to the end)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use edgelab_core::domain::{Candle, Signal};
use edgelab_core::engine::PositionTracker;
use edgelab_core::env::{Action, DecisionEnvironment, EnvConfig};
use edgelab_core::indicators::{Atr, Indicator, Macd, Rsi};
use edgelab_core::strategy::{create_strategy, Strategy, StrategySpec};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 2000.0 + (i as f64 * 0.1).sin() * 40.0;
            let open = close - 0.3;
            Candle {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 10_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

// ── 1. Tracker ───────────────────────────────────────────────────────

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker");
    for n in [1_000usize, 10_000] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::new("alternating_signals", n), &candles, |b, cs| {
            b.iter(|| {
                let mut tracker = PositionTracker::new(100_000.0);
                for (i, candle) in cs.iter().enumerate() {
                    let signal = match i % 7 {
                        0 => Signal::Buy,
                        3 => Signal::Sell,
                        _ => Signal::Hold,
                    };
                    tracker.apply_signal(signal, candle.close, candle.timestamp, 1.0);
                }
                black_box(tracker.equity())
            })
        });
    }
    group.finish();
}

// ── 2. Strategy ──────────────────────────────────────────────────────

fn bench_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_window");
    let candles = make_candles(2_000);
    for spec in [StrategySpec::new("rsi"), StrategySpec::new("ma_crossover")] {
        let strategy = create_strategy(&spec).unwrap();
        group.bench_function(spec.kind.clone(), |b| {
            b.iter(|| {
                let mut buys = 0usize;
                for t in 20..candles.len() {
                    let decision = strategy.decide(&candles[t - 20..=t]);
                    if decision.signal == Signal::Buy {
                        buys += 1;
                    }
                }
                black_box(buys)
            })
        });
    }
    group.finish();
}

// ── 3. Indicator precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    let candles = make_candles(5_000);
    group.bench_function("rsi_macd_atr_5000", |b| {
        b.iter(|| {
            let rsi = Rsi::new(14).compute(black_box(&candles));
            let macd = Macd::default().compute(black_box(&candles));
            let atr = Atr::new(14).compute(black_box(&candles));
            black_box((rsi, macd, atr))
        })
    });
    group.finish();
}

// ── 4. Environment episode ───────────────────────────────────────────

fn bench_environment(c: &mut Criterion) {
    let mut group = c.benchmark_group("environment");
    let candles = make_candles(2_000);
    let mut env = DecisionEnvironment::new(candles, EnvConfig::default());
    group.bench_function("episode_2000", |b| {
        b.iter(|| {
            env.reset();
            let mut total = 0.0;
            let mut i = 0usize;
            while !env.is_finished() {
                total += env.step(Action::ALL[i % Action::COUNT]).reward;
                i += 1;
            }
            black_box(total)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_tracker,
    bench_strategy,
    bench_indicators,
    bench_environment
);
criterion_main!(benches);
