//! Backtest simulation driver: replays a strategy through a position tracker.
//!
//! Two entry points:
//! - `Backtester::run()`: filters candles to an inclusive date range first.
//! - `Backtester::run_all()`: the whole series, no filter.
//!
//! Each candle sees a causal window (itself plus up to `lookback` predecessors
//! from the filtered series). Any position still open after the last candle is
//! force-closed at that candle's close.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use edgelab_core::domain::{filter_range, Candle, ClosedTrade, EquityPoint};
use edgelab_core::engine::{PositionTracker, DEFAULT_POSITION_SIZE};
use edgelab_core::strategy::{ParamSet, Strategy};

use crate::data_loader::dataset_hash;
use crate::metrics::Metrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Immutable driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// Preceding candles included in each strategy window.
    pub lookback: usize,
    pub position_size: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            lookback: 20,
            position_size: DEFAULT_POSITION_SIZE,
        }
    }
}

/// Complete record of one backtest run. Metrics are derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub params: ParamSet,
    pub initial_capital: f64,
    pub candle_count: usize,
    /// BLAKE3 over the filtered candles.
    pub dataset_hash: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    /// Result for a range with no candles in it.
    pub fn empty<S: Strategy + ?Sized>(strategy: &S, initial_capital: f64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            strategy: strategy.name().to_string(),
            params: strategy.params(),
            initial_capital,
            candle_count: 0,
            dataset_hash: dataset_hash(&[]),
            start: None,
            end: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candle_count == 0
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::compute(&self.trades, &self.equity_curve, self.initial_capital)
    }
}

/// Drives strategies over candle series. Holds no per-run state.
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    settings: BacktestSettings,
}

impl Backtester {
    pub fn new(settings: BacktestSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    /// Window length used for `strategy`: the candle plus its lookback,
    /// widened to the strategy's own minimum.
    pub fn window_len<S: Strategy + ?Sized>(&self, strategy: &S) -> usize {
        (self.settings.lookback + 1).max(strategy.min_window())
    }

    /// Run over candles in `[start, end]` inclusive.
    pub fn run<S: Strategy + ?Sized>(
        &self,
        strategy: &S,
        candles: &[Candle],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BacktestResult {
        let filtered = filter_range(candles, start, end);
        if filtered.is_empty() {
            warn!(
                strategy = strategy.name(),
                %start,
                %end,
                "no candles in backtest range"
            );
            return BacktestResult::empty(strategy, self.settings.initial_capital);
        }
        self.simulate(strategy, filtered)
    }

    /// Run over the whole series.
    pub fn run_all<S: Strategy + ?Sized>(&self, strategy: &S, candles: &[Candle]) -> BacktestResult {
        if candles.is_empty() {
            warn!(strategy = strategy.name(), "no candles to backtest");
            return BacktestResult::empty(strategy, self.settings.initial_capital);
        }
        self.simulate(strategy, candles)
    }

    fn simulate<S: Strategy + ?Sized>(&self, strategy: &S, candles: &[Candle]) -> BacktestResult {
        let window_len = self.window_len(strategy);
        let mut tracker = PositionTracker::new(self.settings.initial_capital);
        let mut equity_curve = Vec::with_capacity(candles.len());

        for (i, candle) in candles.iter().enumerate() {
            let from = (i + 1).saturating_sub(window_len);
            let decision = strategy.decide(&candles[from..=i]);
            tracker.apply_signal(
                decision.signal,
                candle.close,
                candle.timestamp,
                self.settings.position_size,
            );
            equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity: tracker.equity(),
            });
        }

        // Non-empty by construction.
        let first = candles[0];
        let last = candles[candles.len() - 1];
        tracker.force_close(last.close, last.timestamp);

        let trades = tracker.into_trades();
        info!(
            strategy = strategy.name(),
            candles = candles.len(),
            trades = trades.len(),
            "backtest complete"
        );

        BacktestResult {
            schema_version: SCHEMA_VERSION,
            strategy: strategy.name().to_string(),
            params: strategy.params(),
            initial_capital: self.settings.initial_capital,
            candle_count: candles.len(),
            dataset_hash: dataset_hash(candles),
            start: Some(first.timestamp),
            end: Some(last.timestamp),
            trades,
            equity_curve,
        }
    }
}
