//! Walk-forward validation: rolling train/test windows over a date range.
//!
//! Window k trains on `[t, t + train]` and tests on `[t + train, t + train + test]`,
//! then `t` advances by the test length. Both ranges are inclusive, so the
//! boundary candle belongs to both. Partial windows are dropped: generation
//! stops once the next test window would end after the overall end date.
//!
//! Consistency compares test Sharpe to train Sharpe, capped at 1.0.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use edgelab_core::domain::Candle;
use edgelab_core::stats::mean;
use edgelab_core::strategy::Strategy;

use crate::metrics::Metrics;
use crate::runner::Backtester;

// ─── Configuration ───────────────────────────────────────────────────

/// Upper bound accepted for either window length (100 years).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Train window length in calendar days (default 252).
    pub train_days: u32,
    /// Test window length in calendar days (default 63).
    pub test_days: u32,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_days: 252,
            test_days: 63,
        }
    }
}

impl WalkForwardConfig {
    pub fn train_length(&self) -> Duration {
        Duration::days(i64::from(self.train_days))
    }

    pub fn test_length(&self) -> Duration {
        Duration::days(i64::from(self.test_days))
    }

    /// Rejects zero lengths and lengths above `MAX_WINDOW_DAYS`.
    pub fn validate(&self) -> Result<(), String> {
        for (name, days) in [("train_days", self.train_days), ("test_days", self.test_days)] {
            if days == 0 || days > MAX_WINDOW_DAYS {
                return Err(format!(
                    "{name} must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
                ));
            }
        }
        Ok(())
    }

    /// All complete (train, test) window pairs between `start` and `end`.
    ///
    /// A window whose bounds overflow the calendar ends generation.
    pub fn windows(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<WindowSpec> {
        let (train, test) = (self.train_length(), self.test_length());
        if test <= Duration::zero() {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut t = start;
        loop {
            let Some(train_end) = t.checked_add_signed(train) else {
                break;
            };
            let Some(test_end) = train_end.checked_add_signed(test) else {
                break;
            };
            if test_end > end {
                break;
            }
            out.push(WindowSpec {
                index: out.len(),
                train_start: t,
                train_end,
                test_start: train_end,
                test_end,
            });
            t += test;
        }
        out
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Date bounds of one window pair. All bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub index: usize,
    pub train_start: NaiveDateTime,
    pub train_end: NaiveDateTime,
    pub test_start: NaiveDateTime,
    pub test_end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub window: WindowSpec,
    pub train: Metrics,
    pub test: Metrics,
    pub consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub strategy: String,
    pub windows: Vec<WindowReport>,
    /// Mean window consistency; 0 with no windows.
    pub average_consistency: f64,
}

/// `min(test_sharpe / train_sharpe, 1.0)`, or 0 when the train Sharpe is 0.
pub fn consistency(train_sharpe: f64, test_sharpe: f64) -> f64 {
    if train_sharpe == 0.0 {
        return 0.0;
    }
    (test_sharpe / train_sharpe).min(1.0)
}

// ─── Execution ───────────────────────────────────────────────────────

/// Run `strategy` over every window pair in `[start, end]`.
pub fn run_walk_forward<S: Strategy + ?Sized>(
    backtester: &Backtester,
    config: &WalkForwardConfig,
    strategy: &S,
    candles: &[Candle],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> WalkForwardReport {
    let windows: Vec<WindowReport> = config
        .windows(start, end)
        .into_iter()
        .map(|window| {
            let train = backtester
                .run(strategy, candles, window.train_start, window.train_end)
                .metrics();
            let test = backtester
                .run(strategy, candles, window.test_start, window.test_end)
                .metrics();
            let consistency = consistency(train.sharpe_ratio, test.sharpe_ratio);
            debug!(
                window = window.index,
                train_sharpe = train.sharpe_ratio,
                test_sharpe = test.sharpe_ratio,
                consistency,
                "walk-forward window"
            );
            WindowReport {
                window,
                train,
                test,
                consistency,
            }
        })
        .collect();

    let scores: Vec<f64> = windows.iter().map(|w| w.consistency).collect();
    let average_consistency = mean(&scores);
    info!(
        strategy = strategy.name(),
        windows = windows.len(),
        average_consistency,
        "walk-forward complete"
    );

    WalkForwardReport {
        strategy: strategy.name().to_string(),
        windows,
        average_consistency,
    }
}
