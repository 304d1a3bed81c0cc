//! Observation vector and its normalization constants.

use serde::{Deserialize, Serialize};

use crate::domain::ClosedTrade;
use crate::stats::{mean_over_std, tail};

/// Number of features in an [`EnvironmentState`].
pub const STATE_FEATURES: usize = 11;

/// Scaling divisors mapping raw features into [0, 1].
///
/// Empirically chosen for an instrument trading in the low thousands with
/// hourly volume in the hundreds of thousands. Re-tune per market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationBounds {
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volume: f64,
    /// Equity / initial capital is divided by this.
    pub equity_ratio: f64,
    pub drawdown: f64,
    pub position_size: f64,
    pub atr: f64,
    /// Trades considered for the rolling win rate.
    pub win_rate_window: usize,
    /// Trades considered for the rolling Sharpe estimate.
    pub sharpe_window: usize,
    /// Sharpe estimates in [-sharpe_range, sharpe_range] map onto [0, 1].
    pub sharpe_range: f64,
    pub max_drawdown: f64,
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self {
            price: 10_000.0,
            rsi: 100.0,
            macd: 100.0,
            volume: 1_000_000.0,
            equity_ratio: 2.0,
            drawdown: 50.0,
            position_size: 1.0,
            atr: 100.0,
            win_rate_window: 20,
            sharpe_window: 10,
            sharpe_range: 2.0,
            max_drawdown: 20.0,
        }
    }
}

/// Raw (unnormalized) inputs for one observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFeatures {
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volume: f64,
    pub equity: f64,
    pub initial_capital: f64,
    pub drawdown: f64,
    pub position_size: f64,
    pub atr: f64,
    pub max_drawdown: f64,
}

/// Fixed 11-feature observation, every component in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState(pub [f64; STATE_FEATURES]);

/// Divide and clamp into [0, 1]. NaN (indicator warmup) maps to `fallback`.
fn scale(value: f64, divisor: f64, fallback: f64) -> f64 {
    if value.is_nan() || divisor <= 0.0 {
        return fallback;
    }
    (value / divisor).clamp(0.0, 1.0)
}

impl EnvironmentState {
    pub const PRICE: usize = 0;
    pub const RSI: usize = 1;
    pub const MACD: usize = 2;
    pub const VOLUME: usize = 3;
    pub const EQUITY: usize = 4;
    pub const DRAWDOWN: usize = 5;
    pub const POSITION_SIZE: usize = 6;
    pub const ATR: usize = 7;
    pub const WIN_RATE: usize = 8;
    pub const SHARPE: usize = 9;
    pub const MAX_DRAWDOWN: usize = 10;

    /// Build a state from raw features and the session's closed trades.
    pub fn observe(raw: &RawFeatures, trades: &[ClosedTrade], bounds: &NormalizationBounds) -> Self {
        let equity_ratio = if raw.initial_capital > 0.0 {
            raw.equity / raw.initial_capital
        } else {
            0.0
        };

        Self([
            scale(raw.price, bounds.price, 0.0),
            scale(raw.rsi, bounds.rsi, 0.5),
            scale(raw.macd, bounds.macd, 0.0),
            scale(raw.volume, bounds.volume, 0.0),
            scale(equity_ratio, bounds.equity_ratio, 0.0),
            scale(raw.drawdown, bounds.drawdown, 0.0),
            scale(raw.position_size, bounds.position_size, 0.0),
            scale(raw.atr, bounds.atr, 0.0),
            rolling_win_rate(trades, bounds.win_rate_window),
            rolling_sharpe_feature(trades, bounds.sharpe_window, bounds.sharpe_range),
            scale(raw.max_drawdown, bounds.max_drawdown, 0.0),
        ])
    }

    /// State reported when no candle can be observed: flat, undrawn, neutral
    /// trade statistics.
    pub fn neutral(bounds: &NormalizationBounds) -> Self {
        let mut features = [0.0; STATE_FEATURES];
        features[Self::RSI] = 0.5;
        features[Self::EQUITY] = scale(1.0, bounds.equity_ratio, 0.0);
        features[Self::WIN_RATE] = 0.5;
        features[Self::SHARPE] = 0.5;
        Self(features)
    }

    pub fn features(&self) -> &[f64; STATE_FEATURES] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }
}

/// Fraction of winners among the last `window` trades; 0.5 with no trades.
pub fn rolling_win_rate(trades: &[ClosedTrade], window: usize) -> f64 {
    let recent = tail(trades, window);
    if recent.is_empty() {
        return 0.5;
    }
    recent.iter().filter(|t| t.is_winner()).count() as f64 / recent.len() as f64
}

/// mean/std of the last `window` trade profits, or `None` with fewer trades.
pub fn rolling_trade_sharpe(trades: &[ClosedTrade], window: usize) -> Option<f64> {
    if window == 0 || trades.len() < window {
        return None;
    }
    let profits: Vec<f64> = tail(trades, window).iter().map(|t| t.profit).collect();
    Some(mean_over_std(&profits))
}

fn rolling_sharpe_feature(trades: &[ClosedTrade], window: usize, range: f64) -> f64 {
    match rolling_trade_sharpe(trades, window) {
        Some(s) if range > 0.0 => ((s + range) / (2.0 * range)).clamp(0.0, 1.0),
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use chrono::NaiveDateTime;

    fn trade(profit: f64) -> ClosedTrade {
        ClosedTrade {
            direction: Direction::Buy,
            entry_price: 100.0,
            exit_price: 100.0 + profit,
            size: 1.0,
            profit,
            entry_time: NaiveDateTime::default(),
            timestamp: NaiveDateTime::default(),
        }
    }

    #[test]
    fn all_features_are_clamped() {
        let raw = RawFeatures {
            price: 50_000.0,
            rsi: 150.0,
            macd: -20.0,
            volume: 5e6,
            equity: 300.0,
            initial_capital: 100.0,
            drawdown: 80.0,
            position_size: 0.5,
            atr: f64::NAN,
            max_drawdown: 30.0,
        };
        let state = EnvironmentState::observe(&raw, &[], &NormalizationBounds::default());
        for &f in state.features() {
            assert!((0.0..=1.0).contains(&f), "feature out of range: {f}");
        }
        assert_eq!(state.get(EnvironmentState::PRICE), 1.0);
        assert_eq!(state.get(EnvironmentState::MACD), 0.0);
        assert_eq!(state.get(EnvironmentState::POSITION_SIZE), 0.5);
        assert_eq!(state.get(EnvironmentState::ATR), 0.0);
        assert_eq!(state.get(EnvironmentState::MAX_DRAWDOWN), 1.0);
    }

    #[test]
    fn equity_ratio_at_initial_capital_is_half() {
        let raw = RawFeatures {
            equity: 1000.0,
            initial_capital: 1000.0,
            ..RawFeatures::default()
        };
        let state = EnvironmentState::observe(&raw, &[], &NormalizationBounds::default());
        assert_eq!(state.get(EnvironmentState::EQUITY), 0.5);
        assert_eq!(state.get(EnvironmentState::WIN_RATE), 0.5);
        assert_eq!(state.get(EnvironmentState::SHARPE), 0.5);
    }

    #[test]
    fn win_rate_uses_last_trades_only() {
        let mut trades: Vec<ClosedTrade> = (0..20).map(|_| trade(-1.0)).collect();
        trades.extend((0..20).map(|_| trade(2.0)));
        assert_eq!(rolling_win_rate(&trades, 20), 1.0);
        assert_eq!(rolling_win_rate(&trades[..30], 20), 0.5);
    }

    #[test]
    fn sharpe_feature_needs_full_window() {
        let trades: Vec<ClosedTrade> = (0..9).map(|i| trade(i as f64)).collect();
        assert_eq!(rolling_trade_sharpe(&trades, 10), None);
        assert_eq!(rolling_sharpe_feature(&trades, 10, 2.0), 0.5);

        let equal: Vec<ClosedTrade> = (0..10).map(|_| trade(5.0)).collect();
        assert_eq!(rolling_trade_sharpe(&equal, 10), Some(0.0));
    }

    #[test]
    fn neutral_state_is_in_range() {
        let state = EnvironmentState::neutral(&NormalizationBounds::default());
        assert_eq!(state.get(EnvironmentState::EQUITY), 0.5);
        assert!(state.features().iter().all(|f| (0.0..=1.0).contains(f)));
    }
}
