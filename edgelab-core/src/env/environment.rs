//! Step-wise decision environment over a candle series.
//!
//! One episode walks the series from the first index with enough lookback to
//! the last candle. Each `step` advances the cursor by one candle, applies the
//! action at the new close through a [`PositionTracker`], and returns the new
//! observation with a shaped reward. The environment owns its tracker; nothing
//! is shared between episodes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candle, Position};
use crate::engine::{PositionTracker, Transition};
use crate::indicators::{Atr, Indicator, Macd, Rsi};

use super::action::Action;
use super::reward::{RewardBreakdown, RewardWeights, StepContext};
use super::state::{EnvironmentState, NormalizationBounds, RawFeatures};

/// Immutable environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub initial_capital: f64,
    /// Candles before the first observable index.
    pub lookback: usize,
    /// Drawdown (percent) above which the episode is truncated.
    pub drawdown_critical: f64,
    pub normalization: NormalizationBounds,
    pub reward: RewardWeights,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            lookback: 20,
            drawdown_critical: 12.0,
            normalization: NormalizationBounds::default(),
            reward: RewardWeights::default(),
        }
    }
}

/// Per-step diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub price: f64,
    pub equity: f64,
    pub drawdown: f64,
    pub position: Option<Position>,
    pub transition: Transition,
    pub reward: RewardBreakdown,
    /// Why the episode ended, when it did.
    pub reason: Option<String>,
}

/// Result of one `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: EnvironmentState,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

const END_OF_DATA: &str = "end of data";
const EPISODE_FINISHED: &str = "episode already finished";

pub struct DecisionEnvironment {
    config: EnvConfig,
    candles: Vec<Candle>,
    rsi: Vec<f64>,
    macd: Vec<f64>,
    atr: Vec<f64>,
    tracker: PositionTracker,
    cursor: usize,
    terminated: bool,
    truncated: bool,
}

impl DecisionEnvironment {
    /// Build an environment and reset it. Indicator series are computed once here.
    pub fn new(candles: Vec<Candle>, config: EnvConfig) -> Self {
        let rsi = Rsi::new(14).compute(&candles);
        let macd = Macd::default().compute(&candles);
        let atr = Atr::new(14).compute(&candles);
        let tracker = PositionTracker::new(config.initial_capital);

        let mut env = Self {
            config,
            candles,
            rsi,
            macd,
            atr,
            tracker,
            cursor: 0,
            terminated: false,
            truncated: false,
        };
        env.reset();
        env
    }

    /// Start a fresh episode.
    pub fn reset(&mut self) -> EnvironmentState {
        self.tracker = PositionTracker::new(self.config.initial_capital);
        self.cursor = self.config.lookback;
        self.truncated = false;
        // Need the start candle plus at least one more to step into.
        self.terminated = self.cursor + 1 >= self.candles.len();

        if self.terminated {
            debug!(
                candles = self.candles.len(),
                lookback = self.config.lookback,
                "too few candles for an episode"
            );
            return EnvironmentState::neutral(&self.config.normalization);
        }
        self.observe()
    }

    /// Advance one candle and apply `action` at the new close.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if self.is_finished() {
            return self.finished_outcome();
        }

        let price_before = self.candles[self.cursor].close;
        self.cursor += 1;
        let candle = self.candles[self.cursor];
        let price = candle.close;

        let step_pnl = self
            .tracker
            .position()
            .map(|p| p.direction.sign() * (price - price_before) * p.size)
            .unwrap_or(0.0);

        let transition = match action {
            Action::Hold => {
                self.tracker.mark(price);
                Transition::None
            }
            Action::Close => self.tracker.close(price, candle.timestamp),
            _ => {
                let size = action.size().unwrap_or(crate::engine::DEFAULT_POSITION_SIZE);
                self.tracker
                    .apply_signal(action.signal(), price, candle.timestamp, size)
            }
        };

        let breakdown = self.config.reward.compute(&StepContext {
            action,
            transition: &transition,
            step_pnl,
            drawdown: self.tracker.drawdown(),
            trades: self.tracker.trades(),
        });

        self.terminated = self.cursor >= self.candles.len() - 1;
        self.truncated = self.tracker.drawdown() > self.config.drawdown_critical;

        let reason = if self.truncated {
            Some(format!(
                "drawdown {:.2}% exceeded critical {:.2}%",
                self.tracker.drawdown(),
                self.config.drawdown_critical
            ))
        } else if self.terminated {
            Some(END_OF_DATA.to_string())
        } else {
            None
        };
        if let Some(reason) = &reason {
            debug!(
                cursor = self.cursor,
                equity = self.tracker.equity(),
                reason = reason.as_str(),
                "episode ended"
            );
        }

        StepOutcome {
            state: self.observe(),
            reward: breakdown.total(),
            terminated: self.terminated,
            truncated: self.truncated,
            info: StepInfo {
                price,
                equity: self.tracker.equity(),
                drawdown: self.tracker.drawdown(),
                position: self.tracker.position().copied(),
                transition,
                reward: breakdown,
                reason,
            },
        }
    }

    fn finished_outcome(&self) -> StepOutcome {
        let price = self
            .candles
            .get(self.cursor.min(self.candles.len().saturating_sub(1)))
            .map(|c| c.close)
            .unwrap_or(0.0);
        let state = if self.cursor < self.candles.len() {
            self.observe()
        } else {
            EnvironmentState::neutral(&self.config.normalization)
        };
        StepOutcome {
            state,
            reward: 0.0,
            terminated: true,
            truncated: self.truncated,
            info: StepInfo {
                price,
                equity: self.tracker.equity(),
                drawdown: self.tracker.drawdown(),
                position: self.tracker.position().copied(),
                transition: Transition::None,
                reward: RewardBreakdown::default(),
                reason: Some(EPISODE_FINISHED.to_string()),
            },
        }
    }

    /// Observation at the cursor. Caller guarantees the cursor is in range.
    fn observe(&self) -> EnvironmentState {
        let candle = &self.candles[self.cursor];
        let raw = RawFeatures {
            price: candle.close,
            rsi: self.rsi[self.cursor],
            macd: self.macd[self.cursor],
            volume: candle.volume,
            equity: self.tracker.equity(),
            initial_capital: self.tracker.initial_capital(),
            drawdown: self.tracker.drawdown(),
            position_size: self.tracker.position().map(|p| p.size).unwrap_or(0.0),
            atr: self.atr[self.cursor],
            max_drawdown: self.tracker.max_drawdown(),
        };
        EnvironmentState::observe(&raw, self.tracker.trades(), &self.config.normalization)
    }

    pub fn is_finished(&self) -> bool {
        self.terminated || self.truncated
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }
}
