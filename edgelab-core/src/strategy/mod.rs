//! Strategies: indicator snapshot in, signal out.
//!
//! A strategy sees only a causal window of candles (the current candle plus
//! its predecessors). It never sees position or equity state. The closed set
//! of variants lives in [`StrategyVariant`]; callers pick one at construction
//! through [`create_strategy`] and never switch afterwards.

pub mod factory;
pub mod ma_crossover;
pub mod rsi;

pub use factory::{create_strategy, FactoryError, StrategySpec, STRATEGY_KINDS};
pub use ma_crossover::MaCrossoverStrategy;
pub use rsi::RsiStrategy;

use std::collections::BTreeMap;

use crate::domain::{Candle, SignalDecision};

/// Named indicator values at the last candle of a window.
///
/// Ordered so that logs and exports are stable. An indicator still in warmup
/// is absent rather than NaN.
pub type IndicatorSnapshot = BTreeMap<String, f64>;

/// Parameter set a strategy was built from.
pub type ParamSet = BTreeMap<String, f64>;

/// Capability interface every strategy variant implements.
pub trait Strategy: Send + Sync {
    /// Stable kind name (e.g., "rsi", "ma_crossover").
    fn name(&self) -> &str;

    /// Minimum window length for the indicators to leave warmup.
    fn min_window(&self) -> usize;

    /// The parameters this instance was built with.
    fn params(&self) -> ParamSet;

    /// Compute indicator values at the last candle of `window`.
    fn calculate_indicators(&self, window: &[Candle]) -> IndicatorSnapshot;

    /// Map an indicator snapshot to a signal. Missing values mean HOLD.
    fn generate_signal(&self, indicators: &IndicatorSnapshot) -> SignalDecision;

    /// Convenience: indicators then signal for one window.
    fn decide(&self, window: &[Candle]) -> SignalDecision {
        self.generate_signal(&self.calculate_indicators(window))
    }
}

/// Closed set of strategy variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyVariant {
    Rsi(RsiStrategy),
    MaCrossover(MaCrossoverStrategy),
}

impl StrategyVariant {
    fn inner(&self) -> &dyn Strategy {
        match self {
            StrategyVariant::Rsi(s) => s,
            StrategyVariant::MaCrossover(s) => s,
        }
    }
}

impl Strategy for StrategyVariant {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn min_window(&self) -> usize {
        self.inner().min_window()
    }

    fn params(&self) -> ParamSet {
        self.inner().params()
    }

    fn calculate_indicators(&self, window: &[Candle]) -> IndicatorSnapshot {
        self.inner().calculate_indicators(window)
    }

    fn generate_signal(&self, indicators: &IndicatorSnapshot) -> SignalDecision {
        self.inner().generate_signal(indicators)
    }
}

impl From<RsiStrategy> for StrategyVariant {
    fn from(s: RsiStrategy) -> Self {
        StrategyVariant::Rsi(s)
    }
}

impl From<MaCrossoverStrategy> for StrategyVariant {
    fn from(s: MaCrossoverStrategy) -> Self {
        StrategyVariant::MaCrossover(s)
    }
}
