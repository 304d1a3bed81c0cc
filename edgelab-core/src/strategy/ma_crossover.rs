//! Moving-average crossover: BUY while the fast SMA is above the slow SMA,
//! SELL while it is below.
//!
//! The signal is level-based, not edge-based. Repeated BUYs while already
//! long are no-ops in the tracker, so only the regime change trades.

use crate::domain::{Candle, Signal, SignalDecision};
use crate::indicators::{Indicator, Sma};

use super::{IndicatorSnapshot, ParamSet, Strategy};

pub const FAST_KEY: &str = "fast_ma";
pub const SLOW_KEY: &str = "slow_ma";

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossoverStrategy {
    fast: usize,
    slow: usize,
}

impl MaCrossoverStrategy {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1, "fast period must be >= 1");
        assert!(slow > fast, "slow period must be > fast period");
        Self { fast, slow }
    }
}

impl Default for MaCrossoverStrategy {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl Strategy for MaCrossoverStrategy {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn min_window(&self) -> usize {
        self.slow
    }

    fn params(&self) -> ParamSet {
        ParamSet::from([
            ("fast".to_string(), self.fast as f64),
            ("slow".to_string(), self.slow as f64),
        ])
    }

    fn calculate_indicators(&self, window: &[Candle]) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new();
        let fast = Sma::new(self.fast).latest(window);
        let slow = Sma::new(self.slow).latest(window);
        if let (Some(fast), Some(slow)) = (fast, slow) {
            snapshot.insert(FAST_KEY.to_string(), fast);
            snapshot.insert(SLOW_KEY.to_string(), slow);
        }
        snapshot
    }

    fn generate_signal(&self, indicators: &IndicatorSnapshot) -> SignalDecision {
        let (Some(&fast), Some(&slow)) = (indicators.get(FAST_KEY), indicators.get(SLOW_KEY))
        else {
            return SignalDecision::hold();
        };

        let spread = if slow != 0.0 {
            (fast - slow).abs() / slow.abs()
        } else {
            0.0
        };
        // A 1% spread is full confidence.
        let confidence = spread * 100.0;

        if fast > slow {
            SignalDecision::new(Signal::Buy, confidence)
        } else if fast < slow {
            SignalDecision::new(Signal::Sell, confidence)
        } else {
            SignalDecision::hold()
        }
    }
}
