//! RSI mean-reversion: BUY below the oversold line, SELL above overbought.

use crate::domain::{Candle, Signal, SignalDecision};
use crate::indicators::{Indicator, Rsi};

use super::{IndicatorSnapshot, ParamSet, Strategy};

pub const RSI_KEY: &str = "rsi";

#[derive(Debug, Clone, PartialEq)]
pub struct RsiStrategy {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiStrategy {
    /// Callers are expected to validate through the factory; the bounds here
    /// are only asserted.
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        assert!(
            (0.0..overbought).contains(&oversold) && overbought <= 100.0,
            "RSI thresholds must satisfy 0 <= oversold < overbought <= 100"
        );
        Self {
            period,
            oversold,
            overbought,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn min_window(&self) -> usize {
        self.period + 1
    }

    fn params(&self) -> ParamSet {
        ParamSet::from([
            ("period".to_string(), self.period as f64),
            ("oversold".to_string(), self.oversold),
            ("overbought".to_string(), self.overbought),
        ])
    }

    fn calculate_indicators(&self, window: &[Candle]) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new();
        if let Some(rsi) = Rsi::new(self.period).latest(window) {
            snapshot.insert(RSI_KEY.to_string(), rsi);
        }
        snapshot
    }

    fn generate_signal(&self, indicators: &IndicatorSnapshot) -> SignalDecision {
        let Some(&rsi) = indicators.get(RSI_KEY) else {
            return SignalDecision::hold();
        };

        // Confidence grows with the distance past the threshold.
        if rsi < self.oversold {
            let depth = if self.oversold > 0.0 {
                (self.oversold - rsi) / self.oversold
            } else {
                1.0
            };
            SignalDecision::new(Signal::Buy, depth)
        } else if rsi > self.overbought {
            let room = 100.0 - self.overbought;
            let depth = if room > 0.0 {
                (rsi - self.overbought) / room
            } else {
                1.0
            };
            SignalDecision::new(Signal::Sell, depth)
        } else {
            SignalDecision::hold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;

    fn snapshot(rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot::from([(RSI_KEY.to_string(), rsi)])
    }

    #[test]
    fn thresholds_map_to_signals() {
        let s = RsiStrategy::default();
        assert_eq!(s.generate_signal(&snapshot(20.0)).signal, Signal::Buy);
        assert_eq!(s.generate_signal(&snapshot(80.0)).signal, Signal::Sell);
        assert_eq!(s.generate_signal(&snapshot(50.0)).signal, Signal::Hold);
        // Thresholds themselves are not crossings.
        assert_eq!(s.generate_signal(&snapshot(30.0)).signal, Signal::Hold);
        assert_eq!(s.generate_signal(&snapshot(70.0)).signal, Signal::Hold);
    }

    #[test]
    fn confidence_is_bounded() {
        let s = RsiStrategy::default();
        let buy = s.generate_signal(&snapshot(0.0));
        assert_eq!(buy.confidence, 1.0);
        let sell = s.generate_signal(&snapshot(85.0));
        assert!((sell.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn falling_prices_trigger_buy() {
        let closes: Vec<f64> = (0..21).map(|i| 200.0 - 3.0 * i as f64).collect();
        let s = RsiStrategy::default();
        let decision = s.decide(&candles_from_closes(&closes));
        assert_eq!(decision.signal, Signal::Buy);
    }

    #[test]
    fn warmup_window_has_no_rsi() {
        let s = RsiStrategy::default();
        let window = candles_from_closes(&[100.0; 14]);
        assert!(s.calculate_indicators(&window).is_empty());
    }
}
