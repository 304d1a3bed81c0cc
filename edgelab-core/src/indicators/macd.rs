//! MACD line: EMA(fast) - EMA(slow) of close.
//! Lookback: slow - 1.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        Self {
            fast,
            slow,
            name: format!("macd_{fast}_{slow}"),
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let series = closes(candles);
        let fast = ema_of_series(&series, self.fast);
        let slow = ema_of_series(&series, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;
    use crate::indicators::assert_approx;

    #[test]
    fn macd_warmup_is_nan() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = Macd::default().compute(&candles_from_closes(&closes));
        assert!(result[24].is_nan());
        assert!(!result[25].is_nan());
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let result = Macd::new(3, 6).compute(&candles_from_closes(&[10.0; 12]));
        assert_approx(result[11], 0.0, 1e-12);
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let result = Macd::default().compute(&candles_from_closes(&closes));
        assert!(result[39] > 0.0);
    }
}
