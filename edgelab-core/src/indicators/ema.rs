//! Exponential moving average of close, seeded by the SMA of the first
//! `period` closes. Lookback: period - 1.

use super::smoothing::seeded_smoothing;
use super::{closes, Indicator};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        ema_of_series(&closes(candles), self.period)
    }
}

/// EMA over an arbitrary series (alpha = 2 / (period + 1)).
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    seeded_smoothing(values, 0, period, 2.0 / (period as f64 + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn period_one_tracks_close() {
        let result = Ema::new(1).compute(&candles_from_closes(&[100.0, 200.0, 300.0]));
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn three_period_values() {
        // alpha 0.5, seed mean(10, 11, 12) = 11, then 12 and 13.
        let result = Ema::new(3).compute(&candles_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]));
        assert!(result[..2].iter().all(|v| v.is_nan()));
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_in_seed_poisons_series() {
        let result = ema_of_series(&[f64::NAN, 1.0, 2.0], 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
