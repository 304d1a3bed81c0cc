//! Simple moving average of close. Lookback: period - 1.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        // Each window is summed on its own, so a NaN close only affects the
        // windows that contain it.
        let warmup = self.lookback().min(candles.len());
        std::iter::repeat(f64::NAN)
            .take(warmup)
            .chain(
                candles
                    .windows(self.period)
                    .map(|w| w.iter().map(|c| c.close).sum::<f64>() / self.period as f64),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn five_period_mean() {
        let candles = candles_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&candles);
        assert_eq!(result.len(), 7);
        assert!(result[..4].iter().all(|v| v.is_nan()));
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_close_only_poisons_its_windows() {
        let mut candles = candles_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        candles[2].close = f64::NAN;
        let result = Sma::new(3).compute(&candles);
        assert!(result[2..5].iter().all(|v| v.is_nan()));
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn too_few_candles_is_all_warmup() {
        let result = Sma::new(5).compute(&candles_from_closes(&[10.0, 11.0]));
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lookback_is_period_minus_one() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(1).lookback(), 0);
    }
}
