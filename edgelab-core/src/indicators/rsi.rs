//! Relative Strength Index over close-to-close changes, Wilder-smoothed.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), first valid at index `period`.
//! A window with no movement reads 50.

use super::smoothing::wilder;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        // Index 0 has no previous close; the smoother never reads it.
        let (gains, losses): (Vec<f64>, Vec<f64>) = std::iter::once((f64::NAN, f64::NAN))
            .chain(candles.windows(2).map(|w| {
                let change = w[1].close - w[0].close;
                if change.is_nan() {
                    (f64::NAN, f64::NAN)
                } else {
                    (change.max(0.0), (-change).max(0.0))
                }
            }))
            .take(candles.len())
            .unzip();

        wilder(&gains, self.period)
            .into_iter()
            .zip(wilder(&losses, self.period))
            .map(|(g, l)| strength_index(g, l))
            .collect()
    }
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;
    use crate::indicators::assert_approx;

    #[test]
    fn steady_rise_saturates_at_100() {
        let candles = candles_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_approx(Rsi::new(3).compute(&candles)[3], 100.0, 1e-6);
    }

    #[test]
    fn steady_fall_reads_zero() {
        let candles = candles_from_closes(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_approx(Rsi::new(3).compute(&candles)[3], 0.0, 1e-6);
    }

    #[test]
    fn flat_prices_are_neutral() {
        let result = Rsi::new(14).compute(&candles_from_closes(&[50.0; 30]));
        assert!(result[13].is_nan());
        assert!(result[14..].iter().all(|&v| v == 50.0));
    }

    #[test]
    fn choppy_prices_stay_in_range() {
        let candles =
            candles_from_closes(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&candles);
        assert_eq!(result.len(), candles.len());
        for v in result.into_iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(&v), "rsi out of range: {v}");
        }
    }

    #[test]
    fn empty_input() {
        assert!(Rsi::new(14).compute(&[]).is_empty());
    }
}
