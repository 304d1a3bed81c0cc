//! Average True Range, Wilder-smoothed. Lookback: period.

use super::smoothing::wilder;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range per candle. The first candle has no previous close, so its
/// value is just high - low and the smoother skips it.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let first = candles.first().map(|c| c.high - c.low);
    first
        .into_iter()
        .chain(candles.windows(2).map(|w| {
            let (prev_close, c) = (w[0].close, &w[1]);
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        }))
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        wilder(&true_range(candles), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::{Duration, NaiveDateTime};

    fn bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        ohlc.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: NaiveDateTime::default() + Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn gap_up_uses_previous_close() {
        let tr = true_range(&bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0),
        ]));
        assert_eq!(tr, vec![5.0, 15.0]);
    }

    #[test]
    fn three_period_smoothing() {
        // True ranges after the first candle: 8, 9, 6, 6.
        let candles = bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
        ]);
        let result = Atr::new(3).compute(&candles);
        assert!(result[2].is_nan());
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_input() {
        assert!(true_range(&[]).is_empty());
        assert!(Atr::new(14).compute(&[]).is_empty());
    }
}
