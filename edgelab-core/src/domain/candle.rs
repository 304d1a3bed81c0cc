//! Candle: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV candle for a single instrument over one period.
///
/// Candles are supplied by an external collaborator and never mutated by the
/// engine. A series is ordered by `timestamp` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Errors from candle series validation.
#[derive(Debug, Error, PartialEq)]
pub enum CandleError {
    #[error("candle {index} at {timestamp} is not after the previous candle")]
    OutOfOrder {
        index: usize,
        timestamp: NaiveDateTime,
    },
    #[error("candle {index} at {timestamp} has inconsistent OHLCV values")]
    Insane {
        index: usize,
        timestamp: NaiveDateTime,
    },
}

/// Check that a series is strictly ascending by timestamp and every candle is sane.
pub fn validate_series(candles: &[Candle]) -> Result<(), CandleError> {
    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_sane() {
            return Err(CandleError::Insane {
                index,
                timestamp: candle.timestamp,
            });
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(CandleError::OutOfOrder {
                index,
                timestamp: candle.timestamp,
            });
        }
    }
    Ok(())
}

/// Slice of `candles` whose timestamps fall inside `[start, end]`.
///
/// Relies on the series being sorted ascending.
pub fn filter_range(candles: &[Candle], start: NaiveDateTime, end: NaiveDateTime) -> &[Candle] {
    if start > end {
        return &candles[0..0];
    }
    let lo = candles.partition_point(|c| c.timestamp < start);
    let hi = candles.partition_point(|c| c.timestamp <= end);
    &candles[lo..hi.max(lo)]
}

/// Build candles from close prices for tests and benches.
///
/// Hourly candles starting 2024-01-02 00:00: open = previous close,
/// high/low = max/min(open, close) ± 1.0, volume = 1000.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}
