//! Causal technical indicators.
//!
//! Every indicator is a pure function: candle history in, numeric series of
//! the same length out. The first `lookback()` values are `f64::NAN` (warmup).
//!
//! No value at index t may depend on a candle after t. The decision
//! environment precomputes whole series once and reads them by cursor, which
//! is only sound because of this property.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod smoothing;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Candle;

/// A single-series indicator over a candle sequence.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;

    /// Value at the last candle, or `None` during warmup.
    fn latest(&self, candles: &[Candle]) -> Option<f64> {
        self.compute(candles).last().copied().filter(|v| !v.is_nan())
    }
}

/// Close prices of a candle slice.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candles_from_closes;

    #[test]
    fn latest_is_none_during_warmup() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        assert_eq!(Sma::new(5).latest(&candles), None);
        assert_eq!(Sma::new(2).latest(&candles), Some(1.5));
    }
}
