//! Seeded exponential smoothing shared by EMA, RSI and ATR.

/// Smooths `values` with factor `alpha`, seeded by the mean of
/// `values[first..first + period]`.
///
/// The seed lands at index `first + period - 1`; everything before it is NaN.
/// A NaN inside the seed leaves the whole output NaN, and the first NaN after
/// the seed ends the series.
pub fn seeded_smoothing(values: &[f64], first: usize, period: usize, alpha: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let seed_end = first + period;
    if period == 0 || values.len() < seed_end {
        return out;
    }

    let seed = &values[first..seed_end];
    if seed.iter().any(|v| v.is_nan()) {
        return out;
    }
    let mut level = seed.iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = level;

    for (slot, &v) in out[seed_end..].iter_mut().zip(&values[seed_end..]) {
        if v.is_nan() {
            break;
        }
        level = alpha * v + (1.0 - alpha) * level;
        *slot = level;
    }
    out
}

/// Wilder smoothing (alpha = 1/period) for series whose index 0 has no
/// predecessor, such as price changes or true range.
pub fn wilder(values: &[f64], period: usize) -> Vec<f64> {
    seeded_smoothing(values, 1, period, 1.0 / period as f64)
}
