//! Small descriptive-statistics helpers shared by metrics, rewards and the
//! training stop rule.

/// Arithmetic mean. 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Deviation relative to the mean below which a series counts as constant.
const RELATIVE_SPREAD_FLOOR: f64 = 1e-12;

/// Population standard deviation (ddof = 0). 0.0 for an empty slice.
///
/// A constant series whose value is not exactly representable (0.3, 0.7)
/// leaves rounding residue in the deviation; anything within
/// `RELATIVE_SPREAD_FLOOR` of the mean's magnitude is reported as 0.0.
pub fn population_std(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|&v| v == first) {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    let std = var.sqrt();
    if std <= RELATIVE_SPREAD_FLOOR * m.abs().max(f64::MIN_POSITIVE) {
        0.0
    } else {
        std
    }
}

/// mean / std, or 0.0 when the deviation is zero or the slice is empty.
pub fn mean_over_std(values: &[f64]) -> f64 {
    let std = population_std(values);
    if std > 0.0 && std.is_finite() {
        mean(values) / std
    } else {
        0.0
    }
}

/// The last `n` elements of `values` (all of them if shorter).
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}
