//! Normalized-control helpers shared by every module setter.

/// Exponential map of a normalized `[0, 1]` control onto `[min, max]`:
/// `min · (max/min)^v`. Both bounds must be positive.
#[inline]
pub fn exp_map(v: f64, min: f64, max: f64) -> f64 {
    min * (max / min).powf(unit(v))
}

/// Inverse of [`exp_map`]: the normalized control that produces `value`.
pub fn exp_unmap(value: f64, min: f64, max: f64) -> f64 {
    unit((value / min).ln() / (max / min).ln())
}

/// Clamp a control into `[0, 1]`. NaN maps to 0 so a bad host value can
/// never reach the signal path.
#[inline]
pub fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
