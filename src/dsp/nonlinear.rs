//! Stateless waveshaping and saturation functions.
//!
//! Everything here is a pure function of its arguments, cheap enough to call
//! several times per sample from the excitation strategies and engines.

use std::f64::consts::PI;

/// Rational tanh approximation `x(27 + x²) / (27 + 9x²)`, hard-limited to
/// ±1 beyond |x| = 3.
#[inline]
pub fn fast_tanh(x: f64) -> f64 {
    const CLIP: f64 = 3.0;
    const NUM: f64 = 27.0;
    const DEN_SCALE: f64 = 9.0;

    if x > CLIP {
        return 1.0;
    }
    if x < -CLIP {
        return -1.0;
    }

    let x2 = x * x;
    x * (NUM + x2) / (NUM + DEN_SCALE * x2)
}

#[inline]
pub fn hard_clip(x: f64, threshold: f64) -> f64 {
    x.clamp(-threshold, threshold)
}

/// Drive-scaled tanh saturation.
#[inline]
pub fn soft_clip(x: f64, drive: f64) -> f64 {
    fast_tanh(x * drive)
}

/// `x^alpha` for positive `x`, zero otherwise. Common exponents skip `powf`.
#[inline]
pub fn power_function(x: f64, alpha: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if alpha == 1.0 {
        x
    } else if alpha == 2.0 {
        x * x
    } else if alpha == 3.0 {
        x * x * x
    } else if alpha == 0.5 {
        x.sqrt()
    } else {
        (alpha * x.ln()).exp()
    }
}

/// `x - alpha·x³`
#[inline]
pub fn cubic_waveshaper(x: f64, alpha: f64) -> f64 {
    x - alpha * x * x * x
}

/// Odd fifth-order polynomial `a1·x + a3·x³ + a5·x⁵`.
#[inline]
pub fn polynomial_waveshaper(x: f64, a1: f64, a3: f64, a5: f64) -> f64 {
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    a1 * x + a3 * x3 + a5 * x5
}

/// Sine wavefolder: `sin(x · drive · π/2)`.
#[inline]
pub fn sine_fold(x: f64, drive: f64) -> f64 {
    (x * drive * PI * 0.5).sin()
}

/// Clamp to ±`limit`, mapping NaN to silence.
///
/// `f64::clamp` propagates NaN, which would poison any feedback path the
/// value is written into.
#[inline]
pub fn bounded(x: f64, limit: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(-limit, limit) }
}
