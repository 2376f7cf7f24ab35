//! Filters: the morphing state-variable filter in the resonator loop plus
//! the small one-pole sections used around it.
//!
//! Every recursive state here is checked for finiteness after each update
//! and zeroed if it blew up, so a NaN can never circulate through a
//! feedback path.

use std::f64::consts::PI;

use super::mapping::{exp_map, unit};

const MIN_CUTOFF: f64 = 20.0;
const MAX_CUTOFF: f64 = 20_000.0;
const MIN_Q: f64 = 0.5;
const MAX_Q: f64 = 20.0;
/// Fraction of the largest stable integrator gain the filter will use.
const STABILITY_MARGIN: f64 = 0.98;

#[inline]
fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Chamberlin state-variable filter with a continuous low → band → high
/// output morph.
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    pub frequency: f64,
    pub q: f64,
    /// Output morph in [0, 1]: 0 lowpass, 0.5 bandpass, 1 highpass.
    pub shape: f64,

    f: f64,
    q_inv: f64,

    low: f64,
    band: f64,
    high: f64,

    sample_rate: f64,
}

impl StateVariableFilter {
    pub fn new(sample_rate: f64) -> Self {
        let mut svf = StateVariableFilter {
            frequency: 1000.0,
            q: 1.0,
            shape: 0.0,
            f: 0.0,
            q_inv: 1.0,
            low: 0.0,
            band: 0.0,
            high: 0.0,
            sample_rate,
        };
        svf.update_coefficients();
        svf
    }

    fn update_coefficients(&mut self) {
        let cutoff = self.frequency.min(self.sample_rate * 0.49);
        self.q_inv = 1.0 / self.q.max(MIN_Q);
        // The recursion is stable only while f² + 2f/Q < 4.
        let f_max = (self.q_inv * self.q_inv + 4.0).sqrt() - self.q_inv;
        self.f = (2.0 * (PI * cutoff / self.sample_rate).sin()).min(f_max * STABILITY_MARGIN);
    }

    /// Normalized cutoff, exponential over 20 Hz to 20 kHz.
    pub fn set_frequency(&mut self, v: f64) {
        self.set_cutoff_hz(exp_map(v, MIN_CUTOFF, MAX_CUTOFF));
    }

    pub fn set_cutoff_hz(&mut self, hz: f64) {
        self.frequency = hz;
        self.update_coefficients();
    }

    /// Normalized resonance, exponential over Q 0.5 to 20.
    pub fn set_q(&mut self, v: f64) {
        self.q = exp_map(v, MIN_Q, MAX_Q);
        self.update_coefficients();
    }

    pub fn set_shape(&mut self, v: f64) {
        self.shape = unit(v);
    }

    /// Run one step; returns `(low, band, high)`.
    #[inline]
    pub fn tick(&mut self, input: f64) -> (f64, f64, f64) {
        self.low += self.f * self.band;
        self.high = input - self.low - self.q_inv * self.band;
        self.band += self.f * self.high;

        self.low = finite_or_zero(self.low);
        self.band = finite_or_zero(self.band);
        self.high = finite_or_zero(self.high);

        (self.low, self.band, self.high)
    }

    /// Run one step and return the shape-morphed output.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let (low, band, high) = self.tick(input);
        let out = if self.shape < 0.5 {
            let t = self.shape * 2.0;
            low * (1.0 - t) + band * t
        } else {
            let t = (self.shape - 0.5) * 2.0;
            band * (1.0 - t) + high * t
        };
        finite_or_zero(out)
    }

    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
        self.high = 0.0;
    }
}

/// `y = a·x + (1 - a)·y`
#[derive(Debug, Clone, Default)]
pub struct OnePoleLowpass {
    pub coefficient: f64,
    y1: f64,
}

impl OnePoleLowpass {
    pub fn new(coefficient: f64) -> Self {
        OnePoleLowpass { coefficient, y1: 0.0 }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let a = self.coefficient;
        self.y1 = finite_or_zero(a * x + (1.0 - a) * self.y1);
        self.y1
    }

    pub fn reset(&mut self) {
        self.y1 = 0.0;
    }
}

/// `y = a·(y₁ + x - x₁)`
#[derive(Debug, Clone, Default)]
pub struct OnePoleHighpass {
    pub coefficient: f64,
    x1: f64,
    y1: f64,
}

impl OnePoleHighpass {
    pub fn new(coefficient: f64) -> Self {
        OnePoleHighpass { coefficient, x1: 0.0, y1: 0.0 }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = finite_or_zero(self.coefficient * (self.y1 + x - self.x1));
        self.x1 = finite_or_zero(x);
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// DC blocker `y = x - x₁ + r·y₁`.
#[derive(Debug, Clone)]
pub struct DcBlocker {
    r: f64,
    x1: f64,
    y1: f64,
}

impl Default for DcBlocker {
    fn default() -> Self {
        DcBlocker { r: 0.995, x1: 0.0, y1: 0.0 }
    }
}

impl DcBlocker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = x - self.x1 + self.r * self.y1;
        if !y.is_finite() {
            self.reset();
            return 0.0;
        }
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// Exponentially smoothed rectified level.
#[derive(Debug, Clone)]
pub struct AmplitudeTracker {
    coefficient: f64,
    level: f64,
}

impl AmplitudeTracker {
    /// `time` is the smoothing time constant in seconds.
    pub fn new(sample_rate: f64, time: f64) -> Self {
        AmplitudeTracker {
            coefficient: (-1.0 / (time * sample_rate).max(1.0)).exp(),
            level: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = self.coefficient;
        self.level = finite_or_zero(c * self.level + (1.0 - c) * x.abs());
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}
