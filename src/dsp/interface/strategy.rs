//! Per-variant excitation transfer functions.
//!
//! Each strategy receives the enveloped source sample and the current
//! intensity in `[0, 1]`, and returns a sample bounded to `[-1, 1]`
//! (Flute: `[-0.49, 0.49]`).

use std::f64::consts::TAU;

use crate::dsp::filter::AmplitudeTracker;
use crate::dsp::noise::{ChaoticOscillator, NoiseRng};
use crate::dsp::nonlinear::{bounded, cubic_waveshaper, fast_tanh, power_function, sine_fold, soft_clip};

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Output bound of the flute jet.
pub const FLUTE_LIMIT: f64 = 0.49;

/// `Math.sign`-style sign: zero stays zero.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Plucked-string peak follower.
#[derive(Debug, Clone, Default)]
pub struct Pluck {
    last_peak: f64,
    prev: f64,
}

impl Pluck {
    pub fn process(&mut self, x: f64, intensity: f64) -> f64 {
        let brightness = 0.2 + intensity * 0.45;
        let response = if x.abs() > self.last_peak.abs() {
            self.last_peak = x;
            x
        } else {
            self.last_peak *= 0.999;
            x * (0.35 + (1.0 - intensity) * 0.45) + (x - self.prev) * brightness
        };
        self.prev = x;
        bounded(response, 1.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Mallet strike: sine fold followed by power-law sharpening.
pub fn hit(x: f64, intensity: f64) -> f64 {
    let drive = 2.0 + intensity * 8.0;
    let folded = sine_fold(x, drive);
    let sharpened = sign(folded) * power_function(folded.abs(), 0.35 + intensity * 0.55);
    bounded(sharpened, 1.0)
}

/// Single reed: biased tanh saturation.
pub fn reed(x: f64, intensity: f64) -> f64 {
    let stiffness = 2.5 + intensity * 10.0;
    let bias = (intensity - 0.5) * 0.25;
    let shaped = fast_tanh((x + bias) * stiffness) * (0.6 + intensity * 0.5) - bias * 0.3;
    bounded(shaped, 1.0)
}

/// Air jet: breath noise plus soft cubic saturation.
pub fn flute(x: f64, intensity: f64, rng: &mut NoiseRng) -> f64 {
    let softness = 0.45 + intensity * 0.4;
    let breath = rng.white(intensity * 0.04);
    let mixed = (x + breath) * softness;
    let shaped = mixed - mixed * mixed * mixed * 0.35;
    bounded(shaped, FLUTE_LIMIT)
}

/// Lip reed with asymmetric positive/negative branches.
pub fn brass(x: f64, intensity: f64) -> f64 {
    let drive = 1.5 + intensity * 5.0;
    let shaped = if x >= 0.0 {
        fast_tanh((x * drive + 0.2 + intensity * 0.35).max(0.0))
    } else {
        let compressed = (-x * drive * (0.4 + intensity * 0.4)).min(1.5);
        -power_function(compressed, 1.3) * (0.35 + (1.0 - intensity) * 0.25)
    };
    let out = fast_tanh(shaped * (1.2 + intensity * 1.5)) + intensity * 0.05;
    bounded(out, 1.0)
}

/// Stick-slip bow friction.
#[derive(Debug, Clone, Default)]
pub struct Bow {
    state: f64,
}

impl Bow {
    pub fn process(&mut self, x: f64, intensity: f64, rng: &mut NoiseRng) -> f64 {
        let velocity = intensity * 0.9 + 0.2;
        let slip = x - self.state;
        let friction = fast_tanh(slip * (6.0 + intensity * 12.0));
        let grit = rng.white(intensity * 0.012);
        let out = friction * (0.55 + intensity * 0.35) + slip * 0.25 + grit;

        let stick = 0.8 - intensity * 0.25;
        self.state = self.state * stick + (x + friction * velocity * 0.05) * (1.0 - stick);
        if !self.state.is_finite() {
            self.state = 0.0;
        }
        bounded(out, 1.0)
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Two inharmonic sine partials.
#[derive(Debug, Clone, Default)]
pub struct Bell {
    phase: f64,
}

impl Bell {
    pub fn process(&mut self, x: f64, intensity: f64) -> f64 {
        self.phase = (self.phase + 0.1 + intensity * 0.25).rem_euclid(TAU);
        let spread = 6.0 + intensity * 14.0;
        let even = (x * spread + self.phase).sin() * (0.4 + intensity * 0.4);
        let odd = (x * (spread * 0.5 + 2.0)).sin() * (0.2 + intensity * 0.3);
        bounded(fast_tanh((even + odd) * (1.1 + intensity * 0.6)), 1.0)
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Membrane: leaky energy accumulator plus a driven hit.
#[derive(Debug, Clone, Default)]
pub struct Drum {
    energy: f64,
}

impl Drum {
    pub fn process(&mut self, x: f64, intensity: f64, rng: &mut NoiseRng) -> f64 {
        let drive = 1.2 + intensity * 2.2;
        let noise = rng.white(0.02 + intensity * 0.06);
        self.energy = self.energy * (0.7 - intensity * 0.2) + x.abs() * (0.6 + intensity * 0.7);
        if !self.energy.is_finite() {
            self.energy = 0.0;
        }

        let hit = (x * drive).tanh() + noise;
        let out = hit * (0.4 + intensity * 0.4) + sign(hit) * (self.energy * 0.6).min(0.8);
        bounded(out, 1.0)
    }

    pub fn reset(&mut self) {
        self.energy = 0.0;
    }
}

/// Three golden-ratio integrators, cross-multiplied.
#[derive(Debug, Clone, Default)]
pub struct Crystal {
    p1: f64,
    p2: f64,
    p3: f64,
}

impl Crystal {
    pub fn process(&mut self, x: f64, intensity: f64) -> f64 {
        self.p1 = self.p1 * 0.98 + x;
        self.p2 = self.p2 * 0.95 + x * GOLDEN_RATIO;
        self.p3 = self.p3 * 0.92 + x * GOLDEN_RATIO * GOLDEN_RATIO;

        let q1 = x * (1.0 + self.p1 * 0.3);
        let q2 = x * (1.0 + self.p2 * 0.3);
        let q3 = x * (1.0 + self.p3 * 0.3);

        let ring = (q1 * q2 + q2 * q3 + q1 * q3) * 0.1;
        let coupled = (q1 + q2 + q3) / 3.0 + intensity * 0.3 * ring;
        bounded(cubic_waveshaper(coupled, intensity * 0.2), 1.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Three logistic-map oscillators with two samples of output feedback.
#[derive(Debug, Clone)]
pub struct Vapor {
    chaos: [ChaoticOscillator; 3],
    prev1: f64,
    prev2: f64,
}

impl Default for Vapor {
    fn default() -> Self {
        Vapor {
            chaos: [
                ChaoticOscillator::new(3.7),
                ChaoticOscillator::new(3.8),
                ChaoticOscillator::new(3.9),
            ],
            prev1: 0.0,
            prev2: 0.0,
        }
    }
}

impl Vapor {
    pub fn process(&mut self, x: f64, intensity: f64) -> f64 {
        let r = 2.5 + intensity * 1.5;
        let mut chaos_sum = 0.0;
        for (k, osc) in self.chaos.iter_mut().enumerate() {
            osc.set_r(r + k as f64 * 0.1);
            chaos_sum += osc.next_sample(0.3);
        }

        let amount = intensity * 0.6;
        let mixed = x * (1.0 - amount * 0.5) + chaos_sum * amount;
        let feedback = (self.prev1 * 0.3 + self.prev2 * 0.2) * amount;
        let out = bounded(soft_clip(mixed + feedback, 1.2), 1.0);

        self.prev2 = self.prev1;
        self.prev1 = out;
        out
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Bit-depth reduction with dither at quantization boundaries.
pub fn quantum(x: f64, intensity: f64, rng: &mut NoiseRng) -> f64 {
    let bits = 8.0 - (intensity * 5.0).floor();
    let levels = bits.exp2();
    let scaled = x * levels;
    let rounded = scaled.round();
    let mut out = rounded / levels;
    if (scaled - rounded).abs() > 0.45 {
        out += rng.white(intensity * 0.01);
    }
    bounded(out, 1.0)
}

/// Amplitude-dependent allpass dispersion with self-focusing phase.
#[derive(Debug, Clone)]
pub struct Plasma {
    tracker: AmplitudeTracker,
    phase: f64,
    x1: f64,
    y1: f64,
}

impl Plasma {
    const MAX_COEFFICIENT: f64 = 0.95;

    pub fn new(sample_rate: f64) -> Self {
        Plasma {
            tracker: AmplitudeTracker::new(sample_rate, 0.001),
            phase: 0.0,
            x1: 0.0,
            y1: 0.0,
        }
    }

    pub fn process(&mut self, x: f64, intensity: f64) -> f64 {
        let amp = self.tracker.process(x);

        self.phase = (self.phase + 0.1 * (1.0 + intensity * 0.3 * amp)).rem_euclid(TAU);
        let freq_mod = self.phase.sin() * amp * intensity * 0.5;

        let c = (0.3 + amp * intensity * 0.4).min(Self::MAX_COEFFICIENT);
        let dispersed = c * x + self.x1 - c * self.y1;
        self.x1 = x;
        self.y1 = if dispersed.is_finite() { dispersed } else { 0.0 };

        let mut out = dispersed + freq_mod;
        if intensity > 0.5 {
            out = cubic_waveshaper(out, (intensity - 0.5) * 0.4);
        }
        bounded(out, 1.0)
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
        self.phase = 0.0;
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn pluck_passes_new_peaks_through() {
        let mut p = Pluck::default();
        assert_eq!(p.process(0.5, 0.5), 0.5);
        assert_eq!(p.process(-0.8, 0.5), -0.8);
        let below = p.process(0.1, 0.5);
        assert!(below != 0.1, "sub-peak input should be reshaped");
    }

    #[test]
    fn hit_is_odd() {
        for i in 1..10 {
            let x = i as f64 * 0.1;
            assert!((hit(x, 0.4) + hit(-x, 0.4)).abs() < 1e-12);
        }
        assert_eq!(hit(0.0, 0.7), 0.0);
    }

    #[test]
    fn reed_centered_at_half_intensity() {
        assert!(reed(0.0, 0.5).abs() < 1e-12);
        assert!(reed(1.0, 0.5) > 0.5);
        assert!(reed(-1.0, 0.5) < -0.5);
    }

    #[test]
    fn flute_breath_is_always_present() {
        let mut rng = NoiseRng::new(1, 1);
        assert_eq!(flute(0.0, 0.0, &mut rng), 0.0);
        let breath: Vec<f64> = (0..64).map(|_| flute(0.0, 1.0, &mut rng)).collect();
        assert!(breath.iter().all(|s| s.abs() <= 0.04));
        assert!(breath.iter().any(|&s| s != 0.0), "no breath noise without input");
    }

    #[test]
    fn brass_is_asymmetric() {
        let pos = brass(0.5, 0.5);
        let neg = brass(-0.5, 0.5);
        assert!((pos + neg).abs() > 0.05, "brass looks symmetric: {pos} / {neg}");
    }

    #[test]
    fn vapor_reset_restores_logistic_seeds() {
        let mut v = Vapor::default();
        let first = v.process(0.2, 0.8);
        for _ in 0..50 {
            v.process(0.2, 0.8);
        }
        v.reset();
        assert_eq!(v.process(0.2, 0.8), first);
    }

    #[test]
    fn quantum_steps_match_bit_depth() {
        let mut rng = NoiseRng::new(5, 5);
        // Intensity 0: 8 bits, 256 levels.
        let q = quantum(0.3, 0.0, &mut rng);
        assert!((q - (0.3f64 * 256.0).round() / 256.0).abs() < 1e-12);
        // Intensity 1: 3 bits, 8 levels.
        let q = quantum(0.3, 1.0, &mut rng);
        assert!((q - 0.25).abs() < 0.011, "got {q}");
    }

    #[test]
    fn plasma_reset_clears_history() {
        let mut p = Plasma::new(44100.0);
        let first = p.process(0.3, 0.7);
        for _ in 0..100 {
            p.process(0.9, 0.7);
        }
        p.reset();
        assert_eq!(p.process(0.3, 0.7), first);
    }

    #[test]
    fn crystal_silent_for_silence() {
        let mut c = Crystal::default();
        for _ in 0..10 {
            assert_eq!(c.process(0.0, 1.0), 0.0);
        }
    }

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-2.0), -1.0);
        assert_eq!(sign(PI), 1.0);
    }
}
