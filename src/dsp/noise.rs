//! Noise generators.
//!
//! Each consumer owns its own [`NoiseRng`]. Streams are PCG32 instances
//! derived from the engine seed, so a given seed always renders the same
//! audio.

use rand::Rng;
use rand_pcg::Pcg32;
use std::f64::consts::TAU;

/// Per-module random source.
#[derive(Debug, Clone)]
pub struct NoiseRng {
    rng: Pcg32,
}

impl NoiseRng {
    /// Create a generator on `stream` of the given seed. Different streams of
    /// the same seed are statistically independent.
    pub fn new(seed: u64, stream: u64) -> Self {
        NoiseRng {
            rng: Pcg32::new(seed, stream),
        }
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Uniform in [-1, 1).
    #[inline]
    pub fn bipolar(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// Uniform white noise scaled by `amplitude`.
    #[inline]
    pub fn white(&mut self, amplitude: f64) -> f64 {
        self.bipolar() * amplitude
    }

    /// Normally distributed sample (Box–Muller).
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // Keep u1 away from zero so ln() stays finite.
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        mean + z * std_dev
    }
}

/// Pink (1/f) noise using Paul Kellet's filtered-white-noise approximation.
#[derive(Debug, Clone, Default)]
pub struct PinkNoise {
    b: [f64; 7],
}

impl PinkNoise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sample(&mut self, rng: &mut NoiseRng, amplitude: f64) -> f64 {
        let white = rng.bipolar();
        let b = &mut self.b;

        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;

        pink * 0.11 * amplitude
    }

    pub fn reset(&mut self) {
        self.b = [0.0; 7];
    }
}

/// Logistic-map oscillator `x' = r·x·(1 - x)`, output rescaled to [-1, 1].
#[derive(Debug, Clone)]
pub struct ChaoticOscillator {
    r: f64,
    x: f64,
}

impl ChaoticOscillator {
    pub const MIN_R: f64 = 2.5;
    pub const MAX_R: f64 = 4.0;

    pub fn new(r: f64) -> Self {
        ChaoticOscillator {
            r: r.clamp(Self::MIN_R, Self::MAX_R),
            x: 0.5,
        }
    }

    pub fn set_r(&mut self, r: f64) {
        self.r = r.clamp(Self::MIN_R, Self::MAX_R);
    }

    #[inline]
    pub fn next_sample(&mut self, amplitude: f64) -> f64 {
        self.x = self.r * self.x * (1.0 - self.x);
        (self.x * 2.0 - 1.0) * amplitude
    }

    pub fn reset(&mut self) {
        self.x = 0.5;
    }
}
