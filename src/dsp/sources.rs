//! Excitation sources: DC pressure, white noise and a naive sawtooth.

use super::mapping::unit;
use super::noise::NoiseRng;

#[derive(Debug, Clone)]
pub struct Sources {
    sample_rate: f64,
    dc_level: f64,
    noise_level: f64,
    tone_level: f64,
    phase: f64,
    rng: NoiseRng,
}

impl Sources {
    pub fn new(sample_rate: f64, rng: NoiseRng) -> Self {
        Sources {
            sample_rate,
            dc_level: 0.5,
            noise_level: 0.15,
            tone_level: 0.0,
            phase: 0.0,
            rng,
        }
    }

    pub fn set_dc_level(&mut self, v: f64) {
        self.dc_level = unit(v);
    }

    pub fn set_noise_level(&mut self, v: f64) {
        self.noise_level = unit(v);
    }

    pub fn set_tone_level(&mut self, v: f64) {
        self.tone_level = unit(v);
    }

    /// Next excitation sample for a tone at `frequency` Hz.
    #[inline]
    pub fn process(&mut self, frequency: f64) -> f64 {
        if frequency.is_finite() {
            self.phase += frequency / self.sample_rate;
            self.phase = self.phase.rem_euclid(1.0);
        }

        let noise = self.rng.bipolar() * self.noise_level;
        let saw = (2.0 * self.phase - 1.0) * self.tone_level;
        self.dc_level + noise + saw
    }

    /// Levels survive; only the oscillator phase restarts.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
