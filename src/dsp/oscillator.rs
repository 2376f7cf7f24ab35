//! Distortion-synthesis oscillators.
//!
//! Each algorithm turns one or two sine phase accumulators into a rich
//! spectrum through a closed-form nonlinearity. Two normalized parameters
//! shape the result; what they mean depends on the algorithm.

use std::f64::consts::TAU;

use log::warn;
use serde::{Deserialize, Serialize};

use super::mapping::{exp_map, unit};

const EPSILON: f64 = 1e-8;

/// Oscillator algorithm, indexed 0..=6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    /// Band-limited pulse from the Dirichlet kernel. Harmonics / tilt.
    BandLimitedPulse,
    /// Moorer single-sided discrete summation. Decay / ratio.
    DsfSingleSided,
    /// Moorer double-sided discrete summation. Decay / ratio.
    DsfDoubleSided,
    /// Saturated sine. Drive / trim.
    #[default]
    TanhSquare,
    /// Square-to-saw transform. Drive / blend.
    TanhSaw,
    /// Phase-aligned formant. Formant ratio / bandwidth.
    Paf,
    /// Modified FM. Index / ratio.
    ModFm,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::BandLimitedPulse,
        Algorithm::DsfSingleSided,
        Algorithm::DsfDoubleSided,
        Algorithm::TanhSquare,
        Algorithm::TanhSaw,
        Algorithm::Paf,
        Algorithm::ModFm,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A distortion oscillator.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub algorithm: Algorithm,
    pub frequency: f64,
    param1: f64,
    param2: f64,

    phase: f64,
    secondary_phase: f64,
    secondary_phase_neg: f64,
    mod_phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(sample_rate: f64) -> Self {
        Oscillator {
            algorithm: Algorithm::default(),
            frequency: 440.0,
            param1: 0.55,
            param2: 0.5,
            phase: 0.0,
            secondary_phase: 0.0,
            secondary_phase_neg: 0.0,
            mod_phase: 0.0,
            sample_rate,
        }
    }

    /// Select an algorithm by index. Unknown indices leave it unchanged.
    pub fn set_algorithm_index(&mut self, index: i64) {
        match Algorithm::from_index(index) {
            Some(algorithm) => self.algorithm = algorithm,
            None => warn!("unknown oscillator algorithm {index}, keeping {:?}", self.algorithm),
        }
    }

    pub fn set_param1(&mut self, v: f64) {
        self.param1 = unit(v);
    }

    pub fn set_param2(&mut self, v: f64) {
        self.param2 = unit(v);
    }

    #[inline]
    fn step(&self, phase: f64, frequency: f64) -> f64 {
        let next = phase + frequency / self.sample_rate;
        if next.is_finite() { next - next.floor() } else { 0.0 }
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let (p1, p2, f) = (self.param1, self.param2, self.frequency);
        match self.algorithm {
            Algorithm::BandLimitedPulse => self.dirichlet_pulse(p1, p2, f),
            Algorithm::DsfSingleSided => self.dsf_single(p1, p2, f),
            Algorithm::DsfDoubleSided => self.dsf_double(p1, p2, f),
            Algorithm::TanhSquare => self.tanh_square(p1, p2, f),
            Algorithm::TanhSaw => self.tanh_saw(p1, p2, f),
            Algorithm::Paf => self.paf(p1, p2, f),
            Algorithm::ModFm => self.mod_fm(p1, p2, f),
        }
    }

    fn dirichlet_pulse(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let harmonics = (1.0 + p1 * 63.0).round().max(1.0);
        let tilt_db = -3.0 + p2 * 18.0;

        self.phase = self.step(self.phase, frequency);
        let theta = self.phase * TAU;

        let numerator = ((2.0 * harmonics + 1.0) * theta * 0.5).sin();
        let denominator = (theta * 0.5).sin();
        let value = if denominator.abs() < EPSILON { 1.0 } else { numerator / denominator - 1.0 };

        value / harmonics * 10f64.powf(tilt_db / 20.0)
    }

    fn dsf_single(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let decay = (p1 * 0.98).min(0.98);
        let ratio = exp_map(p2, 0.5, 4.0);

        self.phase = self.step(self.phase, frequency);
        self.secondary_phase = self.step(self.secondary_phase, frequency * ratio);

        dsf_component(self.phase * TAU, self.secondary_phase * TAU, decay)
    }

    fn dsf_double(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let decay = (p1 * 0.96).min(0.96);
        let ratio = exp_map(p2, 0.5, 4.5);

        self.phase = self.step(self.phase, frequency);
        self.secondary_phase = self.step(self.secondary_phase, frequency * ratio);
        self.secondary_phase_neg = self.step(self.secondary_phase_neg, frequency * ratio);

        let w = self.phase * TAU;
        let positive = dsf_component(w, self.secondary_phase * TAU, decay);
        let negative = dsf_component(w, -self.secondary_phase_neg * TAU, decay);
        0.5 * (positive + negative)
    }

    fn tanh_square(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let drive = exp_map(p1, 0.05, 5.0);
        let trim = exp_map(p2, 0.2, 1.2);

        self.phase = self.step(self.phase, frequency);
        ((self.phase * TAU).sin() * drive).tanh() * trim
    }

    fn tanh_saw(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let drive = exp_map(p1, 0.05, 4.5);
        let blend = p2;

        self.phase = self.step(self.phase, frequency);
        let square = ((self.phase * TAU).sin() * drive).tanh();

        self.secondary_phase = self.step(self.secondary_phase, frequency);
        let cosine = (self.secondary_phase * TAU).cos();
        let saw = square + cosine * (1.0 - square * square);

        square * (1.0 - blend) + saw * blend
    }

    fn paf(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let ratio = exp_map(p1, 0.5, 6.0);
        let bandwidth = exp_map(p2, 50.0, 3000.0);

        self.phase = self.step(self.phase, frequency);
        self.secondary_phase = self.step(self.secondary_phase, frequency * ratio);

        let carrier = (self.secondary_phase * TAU).sin();
        let modulator = (self.phase * TAU).sin();
        let decay = (-bandwidth / self.sample_rate).exp();
        self.mod_phase = decay * self.mod_phase + (1.0 - decay) * modulator;

        carrier * (0.6 + 0.4 * self.mod_phase)
    }

    fn mod_fm(&mut self, p1: f64, p2: f64, frequency: f64) -> f64 {
        let index = exp_map(p1, 0.01, 8.0);
        let ratio = exp_map(p2, 0.25, 6.0);

        self.phase = self.step(self.phase, frequency);
        self.mod_phase = self.step(self.mod_phase, frequency * ratio);

        let carrier = (self.phase * TAU).cos();
        let modulator = (self.mod_phase * TAU).cos();
        carrier * (index * (modulator - 1.0)).exp() * (-index).exp()
    }

    /// Reset all phase accumulators.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.secondary_phase = 0.0;
        self.secondary_phase_neg = 0.0;
        self.mod_phase = 0.0;
    }
}

/// Moorer's closed-form sum of geometrically decaying partials at
/// `w + k·t`, normalized by `√(1 - a²)`.
fn dsf_component(w: f64, t: f64, decay: f64) -> f64 {
    let denominator = 1.0 - 2.0 * decay * t.cos() + decay * decay;
    if denominator.abs() < EPSILON {
        return 0.0;
    }
    let numerator = w.sin() - decay * (w - t).sin();
    numerator / denominator * (1.0 - decay * decay).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn render(algorithm: Algorithm, p1: f64, p2: f64, n: usize) -> Vec<f64> {
        let mut osc = Oscillator::new(SR);
        osc.algorithm = algorithm;
        osc.frequency = 220.0;
        osc.set_param1(p1);
        osc.set_param2(p2);
        (0..n).map(|_| osc.next_sample()).collect()
    }

    #[test]
    fn all_algorithms_finite_and_bounded() {
        for algorithm in Algorithm::ALL {
            for &(p1, p2) in &[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (0.0, 1.0), (1.0, 0.0)] {
                let out = render(algorithm, p1, p2, 4410);
                for (n, y) in out.iter().enumerate() {
                    assert!(y.is_finite(), "{algorithm:?} ({p1}, {p2}) non-finite at {n}");
                    assert!(y.abs() < 20.0, "{algorithm:?} ({p1}, {p2}) gave {y} at {n}");
                }
                let peak = out.iter().fold(0.0f64, |m, y| m.max(y.abs()));
                assert!(peak > 1e-4, "{algorithm:?} ({p1}, {p2}) is silent");
            }
        }
    }

    #[test]
    fn tanh_square_is_bounded_by_trim() {
        let out = render(Algorithm::TanhSquare, 1.0, 0.0, 4410);
        assert!(out.iter().all(|y| y.abs() <= 0.2 + 1e-12));
        let peak = out.iter().fold(0.0f64, |m, y| m.max(y.abs()));
        assert!(peak > 0.19, "hard-driven tanh should reach the trim: {peak}");
    }

    #[test]
    fn index_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::from_index(algorithm.index() as i64), Some(algorithm));
        }
        assert_eq!(Algorithm::from_index(7), None);
        assert_eq!(Algorithm::default().index(), 3);
    }

    #[test]
    fn unknown_index_keeps_current() {
        let mut osc = Oscillator::new(SR);
        osc.set_algorithm_index(5);
        assert_eq!(osc.algorithm, Algorithm::Paf);
        osc.set_algorithm_index(99);
        assert_eq!(osc.algorithm, Algorithm::Paf);
    }

    #[test]
    fn dsf_guard_returns_zero() {
        assert_eq!(dsf_component(1.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn reset_restarts_waveform() {
        let mut osc = Oscillator::new(SR);
        osc.algorithm = Algorithm::ModFm;
        let first = osc.next_sample();
        for _ in 0..321 {
            osc.next_sample();
        }
        osc.reset();
        assert_eq!(osc.next_sample(), first);
    }

    #[test]
    fn algorithm_names_serialize_camel_case() {
        let json = serde_json::to_string(&Algorithm::DsfDoubleSided).unwrap();
        assert_eq!(json, "\"dsfDoubleSided\"");
    }
}
