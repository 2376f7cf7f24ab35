//! Single-LFO modulation with mutually exclusive AM and FM.

use std::f64::consts::TAU;

use super::mapping::{exp_map, unit};

/// Sine LFO.
#[derive(Debug, Clone)]
pub struct Lfo {
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new(sample_rate: f64, frequency: f64) -> Self {
        Lfo { frequency, phase: 0.0, sample_rate }
    }

    /// Advance one sample and return the new value in [-1, 1].
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.phase = (self.phase + TAU * self.frequency / self.sample_rate).rem_euclid(TAU);
        self.phase.sin()
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Per-sample modulation outputs. `am` multiplies amplitude, `fm`
/// multiplies frequency; at most one of them differs from 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationState {
    pub lfo: f64,
    pub am: f64,
    pub fm: f64,
}

#[derive(Debug, Clone)]
pub struct ModulationModule {
    lfo: Lfo,
    am_depth: f64,
    fm_depth: f64,
}

impl ModulationModule {
    pub fn new(sample_rate: f64) -> Self {
        ModulationModule {
            lfo: Lfo::new(sample_rate, 5.0),
            am_depth: 0.0,
            fm_depth: 0.0,
        }
    }

    /// Exponential 0.1 Hz to 20 Hz.
    pub fn set_frequency(&mut self, v: f64) {
        self.lfo.frequency = exp_map(v, 0.1, 20.0);
    }

    pub fn frequency(&self) -> f64 {
        self.lfo.frequency
    }

    /// Bipolar control: below 0.5 is AM depth, above 0.5 is FM depth,
    /// 0.5 is off.
    pub fn set_type_level(&mut self, v: f64) {
        let v = unit(v);
        if v < 0.5 {
            self.am_depth = (0.5 - v) * 2.0;
            self.fm_depth = 0.0;
        } else {
            self.am_depth = 0.0;
            self.fm_depth = (v - 0.5) * 2.0;
        }
    }

    #[inline]
    pub fn process(&mut self) -> ModulationState {
        let lfo = self.lfo.next_sample();
        ModulationState {
            lfo,
            am: 1.0 - self.am_depth * 0.5 + lfo * self.am_depth * 0.5,
            fm: 1.0 + lfo * self.fm_depth * 0.1,
        }
    }

    pub fn reset(&mut self) {
        self.lfo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn run(type_level: f64) -> Vec<ModulationState> {
        let mut m = ModulationModule::new(SR);
        m.set_frequency(1.0);
        m.set_type_level(type_level);
        (0..SR as usize).map(|_| m.process()).collect()
    }

    #[test]
    fn am_and_fm_are_exclusive() {
        for k in 0..=20 {
            let v = k as f64 / 20.0;
            for s in run(v) {
                if v < 0.5 {
                    assert!((s.fm - 1.0).abs() < 0.001, "FM leaked at {v}: {}", s.fm);
                }
                if v > 0.5 {
                    assert!((s.am - 1.0).abs() < 0.001, "AM leaked at {v}: {}", s.am);
                }
            }
        }
    }

    #[test]
    fn centre_is_silent() {
        for s in run(0.5) {
            assert_eq!(s.am, 1.0);
            assert_eq!(s.fm, 1.0);
        }
    }

    #[test]
    fn full_depth_ranges() {
        let am = run(0.0);
        let lo = am.iter().map(|s| s.am).fold(f64::MAX, f64::min);
        let hi = am.iter().map(|s| s.am).fold(f64::MIN, f64::max);
        assert!(lo >= 0.0 && lo < 0.01, "AM minimum {lo}");
        assert!(hi <= 1.0 && hi > 0.99, "AM maximum {hi}");

        let fm = run(1.0);
        let lo = fm.iter().map(|s| s.fm).fold(f64::MAX, f64::min);
        let hi = fm.iter().map(|s| s.fm).fold(f64::MIN, f64::max);
        assert!((lo - 0.9).abs() < 0.001 && (hi - 1.1).abs() < 0.001, "FM {lo}..{hi}");
    }

    #[test]
    fn frequency_mapping() {
        let mut m = ModulationModule::new(SR);
        m.set_frequency(0.0);
        assert!((m.frequency() - 0.1).abs() < 1e-12);
        m.set_frequency(1.0);
        assert!((m.frequency() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restarts_phase() {
        let mut m = ModulationModule::new(SR);
        m.set_type_level(0.0);
        let first = m.process();
        for _ in 0..1234 {
            m.process();
        }
        m.reset();
        assert_eq!(m.process(), first);
    }
}
