//! Attack/release envelope generator.

use super::mapping::exp_map;

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Release,
}

/// Time bounds (seconds) for the exponential attack/release controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeRange {
    pub attack_min: f64,
    pub attack_max: f64,
    pub release_min: f64,
    pub release_max: f64,
}

impl EnvelopeRange {
    /// Bounds used by the modular PM synth and the distortion synth.
    pub const STANDARD: EnvelopeRange = EnvelopeRange {
        attack_min: 0.001,
        attack_max: 1.0,
        release_min: 0.01,
        release_max: 3.0,
    };

    /// Bounds used by the clarinet.
    pub const CLARINET: EnvelopeRange = EnvelopeRange {
        attack_min: 0.001,
        attack_max: 0.5,
        release_min: 0.01,
        release_max: 2.0,
    };
}

/// Linear AR envelope.
///
/// While the gate is held the level climbs by `1 / (attack · sr)` per sample
/// and parks at 1.0; once released it falls by `1 / (release · sr)` per
/// sample. Reaching 0.0 in release deactivates the envelope. A retrigger
/// continues from the current level instead of jumping to zero.
#[derive(Debug, Clone)]
pub struct Envelope {
    range: EnvelopeRange,
    sample_rate: f64,
    attack: f64,
    release: f64,
    attack_rate: f64,
    release_rate: f64,

    stage: Stage,
    gate: bool,
    level: f64,
}

impl Envelope {
    pub fn new(sample_rate: f64, range: EnvelopeRange) -> Self {
        let mut env = Envelope {
            range,
            sample_rate,
            attack: range.attack_min,
            release: range.release_min,
            attack_rate: 0.0,
            release_rate: 0.0,
            stage: Stage::Idle,
            gate: false,
            level: 0.0,
        };
        env.set_attack_seconds(0.01);
        env.set_release_seconds(0.05);
        env
    }

    /// Map a normalized control onto the attack range.
    pub fn set_attack(&mut self, v: f64) {
        self.set_attack_seconds(exp_map(v, self.range.attack_min, self.range.attack_max));
    }

    /// Map a normalized control onto the release range.
    pub fn set_release(&mut self, v: f64) {
        self.set_release_seconds(exp_map(v, self.range.release_min, self.range.release_max));
    }

    pub fn set_attack_seconds(&mut self, seconds: f64) {
        self.attack = seconds;
        self.attack_rate = self.rate_for(seconds);
    }

    pub fn set_release_seconds(&mut self, seconds: f64) {
        self.release = seconds;
        self.release_rate = self.rate_for(seconds);
    }

    pub fn attack_seconds(&self) -> f64 {
        self.attack
    }

    pub fn release_seconds(&self) -> f64 {
        self.release
    }

    fn rate_for(&self, seconds: f64) -> f64 {
        let samples = seconds * self.sample_rate;
        if samples.is_finite() { 1.0 / samples.max(1.0) } else { 1.0 }
    }

    pub fn set_gate(&mut self, gate: bool) {
        self.gate = gate;
        if gate {
            self.stage = Stage::Attack;
        } else if self.stage != Stage::Idle {
            self.stage = Stage::Release;
        }
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Force a fresh attack ramp: level to zero, envelope active.
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.stage = if self.gate { Stage::Attack } else { Stage::Release };
    }

    /// Generate the next envelope sample in [0, 1].
    pub fn process(&mut self) -> f64 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                self.level = (self.level + self.attack_rate).min(1.0);
            }
            Stage::Release => {
                self.level -= self.release_rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    pub fn value(&self) -> f64 {
        self.level
    }

    /// True until a release has run all the way down to zero.
    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }
}
