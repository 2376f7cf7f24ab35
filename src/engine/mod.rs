//! Monophonic synthesis engines.
//!
//! Each engine owns its DSP modules outright and exposes the same control
//! surface through [`Synth`]: note on/off, parameter changes, and one
//! sample per `process()` call. [`Instrument`] wraps the three engines for
//! hosts that pick the engine at runtime.

pub mod clarinet;
pub mod disyn;
pub mod pm;

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::SynthError;
use crate::params::{ClarinetParam, DisynParam, ParamDescriptor, Parameter, PmParam};

pub use clarinet::ClarinetEngine;
pub use disyn::DisynEngine;
pub use pm::PmEngine;

/// Control surface shared by all engines. None of these calls can fail;
/// out-of-range values are clamped and unknown names are ignored.
pub trait Synth {
    type Param: Parameter;

    fn note_on(&mut self, frequency: f64);

    /// Engines without velocity sensitivity ignore `velocity`.
    fn note_on_with_velocity(&mut self, frequency: f64, _velocity: f64) {
        self.note_on(frequency);
    }

    fn note_off(&mut self);

    fn set_param(&mut self, param: Self::Param, value: f64);

    /// Latest value accepted for `param`.
    fn param(&self, param: Self::Param) -> f64;

    /// Produce one output sample.
    fn process(&mut self) -> f64;

    fn is_playing(&self) -> bool;

    /// Set a parameter by name. Unknown names are logged and ignored.
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match Self::Param::from_name(name) {
            Some(param) => {
                self.set_param(param, value);
                true
            }
            None => {
                warn!("ignoring unknown {} parameter '{name}'", Self::Param::ENGINE);
                false
            }
        }
    }

    /// Fill `out` with consecutive samples.
    fn process_block(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.process() as f32;
        }
    }
}

/// Lowest note frequency the engines accept.
const MIN_NOTE_FREQUENCY: f64 = 1.0;

/// Clamp a requested note frequency into `[1 Hz, Nyquist]`. Non-finite
/// requests yield `None`.
pub(crate) fn note_frequency(frequency: f64, sample_rate: f64) -> Option<f64> {
    if !frequency.is_finite() {
        warn!("ignoring note with non-finite frequency {frequency}");
        return None;
    }
    Some(frequency.clamp(MIN_NOTE_FREQUENCY, sample_rate * 0.5))
}

/// Which engine an [`Instrument`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Pm,
    Clarinet,
    Disyn,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Pm => "pm",
            EngineKind::Clarinet => "clarinet",
            EngineKind::Disyn => "disyn",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm" | "pm-synth" => Ok(EngineKind::Pm),
            "clarinet" => Ok(EngineKind::Clarinet),
            "disyn" => Ok(EngineKind::Disyn),
            _ => Err(SynthError::UnknownEngine { name: s.to_string() }),
        }
    }
}

/// One of the three engines, chosen at runtime.
#[derive(Debug, Clone)]
pub enum Instrument {
    Pm(PmEngine),
    Clarinet(ClarinetEngine),
    Disyn(DisynEngine),
}

impl Instrument {
    pub fn new(kind: EngineKind, config: EngineConfig) -> Self {
        match kind {
            EngineKind::Pm => Instrument::Pm(PmEngine::new(config)),
            EngineKind::Clarinet => Instrument::Clarinet(ClarinetEngine::new(config)),
            EngineKind::Disyn => Instrument::Disyn(DisynEngine::new(config)),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Instrument::Pm(_) => EngineKind::Pm,
            Instrument::Clarinet(_) => EngineKind::Clarinet,
            Instrument::Disyn(_) => EngineKind::Disyn,
        }
    }

    pub fn note_on(&mut self, frequency: f64) {
        self.note_on_with_velocity(frequency, 1.0);
    }

    pub fn note_on_with_velocity(&mut self, frequency: f64, velocity: f64) {
        match self {
            Instrument::Pm(e) => e.note_on_with_velocity(frequency, velocity),
            Instrument::Clarinet(e) => e.note_on_with_velocity(frequency, velocity),
            Instrument::Disyn(e) => e.note_on_with_velocity(frequency, velocity),
        }
    }

    pub fn note_off(&mut self) {
        match self {
            Instrument::Pm(e) => e.note_off(),
            Instrument::Clarinet(e) => e.note_off(),
            Instrument::Disyn(e) => e.note_off(),
        }
    }

    /// Set a parameter by name; returns false for names outside the
    /// engine's vocabulary.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match self {
            Instrument::Pm(e) => e.set_parameter(name, value),
            Instrument::Clarinet(e) => e.set_parameter(name, value),
            Instrument::Disyn(e) => e.set_parameter(name, value),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        fn lookup<S: Synth>(engine: &S, name: &str) -> Option<f64> {
            S::Param::from_name(name).map(|p| engine.param(p))
        }
        match self {
            Instrument::Pm(e) => lookup(e, name),
            Instrument::Clarinet(e) => lookup(e, name),
            Instrument::Disyn(e) => lookup(e, name),
        }
    }

    /// Every parameter with its current value, in vocabulary order.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        fn collect<S: Synth>(engine: &S) -> Vec<(&'static str, f64)> {
            S::Param::ALL.iter().map(|&p| (p.name(), engine.param(p))).collect()
        }
        match self {
            Instrument::Pm(e) => collect(e),
            Instrument::Clarinet(e) => collect(e),
            Instrument::Disyn(e) => collect(e),
        }
    }

    pub fn descriptors(&self) -> Vec<ParamDescriptor> {
        match self {
            Instrument::Pm(_) => PmParam::descriptors(),
            Instrument::Clarinet(_) => ClarinetParam::descriptors(),
            Instrument::Disyn(_) => DisynParam::descriptors(),
        }
    }

    #[inline]
    pub fn process(&mut self) -> f64 {
        match self {
            Instrument::Pm(e) => e.process(),
            Instrument::Clarinet(e) => e.process(),
            Instrument::Disyn(e) => e.process(),
        }
    }

    pub fn process_block(&mut self, out: &mut [f32]) {
        match self {
            Instrument::Pm(e) => e.process_block(out),
            Instrument::Clarinet(e) => e.process_block(out),
            Instrument::Disyn(e) => e.process_block(out),
        }
    }

    pub fn is_playing(&self) -> bool {
        match self {
            Instrument::Pm(e) => e.is_playing(),
            Instrument::Clarinet(e) => e.is_playing(),
            Instrument::Disyn(e) => e.is_playing(),
        }
    }
}
