//! Parameter vocabularies and the normalized-value registry.
//!
//! Each engine accepts a fixed, closed set of parameter names. The registry
//! only remembers the latest normalized value per parameter; turning that
//! value into Hz, seconds or gain is the job of the receiving module.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::Serialize;

use crate::dsp::mapping::exp_unmap;

/// A closed parameter vocabulary for one engine.
pub trait Parameter: Copy + Eq + Debug + Send + 'static {
    /// Engine name used in patches and error messages.
    const ENGINE: &'static str;
    /// Every parameter, in index order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Value applied at construction.
    fn default_value(self) -> f64;

    fn index(self) -> usize;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Name/default pairs for host UIs.
    fn descriptors() -> Vec<ParamDescriptor> {
        Self::ALL
            .iter()
            .map(|p| ParamDescriptor {
                name: p.name(),
                default: p.default_value(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub default: f64,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $ty:ident, $engine:literal {
            $($variant:ident => $name:literal = $default:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $ty {
            $($variant,)+
        }

        impl Parameter for $ty {
            const ENGINE: &'static str = $engine;
            const ALL: &'static [Self] = &[$($ty::$variant,)+];

            fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            fn default_value(self) -> f64 {
                match self {
                    $($ty::$variant => $default,)+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

vocabulary! {
    /// Modular physical-modeling synth parameters.
    PmParam, "pm" {
        DcLevel => "dcLevel" = 0.5,
        NoiseLevel => "noiseLevel" = 0.15,
        ToneLevel => "toneLevel" = 0.0,
        Attack => "attack" = exp_unmap(0.01, 0.001, 1.0),
        Release => "release" = 0.28,
        InterfaceType => "interfaceType" = 2.0,
        InterfaceIntensity => "interfaceIntensity" = 0.5,
        Tuning => "tuning" = 0.5,
        Ratio => "ratio" = 0.5,
        Delay1Feedback => "delay1Feedback" = 0.45,
        Delay2Feedback => "delay2Feedback" = 0.45,
        FilterFeedback => "filterFeedback" = 0.0,
        FilterFrequency => "filterFrequency" = exp_unmap(1000.0, 20.0, 20_000.0),
        FilterQ => "filterQ" = exp_unmap(1.0, 0.5, 20.0),
        FilterShape => "filterShape" = 0.0,
        LfoFrequency => "lfoFrequency" = exp_unmap(5.0, 0.1, 20.0),
        ModulationTypeLevel => "modulationTypeLevel" = 0.5,
        ReverbSize => "reverbSize" = 0.5,
        ReverbLevel => "reverbLevel" = 0.3,
    }
}

vocabulary! {
    /// Waveguide clarinet parameters.
    ClarinetParam, "clarinet" {
        Breath => "breath" = 0.75,
        Reed => "reed" = 0.5,
        Noise => "noise" = 0.5,
        Attack => "attack" = exp_unmap(0.01, 0.001, 0.5),
        Release => "release" = exp_unmap(0.05, 0.01, 2.0),
        Damping => "damping" = 0.58,
        Brightness => "brightness" = 0.9,
        Vibrato => "vibrato" = 0.0,
    }
}

vocabulary! {
    /// Distortion-oscillator synth parameters.
    DisynParam, "disyn" {
        Algorithm => "algorithm" = 3.0,
        Param1 => "param1" = 0.55,
        Param2 => "param2" = 0.5,
        Attack => "attack" = exp_unmap(0.2, 0.001, 1.0),
        Release => "release" = exp_unmap(0.4, 0.01, 3.0),
        ReverbSize => "reverbSize" = 0.5,
        ReverbLevel => "reverbLevel" = 0.3,
        MasterGain => "masterGain" = 0.8,
    }
}

/// Latest normalized value of every parameter in `P`.
#[derive(Debug, Clone)]
pub struct ParamRegistry<P: Parameter> {
    values: Vec<f64>,
    _vocabulary: PhantomData<P>,
}

impl<P: Parameter> Default for ParamRegistry<P> {
    fn default() -> Self {
        ParamRegistry {
            values: P::ALL.iter().map(|p| p.default_value()).collect(),
            _vocabulary: PhantomData,
        }
    }
}

impl<P: Parameter> ParamRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: P) -> f64 {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: P, value: f64) {
        self.values[param.index()] = value;
    }

    /// `(parameter, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (P, f64)> + '_ {
        P::ALL.iter().copied().zip(self.values.iter().copied())
    }
}
