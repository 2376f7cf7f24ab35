//! Distortion-synthesis voice: one [`Oscillator`] through an AR envelope
//! and the shared reverb.

use log::debug;

use super::{Synth, note_frequency};
use crate::config::EngineConfig;
use crate::dsp::envelope::{Envelope, EnvelopeRange};
use crate::dsp::mapping::unit;
use crate::dsp::oscillator::{Algorithm, Oscillator};
use crate::dsp::reverb::Reverb;
use crate::params::{DisynParam, ParamRegistry, Parameter};

#[derive(Debug, Clone)]
pub struct DisynEngine {
    config: EngineConfig,
    params: ParamRegistry<DisynParam>,

    oscillator: Oscillator,
    envelope: Envelope,
    reverb: Reverb,

    master_gain: f64,
    velocity: f64,
    playing: bool,
}

impl DisynEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sr = config.sample_rate;
        let mut engine = DisynEngine {
            config,
            params: ParamRegistry::new(),
            oscillator: Oscillator::new(sr),
            envelope: Envelope::new(sr, EnvelopeRange::STANDARD),
            reverb: Reverb::new(sr),
            master_gain: 0.8,
            velocity: 1.0,
            playing: false,
        };
        for &param in DisynParam::ALL {
            engine.set_param(param, param.default_value());
        }
        engine
    }

    pub fn algorithm(&self) -> Algorithm {
        self.oscillator.algorithm
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

impl Synth for DisynEngine {
    type Param = DisynParam;

    fn note_on(&mut self, frequency: f64) {
        self.note_on_with_velocity(frequency, 1.0);
    }

    fn note_on_with_velocity(&mut self, frequency: f64, velocity: f64) {
        let Some(frequency) = note_frequency(frequency, self.config.sample_rate) else {
            return;
        };
        self.velocity = unit(velocity);
        debug!(
            "disyn note on {frequency:.2} Hz, velocity {:.2}, {:?}",
            self.velocity, self.oscillator.algorithm
        );
        self.oscillator.frequency = frequency;
        self.oscillator.reset();
        self.envelope.reset();
        self.reverb.reset();
        self.envelope.set_gate(true);
        self.playing = true;
    }

    fn note_off(&mut self) {
        self.envelope.set_gate(false);
    }

    fn set_param(&mut self, param: DisynParam, value: f64) {
        if param == DisynParam::Algorithm {
            if value.is_finite() {
                self.oscillator.set_algorithm_index(value.round() as i64);
            }
            self.params.set(param, self.oscillator.algorithm.index() as f64);
            return;
        }
        let v = unit(value);
        match param {
            DisynParam::Param1 => self.oscillator.set_param1(v),
            DisynParam::Param2 => self.oscillator.set_param2(v),
            DisynParam::Attack => self.envelope.set_attack(v),
            DisynParam::Release => self.envelope.set_release(v),
            DisynParam::ReverbSize => self.reverb.set_size(v),
            DisynParam::ReverbLevel => self.reverb.set_level(v),
            DisynParam::MasterGain => self.master_gain = v,
            DisynParam::Algorithm => {}
        }
        self.params.set(param, v);
    }

    fn param(&self, param: DisynParam) -> f64 {
        self.params.get(param)
    }

    fn process(&mut self) -> f64 {
        if !self.playing {
            return 0.0;
        }
        let osc = self.oscillator.next_sample();
        let env = self.envelope.process();
        let output = self.reverb.process(osc * env * self.velocity * self.master_gain);

        if !self.envelope.is_active() && output.abs() < self.config.silence.residual {
            self.playing = false;
        }
        output
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
