//! Single-bore waveguide clarinet.
//!
//! A reed nonlinearity couples mouth pressure to the pressure wave coming
//! back down the bore. The result is damped, DC-blocked, saturated and
//! written back into the bore delay line.

use log::debug;

use super::{Synth, note_frequency};
use crate::config::EngineConfig;
use crate::dsp::delay::DelayLine;
use crate::dsp::envelope::{Envelope, EnvelopeRange};
use crate::dsp::filter::{OnePoleHighpass, OnePoleLowpass};
use crate::dsp::mapping::unit;
use crate::dsp::modulation::Lfo;
use crate::dsp::noise::NoiseRng;
use crate::dsp::nonlinear::fast_tanh;
use crate::params::{ClarinetParam, ParamRegistry, Parameter};

const NOISE_STREAM: u64 = 4;

const VIBRATO_RATE: f64 = 5.0;
const EXCITATION_AMPLITUDE: f64 = 0.01;
const FLOW_GAIN: f64 = 1.5;
const REED_STIFFNESS_SCALE: f64 = 5.0;
const REED_STIFFNESS_OFFSET: f64 = 0.5;
const SATURATION_SCALE: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct ClarinetEngine {
    config: EngineConfig,
    params: ParamRegistry<ClarinetParam>,

    bore: DelayLine,
    bore_length: usize,
    envelope: Envelope,
    lowpass: OnePoleLowpass,
    highpass: OnePoleHighpass,
    vibrato: Lfo,
    rng: NoiseRng,

    breath: f64,
    reed: f64,
    noise_level: f64,
    vibrato_depth: f64,

    frequency: f64,
    playing: bool,
}

impl ClarinetEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sr = config.sample_rate;
        let mut engine = ClarinetEngine {
            config,
            params: ParamRegistry::new(),
            bore: DelayLine::for_sample_rate(sr),
            bore_length: 0,
            envelope: Envelope::new(sr, EnvelopeRange::CLARINET),
            lowpass: OnePoleLowpass::default(),
            highpass: OnePoleHighpass::default(),
            vibrato: Lfo::new(sr, VIBRATO_RATE),
            rng: NoiseRng::new(config.seed, NOISE_STREAM),
            breath: 0.0,
            reed: 0.0,
            noise_level: 0.0,
            vibrato_depth: 0.0,
            frequency: 440.0,
            playing: false,
        };
        for &param in ClarinetParam::ALL {
            engine.set_param(param, param.default_value());
        }
        engine
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Active bore length in whole samples for the current note.
    pub fn bore_length(&self) -> usize {
        self.bore_length
    }

    fn reed_reflection(&self, pressure_difference: f64) -> f64 {
        fast_tanh(pressure_difference * (self.reed * REED_STIFFNESS_SCALE + REED_STIFFNESS_OFFSET))
    }
}

impl Synth for ClarinetEngine {
    type Param = ClarinetParam;

    fn note_on(&mut self, frequency: f64) {
        let Some(frequency) = note_frequency(frequency, self.config.sample_rate) else {
            return;
        };
        let max_length = self.bore.capacity() - 1;
        self.frequency = frequency;
        self.bore_length = ((self.config.sample_rate / frequency).floor() as usize).clamp(2, max_length);
        debug!("clarinet note on {frequency:.2} Hz, bore {} samples", self.bore_length);

        self.bore.clear();
        self.bore.seed_history(&mut self.rng, self.bore_length, EXCITATION_AMPLITUDE);
        self.lowpass.reset();
        self.highpass.reset();
        self.vibrato.reset();
        self.envelope.reset();
        self.envelope.set_gate(true);
        self.playing = true;
    }

    fn note_off(&mut self) {
        self.envelope.set_gate(false);
    }

    fn set_param(&mut self, param: ClarinetParam, value: f64) {
        let v = unit(value);
        match param {
            ClarinetParam::Breath => self.breath = 0.4 + v * 0.4,
            ClarinetParam::Reed => self.reed = v,
            ClarinetParam::Noise => self.noise_level = v * 0.3,
            ClarinetParam::Attack => self.envelope.set_attack(v),
            ClarinetParam::Release => self.envelope.set_release(v),
            ClarinetParam::Damping => self.lowpass.coefficient = 0.3 + v * 0.69,
            ClarinetParam::Brightness => self.highpass.coefficient = 1.0 - (0.001 + v * 0.01),
            ClarinetParam::Vibrato => self.vibrato_depth = v * 0.01,
        }
        self.params.set(param, v);
    }

    fn param(&self, param: ClarinetParam) -> f64 {
        self.params.get(param)
    }

    fn process(&mut self) -> f64 {
        if !self.playing {
            return 0.0;
        }
        let env = self.envelope.process();
        if !self.envelope.is_active() {
            self.playing = false;
        }
        if env <= self.config.silence.envelope {
            return 0.0;
        }

        let vibrato = self.vibrato.next_sample() * self.vibrato_depth;
        let delay = (self.config.sample_rate / self.frequency * (1.0 + vibrato))
            .clamp(1.0, (self.bore_length - 1) as f64);
        let bore = self.bore.read_at(delay);

        let noise = self.rng.white(self.noise_level);
        let mouth = self.breath * env + noise * env;
        let flow = self.reed_reflection(mouth - bore);

        let mut sample = bore + flow * FLOW_GAIN;
        sample = self.lowpass.process(sample);
        sample = self.highpass.process(sample);
        sample = fast_tanh(sample * SATURATION_SCALE);

        self.bore.write(sample);
        sample * env
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
