//! Modular physical-modeling engine.
//!
//! Signal path, one sample at a time:
//!
//! ```text
//! sources ─► ×envelope ─► interface ─► (+ feedback) ─► DC block ─► dual delay ─► SVF ─► ×AM ─► reverb
//!                                          ▲                          │            │
//!                                          └──────── previous sample ─┴────────────┘
//! ```
//!
//! Feedback reads the previous sample's delay and filter outputs, so the
//! loop always carries one sample of latency.

use log::debug;

use super::{Synth, note_frequency};
use crate::config::EngineConfig;
use crate::dsp::delay::DualDelay;
use crate::dsp::envelope::{Envelope, EnvelopeRange};
use crate::dsp::feedback::FeedbackMixer;
use crate::dsp::filter::{DcBlocker, StateVariableFilter};
use crate::dsp::interface::Interface;
use crate::dsp::mapping::unit;
use crate::dsp::modulation::ModulationModule;
use crate::dsp::noise::NoiseRng;
use crate::dsp::nonlinear::bounded;
use crate::dsp::reverb::Reverb;
use crate::dsp::sources::Sources;
use crate::params::{ParamRegistry, Parameter, PmParam};

const SOURCE_STREAM: u64 = 1;
const INTERFACE_STREAM: u64 = 2;
const DELAY_STREAM: u64 = 3;

#[derive(Debug, Clone)]
pub struct PmEngine {
    config: EngineConfig,
    params: ParamRegistry<PmParam>,

    sources: Sources,
    envelope: Envelope,
    interface: Interface,
    delays: DualDelay,
    feedback: FeedbackMixer,
    dc_blocker: DcBlocker,
    filter: StateVariableFilter,
    modulation: ModulationModule,
    reverb: Reverb,

    frequency: f64,
    playing: bool,
    prev_delay1: f64,
    prev_delay2: f64,
    prev_filter: f64,
}

impl PmEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sr = config.sample_rate;
        let mut engine = PmEngine {
            config,
            params: ParamRegistry::new(),
            sources: Sources::new(sr, NoiseRng::new(config.seed, SOURCE_STREAM)),
            envelope: Envelope::new(sr, EnvelopeRange::STANDARD),
            interface: Interface::new(sr, NoiseRng::new(config.seed, INTERFACE_STREAM)),
            delays: DualDelay::new(sr, NoiseRng::new(config.seed, DELAY_STREAM)),
            feedback: FeedbackMixer::new(),
            dc_blocker: DcBlocker::new(),
            filter: StateVariableFilter::new(sr),
            modulation: ModulationModule::new(sr),
            reverb: Reverb::new(sr),
            frequency: 440.0,
            playing: false,
            prev_delay1: 0.0,
            prev_delay2: 0.0,
            prev_filter: 0.0,
        };
        for &param in PmParam::ALL {
            engine.set_param(param, param.default_value());
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    fn reset_all(&mut self) {
        self.sources.reset();
        self.envelope.reset();
        self.interface.reset();
        self.delays.reset();
        self.dc_blocker.reset();
        self.filter.reset();
        self.modulation.reset();
        self.reverb.reset();
        self.prev_delay1 = 0.0;
        self.prev_delay2 = 0.0;
        self.prev_filter = 0.0;
    }
}

impl Synth for PmEngine {
    type Param = PmParam;

    fn note_on(&mut self, frequency: f64) {
        let Some(frequency) = note_frequency(frequency, self.config.sample_rate) else {
            return;
        };
        debug!("pm note on {frequency:.2} Hz, interface {:?}", self.interface.kind());
        self.frequency = frequency;
        self.reset_all();
        self.envelope.set_gate(true);
        self.interface.set_gate(true);
        self.playing = true;
    }

    fn note_off(&mut self) {
        self.envelope.set_gate(false);
        self.interface.set_gate(false);
    }

    fn set_param(&mut self, param: PmParam, value: f64) {
        let stored = match param {
            PmParam::InterfaceType => {
                let index = if value.is_finite() { value.round() as i64 } else { -1 };
                self.interface.set_kind_index(index);
                self.params.set(param, self.interface.kind().index() as f64);
                return;
            }
            _ => unit(value),
        };
        match param {
            PmParam::DcLevel => self.sources.set_dc_level(stored),
            PmParam::NoiseLevel => self.sources.set_noise_level(stored),
            PmParam::ToneLevel => self.sources.set_tone_level(stored),
            PmParam::Attack => self.envelope.set_attack(stored),
            PmParam::Release => self.envelope.set_release(stored),
            PmParam::InterfaceIntensity => self.interface.set_intensity(stored),
            PmParam::Tuning => self.delays.set_tuning(stored),
            PmParam::Ratio => self.delays.set_ratio(stored),
            PmParam::Delay1Feedback => self.feedback.set_delay1(stored),
            PmParam::Delay2Feedback => self.feedback.set_delay2(stored),
            PmParam::FilterFeedback => self.feedback.set_filter(stored),
            PmParam::FilterFrequency => self.filter.set_frequency(stored),
            PmParam::FilterQ => self.filter.set_q(stored),
            PmParam::FilterShape => self.filter.set_shape(stored),
            PmParam::LfoFrequency => self.modulation.set_frequency(stored),
            PmParam::ModulationTypeLevel => self.modulation.set_type_level(stored),
            PmParam::ReverbSize => self.reverb.set_size(stored),
            PmParam::ReverbLevel => self.reverb.set_level(stored),
            PmParam::InterfaceType => {}
        }
        self.params.set(param, stored);
    }

    fn param(&self, param: PmParam) -> f64 {
        self.params.get(param)
    }

    fn process(&mut self) -> f64 {
        if !self.playing {
            return 0.0;
        }
        let silence = self.config.silence;

        let modulation = self.modulation.process();
        let frequency = self.frequency * modulation.fm;
        let source = self.sources.process(frequency);

        let env = self.envelope.process();
        let excited = if env <= silence.envelope { 0.0 } else { self.interface.process(source * env) };

        let feedback = self.feedback.process(self.prev_delay1, self.prev_delay2, self.prev_filter);
        let delay_in = bounded(self.dc_blocker.process(excited + feedback), 1.0);
        let (d1, d2) = self.delays.process(delay_in, frequency);

        let filtered = self.filter.process((d1 + d2) * 0.5);
        let output = self.reverb.process(filtered * modulation.am * self.config.output_gain);

        self.prev_delay1 = d1;
        self.prev_delay2 = d2;
        self.prev_filter = filtered;

        if !self.envelope.is_active()
            && output.abs() < silence.residual
            && d1.abs() < silence.residual
            && d2.abs() < silence.residual
        {
            self.playing = false;
        }
        output
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
