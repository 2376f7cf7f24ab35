//! Excitation interface: the nonlinear element that injects energy into
//! the resonator.
//!
//! The twelve variants form a closed set. [`Interface`] holds the active
//! [`Strategy`] and dispatches with a `match`, so there is no virtual call
//! in the per-sample path.

pub mod strategy;

use log::warn;
use serde::{Deserialize, Serialize};

use super::mapping::unit;
use super::noise::NoiseRng;
use strategy::{Bell, Bow, Crystal, Drum, Plasma, Pluck, Vapor};

/// Physical excitation mechanism, indexed 0..=11.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Pluck,
    Hit,
    #[default]
    Reed,
    Flute,
    Brass,
    Bow,
    Bell,
    Drum,
    Crystal,
    Vapor,
    Quantum,
    Plasma,
}

impl InterfaceKind {
    pub const ALL: [InterfaceKind; 12] = [
        InterfaceKind::Pluck,
        InterfaceKind::Hit,
        InterfaceKind::Reed,
        InterfaceKind::Flute,
        InterfaceKind::Brass,
        InterfaceKind::Bow,
        InterfaceKind::Bell,
        InterfaceKind::Drum,
        InterfaceKind::Crystal,
        InterfaceKind::Vapor,
        InterfaceKind::Quantum,
        InterfaceKind::Plasma,
    ];

    /// Variant at `index`, if there is one.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Output bound the variant guarantees.
    pub fn output_limit(self) -> f64 {
        match self {
            InterfaceKind::Flute => strategy::FLUTE_LIMIT,
            _ => 1.0,
        }
    }

    /// Variants whose internal state restarts at each new note.
    fn resets_on_note_on(self) -> bool {
        matches!(
            self,
            InterfaceKind::Pluck
                | InterfaceKind::Bell
                | InterfaceKind::Bow
                | InterfaceKind::Drum
                | InterfaceKind::Crystal
                | InterfaceKind::Vapor
                | InterfaceKind::Plasma
        )
    }
}

/// Per-variant state.
#[derive(Debug, Clone)]
pub enum Strategy {
    Pluck(Pluck),
    Hit,
    Reed,
    Flute,
    Brass,
    Bow(Bow),
    Bell(Bell),
    Drum(Drum),
    Crystal(Crystal),
    Vapor(Vapor),
    Quantum,
    Plasma(Plasma),
}

impl Strategy {
    fn new(kind: InterfaceKind, sample_rate: f64) -> Self {
        match kind {
            InterfaceKind::Pluck => Strategy::Pluck(Pluck::default()),
            InterfaceKind::Hit => Strategy::Hit,
            InterfaceKind::Reed => Strategy::Reed,
            InterfaceKind::Flute => Strategy::Flute,
            InterfaceKind::Brass => Strategy::Brass,
            InterfaceKind::Bow => Strategy::Bow(Bow::default()),
            InterfaceKind::Bell => Strategy::Bell(Bell::default()),
            InterfaceKind::Drum => Strategy::Drum(Drum::default()),
            InterfaceKind::Crystal => Strategy::Crystal(Crystal::default()),
            InterfaceKind::Vapor => Strategy::Vapor(Vapor::default()),
            InterfaceKind::Quantum => Strategy::Quantum,
            InterfaceKind::Plasma => Strategy::Plasma(Plasma::new(sample_rate)),
        }
    }

    fn reset(&mut self) {
        match self {
            Strategy::Pluck(s) => s.reset(),
            Strategy::Bow(s) => s.reset(),
            Strategy::Bell(s) => s.reset(),
            Strategy::Drum(s) => s.reset(),
            Strategy::Crystal(s) => s.reset(),
            Strategy::Vapor(s) => s.reset(),
            Strategy::Plasma(s) => s.reset(),
            Strategy::Hit | Strategy::Reed | Strategy::Flute | Strategy::Brass | Strategy::Quantum => {}
        }
    }
}

/// The excitation stage of the PM engine.
#[derive(Debug, Clone)]
pub struct Interface {
    sample_rate: f64,
    kind: InterfaceKind,
    strategy: Strategy,
    intensity: f64,
    gate: bool,
    rng: NoiseRng,
}

impl Interface {
    pub fn new(sample_rate: f64, rng: NoiseRng) -> Self {
        let kind = InterfaceKind::default();
        Interface {
            sample_rate,
            kind,
            strategy: Strategy::new(kind, sample_rate),
            intensity: 0.5,
            gate: false,
            rng,
        }
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    /// Switch variant. The new variant starts from fresh state.
    pub fn set_kind(&mut self, kind: InterfaceKind) {
        if kind != self.kind {
            self.kind = kind;
            self.strategy = Strategy::new(kind, self.sample_rate);
        }
    }

    /// Select a variant by index. Out-of-range indices fall back to Reed.
    pub fn set_kind_index(&mut self, index: i64) {
        let kind = InterfaceKind::from_index(index).unwrap_or_else(|| {
            warn!("unknown interface type {index}, falling back to reed");
            InterfaceKind::Reed
        });
        self.set_kind(kind);
    }

    pub fn set_intensity(&mut self, v: f64) {
        self.intensity = unit(v);
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Update the gate; a low-to-high edge fires [`Interface::on_note_on`].
    pub fn set_gate(&mut self, gate: bool) {
        if gate && !self.gate {
            self.on_note_on();
        }
        self.gate = gate;
    }

    pub fn on_note_on(&mut self) {
        if self.kind.resets_on_note_on() {
            self.strategy.reset();
        }
    }

    pub fn reset(&mut self) {
        self.strategy.reset();
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let i = self.intensity;
        match &mut self.strategy {
            Strategy::Pluck(s) => s.process(x, i),
            Strategy::Hit => strategy::hit(x, i),
            Strategy::Reed => strategy::reed(x, i),
            Strategy::Flute => strategy::flute(x, i, &mut self.rng),
            Strategy::Brass => strategy::brass(x, i),
            Strategy::Bow(s) => s.process(x, i, &mut self.rng),
            Strategy::Bell(s) => s.process(x, i),
            Strategy::Drum(s) => s.process(x, i, &mut self.rng),
            Strategy::Crystal(s) => s.process(x, i),
            Strategy::Vapor(s) => s.process(x, i),
            Strategy::Quantum => strategy::quantum(x, i, &mut self.rng),
            Strategy::Plasma(s) => s.process(x, i),
        }
    }
}
