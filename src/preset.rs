//! Patches: named parameter sets saved as JSON.
//!
//! A patch records which engine it belongs to and the normalized value of
//! each parameter it sets. Parameters it leaves out keep whatever value
//! the instrument already has.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::{EngineKind, Instrument};
use crate::error::{SynthError, SynthResult};
use crate::params::{ClarinetParam, DisynParam, Parameter, PmParam};

// ── Patch ───────────────────────────────────────────────────

/// A saved set of parameter values for one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Human-readable name (e.g., "Glass Pluck").
    #[serde(default)]
    pub name: String,
    /// Engine the parameter names belong to.
    pub engine: EngineKind,
    /// Parameter name → value. Sorted so saved files diff cleanly.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl Patch {
    pub fn new(name: impl Into<String>, engine: EngineKind) -> Self {
        Patch {
            name: name.into(),
            engine,
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Snapshot every parameter of `instrument`.
    pub fn capture(name: impl Into<String>, instrument: &Instrument) -> Self {
        Patch {
            name: name.into(),
            engine: instrument.kind(),
            parameters: instrument
                .parameters()
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fail on the first parameter name the engine does not know.
    pub fn validate(&self) -> SynthResult<()> {
        fn check<P: Parameter>(patch: &Patch) -> SynthResult<()> {
            match patch.parameters.keys().find(|name| P::from_name(name).is_none()) {
                Some(name) => Err(SynthError::unknown_parameter(P::ENGINE, name.as_str())),
                None => Ok(()),
            }
        }
        match self.engine {
            EngineKind::Pm => check::<PmParam>(self),
            EngineKind::Clarinet => check::<ClarinetParam>(self),
            EngineKind::Disyn => check::<DisynParam>(self),
        }
    }
}

// ── Loading ─────────────────────────────────────────────────

impl Instrument {
    /// Build the patch's engine and apply it.
    pub fn from_patch(patch: &Patch, config: EngineConfig) -> SynthResult<Self> {
        let mut instrument = Instrument::new(patch.engine, config);
        instrument.apply_patch(patch)?;
        Ok(instrument)
    }

    /// Apply `patch` to this instrument. Nothing is changed unless every
    /// name in the patch is valid for this engine.
    pub fn apply_patch(&mut self, patch: &Patch) -> SynthResult<()> {
        if patch.engine != self.kind() {
            return Err(SynthError::EngineMismatch {
                expected: self.kind().as_str(),
                found: patch.engine.to_string(),
            });
        }
        patch.validate()?;
        debug!("applying patch '{}' ({} parameters) to {}", patch.name, patch.parameters.len(), self.kind());
        for (name, &value) in &patch.parameters {
            self.set_parameter(name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn patch_json_roundtrip() {
        let json = r#"{
            "name": "Glass Pluck",
            "engine": "pm",
            "parameters": {
                "interfaceType": 0,
                "interfaceIntensity": 0.6,
                "reverbLevel": 0.1
            }
        }"#;
        let patch = Patch::from_json(json).unwrap();
        assert_eq!(
            patch,
            Patch::new("Glass Pluck", EngineKind::Pm)
                .with("interfaceType", 0.0)
                .with("interfaceIntensity", 0.6)
                .with("reverbLevel", 0.1)
        );
        let back = Patch::from_json(&patch.to_json().unwrap()).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn missing_fields_default() {
        let patch = Patch::from_json(r#"{"engine": "clarinet"}"#).unwrap();
        assert_eq!(patch, Patch::new("", EngineKind::Clarinet));
        assert!(Patch::from_json(r#"{"engine": "theremin"}"#).is_err());
    }

    #[test]
    fn from_patch_applies_values() {
        let patch = Patch::new("Breathy", EngineKind::Clarinet)
            .with("breath", 0.9)
            .with("noise", 0.8);
        let inst = Instrument::from_patch(&patch, EngineConfig::default()).unwrap();
        assert_eq!(inst.kind(), EngineKind::Clarinet);
        assert_eq!(inst.parameter("breath"), Some(0.9));
        assert_eq!(inst.parameter("noise"), Some(0.8));
        assert_eq!(inst.parameter("reed"), Some(ClarinetParam::Reed.default_value()));
    }

    #[test]
    fn unknown_name_rejects_whole_patch() {
        let patch = Patch::new("Typo", EngineKind::Disyn)
            .with("masterGain", 0.1)
            .with("mastrGain", 0.2);
        let mut inst = Instrument::new(EngineKind::Disyn, EngineConfig::default());
        let err = inst.apply_patch(&patch).unwrap_err();
        assert!(matches!(err, SynthError::UnknownParameter { engine: "disyn", ref name } if name == "mastrGain"));
        assert_eq!(inst.parameter("masterGain"), Some(0.8));
    }

    #[test]
    fn engine_mismatch() {
        let patch = Patch::new("Wrong", EngineKind::Pm);
        let mut inst = Instrument::new(EngineKind::Clarinet, EngineConfig::default());
        let err = inst.apply_patch(&patch).unwrap_err();
        assert_eq!(err.to_string(), "patch is for the pm engine, not clarinet");
    }

    #[test]
    fn capture_then_restore() {
        let mut original = Instrument::new(EngineKind::Pm, EngineConfig::default());
        original.set_parameter("interfaceType", 9.0);
        original.set_parameter("filterShape", 0.75);
        let patch = Patch::capture("Snapshot", &original);
        assert_eq!(patch.parameters.len(), PmParam::ALL.len());

        let restored = Instrument::from_patch(&patch, EngineConfig::default()).unwrap();
        assert_eq!(restored.parameters(), original.parameters());
    }
}
