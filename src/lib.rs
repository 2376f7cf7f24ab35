pub mod config;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod preset;

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::engine::{EngineKind, Instrument};
use crate::error::SynthError;
use crate::preset::Patch;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the flues-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn js_error(e: SynthError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed monophonic instrument for an AudioWorklet.
#[wasm_bindgen]
pub struct WasmSynth {
    inner: Instrument,
}

#[wasm_bindgen]
impl WasmSynth {
    /// Create an engine by name (`"pm"`, `"clarinet"` or `"disyn"`).
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, sample_rate: f64) -> Result<WasmSynth, JsValue> {
        let kind: EngineKind = kind.parse().map_err(js_error)?;
        let config = EngineConfig {
            sample_rate,
            ..EngineConfig::default()
        };
        config.validate().map_err(js_error)?;
        Ok(WasmSynth {
            inner: Instrument::new(kind, config),
        })
    }

    pub fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    #[wasm_bindgen(js_name = noteOn)]
    pub fn note_on(&mut self, frequency: f64, velocity: Option<f64>) {
        self.inner.note_on_with_velocity(frequency, velocity.unwrap_or(1.0));
    }

    #[wasm_bindgen(js_name = noteOff)]
    pub fn note_off(&mut self) {
        self.inner.note_off();
    }

    /// Returns false when the engine has no parameter called `name`.
    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        self.inner.set_parameter(name, value)
    }

    pub fn process(&mut self) -> f32 {
        self.inner.process() as f32
    }

    /// Fill an output buffer in place.
    #[wasm_bindgen(js_name = processBlock)]
    pub fn process_block(&mut self, out: &mut [f32]) {
        self.inner.process_block(out);
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    /// Current parameter values as a `{ name: value }` object.
    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        let values: BTreeMap<&str, f64> = self.inner.parameters().into_iter().collect();
        serde_wasm_bindgen::to_value(&values).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Parameter names with their defaults, in vocabulary order.
    pub fn descriptors(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.descriptors()).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Apply a JSON patch. Rejects patches for another engine or with
    /// unknown parameter names.
    #[wasm_bindgen(js_name = loadPatch)]
    pub fn load_patch(&mut self, json: &str) -> Result<(), JsValue> {
        let patch = Patch::from_json(json).map_err(js_error)?;
        self.inner.apply_patch(&patch).map_err(js_error)
    }

    /// Snapshot the current parameters as a JSON patch.
    #[wasm_bindgen(js_name = savePatch)]
    pub fn save_patch(&self, name: &str) -> Result<String, JsValue> {
        Patch::capture(name, &self.inner).to_json().map_err(js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn wasm_synth_plays_and_round_trips_patches() {
        let mut synth = WasmSynth::new("clarinet", 48000.0).unwrap_or_else(|_| panic!("valid engine"));
        assert_eq!(synth.kind(), "clarinet");
        assert!(synth.set_parameter("vibrato", 0.4));
        assert!(!synth.set_parameter("cutoff", 0.4));

        synth.note_on(261.63, None);
        let mut block = [0.0f32; 128];
        synth.process_block(&mut block);
        assert!(synth.is_playing());
        assert!(block.iter().any(|&s| s != 0.0));

        let saved = synth.save_patch("Vibrato").unwrap_or_else(|_| panic!("serializable"));
        assert!(saved.contains("\"vibrato\": 0.4"));
        let mut other = WasmSynth::new("clarinet", 48000.0).unwrap_or_else(|_| panic!("valid engine"));
        assert!(other.load_patch(&saved).is_ok());
        assert_eq!(other.inner.parameter("vibrato"), Some(0.4));
    }
}
