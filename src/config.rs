//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;
pub const MIN_SAMPLE_RATE: f64 = 8000.0;
pub const MAX_SAMPLE_RATE: f64 = 384_000.0;

/// Levels below which a voice is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SilenceThresholds {
    /// Envelope level at or below which no excitation is produced.
    pub envelope: f64,
    /// Residual output/resonator magnitude below which the voice stops.
    pub residual: f64,
}

impl Default for SilenceThresholds {
    fn default() -> Self {
        SilenceThresholds {
            envelope: 0.001,
            residual: 1e-5,
        }
    }
}

/// Construction-time settings shared by all engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate: f64,
    /// Seed for every noise stream in the engine.
    pub seed: u64,
    /// Gain applied ahead of the reverb in the PM engine.
    pub output_gain: f64,
    pub silence: SilenceThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 0x5EED,
            output_gain: 0.5,
            silence: SilenceThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults at `sample_rate`, coerced into the supported range.
    pub fn new(sample_rate: f64) -> Self {
        EngineConfig {
            sample_rate: sanitize_sample_rate(sample_rate),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> SynthResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SynthResult<()> {
        let rate = self.sample_rate;
        if !rate.is_finite() || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
            return Err(SynthError::InvalidSampleRate { rate });
        }
        Ok(())
    }
}

fn sanitize_sample_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.sample_rate, 44100.0);
        assert_eq!(c.output_gain, 0.5);
        assert_eq!(c.silence.envelope, 0.001);
        assert_eq!(c.silence.residual, 1e-5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn new_sanitizes_rate() {
        assert_eq!(EngineConfig::new(f64::NAN).sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(EngineConfig::new(10.0).sample_rate, MIN_SAMPLE_RATE);
        assert_eq!(EngineConfig::new(1e9).sample_rate, MAX_SAMPLE_RATE);
        assert_eq!(EngineConfig::new(48000.0).sample_rate, 48000.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = EngineConfig::from_json(r#"{"sampleRate": 48000, "silence": {"residual": 0.0001}}"#).unwrap();
        assert_eq!(
            c,
            EngineConfig {
                sample_rate: 48000.0,
                silence: SilenceThresholds {
                    envelope: 0.001,
                    residual: 0.0001,
                },
                ..EngineConfig::default()
            }
        );
    }

    #[test]
    fn json_rejects_bad_rate() {
        let err = EngineConfig::from_json(r#"{"sampleRate": 100}"#).unwrap_err();
        assert!(matches!(err, SynthError::InvalidSampleRate { rate } if rate == 100.0));
    }

    #[test]
    fn json_round_trip() {
        let c = EngineConfig::new(96000.0).with_seed(7);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"outputGain\""));
        assert_eq!(EngineConfig::from_json(&json).unwrap(), c);
    }
}
