//! Error types for the non-real-time surfaces: configuration, patches and
//! the control queue. Audio-thread calls never fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("invalid sample rate {rate} (expected {min}..={max} Hz)", min = crate::config::MIN_SAMPLE_RATE, max = crate::config::MAX_SAMPLE_RATE)]
    InvalidSampleRate { rate: f64 },

    #[error("unknown parameter '{name}' for {engine} engine")]
    UnknownParameter { engine: &'static str, name: String },

    #[error("unknown engine '{name}' (expected pm, clarinet or disyn)")]
    UnknownEngine { name: String },

    #[error("patch is for the {found} engine, not {expected}")]
    EngineMismatch { expected: &'static str, found: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("control queue is full")]
    QueueFull,
}

impl SynthError {
    pub fn unknown_parameter(engine: &'static str, name: impl Into<String>) -> Self {
        SynthError::UnknownParameter { engine, name: name.into() }
    }
}

pub type SynthResult<T> = Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = SynthError::InvalidSampleRate { rate: 100.0 };
        assert_eq!(e.to_string(), "invalid sample rate 100 (expected 8000..=384000 Hz)");

        let e = SynthError::unknown_parameter("pm", "wobble");
        assert_eq!(e.to_string(), "unknown parameter 'wobble' for pm engine");

        let e = SynthError::EngineMismatch { expected: "clarinet", found: "pm".into() };
        assert_eq!(e.to_string(), "patch is for the pm engine, not clarinet");

        assert_eq!(SynthError::QueueFull.to_string(), "control queue is full");
    }

    #[test]
    fn json_errors_convert() {
        fn parse() -> SynthResult<serde_json::Value> {
            Ok(serde_json::from_str("{not json")?)
        }
        let err = parse().unwrap_err();
        assert!(matches!(err, SynthError::Json(_)));
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
