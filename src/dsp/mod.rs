//! DSP building blocks: per-sample signal processing modules.
//!
//! Every module owns its state, allocates only at construction, and exposes
//! `process`/`reset` plus clamping setters that take normalized controls.
//! The engines in [`crate::engine`] wire these together.

pub mod delay;
pub mod envelope;
pub mod feedback;
pub mod filter;
pub mod interface;
pub mod mapping;
pub mod modulation;
pub mod noise;
pub mod nonlinear;
pub mod oscillator;
pub mod reverb;
pub mod sources;
