//! Feedback mixer for the resonator loop.

use super::mapping::unit;

/// Largest gain any feedback path can reach.
pub const MAX_GAIN: f64 = 0.99;

/// Weighted sum of the previous delay and filter outputs.
#[derive(Debug, Clone, Default)]
pub struct FeedbackMixer {
    delay1: f64,
    delay2: f64,
    filter: f64,
}

impl FeedbackMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delay1(&mut self, v: f64) {
        self.delay1 = unit(v) * MAX_GAIN;
    }

    pub fn set_delay2(&mut self, v: f64) {
        self.delay2 = unit(v) * MAX_GAIN;
    }

    pub fn set_filter(&mut self, v: f64) {
        self.filter = unit(v) * MAX_GAIN;
    }

    pub fn gains(&self) -> (f64, f64, f64) {
        (self.delay1, self.delay2, self.filter)
    }

    #[inline]
    pub fn process(&self, delay1_out: f64, delay2_out: f64, filter_out: f64) -> f64 {
        delay1_out * self.delay1 + delay2_out * self.delay2 + filter_out * self.filter
    }
}
