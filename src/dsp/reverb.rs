//! Reverb: mono Schroeder reverberator.
//!
//! Four parallel feedback combs are averaged and diffused through two
//! series allpasses.

use super::mapping::unit;

/// A comb filter delay line with feedback.
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f64>,
    index: usize,
    feedback: f64,
}

impl CombFilter {
    fn new(size: usize, feedback: f64) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let output = self.buffer[self.index];
        self.buffer[self.index] = input + output * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// An allpass filter delay line.
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f64>,
    index: usize,
    gain: f64,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            gain: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let delayed = self.buffer[self.index];
        let output = -input * self.gain + delayed;
        self.buffer[self.index] = input + delayed * self.gain;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

// Delay times in seconds.
const COMB_TUNING: [f64; 4] = [0.0297, 0.0371, 0.0411, 0.0437];
const ALLPASS_TUNING: [f64; 2] = [0.005, 0.0017];

/// A mono Schroeder reverb.
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,

    /// Room size (0.0 to 1.0). Affects decay time.
    pub size: f64,
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    pub level: f64,
}

impl Reverb {
    pub fn new(sample_rate: f64) -> Self {
        let combs = COMB_TUNING
            .iter()
            .map(|&t| CombFilter::new((t * sample_rate) as usize, 0.84))
            .collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&t| AllpassFilter::new((t * sample_rate) as usize))
            .collect();

        let mut reverb = Self {
            combs,
            allpasses,
            size: 0.5,
            level: 0.3,
        };
        reverb.update_parameters();
        reverb
    }

    pub fn set_size(&mut self, v: f64) {
        self.size = unit(v);
        self.update_parameters();
    }

    pub fn set_level(&mut self, v: f64) {
        self.level = unit(v);
    }

    fn update_parameters(&mut self) {
        let room_scale = 0.28;
        let room_offset = 0.7;
        let feedback = self.size * room_scale + room_offset;
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet /= self.combs.len() as f64;

        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }

        input * (1.0 - self.level) + wet * self.level
    }

    /// Clear all delay lines.
    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn tail_rms(size: f64) -> f64 {
        let mut reverb = Reverb::new(SR);
        reverb.set_size(size);
        reverb.set_level(1.0);
        reverb.process(1.0);
        let start = (0.1 * SR) as usize;
        let end = (0.5 * SR) as usize;
        let mut sum = 0.0;
        for n in 1..end {
            let y = reverb.process(0.0);
            if n >= start {
                sum += y * y;
            }
        }
        (sum / (end - start) as f64).sqrt()
    }

    #[test]
    fn dry_passes_through() {
        let mut reverb = Reverb::new(SR);
        reverb.set_level(0.0);
        for i in 0..1000 {
            let x = (i as f64 * 0.01).sin();
            assert!((reverb.process(x) - x).abs() < 1e-12);
        }
    }

    #[test]
    fn produces_tail() {
        assert!(tail_rms(0.5) > 1e-4);
    }

    #[test]
    fn bigger_room_decays_longer() {
        let small = tail_rms(0.2);
        let large = tail_rms(0.9);
        assert!(large > small, "size 0.9 tail {large} should exceed size 0.2 tail {small}");
    }

    #[test]
    fn silence_after_reset() {
        let mut reverb = Reverb::new(SR);
        reverb.set_size(0.9);
        reverb.set_level(0.8);
        for i in 0..10_000 {
            reverb.process(((i * 7919) % 200) as f64 / 100.0 - 1.0);
        }
        reverb.reset();
        for _ in 0..100 {
            let y = reverb.process(0.0);
            assert!(y.abs() < 0.001, "reverb not silent after reset: {y}");
        }
    }

    #[test]
    fn output_finite_at_max_size() {
        let mut reverb = Reverb::new(SR);
        reverb.set_size(1.0);
        reverb.set_level(1.0);
        for i in 0..SR as usize {
            let y = reverb.process(if i % 100 == 0 { 1.0 } else { 0.0 });
            assert!(y.is_finite() && y.abs() < 50.0, "reverb blew up: {y}");
        }
    }

    #[test]
    fn buffer_lengths_follow_sample_rate() {
        let reverb = Reverb::new(SR);
        let lens: Vec<usize> = reverb.combs.iter().map(|c| c.buffer.len()).collect();
        assert_eq!(lens, vec![1309, 1636, 1812, 1927]);
        assert_eq!(reverb.allpasses[0].buffer.len(), 220);
        assert_eq!(reverb.allpasses[1].buffer.len(), 74);
    }
}
