//! Waveguide delay lines with linearly interpolated fractional reads.

use super::mapping::unit;
use super::noise::NoiseRng;

/// Shortest delay any line will run at, in samples.
pub const MIN_DELAY: f64 = 2.0;

/// Lowest frequency a line must be able to hold a full period of.
const LOWEST_FREQUENCY: f64 = 20.0;

/// Samples seeded with noise on reset so a zeroed feedback loop can start.
const SEED_SAMPLES: usize = 100;
const SEED_AMPLITUDE: f64 = 0.01;

/// A circular buffer read at a fractional distance behind the write head.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
    delay: f64,
}

impl DelayLine {
    /// Create a line holding `capacity` samples (at least 4).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(4);
        DelayLine {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay: MIN_DELAY,
        }
    }

    /// Capacity sized for one period of the lowest supported frequency.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self::new((sample_rate / LOWEST_FREQUENCY) as usize)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Set the read distance, clamped to `[2, capacity - 1]`.
    pub fn set_delay(&mut self, samples: f64) {
        let max = (self.buffer.len() - 1) as f64;
        self.delay = if samples.is_finite() { samples.clamp(MIN_DELAY, max) } else { max };
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Interpolated read at the current delay.
    #[inline]
    pub fn read(&self) -> f64 {
        self.read_at(self.delay)
    }

    /// Interpolated read `delay` samples behind the write head.
    #[inline]
    pub fn read_at(&self, delay: f64) -> f64 {
        let len = self.buffer.len();
        let pos = (self.write_pos as f64 - delay).rem_euclid(len as f64);
        let i0 = (pos as usize).min(len - 1);
        let i1 = (i0 + 1) % len;
        let frac = pos - i0 as f64;
        self.buffer[i0] + (self.buffer[i1] - self.buffer[i0]) * frac
    }

    /// Write one sample and advance the head.
    #[inline]
    pub fn write(&mut self, sample: f64) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read at the current delay, then write `input`.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let out = self.read();
        self.write(input);
        out
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Fill the `count` samples just behind the write head with noise, so
    /// the very next reads within that distance see it.
    pub fn seed_history(&mut self, rng: &mut NoiseRng, count: usize, amplitude: f64) {
        let len = self.buffer.len();
        for k in 1..=count.min(len) {
            self.buffer[(self.write_pos + len - k) % len] = rng.white(amplitude);
        }
    }
}

/// Two waveguides tuned from one control frequency.
///
/// Line 1 runs at the tuned frequency, line 2 at a length ratio of line 1.
#[derive(Debug, Clone)]
pub struct DualDelay {
    sample_rate: f64,
    line1: DelayLine,
    line2: DelayLine,
    semitones: f64,
    ratio: f64,
    last_frequency: Option<f64>,
    rng: NoiseRng,
}

impl DualDelay {
    pub fn new(sample_rate: f64, rng: NoiseRng) -> Self {
        DualDelay {
            sample_rate,
            line1: DelayLine::for_sample_rate(sample_rate),
            line2: DelayLine::for_sample_rate(sample_rate),
            semitones: 0.0,
            ratio: 1.0,
            last_frequency: None,
            rng,
        }
    }

    /// ±12 semitones around the control frequency; 0.5 is untransposed.
    pub fn set_tuning(&mut self, v: f64) {
        self.semitones = (unit(v) - 0.5) * 24.0;
        self.last_frequency = None;
    }

    /// Line 2 / line 1 length ratio: `[0.5, 1)` below 0.5, `[1, 2]` above.
    pub fn set_ratio(&mut self, v: f64) {
        let v = unit(v);
        self.ratio = if v < 0.5 { 0.5 + v } else { 1.0 + (v - 0.5) * 2.0 };
        self.last_frequency = None;
    }

    pub fn lengths(&self) -> (f64, f64) {
        (self.line1.delay(), self.line2.delay())
    }

    fn retune(&mut self, frequency: f64) {
        let tuned = frequency * (self.semitones / 12.0).exp2();
        let len1 = if tuned > 0.0 { self.sample_rate / tuned } else { f64::INFINITY };
        self.line1.set_delay(len1);
        self.line2.set_delay(self.line1.delay() * self.ratio);
        self.last_frequency = Some(frequency);
    }

    /// Read both lines, then write `input` into both.
    #[inline]
    pub fn process(&mut self, input: f64, frequency: f64) -> (f64, f64) {
        if self.last_frequency != Some(frequency) {
            self.retune(frequency);
        }
        (self.line1.process(input), self.line2.process(input))
    }

    /// Zero both lines and seed the samples just behind the write head with
    /// a little noise, so a loop with no external input still starts.
    pub fn reset(&mut self) {
        for line in [&mut self.line1, &mut self.line2] {
            line.clear();
            line.seed_history(&mut self.rng, SEED_SAMPLES, SEED_AMPLITUDE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_comes_back_after_delay() {
        let mut line = DelayLine::new(512);
        line.set_delay(50.0);
        assert_eq!(line.process(1.0), 0.0);
        for n in 1..50 {
            let y = line.process(0.0);
            assert!(y.abs() < 1e-12, "early output {y} at sample {n}");
        }
        let y = line.process(0.0);
        assert!((y - 1.0).abs() < 1e-12, "impulse lost, got {y}");
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut line = DelayLine::new(16);
        line.write(0.0);
        line.write(1.0);
        line.write(0.0);
        // Head at 3; 1.5 samples back lands halfway between 1.0 and 0.0.
        assert!((line.read_at(1.5) - 0.5).abs() < 1e-12);
        assert!((line.read_at(2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new(100);
        line.set_delay(1.0);
        assert_eq!(line.delay(), MIN_DELAY);
        line.set_delay(5000.0);
        assert_eq!(line.delay(), 99.0);
        line.set_delay(f64::NAN);
        assert_eq!(line.delay(), 99.0);
    }

    #[test]
    fn wraps_around_buffer() {
        let mut line = DelayLine::new(8);
        line.set_delay(3.0);
        let mut out = Vec::new();
        for n in 0..20 {
            out.push(line.process(n as f64));
        }
        for n in 3..20 {
            assert!((out[n] - (n - 3) as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn dual_delay_round_trip() {
        let mut dual = DualDelay::new(44100.0, NoiseRng::new(1, 1));
        dual.reset();
        // 441 Hz at 44.1 kHz is exactly 100 samples; ratio 0.5 keeps line 2 equal.
        dual.set_tuning(0.5);
        dual.set_ratio(0.5);
        let (a, b) = dual.process(1.0, 441.0);
        assert_eq!((a, b), (0.0, 0.0));
        assert_eq!(dual.lengths(), (100.0, 100.0));
        for _ in 1..100 {
            let (a, b) = dual.process(0.0, 441.0);
            assert!(a.abs() < 1e-12 && b.abs() < 1e-12);
        }
        let (a, b) = dual.process(0.0, 441.0);
        assert!((a - 1.0).abs() < 1e-9 && (b - 1.0).abs() < 1e-9, "got {a}, {b}");
    }

    #[test]
    fn tuning_and_ratio_mapping() {
        let mut dual = DualDelay::new(44100.0, NoiseRng::new(1, 1));
        dual.set_tuning(1.0);
        dual.set_ratio(1.0);
        dual.process(0.0, 441.0);
        let (l1, l2) = dual.lengths();
        assert!((l1 - 50.0).abs() < 1e-9, "octave up should halve line 1: {l1}");
        assert!((l2 - 100.0).abs() < 1e-9, "ratio 2 should double it back: {l2}");

        dual.set_ratio(0.0);
        dual.process(0.0, 441.0);
        assert!((dual.lengths().1 - 25.0).abs() < 1e-9);
    }

    #[test]
    fn reset_seeds_small_noise() {
        let mut dual = DualDelay::new(44100.0, NoiseRng::new(4, 2));
        dual.reset();
        let cap = dual.line1.capacity();
        assert_eq!(cap, 2205);
        let seeded = &dual.line1.buffer[cap - SEED_SAMPLES..];
        assert!(seeded.iter().any(|&s| s != 0.0));
        assert!(seeded.iter().all(|s| s.abs() <= SEED_AMPLITUDE));
        assert!(dual.line1.buffer[..cap - SEED_SAMPLES].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn reset_seed_reaches_the_read_head() {
        for frequency in [55.0, 220.0, 2000.0] {
            let mut dual = DualDelay::new(44100.0, NoiseRng::new(9, 3));
            dual.reset();
            let heard = (0..2205)
                .map(|_| dual.process(0.0, frequency))
                .filter(|&(a, b)| a != 0.0 || b != 0.0)
                .count();
            assert!(heard > 0, "seed never read back at {frequency} Hz");
        }
    }

    #[test]
    fn seeded_history_is_readable_immediately() {
        let mut line = DelayLine::new(64);
        line.clear();
        line.seed_history(&mut NoiseRng::new(2, 2), 10, 0.01);
        assert!(line.read_at(5.0) != 0.0);
        assert!(line.read_at(10.0).abs() <= 0.01);
        assert_eq!(line.read_at(20.0), 0.0);
    }

    #[test]
    fn silly_frequencies_stay_in_range() {
        let mut dual = DualDelay::new(44100.0, NoiseRng::new(1, 1));
        for f in [0.0, -10.0, 1e9, f64::NAN] {
            dual.process(0.1, f);
            let (l1, l2) = dual.lengths();
            assert!((MIN_DELAY..=2204.0).contains(&l1), "{f}: {l1}");
            assert!((MIN_DELAY..=2204.0).contains(&l2), "{f}: {l2}");
        }
    }
}
