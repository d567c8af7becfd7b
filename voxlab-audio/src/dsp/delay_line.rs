//! Mono circular delay line with fractional reads
//!
//! Supports linear and 4-point Lagrange interpolation. Delays are measured in
//! samples back from the most recent write: a delay of 0 reads the sample
//! just written.

/// Fractional read interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Interpolation {
    /// Linear interpolation, never overshoots its neighbours
    #[default]
    Linear,
    /// 4-point Lagrange cubic interpolation (highest quality)
    Lagrange,
}

/// Circular buffer of past samples
pub struct DelayLine {
    buffer: Vec<f32>,
    /// Index of the most recently written sample
    write_pos: usize,
    max_delay: f32,
    interpolation: Interpolation,
}

impl DelayLine {
    /// Create a delay line able to read up to `max_delay` samples back
    pub fn new(max_delay: usize, interpolation: Interpolation) -> Self {
        let len = max_delay + 4;
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            max_delay: max_delay as f32,
            interpolation,
        }
    }

    /// Push a new sample
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.buffer[self.write_pos] = sample;
    }

    /// Sample written `ago` writes before the latest one
    #[inline]
    fn tap(&self, ago: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - (ago % len)) % len]
    }

    /// Read `delay` samples back (clamped to 0..=max_delay)
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let delay = delay.clamp(0.0, self.max_delay);
        let int_delay = delay as usize;
        let frac = delay - int_delay as f32;

        match self.interpolation {
            // Lagrange needs one newer neighbour, unavailable at delay < 1
            Interpolation::Lagrange if int_delay >= 1 => self.lagrange(int_delay, frac),
            _ => self.tap(int_delay) * (1.0 - frac) + self.tap(int_delay + 1) * frac,
        }
    }

    /// 4-point Lagrange through the samples at int-1, int, int+1, int+2
    #[inline]
    fn lagrange(&self, int_delay: usize, frac: f32) -> f32 {
        let x = frac;
        let x_1 = x + 1.0;
        let x_2 = x - 1.0;
        let x_3 = x - 2.0;

        let l_1 = -x * x_2 * x_3 / 6.0;
        let l0 = x_1 * x_2 * x_3 / 2.0;
        let l1 = -x_1 * x * x_3 / 2.0;
        let l2 = x_1 * x * x_2 / 6.0;

        self.tap(int_delay - 1) * l_1
            + self.tap(int_delay) * l0
            + self.tap(int_delay + 1) * l1
            + self.tap(int_delay + 2) * l2
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_delays() {
        for mode in [Interpolation::Linear, Interpolation::Lagrange] {
            let mut line = DelayLine::new(16, mode);
            for i in 0..10 {
                line.write(i as f32);
            }
            assert_eq!(line.read(0.0), 9.0);
            assert_eq!(line.read(3.0), 6.0);
        }
    }

    #[test]
    fn test_fractional_delay_on_ramp() {
        // Both interpolators are exact on a linear ramp
        for mode in [Interpolation::Linear, Interpolation::Lagrange] {
            let mut line = DelayLine::new(16, mode);
            for i in 0..10 {
                line.write(i as f32);
            }
            assert!((line.read(2.5) - 6.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_delay_clamped_to_capacity() {
        let mut line = DelayLine::new(4, Interpolation::Linear);
        for i in 0..20 {
            line.write(i as f32);
        }
        assert_eq!(line.read(100.0), 15.0);
        assert_eq!(line.read(-3.0), 19.0);
    }
}
