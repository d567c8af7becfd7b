//! Input level meter
//!
//! Reports peak and RMS over fixed windows (50 ms by default) while a
//! capture is running, for a live record meter.

/// Level over one completed window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelReading {
    /// Peak absolute sample
    pub peak: f32,
    /// RMS level
    pub rms: f32,
}

impl LevelReading {
    /// RMS in dBFS (floored at -96 dB)
    pub fn rms_db(&self) -> f32 {
        if self.rms > 0.0 {
            (20.0 * self.rms.log10()).max(-96.0)
        } else {
            -96.0
        }
    }
}

/// Windowed peak/RMS meter
pub struct LevelMeter {
    /// Window length in samples
    window: usize,
    filled: usize,
    sum_sq: f64,
    peak: f32,
    last: LevelReading,
}

impl LevelMeter {
    /// Default update interval in seconds
    pub const DEFAULT_WINDOW_SECS: f32 = 0.05;

    pub fn new(sample_rate: u32, window_secs: f32) -> Self {
        Self {
            window: ((sample_rate as f32 * window_secs) as usize).max(1),
            filled: 0,
            sum_sq: 0.0,
            peak: 0.0,
            last: LevelReading::default(),
        }
    }

    /// Feed samples; returns the newest reading if a window completed
    pub fn push(&mut self, samples: &[f32]) -> Option<LevelReading> {
        let mut completed = None;
        for &s in samples {
            self.sum_sq += (s as f64) * (s as f64);
            self.peak = self.peak.max(s.abs());
            self.filled += 1;

            if self.filled == self.window {
                self.last = LevelReading {
                    peak: self.peak,
                    rms: (self.sum_sq / self.window as f64).sqrt() as f32,
                };
                completed = Some(self.last);
                self.filled = 0;
                self.sum_sq = 0.0;
                self.peak = 0.0;
            }
        }
        completed
    }

    /// Most recent completed reading
    pub fn last(&self) -> LevelReading {
        self.last
    }

    pub fn reset(&mut self) {
        self.filled = 0;
        self.sum_sq = 0.0;
        self.peak = 0.0;
        self.last = LevelReading::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_per_window() {
        let mut meter = LevelMeter::new(1000, 0.05);
        assert!(meter.push(&[0.5; 49]).is_none());
        let reading = meter.push(&[0.5]).unwrap();
        assert!((reading.peak - 0.5).abs() < 1e-6);
        assert!((reading.rms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_square_wave_levels() {
        let mut meter = LevelMeter::new(1000, 0.05);
        let samples: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 0.8 } else { -0.8 }).collect();
        let reading = meter.push(&samples).unwrap();
        assert!((reading.peak - 0.8).abs() < 1e-6);
        assert!((reading.rms - 0.8).abs() < 1e-5);
        assert_eq!(meter.last(), reading);
    }

    #[test]
    fn test_silence_db_floor() {
        assert_eq!(LevelReading::default().rms_db(), -96.0);
        let full = LevelReading { peak: 1.0, rms: 1.0 };
        assert!(full.rms_db().abs() < 1e-6);
    }
}
