//! Synthesized demo clips
//!
//! Three short child-voice clips built with formant synthesis, so effects can
//! be tried without a microphone. A harmonic source (amplitude `1/h^1.15`, up
//! to 7.5 kHz) is shaped by three Lorentzian formant resonances per vowel.

use crate::buffer::{AudioBuffer, BufferError};
use crate::math::normalize;
use std::f64::consts::TAU;
use std::str::FromStr;

/// Sample rate of every demo clip
pub const DEMO_SAMPLE_RATE: u32 = 44_100;

/// Peak level of every demo clip
const DEMO_PEAK: f32 = 0.88;

/// Child speaking fundamental in Hz
const F0: f64 = 285.0;

const MAX_HARMONICS: usize = 40;
const MAX_HARMONIC_FREQ: f64 = 7500.0;
const VIBRATO_RATE: f64 = 5.5;

/// Three formants as (centre Hz, bandwidth Hz)
type Formants = [(f64, f64); 3];

const AH: Formants = [(900.0, 140.0), (1450.0, 200.0), (2750.0, 260.0)];
const EE: Formants = [(310.0, 90.0), (2730.0, 195.0), (3100.0, 240.0)];
const OH: Formants = [(540.0, 130.0), (900.0, 170.0), (2450.0, 250.0)];
const OO: Formants = [(285.0, 90.0), (760.0, 150.0), (2280.0, 240.0)];
const EH: Formants = [(590.0, 140.0), (1920.0, 200.0), (2700.0, 250.0)];

/// Bundled demo clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoSample {
    /// "Ahh - Eee - Ohh", three sustained vowels
    Vowels,
    /// "La la la", a five note C5-E5-G5-E5-C5 melody
    Melody,
    /// "Hello! Woo-hoo!", an excited greeting
    Hello,
}

impl DemoSample {
    pub const ALL: [DemoSample; 3] = [DemoSample::Vowels, DemoSample::Melody, DemoSample::Hello];

    pub fn id(&self) -> &'static str {
        match self {
            DemoSample::Vowels => "vowels",
            DemoSample::Melody => "melody",
            DemoSample::Hello => "hello",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DemoSample::Vowels => "Ahh-Eee-Ohh",
            DemoSample::Melody => "La-La-La",
            DemoSample::Hello => "Hello Woo-Hoo",
        }
    }

    pub fn duration_secs(&self) -> f64 {
        match self {
            DemoSample::Vowels => 3.3,
            DemoSample::Melody => 3.1,
            DemoSample::Hello => 3.2,
        }
    }

    /// Synthesize the clip as a mono buffer at [`DEMO_SAMPLE_RATE`]
    pub fn render(&self) -> Result<AudioBuffer, BufferError> {
        let frames = (DEMO_SAMPLE_RATE as f64 * self.duration_secs()) as usize;
        let raw: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f64 / DEMO_SAMPLE_RATE as f64;
                let s = match self {
                    DemoSample::Vowels => vowels_at(t),
                    DemoSample::Melody => melody_at(t),
                    DemoSample::Hello => hello_at(t),
                };
                s as f32
            })
            .collect();

        let buffer = AudioBuffer::from_mono(raw, DEMO_SAMPLE_RATE)?;
        Ok(normalize(&buffer, DEMO_PEAK))
    }
}

impl FromStr for DemoSample {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        DemoSample::ALL
            .into_iter()
            .find(|d| d.id() == lowered)
            .ok_or_else(|| format!("unknown demo sample: {s}"))
    }
}

/// Linear fade-in/fade-out envelope over `[start, end]`
fn fade(t: f64, start: f64, end: f64, fade_in: f64, fade_out: f64) -> f64 {
    if t <= start || t >= end {
        return 0.0;
    }
    let fi = ((t - start) / fade_in).min(1.0);
    let fo = ((end - t) / fade_out).min(1.0);
    fi * fo
}

fn lerp(a: f64, b: f64, k: f64) -> f64 {
    a + (b - a) * k.clamp(0.0, 1.0)
}

fn blend(a: &Formants, b: &Formants, k: f64) -> Formants {
    let mut out = *a;
    for (o, (fa, fb)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = (lerp(fa.0, fb.0, k), lerp(fa.1, fb.1, k));
    }
    out
}

/// One voiced sample at time `t`
fn voice_at(t: f64, f0: f64, formants: &Formants, vibrato: f64) -> f64 {
    let f0v = f0 * (1.0 + vibrato * (TAU * VIBRATO_RATE * t).sin());
    let mut s = 0.0;
    for h in 1..=MAX_HARMONICS {
        let freq = f0v * h as f64;
        if freq > MAX_HARMONIC_FREQ {
            break;
        }
        let source = 1.0 / (h as f64).powf(1.15);
        let gain: f64 = formants
            .iter()
            .map(|&(fc, bw)| {
                let q = fc / bw;
                let norm = (freq - fc) / fc;
                1.0 / (1.0 + q * q * norm * norm)
            })
            .sum();
        s += source * gain * (TAU * freq * t).sin();
    }
    s
}

fn vowels_at(t: f64) -> f64 {
    fade(t, 0.05, 1.02, 0.07, 0.10) * voice_at(t, F0, &AH, 0.012)
        + fade(t, 1.18, 2.15, 0.07, 0.10) * voice_at(t, F0 * 1.08, &EE, 0.010)
        + fade(t, 2.30, 3.25, 0.07, 0.10) * voice_at(t, F0 * 0.96, &OH, 0.014)
}

fn melody_at(t: f64) -> f64 {
    const NOTES: [(f64, f64, f64); 5] = [
        (523.25, 0.00, 0.48),
        (659.25, 0.58, 1.06),
        (783.99, 1.16, 1.64),
        (659.25, 1.74, 2.22),
        (523.25, 2.32, 2.92),
    ];

    NOTES
        .iter()
        .map(|&(freq, start, end)| {
            let env = fade(t, start, end, 0.04, 0.12);
            if env == 0.0 {
                return 0.0;
            }
            // "L" onset: EH into AH over the first 70 ms
            let formants = blend(&EH, &AH, (t - start) / 0.07);
            env * voice_at(t, freq, &formants, 0.009)
        })
        .sum()
}

fn hello_at(t: f64) -> f64 {
    let mut s = 0.0;

    let env = fade(t, 0.05, 0.38, 0.05, 0.07);
    if env > 0.0 {
        let f0 = lerp(270.0, 292.0, (t - 0.05) / 0.33);
        s += env * voice_at(t, f0, &EH, 0.010);
    }

    let env = fade(t, 0.34, 0.80, 0.05, 0.10);
    if env > 0.0 {
        let k = ((t - 0.34) / 0.25).min(1.0);
        s += env * voice_at(t, lerp(292.0, 280.0, k), &blend(&EH, &OH, k), 0.012);
    }

    let env = fade(t, 1.05, 1.65, 0.04, 0.08);
    if env > 0.0 {
        let f0 = lerp(295.0, 385.0, (t - 1.05) / 0.30);
        s += env * voice_at(t, f0, &OO, 0.018);
    }

    let env = fade(t, 1.62, 2.35, 0.05, 0.18);
    if env > 0.0 {
        let f0 = lerp(385.0, 345.0, (t - 1.62) / 0.73);
        s += env * voice_at(t, f0, &OO, 0.015);
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_envelope() {
        assert_eq!(fade(0.0, 0.1, 1.0, 0.1, 0.1), 0.0);
        assert!((fade(0.15, 0.1, 1.0, 0.1, 0.1) - 0.5).abs() < 1e-9);
        assert_eq!(fade(0.5, 0.1, 1.0, 0.1, 0.1), 1.0);
        assert_eq!(fade(1.0, 0.1, 1.0, 0.1, 0.1), 0.0);
    }

    #[test]
    fn test_clip_length_and_peak() {
        let clip = DemoSample::Hello.render().unwrap();
        assert_eq!(clip.sample_rate(), DEMO_SAMPLE_RATE);
        assert_eq!(clip.num_channels(), 1);
        assert_eq!(clip.len(), (44_100.0 * 3.2) as usize);
        assert!((clip.peak() - DEMO_PEAK).abs() < 1e-4);
        // Leading silence before the first syllable
        assert!(clip.channel(0)[..2000].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_parse_ids() {
        for sample in DemoSample::ALL {
            assert_eq!(sample.id().parse::<DemoSample>().unwrap(), sample);
        }
        assert!("applause".parse::<DemoSample>().is_err());
    }
}
