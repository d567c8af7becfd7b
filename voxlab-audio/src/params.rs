//! Typed effect parameters
//!
//! Each effect owns a parameter record with a shared `wet_dry` field. At the
//! string-keyed boundary (CLI flags, session commands) parameters use their
//! camelCase names; every value written through that boundary is clamped to
//! the declared range, and unknown names are ignored.

use crate::effects::EffectId;
use tracing::debug;

/// Valid range of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Public description of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Boundary name, e.g. `pitchShift`
    pub key: &'static str,
    /// Display label
    pub label: &'static str,
    pub range: ParamRange,
}

const WET_DRY: ParamSpec = ParamSpec {
    key: "wetDry",
    label: "Effect Amount",
    range: ParamRange::new(0.0, 1.0, 0.05),
};

/// Common behaviour of the per-effect parameter records
pub trait ParamSet: Default + Clone + PartialEq + std::fmt::Debug {
    /// Declared parameters, `wetDry` last
    const SPECS: &'static [ParamSpec];

    /// Read a parameter by boundary name
    fn get(&self, key: &str) -> Option<f32>;

    /// Write a parameter without clamping; false if the name is unknown
    fn put(&mut self, key: &str, value: f32) -> bool;

    fn wet_dry(&self) -> f32;

    fn spec(key: &str) -> Option<&'static ParamSpec> {
        Self::SPECS.iter().find(|s| s.key == key)
    }

    /// Set a parameter, clamped to its range
    ///
    /// Returns false for unknown names. Non-finite values leave the
    /// parameter unchanged.
    fn set(&mut self, key: &str, value: f32) -> bool {
        let Some(spec) = Self::spec(key) else {
            return false;
        };
        if value.is_finite() {
            self.put(key, spec.range.clamp(value));
        }
        true
    }

    /// Copy with every parameter clamped to its range
    fn clamped(&self) -> Self {
        let mut out = self.clone();
        for spec in Self::SPECS {
            if let Some(value) = self.get(spec.key) {
                let value = if value.is_finite() {
                    value
                } else {
                    Self::default().get(spec.key).unwrap_or(spec.range.min)
                };
                out.put(spec.key, spec.range.clamp(value));
            }
        }
        out
    }
}

/// Chipmunk: upward pitch shift
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipmunkParams {
    /// Semitones (4 - 12)
    pub pitch_shift: f32,
    pub wet_dry: f32,
}

impl Default for ChipmunkParams {
    fn default() -> Self {
        Self {
            pitch_shift: 7.0,
            wet_dry: 1.0,
        }
    }
}

impl ParamSet for ChipmunkParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "pitchShift",
            label: "Pitch Shift (semitones)",
            range: ParamRange::new(4.0, 12.0, 1.0),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "pitchShift" => Some(self.pitch_shift),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "pitchShift" => self.pitch_shift = value,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Deep voice: downward pitch shift
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeepVoiceParams {
    /// Semitones (-12 - -4)
    pub pitch_shift: f32,
    pub wet_dry: f32,
}

impl Default for DeepVoiceParams {
    fn default() -> Self {
        Self {
            pitch_shift: -7.0,
            wet_dry: 1.0,
        }
    }
}

impl ParamSet for DeepVoiceParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "pitchShift",
            label: "Pitch Shift (semitones)",
            range: ParamRange::new(-12.0, -4.0, 1.0),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "pitchShift" => Some(self.pitch_shift),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "pitchShift" => self.pitch_shift = value,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Robot: ring modulation into a resonant band-pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotParams {
    /// Carrier frequency in Hz
    pub modulation_freq: f32,
    /// Band-pass centre in Hz
    pub filter_freq: f32,
    pub filter_q: f32,
    pub wet_dry: f32,
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            modulation_freq: 30.0,
            filter_freq: 800.0,
            filter_q: 3.0,
            wet_dry: 1.0,
        }
    }
}

impl ParamSet for RobotParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "modulationFreq",
            label: "Modulation Frequency (Hz)",
            range: ParamRange::new(20.0, 200.0, 5.0),
        },
        ParamSpec {
            key: "filterFreq",
            label: "Filter Center (Hz)",
            range: ParamRange::new(200.0, 3000.0, 50.0),
        },
        ParamSpec {
            key: "filterQ",
            label: "Filter Resonance",
            range: ParamRange::new(0.5, 10.0, 0.5),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "modulationFreq" => Some(self.modulation_freq),
            "filterFreq" => Some(self.filter_freq),
            "filterQ" => Some(self.filter_q),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "modulationFreq" => self.modulation_freq = value,
            "filterFreq" => self.filter_freq = value,
            "filterQ" => self.filter_q = value,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Telephone: band-limited and lightly distorted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelephoneParams {
    /// High-pass cutoff in Hz
    pub low_cutoff: f32,
    /// Low-pass cutoff in Hz
    pub high_cutoff: f32,
    /// Soft-clip amount (0 - 0.5)
    pub distortion: f32,
    pub wet_dry: f32,
}

impl Default for TelephoneParams {
    fn default() -> Self {
        Self {
            low_cutoff: 300.0,
            high_cutoff: 3400.0,
            distortion: 0.2,
            wet_dry: 1.0,
        }
    }
}

impl ParamSet for TelephoneParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "lowCutoff",
            label: "Low Cut (Hz)",
            range: ParamRange::new(200.0, 500.0, 25.0),
        },
        ParamSpec {
            key: "highCutoff",
            label: "High Cut (Hz)",
            range: ParamRange::new(2000.0, 4000.0, 100.0),
        },
        ParamSpec {
            key: "distortion",
            label: "Distortion",
            range: ParamRange::new(0.0, 0.5, 0.05),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "lowCutoff" => Some(self.low_cutoff),
            "highCutoff" => Some(self.high_cutoff),
            "distortion" => Some(self.distortion),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "lowCutoff" => self.low_cutoff = value,
            "highCutoff" => self.high_cutoff = value,
            "distortion" => self.distortion = value,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Echo: feedback delay with a decay tail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoParams {
    /// Delay in seconds
    pub delay_time: f32,
    /// Feedback gain (0 - 0.9)
    pub feedback: f32,
    pub wet_dry: f32,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            delay_time: 0.25,
            feedback: 0.5,
            wet_dry: 0.7,
        }
    }
}

impl ParamSet for EchoParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "delayTime",
            label: "Delay Time (s)",
            range: ParamRange::new(0.1, 1.0, 0.05),
        },
        ParamSpec {
            key: "feedback",
            label: "Feedback",
            range: ParamRange::new(0.0, 0.9, 0.05),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "delayTime" => Some(self.delay_time),
            "feedback" => Some(self.feedback),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "delayTime" => self.delay_time = value,
            "feedback" => self.feedback = value,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Alien: multi-voice chorus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlienParams {
    /// LFO rate in Hz
    pub chorus_rate: f32,
    /// Sweep depth (0 - 1)
    pub chorus_depth: f32,
    /// Number of voices (2 - 8)
    pub voices: u8,
    pub wet_dry: f32,
}

impl Default for AlienParams {
    fn default() -> Self {
        Self {
            chorus_rate: 2.0,
            chorus_depth: 0.7,
            voices: 4,
            wet_dry: 0.8,
        }
    }
}

impl ParamSet for AlienParams {
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec {
            key: "chorusRate",
            label: "Modulation Rate (Hz)",
            range: ParamRange::new(0.5, 8.0, 0.5),
        },
        ParamSpec {
            key: "chorusDepth",
            label: "Modulation Depth",
            range: ParamRange::new(0.0, 1.0, 0.05),
        },
        ParamSpec {
            key: "voices",
            label: "Voices",
            range: ParamRange::new(2.0, 8.0, 1.0),
        },
        WET_DRY,
    ];

    fn get(&self, key: &str) -> Option<f32> {
        match key {
            "chorusRate" => Some(self.chorus_rate),
            "chorusDepth" => Some(self.chorus_depth),
            "voices" => Some(self.voices as f32),
            "wetDry" => Some(self.wet_dry),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: f32) -> bool {
        match key {
            "chorusRate" => self.chorus_rate = value,
            "chorusDepth" => self.chorus_depth = value,
            // Saturating float-to-int cast; callers clamp first
            "voices" => self.voices = value.round() as u8,
            "wetDry" => self.wet_dry = value,
            _ => return false,
        }
        true
    }

    fn wet_dry(&self) -> f32 {
        self.wet_dry
    }
}

/// Parameters for any of the six effects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Chipmunk(ChipmunkParams),
    DeepVoice(DeepVoiceParams),
    Robot(RobotParams),
    Telephone(TelephoneParams),
    Echo(EchoParams),
    Alien(AlienParams),
}

impl EffectParams {
    /// Fully populated defaults for an effect
    pub fn defaults(id: EffectId) -> Self {
        match id {
            EffectId::Chipmunk => Self::Chipmunk(ChipmunkParams::default()),
            EffectId::DeepVoice => Self::DeepVoice(DeepVoiceParams::default()),
            EffectId::Robot => Self::Robot(RobotParams::default()),
            EffectId::Telephone => Self::Telephone(TelephoneParams::default()),
            EffectId::Echo => Self::Echo(EchoParams::default()),
            EffectId::Alien => Self::Alien(AlienParams::default()),
        }
    }

    /// Build from a sparse name/value list
    ///
    /// Missing names keep their defaults, unknown names are skipped and
    /// every value is clamped to its range.
    pub fn from_pairs<'a, I>(id: EffectId, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut params = Self::defaults(id);
        for (key, value) in pairs {
            if !params.set(key, value) {
                debug!(effect = id.as_str(), key, "ignoring unknown parameter");
            }
        }
        params
    }

    pub fn id(&self) -> EffectId {
        match self {
            Self::Chipmunk(_) => EffectId::Chipmunk,
            Self::DeepVoice(_) => EffectId::DeepVoice,
            Self::Robot(_) => EffectId::Robot,
            Self::Telephone(_) => EffectId::Telephone,
            Self::Echo(_) => EffectId::Echo,
            Self::Alien(_) => EffectId::Alien,
        }
    }

    /// Declared parameters of this effect
    pub fn specs(&self) -> &'static [ParamSpec] {
        Self::specs_for(self.id())
    }

    pub fn specs_for(id: EffectId) -> &'static [ParamSpec] {
        match id {
            EffectId::Chipmunk => ChipmunkParams::SPECS,
            EffectId::DeepVoice => DeepVoiceParams::SPECS,
            EffectId::Robot => RobotParams::SPECS,
            EffectId::Telephone => TelephoneParams::SPECS,
            EffectId::Echo => EchoParams::SPECS,
            EffectId::Alien => AlienParams::SPECS,
        }
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        match self {
            Self::Chipmunk(p) => p.get(key),
            Self::DeepVoice(p) => p.get(key),
            Self::Robot(p) => p.get(key),
            Self::Telephone(p) => p.get(key),
            Self::Echo(p) => p.get(key),
            Self::Alien(p) => p.get(key),
        }
    }

    /// Set a parameter by name, clamped; false if the effect has no such parameter
    pub fn set(&mut self, key: &str, value: f32) -> bool {
        match self {
            Self::Chipmunk(p) => p.set(key, value),
            Self::DeepVoice(p) => p.set(key, value),
            Self::Robot(p) => p.set(key, value),
            Self::Telephone(p) => p.set(key, value),
            Self::Echo(p) => p.set(key, value),
            Self::Alien(p) => p.set(key, value),
        }
    }

    pub fn wet_dry(&self) -> f32 {
        match self {
            Self::Chipmunk(p) => p.wet_dry(),
            Self::DeepVoice(p) => p.wet_dry(),
            Self::Robot(p) => p.wet_dry(),
            Self::Telephone(p) => p.wet_dry(),
            Self::Echo(p) => p.wet_dry(),
            Self::Alien(p) => p.wet_dry(),
        }
    }

    /// Current values as `(name, value)` in declaration order
    pub fn values(&self) -> Vec<(&'static str, f32)> {
        self.specs()
            .iter()
            .filter_map(|spec| self.get(spec.key).map(|v| (spec.key, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_declared_ranges() {
        for id in EffectId::ALL {
            let params = EffectParams::defaults(id);
            for spec in params.specs() {
                let value = params.get(spec.key).unwrap();
                assert!(spec.range.contains(value), "{} {} = {}", id.as_str(), spec.key, value);
            }
            assert_eq!(params.specs().last().map(|s| s.key), Some("wetDry"));
        }
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut params = EffectParams::defaults(EffectId::Echo);
        assert!(params.set("feedback", 1.5));
        assert_eq!(params.get("feedback"), Some(0.9));
        assert!(params.set("delayTime", -1.0));
        assert_eq!(params.get("delayTime"), Some(0.1));
        assert!(params.set("wetDry", 2.0));
        assert_eq!(params.wet_dry(), 1.0);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut params = EffectParams::defaults(EffectId::Robot);
        assert!(params.set("filterFreq", f32::NAN));
        assert_eq!(params.get("filterFreq"), Some(800.0));
    }

    #[test]
    fn test_sparse_pairs_fill_defaults() {
        let params = EffectParams::from_pairs(
            EffectId::Telephone,
            [("distortion", 0.4), ("bogus", 3.0), ("highCutoff", 10_000.0)],
        );
        let EffectParams::Telephone(p) = params else {
            panic!("wrong variant");
        };
        assert_eq!(p.low_cutoff, 300.0);
        assert_eq!(p.high_cutoff, 4000.0);
        assert_eq!(p.distortion, 0.4);
        assert_eq!(p.wet_dry, 1.0);
    }

    #[test]
    fn test_voices_round_and_clamp() {
        let mut params = AlienParams::default();
        params.set("voices", 5.6);
        assert_eq!(params.voices, 6);
        params.set("voices", 40.0);
        assert_eq!(params.voices, 8);
        params.set("voices", 0.0);
        assert_eq!(params.voices, 2);
    }

    #[test]
    fn test_clamped_repairs_direct_writes() {
        let params = DeepVoiceParams {
            pitch_shift: 5.0,
            wet_dry: f32::NAN,
        };
        let fixed = params.clamped();
        assert_eq!(fixed.pitch_shift, -4.0);
        assert_eq!(fixed.wet_dry, 1.0);
    }
}
