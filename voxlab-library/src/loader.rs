//! Audio decoding to the session sample rate
//!
//! 16-bit PCM WAV goes through the exact WAV decoder; anything else is probed
//! and decoded by Symphonia. Results are resampled to the target rate when
//! the source rate differs.

use crate::wav::{decode_wav, is_pcm16_wav, WavError};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, info};
use voxlab_audio::{AudioBuffer, BufferError};

/// Default session sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Errors that can occur while loading audio
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format")]
    UnsupportedFormat,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Resample error: {0}")]
    Resample(String),
    #[error("File contains no audio")]
    Empty,
    #[error(transparent)]
    Wav(#[from] WavError),
    #[error("Invalid audio: {0}")]
    Buffer(#[from] BufferError),
}

/// Decoder producing buffers at a fixed sample rate
pub struct AudioLoader {
    target_sample_rate: u32,
}

impl Default for AudioLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioLoader {
    /// Create a loader with the default 48kHz sample rate
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Create a loader with a specific sample rate
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Load and decode an audio file
    pub fn load(&self, path: &Path) -> Result<AudioBuffer, LoadError> {
        let bytes = std::fs::read(path)?;
        let extension = path.extension().and_then(|e| e.to_str());
        info!(path = %path.display(), bytes = bytes.len(), "loading audio file");
        self.decode_with_hint(bytes, extension)
    }

    /// Decode an in-memory file
    pub fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer, LoadError> {
        self.decode_with_hint(bytes.to_vec(), None)
    }

    fn decode_with_hint(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioBuffer, LoadError> {
        let decoded = if is_pcm16_wav(&bytes) {
            debug!("decoding PCM16 WAV directly");
            decode_wav(&bytes)?
        } else {
            self.decode_symphonia(bytes, extension)?
        };

        if decoded.is_empty() {
            return Err(LoadError::Empty);
        }
        self.conform(decoded)
    }

    /// Bring an in-memory buffer (capture, demo clip) to the target rate
    pub fn conform(&self, buffer: AudioBuffer) -> Result<AudioBuffer, LoadError> {
        if buffer.sample_rate() == self.target_sample_rate {
            return Ok(buffer);
        }
        self.resample(&buffer)
    }

    fn decode_symphonia(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioBuffer, LoadError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| match e {
                SymphoniaError::Unsupported(_) => LoadError::UnsupportedFormat,
                other => LoadError::Decode(other.to_string()),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let source_sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                // Corrupt packets are skipped
                Err(SymphoniaError::DecodeError(msg)) => {
                    debug!(msg, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        if channels == 0 || samples.is_empty() {
            return Err(LoadError::Empty);
        }
        debug!(
            frames = samples.len() / channels,
            channels,
            sample_rate = source_sample_rate,
            "decoded with symphonia"
        );
        Ok(AudioBuffer::from_interleaved(&samples, channels, source_sample_rate)?)
    }

    /// Resample to the target rate
    fn resample(&self, buffer: &AudioBuffer) -> Result<AudioBuffer, LoadError> {
        use rubato::{FftFixedInOut, Resampler};

        let source_rate = buffer.sample_rate();
        let channels = buffer.num_channels();
        let frames = buffer.len();
        debug!(from = source_rate, to = self.target_sample_rate, frames, "resampling");

        let mut resampler = FftFixedInOut::<f32>::new(
            source_rate as usize,
            self.target_sample_rate as usize,
            1024,
            channels,
        )
        .map_err(|e| LoadError::Resample(e.to_string()))?;

        let chunk_size = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); channels];

        let mut pos = 0;
        while pos + chunk_size <= frames {
            let input_refs: Vec<&[f32]> = buffer
                .channels()
                .map(|ch| &ch[pos..pos + chunk_size])
                .collect();

            let resampled = resampler
                .process(&input_refs, None)
                .map_err(|e| LoadError::Resample(e.to_string()))?;

            for (ch, data) in resampled.into_iter().enumerate() {
                output[ch].extend(data);
            }
            pos += chunk_size;
        }

        // Last partial chunk: pad with zeros, keep the proportional output
        if pos < frames {
            let remaining = frames - pos;
            let padded: Vec<Vec<f32>> = buffer
                .channels()
                .map(|ch| {
                    let mut v = ch[pos..].to_vec();
                    v.resize(chunk_size, 0.0);
                    v
                })
                .collect();
            let input_refs: Vec<&[f32]> = padded.iter().map(Vec::as_slice).collect();

            let resampled = resampler
                .process(&input_refs, None)
                .map_err(|e| LoadError::Resample(e.to_string()))?;
            let keep = remaining * self.target_sample_rate as usize / source_rate as usize;
            for (ch, data) in resampled.into_iter().enumerate() {
                output[ch].extend(&data[..keep.min(data.len())]);
            }
        }

        Ok(AudioBuffer::new(output, self.target_sample_rate)?)
    }
}

/// Decode bytes into a buffer at `target_rate`
pub fn decode_audio(bytes: &[u8], target_rate: u32) -> Result<AudioBuffer, LoadError> {
    AudioLoader::with_sample_rate(target_rate).decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::encode_wav;
    use std::f32::consts::PI;

    fn tone(sample_rate: u32, frames: usize) -> AudioBuffer {
        let samples = (0..frames)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        AudioBuffer::from_mono(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_same_rate_wav_is_exact() {
        let original = tone(48000, 4800);
        let bytes = encode_wav(&original).unwrap();
        let decoded = decode_audio(&bytes, 48000).unwrap();
        assert_eq!(decoded.len(), original.len());
        for (a, b) in original.channel(0).iter().zip(decoded.channel(0)) {
            assert!((a - b).abs() <= 1.0 / 32767.0);
        }
    }

    #[test]
    fn test_resamples_to_target_rate() {
        let original = tone(44100, 44100);
        let bytes = encode_wav(&original).unwrap();
        let decoded = decode_audio(&bytes, 48000).unwrap();
        assert_eq!(decoded.sample_rate(), 48000);
        assert_eq!(decoded.num_channels(), 1);
        assert!((decoded.len() as i64 - 48000).abs() < 2048, "{} frames", decoded.len());
    }

    #[test]
    fn test_conform_keeps_matching_rate() {
        let original = tone(48000, 480);
        let conformed = AudioLoader::new().conform(original.clone()).unwrap();
        assert!(conformed.ptr_eq(&original));

        let resampled = AudioLoader::new().conform(tone(24000, 24000)).unwrap();
        assert_eq!(resampled.sample_rate(), 48000);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_audio(b"definitely not audio data at all", 48000).is_err());
    }

    #[test]
    fn test_empty_wav_is_an_error() {
        let empty = AudioBuffer::silent(1, 0, 48000).unwrap();
        let bytes = encode_wav(&empty).unwrap();
        assert!(matches!(decode_audio(&bytes, 48000), Err(LoadError::Empty)));
    }
}
