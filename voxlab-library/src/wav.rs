//! 16-bit PCM WAV encoding and decoding
//!
//! Samples are clamped to [-1, 1] and scaled asymmetrically: negative values
//! by 32768, positive by 32767. Decoding divides by the same factor, so a
//! round trip is exact up to PCM16 quantization.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use thiserror::Error;
use voxlab_audio::{AudioBuffer, BufferError};

/// Most channels written to a WAV file
pub const MAX_WAV_CHANNELS: usize = 2;

/// Errors that can occur reading or writing WAV data
#[derive(Error, Debug)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported WAV layout: {0}")]
    Unsupported(String),
    #[error("invalid audio: {0}")]
    Buffer(#[from] BufferError),
}

/// Convert one sample to PCM16
#[inline]
pub fn to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

/// Convert one PCM16 value back to a sample
#[inline]
pub fn from_pcm16(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Encode a buffer as a mono or stereo 16-bit PCM WAV file
///
/// Buffers with more than two channels keep their first two.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, WavError> {
    let channels = buffer.num_channels().min(MAX_WAV_CHANNELS);
    let spec = WavSpec {
        channels: channels as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(44 + buffer.len() * channels * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)?;
        for sample in buffer.to_interleaved(MAX_WAV_CHANNELS) {
            writer.write_sample(to_pcm16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(bytes)
}

/// Whether `bytes` look like a 16-bit PCM RIFF/WAVE file
pub fn is_pcm16_wav(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return false;
    }
    WavReader::new(Cursor::new(bytes))
        .map(|r| {
            let spec = r.spec();
            spec.sample_format == SampleFormat::Int && spec.bits_per_sample == 16
        })
        .unwrap_or(false)
}

/// Decode a 16-bit PCM WAV file exactly
pub fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, WavError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavError::Unsupported(format!(
            "{}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .map(|s| s.map(from_pcm16))
        .collect::<Result<Vec<f32>, _>>()?;

    Ok(AudioBuffer::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
    )?)
}
