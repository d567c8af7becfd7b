//! Immutable multi-channel audio buffers
//!
//! An [`AudioBuffer`] never changes after construction. Every effect and mix
//! returns a new buffer, so the original recording and any processed version
//! can be compared freely. Channel data sits behind an `Arc`, which makes
//! cloning cheap and lets callers check whether two handles share storage.

use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur when constructing a buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer must have at least one channel")]
    NoChannels,
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
    #[error("channel {channel} has {found} frames, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        found: usize,
    },
    #[error("interleaved data length {len} is not a multiple of {channels} channels")]
    PartialFrame { len: usize, channels: usize },
}

/// Fixed-length, fixed-rate, multi-channel block of f32 samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    frames: usize,
    channels: Arc<[Vec<f32>]>,
}

impl AudioBuffer {
    /// Create a buffer from planar channel data
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        let frames = channels.first().map(Vec::len).ok_or(BufferError::NoChannels)?;
        if let Some((channel, data)) = channels
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != frames)
        {
            return Err(BufferError::RaggedChannels {
                channel,
                expected: frames,
                found: data.len(),
            });
        }

        Ok(Self {
            sample_rate,
            frames,
            channels: channels.into(),
        })
    }

    /// Create a single-channel buffer
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, BufferError> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a buffer from interleaved samples (L,R,L,R,...)
    pub fn from_interleaved(
        samples: &[f32],
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if channels == 0 {
            return Err(BufferError::NoChannels);
        }
        if samples.len() % channels != 0 {
            return Err(BufferError::PartialFrame {
                len: samples.len(),
                channels,
            });
        }

        let frames = samples.len() / channels;
        let planar: Vec<Vec<f32>> = (0..channels)
            .map(|ch| (0..frames).map(|f| samples[f * channels + ch]).collect())
            .collect();
        Self::new(planar, sample_rate)
    }

    /// Create a silent buffer
    pub fn silent(channels: usize, frames: usize, sample_rate: u32) -> Result<Self, BufferError> {
        Self::new(vec![vec![0.0; frames]; channels], sample_rate)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in frames (samples per channel)
    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    ///
    /// Indices past the last channel read the last channel, which broadcasts
    /// mono material across any wider layout.
    pub fn channel(&self, index: usize) -> &[f32] {
        let last = self.channels.len() - 1;
        &self.channels[index.min(last)]
    }

    /// Iterate over all channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.channels()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Whether both handles point at the same sample storage
    pub fn ptr_eq(&self, other: &AudioBuffer) -> bool {
        Arc::ptr_eq(&self.channels, &other.channels)
    }

    /// Copy of this buffer zero-padded (or truncated) to `frames`
    pub fn resized(&self, frames: usize) -> AudioBuffer {
        let channels = self
            .channels()
            .map(|ch| {
                let mut data = ch[..frames.min(ch.len())].to_vec();
                data.resize(frames, 0.0);
                data
            })
            .collect::<Vec<_>>();

        AudioBuffer {
            sample_rate: self.sample_rate,
            frames,
            channels: channels.into(),
        }
    }

    /// Apply a per-sample function, producing a new buffer
    pub fn map_samples(&self, f: impl Fn(f32) -> f32) -> AudioBuffer {
        let channels = self
            .channels()
            .map(|ch| ch.iter().map(|&s| f(s)).collect::<Vec<f32>>())
            .collect::<Vec<Vec<f32>>>();

        AudioBuffer {
            sample_rate: self.sample_rate,
            frames: self.frames,
            channels: channels.into(),
        }
    }

    /// Interleave up to `max_channels` channels (L,R,L,R,...)
    pub fn to_interleaved(&self, max_channels: usize) -> Vec<f32> {
        let channels = self.num_channels().min(max_channels.max(1));
        let mut out = Vec::with_capacity(self.frames * channels);
        for frame in 0..self.frames {
            for ch in 0..channels {
                out.push(self.channels[ch][frame]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_buffers() {
        assert_eq!(AudioBuffer::new(vec![], 48000).unwrap_err(), BufferError::NoChannels);
        assert_eq!(
            AudioBuffer::from_mono(vec![0.0; 4], 0).unwrap_err(),
            BufferError::ZeroSampleRate
        );
        assert!(matches!(
            AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 48000),
            Err(BufferError::RaggedChannels { channel: 1, .. })
        ));
        assert!(matches!(
            AudioBuffer::from_interleaved(&[0.0; 5], 2, 48000),
            Err(BufferError::PartialFrame { .. })
        ));
    }

    #[test]
    fn test_interleave_roundtrip_layout() {
        let buffer = AudioBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2], 2, 44100).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.channel(0), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2]);
        assert_eq!(buffer.to_interleaved(2), vec![0.1, -0.1, 0.2, -0.2]);
        assert_eq!(buffer.to_interleaved(1), vec![0.1, 0.2]);
    }

    #[test]
    fn test_channel_index_broadcasts_last() {
        let buffer = AudioBuffer::from_mono(vec![0.5, 0.25], 48000).unwrap();
        assert_eq!(buffer.channel(3), buffer.channel(0));
    }

    #[test]
    fn test_resized_pads_with_silence() {
        let buffer = AudioBuffer::from_mono(vec![0.5, 0.25], 48000).unwrap();
        let padded = buffer.resized(4);
        assert_eq!(padded.channel(0), &[0.5, 0.25, 0.0, 0.0]);
        assert_eq!(buffer.len(), 2);
        assert!(!padded.ptr_eq(&buffer));
    }

    #[test]
    fn test_clone_shares_storage() {
        let buffer = AudioBuffer::from_mono(vec![0.5; 8], 48000).unwrap();
        let copy = buffer.clone();
        assert!(copy.ptr_eq(&buffer));
        assert_eq!(buffer.peak(), 0.5);
        assert!((buffer.duration_secs() - 8.0 / 48000.0).abs() < 1e-12);
    }
}
