//! Microphone capture
//!
//! The cpal input callback pushes samples into a lock-free ring buffer; the
//! recording thread drains it, folds the frames down to mono, feeds the level
//! meter and stops at the requested length or the wall-clock ceiling,
//! whichever comes first.

use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;
use tracing::{info, warn};
use voxlab_audio::{AudioBuffer, BufferError, LevelMeter, LevelReading};

/// How often the ring buffer is drained
const DRAIN_INTERVAL: Duration = Duration::from_millis(20);

/// Ring buffer capacity in seconds of audio
const RING_SECS: usize = 2;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("microphone access was denied: {0}")]
    PermissionDenied(String),
    #[error("no microphone found")]
    NoDevice,
    #[error("audio input stream failed: {0}")]
    Stream(String),
    #[error("captured audio is invalid: {0}")]
    Buffer(#[from] BufferError),
}

impl CaptureError {
    /// Split backend failures into permission problems and everything else
    fn from_backend(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("permission")
            || lower.contains("denied")
            || lower.contains("not permitted")
            || lower.contains("not authorized")
        {
            CaptureError::PermissionDenied(message)
        } else {
            CaptureError::Stream(message)
        }
    }
}

/// Result of one capture session
#[derive(Debug)]
pub struct Recording {
    pub buffer: AudioBuffer,
    /// True when the ceiling ended the recording
    pub auto_stopped: bool,
}

/// Records from the default input device
///
/// `record` borrows the recorder mutably, so one recorder runs one session
/// at a time.
pub struct Recorder {
    max_secs: u32,
}

impl Recorder {
    pub fn new(max_secs: u32) -> Self {
        Self {
            max_secs: max_secs.max(1),
        }
    }

    /// Longest recording this recorder allows
    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }

    /// Record for `secs` (capped at the ceiling), reporting levels as they arrive
    pub fn record(
        &mut self,
        secs: Option<u32>,
        mut on_level: impl FnMut(LevelReading, f64),
    ) -> Result<Recording, CaptureError> {
        self.capture(secs, &mut on_level)
    }

    fn capture(
        &self,
        secs: Option<u32>,
        on_level: &mut dyn FnMut(LevelReading, f64),
    ) -> Result<Recording, CaptureError> {
        let requested = secs.unwrap_or(self.max_secs);
        let limit_secs = requested.min(self.max_secs);

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::from_backend(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let ring = HeapRb::<f32>::new(sample_rate as usize * channels * RING_SECS);
        let (producer, mut consumer) = ring.split();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, producer),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, producer),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, producer),
            other => {
                return Err(CaptureError::Stream(format!("unsupported sample format {other:?}")));
            }
        }?;
        stream
            .play()
            .map_err(|e| CaptureError::from_backend(e.to_string()))?;

        info!(sample_rate, channels, limit_secs, "recording started");

        let target_frames = sample_rate as usize * limit_secs as usize;
        let ceiling = Duration::from_secs(self.max_secs as u64);
        let started = Instant::now();
        let mut meter = LevelMeter::new(sample_rate, LevelMeter::DEFAULT_WINDOW_SECS);
        let mut scratch = vec![0.0f32; sample_rate as usize * channels / 10];
        let mut mono: Vec<f32> = Vec::with_capacity(target_frames);

        let mut auto_stopped = false;
        loop {
            std::thread::sleep(DRAIN_INTERVAL);

            let start = mono.len();
            drain(&mut consumer, &mut scratch, channels, &mut mono);
            if let Some(reading) = meter.push(&mono[start..]) {
                on_level(reading, mono.len() as f64 / sample_rate as f64);
            }

            if started.elapsed() >= ceiling {
                auto_stopped = true;
                break;
            }
            if mono.len() >= target_frames {
                auto_stopped = requested >= self.max_secs;
                break;
            }
        }
        drop(stream);

        // Whatever arrived after the last drain
        drain(&mut consumer, &mut scratch, channels, &mut mono);
        mono.truncate(target_frames);

        if auto_stopped {
            info!(max_secs = self.max_secs, "recording auto-stopped at the ceiling");
        }
        info!(frames = mono.len(), "recording stopped");

        Ok(Recording {
            buffer: AudioBuffer::from_mono(mono, sample_rate)?,
            auto_stopped,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: HeapProd<f32>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Whole callbacks are dropped when the ring is full so frames stay aligned
                if producer.vacant_len() < data.len() {
                    return;
                }
                for &sample in data {
                    let _ = producer.try_push(sample.to_sample::<f32>());
                }
            },
            |err| warn!(error = %err, "audio input stream error"),
            None,
        )
        .map_err(|e| CaptureError::from_backend(e.to_string()))
}

/// Move complete frames out of the ring, averaged to mono
fn drain(consumer: &mut HeapCons<f32>, scratch: &mut [f32], channels: usize, out: &mut Vec<f32>) {
    let usable = scratch.len() - scratch.len() % channels;
    loop {
        let read = consumer.pop_slice(&mut scratch[..usable]);
        if read == 0 {
            break;
        }
        downmix_into(&scratch[..read], channels, out);
        if read < usable {
            break;
        }
    }
}

/// Average interleaved frames into one channel; a trailing partial frame is dropped
pub fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let scale = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_frames() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mut out = vec![0.25];
        downmix_into(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![0.25, 0.1, 0.2]);
    }

    #[test]
    fn test_drain_reads_everything_queued() {
        let ring = HeapRb::<f32>::new(64);
        let (mut producer, mut consumer) = ring.split();
        for i in 0..40 {
            producer.try_push(i as f32).unwrap();
        }
        let mut scratch = vec![0.0; 16];
        let mut out = Vec::new();
        drain(&mut consumer, &mut scratch, 2, &mut out);
        assert_eq!(out.len(), 20);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[19], 38.5);
    }

    #[test]
    fn test_backend_errors_are_classified() {
        assert!(matches!(
            CaptureError::from_backend("Permission denied by the system".into()),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            CaptureError::from_backend("device unplugged".into()),
            CaptureError::Stream(_)
        ));
    }

    #[test]
    fn test_recorder_ceiling_is_at_least_one_second() {
        assert_eq!(Recorder::new(0).max_secs(), 1);
        assert_eq!(Recorder::new(10).max_secs(), 10);
    }
}
