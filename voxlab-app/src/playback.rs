//! Device playback
//!
//! One output stream at a time. The stream callback reads from a shared
//! [`Cursor`] that maps buffer channels onto device channels and steps
//! through the buffer at `buffer_rate / device_rate` with linear
//! interpolation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use voxlab_audio::AudioBuffer;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("audio output stream failed: {0}")]
    Stream(String),
}

/// Time allowed past the end of the buffer before a stalled device is abandoned
const WAIT_MARGIN: Duration = Duration::from_secs(2);

/// Read position into a buffer, shared with the output callback
#[derive(Debug)]
pub struct Cursor {
    buffer: AudioBuffer,
    /// Position in source frames
    position: f64,
    /// Source frames per device frame
    step: f64,
    finished: bool,
}

impl Cursor {
    pub fn new(buffer: AudioBuffer, device_rate: u32) -> Self {
        let step = buffer.sample_rate() as f64 / device_rate.max(1) as f64;
        Self {
            buffer,
            position: 0.0,
            step,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Source time left to play
    pub fn remaining(&self) -> Duration {
        let frames = (self.buffer.len() as f64 - self.position).max(0.0);
        Duration::from_secs_f64(frames / self.buffer.sample_rate().max(1) as f64)
    }

    fn sample_at(&self, channel: usize, position: f64) -> f32 {
        let data = self.buffer.channel(channel);
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let a = data.get(index).copied().unwrap_or(0.0);
        let b = data.get(index + 1).copied().unwrap_or(0.0);
        a + (b - a) * frac
    }

    /// Fill interleaved device frames; silence once the buffer is exhausted
    pub fn fill(&mut self, out: &mut [f32], device_channels: usize) {
        let source_channels = self.buffer.num_channels();
        let len = self.buffer.len() as f64;

        for frame in out.chunks_exact_mut(device_channels.max(1)) {
            if self.position >= len {
                self.finished = true;
                frame.fill(0.0);
                continue;
            }

            if device_channels == 1 && source_channels > 1 {
                let sum: f32 = (0..source_channels)
                    .map(|ch| self.sample_at(ch, self.position))
                    .sum();
                frame[0] = sum / source_channels as f32;
            } else {
                for (ch, sample) in frame.iter_mut().enumerate() {
                    // Mono sources feed every device channel; extra channels repeat the last one
                    *sample = self.sample_at(ch.min(source_channels - 1), self.position);
                }
            }
            self.position += self.step;
        }
    }
}

/// Exclusive output player
#[derive(Default)]
pub struct Player {
    stream: Option<cpal::Stream>,
    cursor: Option<Arc<Mutex<Cursor>>>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `buffer`, stopping whatever is playing
    pub fn play(&mut self, buffer: &AudioBuffer) -> Result<(), PlaybackError> {
        self.stop();

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        let device_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let cursor = Arc::new(Mutex::new(Cursor::new(buffer.clone(), device_rate)));
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, cursor.clone()),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, cursor.clone()),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, cursor.clone()),
            other => return Err(PlaybackError::Stream(format!("unsupported sample format {other:?}"))),
        }?;
        stream.play().map_err(|e| PlaybackError::Stream(e.to_string()))?;

        debug!(
            frames = buffer.len(),
            source_rate = buffer.sample_rate(),
            device_rate,
            channels,
            "playback started"
        );
        self.stream = Some(stream);
        self.cursor = Some(cursor);
        Ok(())
    }

    /// Stop playback; no-op when idle
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("playback stopped");
        }
        self.cursor = None;
    }

    pub fn is_playing(&self) -> bool {
        self.cursor
            .as_ref()
            .is_some_and(|cursor| !cursor.lock().is_finished())
    }

    /// Block until the current buffer has played out
    ///
    /// Gives up once the remaining buffer time plus a margin has passed, so a
    /// device that stops calling back cannot hang the caller.
    pub fn wait(&mut self) {
        self.wait_with_margin(WAIT_MARGIN);
    }

    fn wait_with_margin(&mut self, margin: Duration) {
        let remaining = self
            .cursor
            .as_ref()
            .map_or(Duration::ZERO, |cursor| cursor.lock().remaining());
        let deadline = Instant::now() + remaining + margin;
        while self.is_playing() {
            if Instant::now() >= deadline {
                warn!(?remaining, "output device stalled, stopping playback");
                break;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        self.stop();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    cursor: Arc<Mutex<Cursor>>,
) -> Result<cpal::Stream, PlaybackError>
where
    T: SizedSample + FromSample<f32>,
{
    // Pre-allocated so the callback never allocates
    let mut scratch = vec![0.0f32; 16384];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Never block the audio thread; output silence on contention
                let Some(mut cursor) = cursor.try_lock() else {
                    data.fill(T::EQUILIBRIUM);
                    return;
                };
                if scratch.len() < data.len() {
                    data.fill(T::EQUILIBRIUM);
                    return;
                }
                let out = &mut scratch[..data.len()];
                cursor.fill(out, channels);
                for (dst, &src) in data.iter_mut().zip(out.iter()) {
                    *dst = T::from_sample(src);
                }
            },
            |err| warn!(error = %err, "audio output stream error"),
            None,
        )
        .map_err(|e| PlaybackError::Stream(e.to_string()))
}
