//! Offline rendering contexts
//!
//! Every effect renders through a [`RenderContext`]: a scoped handle sized to
//! the input's channel count and sample rate. Contexts are a limited shared
//! resource, so each one holds a slot in a [`ContextPool`] and gives it back
//! when dropped, whether the render succeeded, returned early or failed.

use crate::buffer::AudioBuffer;
use crate::dsp::Node;
use crate::effects::ProcessingError;
use parking_lot::{Condvar, Mutex};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum channels a context can render
pub const MAX_CHANNELS: usize = 32;

/// Supported sample rate range in Hz
pub const MIN_SAMPLE_RATE: u32 = 3_000;
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Concurrently open contexts allowed by the global pool
pub const DEFAULT_CONTEXT_LIMIT: usize = 6;

/// How long `acquire` waits for a free slot before giving up
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Counting pool of render context slots
pub struct ContextPool {
    limit: usize,
    open: Mutex<usize>,
    freed: Condvar,
}

impl ContextPool {
    /// Create a pool with room for `limit` open contexts
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            open: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    /// Process-wide pool used by the effects
    pub fn global() -> &'static ContextPool {
        static POOL: OnceLock<ContextPool> = OnceLock::new();
        POOL.get_or_init(|| ContextPool::new(DEFAULT_CONTEXT_LIMIT))
    }

    /// Number of contexts currently open
    pub fn open_contexts(&self) -> usize {
        *self.open.lock()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Open a context, waiting for a free slot if the pool is full
    pub fn acquire(
        &self,
        channels: usize,
        frames: usize,
        sample_rate: u32,
    ) -> Result<RenderContext<'_>, ProcessingError> {
        self.open_with(channels, frames, sample_rate, Some(ACQUIRE_TIMEOUT))
    }

    /// Open a context only if a slot is free right now
    pub fn try_acquire(
        &self,
        channels: usize,
        frames: usize,
        sample_rate: u32,
    ) -> Result<RenderContext<'_>, ProcessingError> {
        self.open_with(channels, frames, sample_rate, None)
    }

    fn open_with(
        &self,
        channels: usize,
        frames: usize,
        sample_rate: u32,
        wait: Option<Duration>,
    ) -> Result<RenderContext<'_>, ProcessingError> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ProcessingError::UnsupportedChannels(channels));
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(ProcessingError::InvalidSampleRate(sample_rate));
        }
        if frames == 0 {
            return Err(ProcessingError::EmptyInput);
        }

        let mut open = self.open.lock();
        if *open >= self.limit {
            let Some(timeout) = wait else {
                return Err(ProcessingError::ContextLimit(self.limit));
            };
            // wait_while_for returns once the predicate clears or the timeout hits
            let result = self
                .freed
                .wait_while_for(&mut open, |open| *open >= self.limit, timeout);
            if result.timed_out() && *open >= self.limit {
                warn!(limit = self.limit, "timed out waiting for a render context");
                return Err(ProcessingError::ContextLimit(self.limit));
            }
        }
        *open += 1;
        debug!(channels, frames, sample_rate, open = *open, "render context acquired");

        Ok(RenderContext {
            channels,
            frames,
            sample_rate,
            _slot: ContextSlot { pool: self },
        })
    }

    fn release(&self) {
        let mut open = self.open.lock();
        *open = open.saturating_sub(1);
        debug!(open = *open, "render context released");
        drop(open);
        self.freed.notify_one();
    }
}

/// Held slot, returned to the pool on drop
struct ContextSlot<'p> {
    pool: &'p ContextPool,
}

impl Drop for ContextSlot<'_> {
    fn drop(&mut self) {
        self.pool.release();
    }
}

/// An open offline rendering context
pub struct RenderContext<'p> {
    channels: usize,
    frames: usize,
    sample_rate: u32,
    _slot: ContextSlot<'p>,
}

impl RenderContext<'static> {
    /// Open a global context sized for `input` plus `tail_secs` of extra output
    pub fn for_buffer(input: &AudioBuffer, tail_secs: f32) -> Result<Self, ProcessingError> {
        if input.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }
        let tail_frames = (tail_secs.max(0.0) * input.sample_rate() as f32).ceil() as usize;
        ContextPool::global().acquire(
            input.num_channels(),
            input.len() + tail_frames,
            input.sample_rate(),
        )
    }
}

impl RenderContext<'_> {
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Output length in frames
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Render `input` through a chain of nodes, one fresh chain per channel
    ///
    /// Each channel starts as a copy of the input zero-padded to the context
    /// length, then every node processes it in place in order.
    pub fn render<F>(&self, input: &AudioBuffer, mut build_chain: F) -> Result<AudioBuffer, ProcessingError>
    where
        F: FnMut(usize) -> Vec<Box<dyn Node>>,
    {
        if input.num_channels() != self.channels {
            return Err(ProcessingError::UnsupportedChannels(input.num_channels()));
        }

        let mut rendered = Vec::with_capacity(self.channels);
        for ch in 0..self.channels {
            let source = input.channel(ch);
            let mut data = vec![0.0f32; self.frames];
            let copied = source.len().min(self.frames);
            data[..copied].copy_from_slice(&source[..copied]);

            for mut node in build_chain(ch) {
                node.process(&mut data);
            }

            if let Some(pos) = data.iter().position(|s| !s.is_finite()) {
                return Err(ProcessingError::NonFinite { channel: ch, frame: pos });
            }
            rendered.push(data);
        }

        AudioBuffer::new(rendered, self.sample_rate)
            .map_err(|e| ProcessingError::Render(e.to_string()))
    }
}
