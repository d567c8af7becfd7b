//! Processing orchestrator
//!
//! [`Processor`] holds the session state: the original recording, the last
//! committed processed buffer, the recording status and what is playing.
//! Effect requests are numbered; a result is committed only when its number
//! is higher than anything committed before, so a slow render can never
//! overwrite a newer one. [`ProcessingWorker`] runs renders off the caller's
//! thread and reports back over a channel.

use crate::buffer::AudioBuffer;
use crate::effects::{Effect, EffectId, ProcessingError, UnknownEffectError};
use crate::params::EffectParams;
use crate::registry::EffectRegistry;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    UnknownEffect(#[from] UnknownEffectError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("nothing recorded yet")]
    NoRecording,

    #[error("no processed audio yet")]
    NoProcessed,

    #[error("a recording is already in progress")]
    AlreadyRecording,
}

/// Recording lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingStatus {
    #[default]
    Idle,
    Recording,
    Stopped,
}

/// Which buffer playback reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSource {
    Original,
    Processed,
}

/// Exclusive playback state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing {
        source: PlaybackSource,
        /// Start position in seconds
        offset_secs: f64,
        started: Instant,
    },
}

/// A numbered effect request
#[derive(Debug, Clone)]
pub struct Ticket {
    pub seq: u64,
    pub effect: Effect,
    pub params: EffectParams,
    pub input: AudioBuffer,
}

impl Ticket {
    /// Render this request; pure with respect to the session state
    pub fn run(&self) -> Result<AudioBuffer, ProcessingError> {
        self.effect.process(&self.input, &self.params)
    }
}

/// What happened to a finished request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A newer request already committed; the result was dropped
    Stale,
}

/// Session state machine
#[derive(Debug, Default)]
pub struct Processor {
    status: RecordingStatus,
    original: Option<AudioBuffer>,
    processed: Option<AudioBuffer>,
    processed_effect: Option<EffectId>,
    /// Last sequence number handed out
    next_seq: u64,
    /// Highest sequence number committed (or invalidated)
    committed_seq: u64,
    playback: PlaybackState,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RecordingStatus {
        self.status
    }

    pub fn original(&self) -> Option<&AudioBuffer> {
        self.original.as_ref()
    }

    pub fn processed(&self) -> Option<&AudioBuffer> {
        self.processed.as_ref()
    }

    /// Effect that produced the current processed buffer
    pub fn processed_effect(&self) -> Option<EffectId> {
        self.processed_effect
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Enter the recording state; only one capture at a time
    pub fn begin_recording(&mut self) -> Result<(), ProcessorError> {
        if self.status == RecordingStatus::Recording {
            return Err(ProcessorError::AlreadyRecording);
        }
        self.stop_playback();
        self.status = RecordingStatus::Recording;
        Ok(())
    }

    /// Leave the recording state without a result (capture failed)
    pub fn abort_recording(&mut self) {
        if self.status == RecordingStatus::Recording {
            self.status = if self.original.is_some() {
                RecordingStatus::Stopped
            } else {
                RecordingStatus::Idle
            };
        }
    }

    /// Install a new original (end of a capture, a demo clip or a file)
    ///
    /// Drops the previous processed buffer and invalidates every request
    /// still in flight.
    pub fn load(&mut self, buffer: AudioBuffer) {
        info!(
            frames = buffer.len(),
            channels = buffer.num_channels(),
            sample_rate = buffer.sample_rate(),
            "original loaded"
        );
        self.stop_playback();
        self.original = Some(buffer);
        self.processed = None;
        self.processed_effect = None;
        self.committed_seq = self.next_seq;
        self.status = RecordingStatus::Stopped;
    }

    /// Back to idle with nothing recorded
    pub fn reset(&mut self) {
        self.stop_playback();
        self.original = None;
        self.processed = None;
        self.processed_effect = None;
        self.committed_seq = self.next_seq;
        self.status = RecordingStatus::Idle;
    }

    /// Number a new effect request against the current original
    ///
    /// Fails fast on an unknown effect or when nothing is recorded.
    pub fn submit(&mut self, effect: &str, params: Option<EffectParams>) -> Result<Ticket, ProcessorError> {
        let effect = EffectRegistry::global().get(effect)?;
        let input = self.original.clone().ok_or(ProcessorError::NoRecording)?;
        let params = params.unwrap_or_else(|| effect.default_params());

        self.next_seq += 1;
        debug!(seq = self.next_seq, effect = effect.id().as_str(), "effect request");
        Ok(Ticket {
            seq: self.next_seq,
            effect,
            params,
            input,
        })
    }

    /// Commit a finished request
    ///
    /// Results older than the last commit are dropped. A failure is returned
    /// as an error and leaves the previous processed buffer in place, but
    /// still supersedes every older request. A successful commit stops
    /// playback of the old processed buffer.
    pub fn commit(
        &mut self,
        seq: u64,
        effect: EffectId,
        result: Result<AudioBuffer, ProcessingError>,
    ) -> Result<CommitOutcome, ProcessorError> {
        if seq <= self.committed_seq {
            debug!(seq, committed = self.committed_seq, effect = effect.as_str(), "discarding stale result");
            return Ok(CommitOutcome::Stale);
        }

        self.committed_seq = seq;
        let buffer = match result {
            Ok(buffer) => buffer,
            Err(error) => {
                debug!(seq, effect = effect.as_str(), %error, "effect request failed");
                return Err(error.into());
            }
        };
        self.processed = Some(buffer);
        self.processed_effect = Some(effect);
        if let PlaybackState::Playing {
            source: PlaybackSource::Processed,
            ..
        } = self.playback
        {
            self.playback = PlaybackState::Idle;
        }
        debug!(seq, effect = effect.as_str(), "processed buffer committed");
        Ok(CommitOutcome::Committed)
    }

    /// Commit a worker event
    pub fn apply_event(&mut self, event: ProcessingEvent) -> Result<CommitOutcome, ProcessorError> {
        match event {
            ProcessingEvent::Completed { seq, effect, buffer } => self.commit(seq, effect, Ok(buffer)),
            ProcessingEvent::Failed { seq, effect, error } => self.commit(seq, effect, Err(error)),
        }
    }

    /// Submit, render and commit on the calling thread
    pub fn apply_effect(&mut self, effect: &str, params: Option<EffectParams>) -> Result<AudioBuffer, ProcessorError> {
        let ticket = self.submit(effect, params)?;
        let result = ticket.run();
        self.commit(ticket.seq, ticket.effect.id(), result)?;
        self.processed.clone().ok_or(ProcessorError::NoProcessed)
    }

    /// Start playing a buffer, stopping whatever was playing
    pub fn start_playback(&mut self, source: PlaybackSource) -> Result<AudioBuffer, ProcessorError> {
        let buffer = match source {
            PlaybackSource::Original => self.original.clone().ok_or(ProcessorError::NoRecording)?,
            PlaybackSource::Processed => self.processed.clone().ok_or(ProcessorError::NoProcessed)?,
        };
        self.stop_playback();
        self.playback = PlaybackState::Playing {
            source,
            offset_secs: 0.0,
            started: Instant::now(),
        };
        Ok(buffer)
    }

    /// Stop playback; returns what was playing, if anything
    pub fn stop_playback(&mut self) -> Option<PlaybackSource> {
        match std::mem::take(&mut self.playback) {
            PlaybackState::Playing { source, .. } => Some(source),
            PlaybackState::Idle => None,
        }
    }

    /// Playback position in seconds (offset + elapsed), capped at the buffer length
    ///
    /// Once the end is reached playback returns to idle.
    pub fn current_time(&mut self) -> f64 {
        let PlaybackState::Playing {
            source,
            offset_secs,
            started,
        } = self.playback
        else {
            return 0.0;
        };

        let duration = match source {
            PlaybackSource::Original => self.original.as_ref(),
            PlaybackSource::Processed => self.processed.as_ref(),
        }
        .map(AudioBuffer::duration_secs)
        .unwrap_or(0.0);

        let position = offset_secs + started.elapsed().as_secs_f64();
        if position >= duration {
            self.playback = PlaybackState::Idle;
            return duration;
        }
        position
    }
}

/// Commands for the render thread
#[derive(Debug)]
pub enum WorkerCommand {
    Render(Ticket),
    Shutdown,
}

/// Results from the render thread
#[derive(Debug, Clone)]
pub enum ProcessingEvent {
    Completed {
        seq: u64,
        effect: EffectId,
        buffer: AudioBuffer,
    },
    Failed {
        seq: u64,
        effect: EffectId,
        error: ProcessingError,
    },
}

impl ProcessingEvent {
    pub fn seq(&self) -> u64 {
        match self {
            ProcessingEvent::Completed { seq, .. } | ProcessingEvent::Failed { seq, .. } => *seq,
        }
    }
}

/// Background render thread
pub struct ProcessingWorker {
    command_tx: Sender<WorkerCommand>,
    event_rx: Receiver<ProcessingEvent>,
    handle: Option<JoinHandle<()>>,
}

impl ProcessingWorker {
    /// Queue depth for requests and results
    const QUEUE_SIZE: usize = 64;

    pub fn spawn() -> Self {
        let (command_tx, command_rx) = bounded::<WorkerCommand>(Self::QUEUE_SIZE);
        let (event_tx, event_rx) = bounded::<ProcessingEvent>(Self::QUEUE_SIZE);

        let handle = thread::spawn(move || {
            for command in command_rx.iter() {
                let ticket = match command {
                    WorkerCommand::Render(ticket) => ticket,
                    WorkerCommand::Shutdown => break,
                };

                let effect = ticket.effect.id();
                let event = match ticket.run() {
                    Ok(buffer) => ProcessingEvent::Completed {
                        seq: ticket.seq,
                        effect,
                        buffer,
                    },
                    Err(error) => ProcessingEvent::Failed {
                        seq: ticket.seq,
                        effect,
                        error,
                    },
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            debug!("render worker stopped");
        });

        Self {
            command_tx,
            event_rx,
            handle: Some(handle),
        }
    }

    /// Queue a request; false if the queue is full or the worker is gone
    pub fn submit(&self, ticket: Ticket) -> bool {
        let seq = ticket.seq;
        let queued = self.command_tx.try_send(WorkerCommand::Render(ticket)).is_ok();
        if !queued {
            warn!(seq, "render queue unavailable");
        }
        queued
    }

    /// Next finished request, if any
    pub fn try_recv(&self) -> Option<ProcessingEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished request
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ProcessingEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the thread after the requests already queued
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.command_tx.send(WorkerCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for ProcessingWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn voice() -> AudioBuffer {
        let samples = (0..9600)
            .map(|i| 0.5 * (2.0 * PI * 220.0 * i as f32 / 48000.0).sin())
            .collect();
        AudioBuffer::from_mono(samples, 48000).unwrap()
    }

    #[test]
    fn test_submit_requires_recording_and_known_effect() {
        let mut p = Processor::new();
        assert_eq!(p.submit("robot", None).unwrap_err(), ProcessorError::NoRecording);
        p.load(voice());
        assert!(matches!(
            p.submit("kazoo", None),
            Err(ProcessorError::UnknownEffect(_))
        ));
        let a = p.submit("robot", None).unwrap();
        let b = p.submit("robot", None).unwrap();
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut p = Processor::new();
        p.load(voice());
        let first = p.submit("chipmunk", None).unwrap();
        let second = p.submit("deepVoice", None).unwrap();

        // The later request finishes first
        let out = p.commit(second.seq, second.effect.id(), second.run()).unwrap();
        assert_eq!(out, CommitOutcome::Committed);
        let out = p.commit(first.seq, first.effect.id(), first.run()).unwrap();
        assert_eq!(out, CommitOutcome::Stale);
        assert_eq!(p.processed_effect(), Some(EffectId::DeepVoice));
    }

    #[test]
    fn test_older_result_after_newer_failure_is_discarded() {
        let mut p = Processor::new();
        p.load(voice());
        let first = p.submit("chipmunk", None).unwrap();
        let second = p.submit("robot", None).unwrap();

        p.commit(second.seq, second.effect.id(), Err(ProcessingError::ContextLimit(6)))
            .unwrap_err();
        let out = p.commit(first.seq, first.effect.id(), first.run()).unwrap();
        assert_eq!(out, CommitOutcome::Stale);
        assert!(p.processed().is_none());
        assert_eq!(p.processed_effect(), None);
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let mut p = Processor::new();
        p.load(voice());
        let good = p.apply_effect("echo", None).unwrap();

        let ticket = p.submit("robot", None).unwrap();
        let err = p
            .commit(ticket.seq, EffectId::Robot, Err(ProcessingError::ContextLimit(6)))
            .unwrap_err();
        assert_eq!(err, ProcessorError::Processing(ProcessingError::ContextLimit(6)));
        assert_eq!(p.processed(), Some(&good));
        assert_eq!(p.processed_effect(), Some(EffectId::Echo));

        // A retry after the failure still commits
        let retry = p.submit("robot", None).unwrap();
        assert_eq!(
            p.commit(retry.seq, EffectId::Robot, retry.run()).unwrap(),
            CommitOutcome::Committed
        );
    }

    #[test]
    fn test_load_invalidates_in_flight_requests() {
        let mut p = Processor::new();
        p.load(voice());
        let ticket = p.submit("alien", None).unwrap();
        p.load(voice());
        let out = p.commit(ticket.seq, EffectId::Alien, ticket.run()).unwrap();
        assert_eq!(out, CommitOutcome::Stale);
        assert!(p.processed().is_none());
    }

    #[test]
    fn test_original_is_never_modified() {
        let mut p = Processor::new();
        let input = voice();
        p.load(input.clone());
        let chip = p.apply_effect("chipmunk", None).unwrap();
        let deep = p.apply_effect("deepVoice", None).unwrap();
        assert_eq!(p.original(), Some(&input));
        assert_ne!(chip.channel(0), deep.channel(0));
    }

    #[test]
    fn test_playback_is_exclusive() {
        let mut p = Processor::new();
        assert_eq!(
            p.start_playback(PlaybackSource::Original).unwrap_err(),
            ProcessorError::NoRecording
        );
        p.load(voice());
        p.apply_effect("telephone", None).unwrap();

        p.start_playback(PlaybackSource::Original).unwrap();
        p.start_playback(PlaybackSource::Processed).unwrap();
        assert!(matches!(
            p.playback(),
            PlaybackState::Playing {
                source: PlaybackSource::Processed,
                ..
            }
        ));
        assert!(p.current_time() >= 0.0);

        // New processed audio cancels playback of the old one
        p.apply_effect("robot", None).unwrap();
        assert_eq!(p.playback(), PlaybackState::Idle);
        assert_eq!(p.stop_playback(), None);
    }

    #[test]
    fn test_recording_state_machine() {
        let mut p = Processor::new();
        assert_eq!(p.status(), RecordingStatus::Idle);
        p.begin_recording().unwrap();
        assert_eq!(p.begin_recording(), Err(ProcessorError::AlreadyRecording));
        p.abort_recording();
        assert_eq!(p.status(), RecordingStatus::Idle);

        p.begin_recording().unwrap();
        p.load(voice());
        assert_eq!(p.status(), RecordingStatus::Stopped);
        p.reset();
        assert_eq!(p.status(), RecordingStatus::Idle);
        assert!(p.original().is_none());
    }

    #[test]
    fn test_worker_round_trip() {
        let mut p = Processor::new();
        p.load(voice());
        let mut worker = ProcessingWorker::spawn();

        let first = p.submit("robot", None).unwrap();
        let second = p.submit("telephone", None).unwrap();
        assert!(worker.submit(first));
        assert!(worker.submit(second));

        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let event = worker.recv_timeout(Duration::from_secs(30)).unwrap();
            outcomes.push(p.apply_event(event).unwrap());
        }
        // Renders finish in order on a single worker
        assert_eq!(outcomes, [CommitOutcome::Committed, CommitOutcome::Committed]);
        assert_eq!(p.processed_effect(), Some(EffectId::Telephone));
        worker.shutdown();
    }
}
