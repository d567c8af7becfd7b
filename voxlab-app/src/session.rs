//! Interactive session
//!
//! Reads command lines, drives the [`Processor`] and hands renders to the
//! [`ProcessingWorker`]. Selecting an effect or changing a parameter queues
//! a preview render in the background; `apply` and `export` wait for the
//! newest request. Results are committed in request order, so an older
//! render that finishes late is dropped.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use tracing::{debug, warn};
use voxlab_audio::{
    normalize, AudioBuffer, CommitOutcome, DemoSample, EffectId, EffectParams, EffectRegistry,
    PlaybackSource, PlaybackState, ProcessingEvent, ProcessingWorker, Processor, ProcessorError,
    RecordingStatus,
};
use voxlab_input::{parse_command, Command, ParseError, HELP};
use voxlab_library::{export_to, AudioLoader, Config, LoadError};

use crate::capture::Recorder;
use crate::errors::{describe, ErrorKind};
use crate::playback::Player;
use crate::report;

/// Longest wait for a render before giving up
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether the loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<W: Write> {
    config: Config,
    loader: AudioLoader,
    processor: Processor,
    worker: ProcessingWorker,
    recorder: Recorder,
    player: Player,
    effect: EffectId,
    params: EffectParams,
    /// Newest request handed to the worker and not yet seen back
    pending: Option<u64>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(config: Config, out: W) -> Self {
        let effect = config.default_effect;
        Self {
            loader: AudioLoader::with_sample_rate(config.sample_rate),
            recorder: Recorder::new(config.max_record_secs),
            processor: Processor::new(),
            worker: ProcessingWorker::spawn(),
            player: Player::new(),
            params: EffectParams::defaults(effect),
            effect,
            pending: None,
            config,
            out,
        }
    }

    /// Read commands until `quit` or end of input
    pub fn run(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "Voxlab voice lab. Type `help` for commands. Current effect: {}",
            self.effect.display_name()
        )?;
        self.prompt()?;

        for line in input.lines() {
            let line = line?;
            if self.handle_line(&line)? == Flow::Quit {
                break;
            }
            self.prompt()?;
        }

        self.player.stop();
        self.worker.shutdown();
        Ok(())
    }

    fn prompt(&mut self) -> std::io::Result<()> {
        write!(self.out, "voxlab> ")?;
        self.out.flush()
    }

    /// Parse and run one line; command failures are reported, not returned
    pub fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        self.drain_events()?;

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(ParseError::Empty) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(Flow::Continue);
            }
        };

        match self.execute(command) {
            Ok(flow) => Ok(flow),
            Err(error) => {
                if let Some(kind) = ErrorKind::classify(&error) {
                    if !kind.recoverable() {
                        warn!(?kind, "unrecoverable error in session");
                    }
                }
                writeln!(self.out, "{}", describe(&error))?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Record(secs) => self.record(secs)?,
            Command::Load(path) => {
                let buffer = self
                    .loader
                    .load(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                self.install(buffer, &path.display().to_string())?;
            }
            Command::Demo(sample) => self.load_demo(sample)?,
            Command::Reset => {
                self.player.stop();
                self.processor.reset();
                self.pending = None;
                writeln!(self.out, "Cleared.")?;
            }

            Command::SelectEffect(id) => {
                self.effect = id;
                self.params = EffectParams::defaults(id);
                let definition = EffectRegistry::global().definition(id);
                writeln!(self.out, "{} {} selected", definition.emoji, definition.name)?;
                self.preview()?;
            }
            Command::Set(key, value) => self.set_param(&key, value)?,
            Command::Wet(value) => self.set_param("wetDry", value)?,
            Command::Apply => {
                let seq = self.submit()?;
                self.wait_for(seq)?;
                if let Some(buffer) = self.processor.processed() {
                    writeln!(
                        self.out,
                        "Applied {} ({:.2}s)",
                        self.effect.display_name(),
                        buffer.duration_secs()
                    )?;
                }
            }

            Command::Play(source) => self.play(source)?,
            Command::Stop => {
                self.player.stop();
                if self.processor.stop_playback().is_some() {
                    writeln!(self.out, "Stopped.")?;
                }
            }

            Command::Export(target) => {
                if let Some(seq) = self.pending {
                    self.wait_for(seq)?;
                }
                let buffer = self
                    .processor
                    .processed()
                    .cloned()
                    .ok_or(ProcessorError::NoProcessed)?;
                let name = self
                    .processor
                    .processed_effect()
                    .unwrap_or(self.effect)
                    .display_name();
                let path = export_to(&buffer, target.as_deref(), &self.config.export_dir, name)?;
                writeln!(self.out, "Saved {}", path.display())?;
            }

            Command::List => report::write_effect_list(&mut self.out, Some(self.effect))?,
            Command::Info(id) => report::write_info(&mut self.out, id.unwrap_or(self.effect))?,
            Command::Params => {
                writeln!(self.out, "{}:", self.effect.display_name())?;
                report::write_params(&mut self.out, &self.params)?;
            }
            Command::Status => self.status()?,
            Command::Help => {
                for (usage, description) in HELP {
                    writeln!(self.out, "  {usage:<28} {description}")?;
                }
            }

            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn record(&mut self, secs: Option<u32>) -> anyhow::Result<()> {
        self.player.stop();
        self.processor.begin_recording()?;
        writeln!(
            self.out,
            "Recording (up to {}s)...",
            secs.unwrap_or(self.recorder.max_secs()).min(self.recorder.max_secs())
        )?;

        let result = self.recorder.record(secs, |reading, elapsed| {
            eprint!("\r{}", report::level_bar(reading, elapsed));
        });
        eprintln!();

        match result {
            Ok(recording) => {
                if recording.auto_stopped {
                    writeln!(self.out, "Reached the {}s limit.", self.recorder.max_secs())?;
                }
                let buffer = self.loader.conform(recording.buffer)?;
                self.install(buffer, "recording")
            }
            Err(e) => {
                self.processor.abort_recording();
                Err(e.into())
            }
        }
    }

    fn load_demo(&mut self, sample: DemoSample) -> anyhow::Result<()> {
        let clip = sample.render().map_err(LoadError::from)?;
        let clip = self.loader.conform(clip)?;
        self.install(clip, sample.title())
    }

    /// Make `buffer` the new original and queue a preview of the current effect
    fn install(&mut self, buffer: AudioBuffer, label: &str) -> anyhow::Result<()> {
        let buffer = match self.config.normalize_peak {
            Some(peak) => normalize(&buffer, peak),
            None => buffer,
        };
        self.player.stop();
        writeln!(
            self.out,
            "Loaded {label}: {:.2}s, {} channel(s), {} Hz",
            buffer.duration_secs(),
            buffer.num_channels(),
            buffer.sample_rate()
        )?;
        self.processor.load(buffer);
        self.pending = None;
        self.preview()
    }

    fn set_param(&mut self, key: &str, value: f32) -> anyhow::Result<()> {
        if !self.params.set(key, value) {
            let known: Vec<&str> = self.params.specs().iter().map(|spec| spec.key).collect();
            writeln!(
                self.out,
                "{} has no parameter `{key}` (try: {})",
                self.effect.display_name(),
                known.join(", ")
            )?;
            return Ok(());
        }
        let applied = self.params.get(key).unwrap_or(value);
        if applied != value {
            writeln!(self.out, "{key} = {applied} (clamped)")?;
        } else {
            writeln!(self.out, "{key} = {applied}")?;
        }
        self.preview()
    }

    /// Queue a background render when there is something to process
    fn preview(&mut self) -> anyhow::Result<()> {
        if self.processor.original().is_some() {
            self.submit()?;
        }
        Ok(())
    }

    fn submit(&mut self) -> anyhow::Result<u64> {
        let ticket = self
            .processor
            .submit(self.effect.as_str(), Some(self.params.clone()))?;
        let seq = ticket.seq;
        if !self.worker.submit(ticket) {
            return Err(anyhow!("the render queue is full, try again"));
        }
        self.pending = Some(seq);
        Ok(seq)
    }

    /// Commit whatever the worker has finished
    fn drain_events(&mut self) -> anyhow::Result<()> {
        while let Some(event) = self.worker.try_recv() {
            if let Err(error) = self.commit(event) {
                writeln!(self.out, "{}", describe(&error))?;
            }
        }
        Ok(())
    }

    /// Block until request `seq` (or something newer) has come back
    fn wait_for(&mut self, seq: u64) -> anyhow::Result<()> {
        let deadline = Instant::now() + RENDER_TIMEOUT;
        while self.pending.is_some_and(|pending| pending <= seq) {
            if Instant::now() >= deadline {
                return Err(anyhow!("rendering took too long"));
            }
            if let Some(event) = self.worker.recv_timeout(Duration::from_millis(100)) {
                let finished = event.seq();
                let result = self.commit(event);
                if finished >= seq {
                    return result;
                }
                if let Err(error) = result {
                    debug!(seq = finished, error = %error, "earlier render failed");
                }
            }
        }
        Ok(())
    }

    fn commit(&mut self, event: ProcessingEvent) -> anyhow::Result<()> {
        let seq = event.seq();
        if self.pending == Some(seq) {
            self.pending = None;
        }
        let outcome = self.processor.apply_event(event)?;
        if outcome == CommitOutcome::Committed && self.processor.playback() == PlaybackState::Idle {
            // The processed buffer being played was replaced
            self.player.stop();
        }
        Ok(())
    }

    fn play(&mut self, source: PlaybackSource) -> anyhow::Result<()> {
        if source == PlaybackSource::Processed {
            if let Some(seq) = self.pending {
                self.wait_for(seq)?;
            }
        }
        let buffer = self.processor.start_playback(source)?;
        if let Err(e) = self.player.play(&buffer) {
            self.processor.stop_playback();
            return Err(e.into());
        }
        writeln!(
            self.out,
            "Playing {} ({:.2}s)",
            match source {
                PlaybackSource::Original => "original",
                PlaybackSource::Processed => "processed",
            },
            buffer.duration_secs()
        )?;
        Ok(())
    }

    fn status(&mut self) -> anyhow::Result<()> {
        let recording = match self.processor.status() {
            RecordingStatus::Idle => "nothing recorded",
            RecordingStatus::Recording => "recording",
            RecordingStatus::Stopped => "ready",
        };
        writeln!(self.out, "Input:     {recording}")?;
        if let Some(original) = self.processor.original() {
            writeln!(self.out, "Original:  {:.2}s", original.duration_secs())?;
        }
        match (self.processor.processed(), self.processor.processed_effect()) {
            (Some(buffer), Some(effect)) => writeln!(
                self.out,
                "Processed: {} ({:.2}s)",
                effect.display_name(),
                buffer.duration_secs()
            )?,
            _ => writeln!(self.out, "Processed: none")?,
        }
        if self.pending.is_some() {
            writeln!(self.out, "Rendering: in progress")?;
        }
        writeln!(self.out, "Effect:    {}", self.effect.display_name())?;

        let position = self.processor.current_time();
        match self.processor.playback() {
            PlaybackState::Playing { source, .. } => {
                writeln!(self.out, "Playback:  {source:?} at {position:.1}s")?
            }
            PlaybackState::Idle => {
                self.player.stop();
                writeln!(self.out, "Playback:  stopped")?
            }
        }
        Ok(())
    }
}

/// Interactive session on stdin/stdout
pub fn run(config: Config) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut session = Session::new(config, std::io::stdout());
    session.run(stdin.lock())
}
