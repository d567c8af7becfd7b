//! Voxlab - voice effects lab
//!
//! Record or load a short voice clip, run it through one of six effects and
//! export the result as WAV.

mod capture;
mod errors;
mod playback;
mod report;
mod session;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use voxlab_audio::{normalize, AudioBuffer, DemoSample, EffectId, EffectParams, Processor};
use voxlab_library::{export_to, AudioLoader, Config, LoadError};

use crate::capture::Recorder;
use crate::errors::{describe, ErrorKind};
use crate::playback::Player;

#[derive(Parser, Debug)]
#[command(name = "voxlab", version, about = "Record, transform and export short voice clips")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sample rate every input is converted to
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(3000..=768_000))]
    sample_rate: Option<u32>,

    /// Folder exports are written to
    #[arg(long, global = true, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the effects with their default parameters
    List,
    /// Explain how an effect works
    Info {
        effect: EffectId,
    },
    /// Process an audio file and export the result
    Apply {
        input: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Process a synthesized demo clip (vowels, melody, hello)
    Demo {
        sample: DemoSample,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Record from the microphone and save the raw clip
    Record {
        /// Length in seconds (capped at the configured maximum)
        #[arg(short, long)]
        seconds: Option<u32>,
        /// Output file or folder
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Play an audio file
    Play {
        file: PathBuf,
    },
    /// Interactive session (the default)
    Session,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Effect to apply (defaults to the configured effect)
    #[arg(short, long)]
    effect: Option<EffectId>,

    /// Parameter override as name=value, e.g. --set filterFreq=900
    #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_param)]
    set: Vec<(String, f32)>,

    /// Wet/dry amount between 0 and 1
    #[arg(short, long)]
    wet: Option<f32>,

    /// Output file or folder
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Play the result after exporting
    #[arg(short, long)]
    play: bool,
}

impl RenderArgs {
    fn effect(&self, config: &Config) -> EffectId {
        self.effect.unwrap_or(config.default_effect)
    }

    /// Defaults for the effect with the overrides applied and clamped
    fn params(&self, effect: EffectId) -> EffectParams {
        let wet = self.wet.map(|value| ("wetDry", value));
        EffectParams::from_pairs(
            effect,
            self.set
                .iter()
                .map(|(key, value)| (key.as_str(), *value))
                .chain(wet),
        )
    }
}

fn parse_param(text: &str) -> Result<(String, f32), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{text}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in `{text}`"));
    }
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("`{}` is not a number", value.trim()))?;
    Ok((key.to_string(), value))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", describe(&error));
            match ErrorKind::classify(&error) {
                Some(kind) if !kind.recoverable() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("voxlab=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxlab=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Config file with command-line overrides on top
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(rate) = cli.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = dir.clone();
    }
    debug!(?config, "configuration");
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let mut stdout = io::stdout().lock();

    match cli.command.unwrap_or(Commands::Session) {
        Commands::List => report::write_effect_list(&mut stdout, None)?,
        Commands::Info { effect } => report::write_info(&mut stdout, effect)?,
        Commands::Apply { input, render } => {
            let loader = AudioLoader::with_sample_rate(config.sample_rate);
            let clip = loader
                .load(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            process_and_export(&config, clip, &render, &mut stdout)?;
        }
        Commands::Demo { sample, render } => {
            let loader = AudioLoader::with_sample_rate(config.sample_rate);
            let clip = loader.conform(sample.render().map_err(LoadError::from)?)?;
            info!(sample = sample.id(), "rendered demo clip");
            process_and_export(&config, clip, &render, &mut stdout)?;
        }
        Commands::Record { seconds, out } => {
            let mut recorder = Recorder::new(config.max_record_secs);
            let limit = seconds.unwrap_or(recorder.max_secs()).min(recorder.max_secs());
            eprintln!("Recording (up to {limit}s)...");
            let recording = recorder.record(seconds, |reading, elapsed| {
                eprint!("\r{}", report::level_bar(reading, elapsed));
            })?;
            eprintln!();

            let clip = AudioLoader::with_sample_rate(config.sample_rate).conform(recording.buffer)?;
            let path = export_to(&clip, out.as_deref(), &config.export_dir, "original")?;
            writeln!(stdout, "{}", path.display())?;
        }
        Commands::Play { file } => {
            let clip = AudioLoader::with_sample_rate(config.sample_rate)
                .load(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            play_to_end(&clip)?;
        }
        Commands::Session => {
            drop(stdout);
            session::run(config)?;
        }
    }
    Ok(())
}

/// Render one effect through the processor and write the result
fn process_and_export(
    config: &Config,
    clip: AudioBuffer,
    render: &RenderArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let clip = match config.normalize_peak {
        Some(peak) => normalize(&clip, peak),
        None => clip,
    };
    let effect = render.effect(config);
    let params = render.params(effect);

    let mut processor = Processor::new();
    processor.load(clip);
    let processed = processor
        .apply_effect(effect.as_str(), Some(params))
        .with_context(|| format!("applying {}", effect.display_name()))?;

    let path = export_to(&processed, render.out.as_deref(), &config.export_dir, effect.display_name())?;
    writeln!(out, "{}", path.display())?;

    if render.play {
        play_to_end(&processed)?;
    }
    Ok(())
}

fn play_to_end(buffer: &AudioBuffer) -> anyhow::Result<()> {
    let mut player = Player::new();
    player.play(buffer)?;
    player.wait();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use voxlab_library::export_filename_today;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_session() {
        let cli = Cli::try_parse_from(["voxlab"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_apply_arguments() {
        let cli = Cli::try_parse_from([
            "voxlab", "apply", "in.wav", "--effect", "robot", "--set", "filterFreq=900", "-s",
            "filterQ=50", "--wet", "0.5", "--out", "out.wav",
        ])
        .unwrap();
        let Some(Commands::Apply { input, render }) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(input, PathBuf::from("in.wav"));
        assert_eq!(render.effect, Some(EffectId::Robot));

        let params = render.params(EffectId::Robot);
        assert_eq!(params.get("filterFreq"), Some(900.0));
        assert_eq!(params.get("filterQ"), Some(10.0));
        assert_eq!(params.wet_dry(), 0.5);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["voxlab", "info", "vocoder"]).is_err());
        assert!(Cli::try_parse_from(["voxlab", "demo", "applause"]).is_err());
        assert!(Cli::try_parse_from(["voxlab", "demo", "hello", "--set", "oops"]).is_err());
        assert!(Cli::try_parse_from(["voxlab", "list", "--sample-rate", "100"]).is_err());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("delayTime = 0.3"), Ok(("delayTime".to_string(), 0.3)));
        assert!(parse_param("=1").is_err());
        assert!(parse_param("delayTime=soon").is_err());
    }

    #[test]
    fn test_demo_is_processed_and_exported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            export_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let render = RenderArgs {
            effect: Some(EffectId::Telephone),
            set: Vec::new(),
            wet: None,
            out: None,
            play: false,
        };
        let clip = DemoSample::Hello.render().unwrap();

        let mut out = Vec::new();
        process_and_export(&config, clip, &render, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        let path = PathBuf::from(printed.trim());
        assert_eq!(path, dir.path().join(export_filename_today("Telephone")));
        assert!(path.exists());
    }
}
