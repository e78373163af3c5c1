#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates and replays Harpia telemetry.

mod generate;
mod run_file;
mod terminal;

use std::{io, num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use harpia_core::OracleKind;
use harpia_rendering::{PlaybackStyle, Presentation, RenderingBackend, TorusGeometry};
use harpia_telemetry_csv::open_telemetry;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    generate::generate,
    run_file::{Overrides, RunFile, RunPlan},
    terminal::TerminalBackend,
};

#[derive(Debug, Parser)]
#[command(name = "harpia")]
#[command(about = "Deterministic toroidal coherence telemetry generator and replay player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the simulation and write a telemetry table
    Generate(GenerateArgs),
    /// Replay a previously written telemetry table
    Replay(ReplayArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// TOML run file; command-line values take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of entities on the torus
    #[arg(long)]
    entities: Option<usize>,

    /// Number of frames to generate
    #[arg(long)]
    frames: Option<usize>,

    /// Radius of the torus' major circle
    #[arg(long)]
    major_radius: Option<f64>,

    /// Radius of the torus' tube
    #[arg(long)]
    minor_radius: Option<f64>,

    /// Vertical compression of the tube
    #[arg(long)]
    flatten: Option<f64>,

    /// Disable reversion shielding and fall back to passive damping
    #[arg(long)]
    no_reversion: bool,

    /// Run seed for every random stream
    #[arg(long)]
    seed: Option<u64>,

    /// Noise oracle implementation
    #[arg(long, value_enum)]
    oracle: Option<OracleArg>,

    /// Destination of the telemetry table
    #[arg(short, long, default_value = "telemetry.csv")]
    output: PathBuf,

    /// Play the written table back in live style once generation finishes
    #[arg(long)]
    play: bool,

    #[command(flatten)]
    playback: PlaybackArgs,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Telemetry table to replay
    #[arg(short, long, default_value = "telemetry.csv")]
    input: PathBuf,

    /// Visual preset
    #[arg(long, value_enum, default_value_t = StyleArg::Replay)]
    style: StyleArg,

    #[command(flatten)]
    playback: PlaybackArgs,
}

#[derive(Debug, Args)]
struct PlaybackArgs {
    /// Print every n-th playback step
    #[arg(long, default_value = "1")]
    every: NonZeroUsize,

    /// Number of passes over the recorded frames
    #[arg(long, default_value = "1")]
    loops: NonZeroUsize,

    /// Stop after this many playback steps
    #[arg(long)]
    limit: Option<usize>,

    /// Pace output at the style's frame interval
    #[arg(long)]
    realtime: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OracleArg {
    Simulator,
    Classical,
}

impl From<OracleArg> for OracleKind {
    fn from(value: OracleArg) -> Self {
        match value {
            OracleArg::Simulator => Self::Simulator,
            OracleArg::Classical => Self::Classical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StyleArg {
    Replay,
    Live,
}

impl From<StyleArg> for PlaybackStyle {
    fn from(value: StyleArg) -> Self {
        match value {
            StyleArg::Replay => Self::replay(),
            StyleArg::Live => Self::live(),
        }
    }
}

/// Entry point for the Harpia command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Replay(args) => run_replay(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let file = match &args.config {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };
    let plan = RunPlan::resolve(
        file,
        Overrides {
            entity_count: args.entities,
            frame_count: args.frames,
            major_radius: args.major_radius,
            minor_radius: args.minor_radius,
            flatten_factor: args.flatten,
            disable_reversion: args.no_reversion,
            seed: args.seed,
            oracle: args.oracle.map(OracleKind::from),
        },
    )?;

    let report = generate(&plan, &args.output)?;
    println!("{report}");

    if args.play {
        let table = open_telemetry(&args.output)
            .with_context(|| format!("failed to reload {}", args.output.display()))?;
        let presentation = Presentation::new(
            format!(
                "HARPIA | {} entities | phoenix resets: {}",
                plan.config.entity_count(),
                report.statistics.phoenix_trigger_count
            ),
            PlaybackStyle::live(),
            TorusGeometry::from_config(&plan.config),
            table.records,
        )
        .context("generated telemetry cannot be presented")?;
        play(presentation, &args.playback)?;
    }

    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let table = open_telemetry(&args.input)
        .with_context(|| format!("failed to load telemetry from {}", args.input.display()))?;
    info!(
        entities = table.entity_count,
        frames = table.records.len(),
        "loaded telemetry for replay"
    );

    let presentation = Presentation::new(
        format!("HARPIA REPLAY | {}", args.input.display()),
        args.style.into(),
        TorusGeometry::default(),
        table.records,
    )
    .with_context(|| format!("telemetry in {} cannot be presented", args.input.display()))?;
    play(presentation, &args.playback)
}

fn play(presentation: Presentation, playback: &PlaybackArgs) -> Result<()> {
    let stdout = io::stdout();
    TerminalBackend::new(stdout.lock(), playback.every, playback.loops)
        .with_limit(playback.limit)
        .with_realtime(playback.realtime)
        .run(presentation)
}
