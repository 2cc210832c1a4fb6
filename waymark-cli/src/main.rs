use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};
use waymark_core::{AlignmentPolicy, PointerEngine, RadarConfig};

mod catalog;
mod dispatcher;
mod render;
mod sensors;

use dispatcher::Dispatcher;
use render::{FrameSink, JsonSink, LoggingAudioPlayer, TextSink};
use sensors::{Clock, Pacing, SpinningCompass, TrackReader};

/// Capacity of the sensor update channel
const UPDATE_QUEUE: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    LastWins,
    Nearest,
}

impl From<PolicyArg> for AlignmentPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::LastWins => AlignmentPolicy::LastWins,
            PolicyArg::Nearest => AlignmentPolicy::Nearest,
        }
    }
}

/// Point at landmarks from a position and heading track
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Landmark catalog (JSON)
    catalog: PathBuf,

    /// Position and heading track (JSON lines), replayed on its own
    /// timeline. Reads stdin live when absent or '-'.
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// Radar configuration (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Half-width of the forward band in degrees
    #[arg(long)]
    tolerance: Option<f64>,

    /// Spacing of landmarks in one cluster in degrees
    #[arg(long)]
    spacing: Option<f64>,

    /// Distance at which lines are shortest (km)
    #[arg(long)]
    max_distance: Option<f64>,

    /// Longest line in display units
    #[arg(long)]
    max_length: Option<f64>,

    /// Minimum time between frames (ms)
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Which group is shown when several clusters are aligned
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Simulate a compass turning at this rate (degrees per second)
    /// instead of reading headings from the track
    #[arg(long, allow_negative_numbers = true)]
    spin: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

impl Cli {
    fn track_path(&self) -> Option<&Path> {
        self.track
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

/// Configuration file, then command line overrides
fn build_config(cli: &Cli) -> anyhow::Result<RadarConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            RadarConfig::from_json(&text).with_context(|| format!("{}", path.display()))?
        }
        None => RadarConfig::default(),
    };

    if let Some(tolerance) = cli.tolerance {
        config.alignment_tolerance_deg = tolerance;
    }
    if let Some(spacing) = cli.spacing {
        config.cluster_spacing_deg = spacing;
    }
    if let Some(max_distance) = cli.max_distance {
        config.max_display_distance_km = max_distance;
    }
    if let Some(max_length) = cli.max_length {
        config.max_line_length = max_length;
    }
    if let Some(refresh_ms) = cli.refresh_ms {
        config.refresh_interval_ms = refresh_ms;
    }
    if let Some(policy) = cli.policy {
        config.alignment_policy = policy.into();
    }

    config.validate()?;
    Ok(config)
}

fn start_track<R>(subsys: &SubsystemHandle, reader: TrackReader<R>)
where
    R: tokio::io::AsyncBufRead + Unpin + Send + 'static,
{
    subsys.start(SubsystemBuilder::new("track", |s| reader.run(s)));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let config = build_config(&cli)?;
    log::debug!("Using {:?}", config);

    let catalog = catalog::load_catalog(&cli.catalog);
    let clock = Clock::new();
    let engine = PointerEngine::new(config, catalog.landmarks, clock.now_ms())?;
    let landmarks: Arc<[_]> = engine.landmarks().clone();

    let sink: Box<dyn FrameSink> = match cli.output {
        OutputFormat::Text => Box::new(TextSink::new(std::io::stdout(), landmarks)),
        OutputFormat::Json => Box::new(JsonSink::new(std::io::stdout())),
    };

    let (tx, rx) = mpsc::channel(UPDATE_QUEUE);
    let dispatcher = Dispatcher::new(engine, rx, sink, Box::new(LoggingAudioPlayer), clock);

    let track_file = match cli.track_path() {
        Some(path) => Some(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open track {}", path.display()))?,
        ),
        None => None,
    };
    let spin = cli.spin;

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new("dispatcher", |s| dispatcher.run(s)));

        if let Some(deg_per_s) = spin {
            let compass = SpinningCompass::new("compass", deg_per_s, clock, tx.clone());
            s.start(SubsystemBuilder::new("compass", |s| compass.run(s)));
        }

        match track_file {
            Some(file) => {
                let reader = TrackReader::new("track", BufReader::new(file), Pacing::Replay, clock, tx)
                    .skip_heading(spin.is_some());
                start_track(&s, reader);
            }
            None => {
                let reader = TrackReader::new(
                    "stdin",
                    BufReader::new(tokio::io::stdin()),
                    Pacing::Live,
                    clock,
                    tx,
                )
                .skip_heading(spin.is_some());
                start_track(&s, reader);
            }
        }
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(1000))
    .await
    .map_err(Into::into)
}
