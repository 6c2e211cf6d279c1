//! Hurricane wind-field producer
//!
//! Loads a scenario, applies command-line overrides and runs the cycle loop
//! until the cycle bound is reached or the process is stopped.

use anyhow::{Context, Result};
use clap::Parser;
use hurricane_sim_core::{
    CycleRepeater, JsonLinesPublisher, LogPublisher, Publisher, SimulationConfig, ThreadPacer,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hurricane wind-field producer with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "hurricane-sim")]
#[command(about = "Publishes evolving hurricane wind-level outlines", long_about = None)]
struct Args {
    /// TOML scenario file (built-in storm when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between ticks
    #[arg(short, long)]
    interval: Option<f64>,

    /// Seconds per cycle
    #[arg(short, long)]
    duration: Option<f64>,

    /// Broker host
    #[arg(long)]
    broker: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// Broker user name
    #[arg(long)]
    username: Option<String>,

    /// Broker password
    #[arg(long)]
    password: Option<String>,

    /// Noise seed (random when neither set here nor in the file)
    #[arg(long)]
    seed: Option<u32>,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Where records go: stdout, log, or file:<path>
    #[arg(short, long, default_value = "stdout")]
    output: Output,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, hurricane_sim_core=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Record sink selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Stdout,
    Log,
    File(PathBuf),
}

impl FromStr for Output {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" | "-" => Ok(Output::Stdout),
            "log" => Ok(Output::Log),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(Output::File(PathBuf::from(path))),
                _ => Err(format!(
                    "unknown output '{s}', expected stdout, log or file:<path>"
                )),
            },
        }
    }
}

impl Output {
    fn publisher(&self) -> Result<Box<dyn Publisher>> {
        Ok(match self {
            Output::Stdout => Box::new(JsonLinesPublisher::new(io::stdout().lock())),
            Output::Log => Box::new(LogPublisher),
            Output::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating output file {}", path.display()))?;
                Box::new(JsonLinesPublisher::new(BufWriter::new(file)))
            }
        })
    }
}

impl Args {
    /// Layer command-line values over the file configuration
    fn apply(&self, config: &mut SimulationConfig) {
        let sim = &mut config.simulation;
        if let Some(interval) = self.interval {
            sim.interval_secs = interval;
        }
        if let Some(duration) = self.duration {
            sim.duration_secs = duration;
        }
        if self.seed.is_some() {
            sim.seed = self.seed;
        }
        if self.cycles.is_some() {
            sim.max_cycles = self.cycles;
        }

        let transport = &mut config.transport;
        if let Some(host) = &self.broker {
            transport.host.clone_from(host);
        }
        if let Some(port) = self.port {
            transport.port = port;
        }
        if self.username.is_some() {
            transport.username.clone_from(&self.username);
        }
        if self.password.is_some() {
            transport.password.clone_from(&self.password);
        }
    }
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter '{default_filter}'"))?;
    // Records may go to stdout; keep logs on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    args.apply(&mut config);

    let scenario = config.validate().context("invalid scenario")?;

    let transport = &config.transport;
    info!(
        host = %transport.host,
        port = transport.port,
        client_id = %transport.client_id,
        username = transport.username.as_deref().unwrap_or("-"),
        output = ?args.output,
        "Broker settings"
    );
    info!(
        storms = scenario.storms.len(),
        seed = scenario.seed,
        ticks_per_cycle = scenario.clock.total_ticks(),
        "Scenario loaded"
    );

    let publisher = args.output.publisher()?;
    let purge = scenario.purge_on_start;
    let max_cycles = scenario.max_cycles;
    let mut repeater = CycleRepeater::new(scenario.into_cycle(), publisher, ThreadPacer)
        .with_purge_on_start(purge)
        .with_max_cycles(max_cycles);

    let summary = repeater.run();
    info!(
        cycles = summary.cycles_completed,
        ticks = summary.ticks_processed,
        published = summary.records_published,
        failures = summary.publish_failures,
        geometry_skips = summary.geometry_skips,
        "Done"
    );
    Ok(())
}
