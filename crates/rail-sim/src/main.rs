//! Rail Sim CLI.
//!
//! Validate layouts, search routes, and run trains against each other.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rail_kernel::{Direction, SegmentId, SimulationConfig, TrackGraph};
use rail_sim::{JourneySpec, RunOptions, parse_point, read_layout, run_journeys};

#[derive(Parser)]
#[command(name = "rail-sim")]
#[command(about = "Actor-based railway interlocking simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a layout, then print its components.
    Check {
        /// Layout file
        layout: PathBuf,
    },

    /// Search a route without starting any actors.
    Route {
        /// Layout file
        layout: PathBuf,
        /// Start point, x,y
        #[arg(long)]
        from: String,
        /// Destination point, x,y
        #[arg(long)]
        to: String,
    },

    /// Run one or more journeys concurrently.
    Run {
        /// Layout file
        layout: PathBuf,
        /// Journey as FROM:TO or FROM:VIA:TO, points written x,y (repeatable)
        #[arg(short, long = "journey", required = true)]
        journeys: Vec<String>,
        /// Simulation config (JSON)
        #[arg(short, long, env = "RAIL_SIM_CONFIG")]
        config: Option<PathBuf>,
        /// Seed for backoff jitter, overrides the config file
        #[arg(long)]
        seed: Option<u64>,
        /// Replace the configured delays with millisecond ones
        #[arg(long)]
        fast: bool,
        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
        /// Output file for the run report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_graph(layout: &Path) -> Result<TrackGraph> {
    let records = read_layout(layout)?;
    TrackGraph::build(&records).with_context(|| format!("Layout {} rejected", layout.display()))
}

fn load_config(path: Option<&Path>, fast: bool) -> Result<SimulationConfig> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SimulationConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    Ok(if fast { config.with_fast_timing() } else { config })
}

fn print_registry(graph: &TrackGraph) {
    println!("Segments ({}):", graph.segments().len());
    for segment in graph.segments() {
        let link = |id: Option<SegmentId>| {
            id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
        };
        println!(
            "  {:<12} {}  left: {}  right: {}",
            segment.id().to_string(),
            segment,
            link(segment.left_neighbor()),
            link(segment.right_neighbor()),
        );
    }

    println!("Switches ({}):", graph.switches().len());
    for switch in graph.switches() {
        let connected: Vec<String> = switch
            .connected_segments()
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!(
            "  {:<12} at {}  connects: {}",
            switch.id().to_string(),
            switch.location(),
            connected.join(", ")
        );
    }

    println!("Stations ({}):", graph.stations().len());
    for station in graph.stations() {
        let connected = station
            .connected_segment()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unconnected".to_string());
        println!(
            "  {:<12} at {}  track: {}",
            station.id().to_string(),
            station.location(),
            connected
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Check { layout } => {
            let graph = load_graph(&layout)?;
            info!(
                segments = graph.segments().len(),
                switches = graph.switches().len(),
                stations = graph.stations().len(),
                "Layout accepted"
            );
            print_registry(&graph);
            println!("Junction points: {}", graph.junction_points().len());
        }

        Commands::Route { layout, from, to } => {
            let graph = load_graph(&layout)?;
            let from = parse_point(&from)?;
            let to = parse_point(&to)?;
            let direction = Direction::towards(&from, &to);

            let start = graph
                .start_component(&from, direction)
                .with_context(|| format!("No track leaves {from} heading {direction}"))?;

            match graph.find_path(start, &from, &to, direction) {
                Some(route) => {
                    println!("Route {from} to {to} heading {direction}:");
                    for (i, component) in route.iter().enumerate() {
                        println!(
                            "  {:>2}. {:<12} {}",
                            i + 1,
                            component.to_string(),
                            graph.describe(*component)
                        );
                    }
                }
                None => bail!("No path from {from} to {to} heading {direction}"),
            }
        }

        Commands::Run {
            layout,
            journeys,
            config,
            seed,
            fast,
            timeout_secs,
            output,
        } => {
            let graph = load_graph(&layout)?;
            let journeys = journeys
                .iter()
                .map(|j| j.parse::<JourneySpec>())
                .collect::<Result<Vec<_>>>()?;

            let mut config = load_config(config.as_deref(), fast)?;
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let options = RunOptions {
                config,
                timeout: Duration::from_secs(timeout_secs),
                ..Default::default()
            };
            let report = run_journeys(graph, &journeys, options).await?;

            println!("\n=== Run Complete ===");
            for journey in &report.journeys {
                println!(
                    "{}: {} -> {} (moves: {}, waits: {})",
                    journey.train, journey.request, journey.outcome, journey.moves, journey.waits
                );
            }
            println!("Elapsed: {} ms", report.elapsed_ms);
            println!("Occupancy changes: {}", report.occupancy_changes);
            println!("Held at end: {}", report.held_at_end);
            println!("Violations: {}", report.violations);
            if report.timed_out {
                println!("Timed out after {timeout_secs}s");
            }

            if let Some(path) = output {
                report
                    .save(&path)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                println!("Report written to {}", path.display());
            }

            if report.violations > 0 {
                bail!("{} mutual-exclusion violations", report.violations);
            }
        }
    }

    Ok(())
}
