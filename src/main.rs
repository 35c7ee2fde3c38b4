use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use stopwatch::Stopwatch;

use roadgraph::{persist, Bounds, MapRuntime, Node, RoundConfig};

/// Build street graphs for the exploration game and query them.
#[derive(Parser)]
#[command(name = "roadgraph", version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simplify a GeoJSON street network and save the game graph
    Build {
        /// GeoJSON file with LineString features
        input: PathBuf,
        /// Destination .json graph file
        output: PathBuf,
        /// Keep only lines inside NORTH,SOUTH,EAST,WEST (degrees)
        #[arg(long, value_parser = parse_bounds)]
        bbox: Option<Bounds>,
    },
    /// Print a summary of a saved graph
    Stats { graph: PathBuf },
    /// Start a round and print it as JSON
    Round {
        graph: PathBuf,
        #[arg(long, default_value_t = RoundConfig::default().min_distance)]
        min_distance: i64,
        #[arg(long, default_value_t = RoundConfig::default().accuracy)]
        accuracy: f64,
        /// Seed for a reproducible round
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the neighbourhood of a node as JSON
    Neighbours {
        graph: PathBuf,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

fn parse_bounds(s: &str) -> Result<Bounds> {
    let v = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .context("bounds must be numbers")?;
    match v.as_slice() {
        &[north, south, east, west] if north >= south && east >= west => Ok(Bounds {
            north,
            south,
            east,
            west,
        }),
        &[_, _, _, _] => bail!("bounds need north >= south and east >= west"),
        _ => bail!("expected NORTH,SOUTH,EAST,WEST"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    match cli.command {
        Command::Build {
            input,
            output,
            bbox,
        } => {
            let mut s = Stopwatch::start_new();
            let reader = BufReader::new(
                File::open(&input).with_context(|| format!("opening {}", input.display()))?,
            );
            let graph = roadgraph::build_from_geojson(reader, bbox)
                .with_context(|| format!("building graph from {}", input.display()))?;
            info!(
                "Build took {} ms: {} nodes, {} edges",
                s.elapsed_ms(),
                graph.node_count(),
                graph.edge_count()
            );
            s.restart();
            persist::save(&output, &graph)
                .with_context(|| format!("saving {}", output.display()))?;
            info!("Saved {} in {} ms", output.display(), s.elapsed_ms());
        }
        Command::Stats { graph } => {
            let g = persist::load(&graph).with_context(|| format!("loading {}", graph.display()))?;
            let b = g.bbox();
            println!("nodes: {}", g.node_count());
            println!("edges: {}", g.edge_count());
            println!("total road length: {:.6}", g.total_length());
            if !g.is_empty() {
                println!(
                    "extent: north {} south {} east {} west {}",
                    b.north, b.south, b.east, b.west
                );
                println!(
                    "span: {:.6} lat x {:.6} lon",
                    b.range_lat(),
                    b.range_lon()
                );
            }
        }
        Command::Round {
            graph,
            min_distance,
            accuracy,
            seed,
        } => {
            let g = persist::load(&graph).with_context(|| format!("loading {}", graph.display()))?;
            let mut rt = match seed {
                Some(seed) => MapRuntime::with_seed(g, seed),
                None => MapRuntime::new(g),
            };
            let s = Stopwatch::start_new();
            let round = rt.begin_round(min_distance, accuracy)?;
            info!("Round generated in {} ms", s.elapsed_ms());
            print_json(&round)?;
        }
        Command::Neighbours { graph, lat, lon } => {
            let rt = MapRuntime::load(&graph).with_context(|| format!("loading {}", graph.display()))?;
            let found = rt.neighbours(&Node::new(lat, lon))?;
            print_json(&found)?;
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
