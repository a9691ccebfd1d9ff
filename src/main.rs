use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wfc_core::{FailurePolicy, Solver, SolverConfig, StepResult, TilesetDescription};

const USAGE: &str = "usage: tile_collapse <tileset.json> [width] [height] [policy] [seed]";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (path, config) = parse_args(&args)?;
    let tileset = load_tileset(Path::new(&path))?;

    let mut solver = Solver::new(config.clone(), &tileset)?;
    let max_steps = 64 * config.width * config.height;
    info!("Running up to {} steps, policy {}", max_steps, solver.policy());
    let result = solver.run(max_steps);

    print!("{}", solver.grid());
    let stats = solver.stats();
    info!(
        "{} steps, {} collapses, {} contradictions, {} resets",
        stats.steps, stats.collapses, stats.contradictions, stats.resets
    );

    match result {
        StepResult::Solved => Ok(()),
        _ if solver.is_failed() => {
            warn!("Run ended in a contradiction");
            std::process::exit(1);
        }
        _ => {
            warn!("Gave up after {} steps", max_steps);
            std::process::exit(2);
        }
    }
}

/// Read a tileset description from a JSON file.
fn load_tileset(path: &Path) -> Result<TilesetDescription, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let tileset: TilesetDescription = serde_json::from_str(&text)
        .map_err(|e| format!("invalid tileset {}: {}", path.display(), e))?;
    info!(
        "Loaded {} tile prototypes from {}",
        tileset.tile_set.len(),
        path.display()
    );
    Ok(tileset)
}

/// Positional arguments; anything omitted keeps the `SolverConfig` default.
fn parse_args(args: &[String]) -> Result<(String, SolverConfig), Box<dyn Error>> {
    let path = args.first().ok_or(USAGE)?.clone();
    let mut config = SolverConfig::default();

    if let Some(width) = args.get(1) {
        config.width = width.parse().map_err(|_| format!("bad width {width:?}"))?;
    }
    if let Some(height) = args.get(2) {
        config.height = height.parse().map_err(|_| format!("bad height {height:?}"))?;
    }
    if let Some(policy) = args.get(3) {
        config.failure_policy = policy.parse::<FailurePolicy>()?;
    }
    if let Some(seed) = args.get(4) {
        config.seed = Some(seed.parse().map_err(|_| format!("bad seed {seed:?}"))?);
    }
    if args.len() > 5 {
        return Err(USAGE.into());
    }
    Ok((path, config))
}
