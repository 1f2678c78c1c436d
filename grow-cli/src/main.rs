//! Headless runner for the layered growth engine.
//!
//! Loads a site description and an optional configuration from JSON, grows
//! the layer stack with a seeded generator and prints every layer as ASCII
//! (or the reports as JSON).

mod render;
mod site;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use grow_core::{
    config::GrowthConfig,
    engine::GrowthEngine,
    phases::LayerReport,
    rng::create_rng,
    stack::{LayerStack, grow_stack},
    types::Cell,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use site::Site;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "grow",
    version,
    about = "Grow a stack of organic occupancy layers on a site"
)]
struct Cli {
    /// Site description (JSON); the built-in demo site when omitted.
    #[arg(long)]
    site: Option<PathBuf>,
    /// Growth configuration (JSON); missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed of the random generator.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Overrides the layer count of the site.
    #[arg(long)]
    layers: Option<usize>,
    /// Print the layer reports as JSON instead of ASCII plans.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    seed: u64,
    total_cells: usize,
    void_count: usize,
    seeds: &'a [Cell],
    voids: &'a [Cell],
    layers: &'a [LayerReport],
}

impl<'a> Summary<'a> {
    fn new(seed: u64, stack: &'a LayerStack) -> Self {
        Self {
            seed,
            total_cells: stack.total_cells(),
            void_count: stack.void_count(),
            seeds: &stack.seeds,
            voids: &stack.voids,
            layers: &stack.reports,
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();

    let config: GrowthConfig = match &cli.config {
        Some(path) => load_json(path)?,
        None => GrowthConfig::default(),
    };
    let mut site: Site = match &cli.site {
        Some(path) => load_json(path)?,
        None => Site::demo(),
    };
    if let Some(count) = cli.layers {
        site.layers.count = count;
    }
    let plan = site.layers.clone();

    let built = site.build(&config).context("site setup failed")?;
    info!(
        cols = built.constraints.cols(),
        rows = built.constraints.rows(),
        seeds = built.seeds.len(),
        "site ready"
    );

    let mut engine = GrowthEngine::new(&config, &built.constraints, &built.field, built.seeds)
        .context("engine setup failed")?;
    let mut rng = create_rng(cli.seed);
    let stack = grow_stack(&mut engine, &plan, &mut rng).context("layer plan rejected")?;

    if cli.json {
        let summary = Summary::new(cli.seed, &stack);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render::render_stack(&stack));
    }
    Ok(())
}
