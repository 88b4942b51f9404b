use std::path::PathBuf;

use canopy::config::ConfigError;
use canopy::recommend::repository::{
    load_dependency_rows_from_path, load_farms_from_path, load_overrides_from_path,
    load_species_from_path, RepositoryError,
};
use canopy::telemetry::{self, TelemetryError};
use canopy::{EngineConfig, EngineError, RecommendationEngine};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(
    name = "Canopy Recommender",
    about = "Score tree species suitability for farm plots from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the recommendation pipeline for a batch of farms
    Recommend(RecommendArgs),
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Engine configuration document (JSON); omit for the standard ruleset
    #[arg(long)]
    config: Option<PathBuf>,
    /// Farm profiles CSV
    #[arg(long)]
    farms: PathBuf,
    /// Species catalog CSV
    #[arg(long)]
    species: PathBuf,
    /// Per-species parameter overrides CSV
    #[arg(long)]
    params: Option<PathBuf>,
    /// Companion-species dependency rows CSV
    #[arg(long)]
    dependencies: Option<PathBuf>,
    /// Restrict the batch to these farm ids (defaults to every farm)
    #[arg(long = "farm-id")]
    farm_ids: Vec<i64>,
    /// Evaluate farms on the rayon pool
    #[arg(long)]
    parallel: bool,
    /// Pretty-print the JSON payloads
    #[arg(long)]
    pretty: bool,
}

/// Error surfaced to the terminal with its full source chain intact.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("input error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub(crate) fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let app_config = CliConfig::load();
    telemetry::init(&app_config.log_level)?;

    match cli.command {
        Command::Recommend(args) => run_recommend(args),
    }
}

fn run_recommend(args: RecommendArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::standard(),
    };

    let catalog = load_species_from_path(&args.species, &config)?;
    let mut farms = load_farms_from_path(&args.farms, &config)?;
    if !args.farm_ids.is_empty() {
        farms.retain(|farm| args.farm_ids.contains(&farm.id));
    }

    let overrides = match &args.params {
        Some(path) => load_overrides_from_path(path, &config)?,
        None => Vec::new(),
    };
    let dependency_rows = match &args.dependencies {
        Some(path) => load_dependency_rows_from_path(path)?,
        None => Vec::new(),
    };

    info!(
        farms = farms.len(),
        species = catalog.len(),
        overrides = overrides.len(),
        "running recommendation batch"
    );

    let engine = RecommendationEngine::new(catalog, config, &overrides, &dependency_rows)?;
    let results = if args.parallel {
        engine.run_batch_parallel(&farms)
    } else {
        engine.run_batch(&farms)
    };

    let payload = if args.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{payload}");

    Ok(())
}
