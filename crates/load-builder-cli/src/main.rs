use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use load_builder_core::config::PhaseConfig;
use load_builder_core::model::{InventoryItem, LanePlan, Wish};
use load_builder_core::pipeline::{
    build_lane, run_pipeline, PipelineContext, SharedPoolDef, TrailerCatalog,
};
use load_builder_core::pool::{InventoryPool, NestedOrigins};
use serde::Deserialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "load-builder",
    about = "Build trailer loads for plant-to-plant lanes from a scenario file",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full four-phase pipeline over every lane in the scenario
    Plan(PlanArgs),
    /// Build a single lane in isolation
    Lane(LaneArgs),
    /// Parse and validate a scenario file without building anything
    Check(CheckArgs),
}

#[derive(Parser, Debug, Clone)]
struct PlanArgs {
    /// Scenario file (.json, .yaml or .yml)
    #[arg(help_heading = "Input/Output")]
    scenario: PathBuf,
    /// Write the JSON report here instead of stdout
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    pretty: bool,
}

#[derive(Parser, Debug, Clone)]
struct LaneArgs {
    /// Scenario file (.json, .yaml or .yml)
    #[arg(help_heading = "Input/Output")]
    scenario: PathBuf,
    /// Origin point of the lane to build
    #[arg(long, help_heading = "Lane")]
    origin: String,
    /// Destination point of the lane to build
    #[arg(long, help_heading = "Lane")]
    destination: String,
    /// Write the JSON report here instead of stdout
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    pretty: bool,
}

#[derive(Parser, Debug, Clone)]
struct CheckArgs {
    /// Scenario file (.json, .yaml or .yml)
    scenario: PathBuf,
}

/// Everything one planning run needs, in one file.
#[derive(Debug, Clone, Deserialize)]
struct Scenario {
    catalog: TrailerCatalog,
    lanes: Vec<LanePlan>,
    wishes: Vec<Wish>,
    inventory: Vec<InventoryItem>,
    #[serde(default)]
    nested_origins: Vec<(String, String)>,
    #[serde(default)]
    shared_pool: SharedPoolDef,
    #[serde(default)]
    phase: PhaseConfig,
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let scenario = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML scenario {}", path.display()))?,
        "json" => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON scenario {}", path.display()))?,
        other => bail!("unsupported scenario extension '{other}' (use json, yaml or yml)"),
    };
    Ok(scenario)
}

fn emit<T: serde::Serialize>(value: &T, out: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing report {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn run_plan(args: &PlanArgs) -> anyhow::Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let Scenario {
        catalog,
        lanes,
        mut wishes,
        inventory,
        nested_origins,
        shared_pool,
        phase,
    } = scenario;

    let mut pool = InventoryPool::new(inventory);
    let mut ctx = PipelineContext::new(NestedOrigins::new(nested_origins), shared_pool);
    let result = run_pipeline(lanes, &mut wishes, &mut pool, &catalog, &mut ctx, &phase)
        .context("planning pipeline failed")?;

    info!("{}", result.stats().summary());
    emit(&result, args.out.as_deref(), args.pretty)
}

fn run_lane(args: &LaneArgs) -> anyhow::Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let Scenario {
        catalog,
        lanes,
        mut wishes,
        inventory,
        nested_origins,
        shared_pool,
        phase,
    } = scenario;

    let Some(plan) = lanes
        .iter()
        .find(|p| p.origin == args.origin && p.destination == args.destination)
    else {
        bail!("no lane {} -> {} in the scenario", args.origin, args.destination);
    };

    let mut pool = InventoryPool::new(inventory);
    let mut ctx = PipelineContext::new(NestedOrigins::new(nested_origins), shared_pool);
    let result = build_lane(plan, &mut wishes, &mut pool, &catalog, &mut ctx, &phase)
        .with_context(|| format!("building lane {} -> {}", args.origin, args.destination))?;

    info!("{}", result.stats().summary());
    emit(&result, args.out.as_deref(), args.pretty)
}

fn run_check(args: &CheckArgs) -> anyhow::Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    for spec in &scenario.catalog.specs {
        spec.validate()
            .with_context(|| format!("catalog category {}", spec.category))?;
    }
    for wish in &scenario.wishes {
        if wish.quantity == 0 {
            continue;
        }
        wish.validate().with_context(|| format!("wish {}", wish.id))?;
    }
    for plan in &scenario.lanes {
        if plan.load_min > plan.load_max {
            bail!(
                "lane {} -> {} has load_min {} above load_max {}",
                plan.origin,
                plan.destination,
                plan.load_min,
                plan.load_max
            );
        }
    }
    info!(
        lanes = scenario.lanes.len(),
        wishes = scenario.wishes.len(),
        inventory_records = scenario.inventory.len(),
        "scenario is valid"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Plan(args) => run_plan(args),
        Commands::Lane(args) => run_lane(args),
        Commands::Check(args) => run_check(args),
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
