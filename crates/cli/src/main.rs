use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guide_agents::GuideAgent;
use guide_core::{scoring, ItineraryRequest, Location};
use guide_dataset::DatasetIndex;
use guide_ml::GenerativeStack;
use guide_observability::{init_tracing, AppMetrics};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "knight-guide")]
#[command(about = "Knight Guide accessible travel planner CLI")]
struct Cli {
    #[arg(long, env = "GUIDE_DATASET_PATH", default_value = "data/travel_planner_clean.json")]
    dataset: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an itinerary through the dataset, model and mock stages.
    Itinerary {
        destination: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=14))]
        duration: u32,
        #[arg(long = "need")]
        needs: Vec<String>,
        #[arg(long, default_value = "")]
        mobility: String,
        #[arg(long, default_value = "")]
        vision: String,
        #[arg(long, default_value = "")]
        hearing: String,
        #[arg(long, default_value = "")]
        cognitive: String,
        #[arg(long, env = "GUIDE_SCORE_SEED")]
        seed: Option<u64>,
        /// Skip the generative model even when an API key is configured.
        #[arg(long)]
        offline: bool,
    },
    Dataset {
        #[command(subcommand)]
        command: DatasetCommand,
    },
    Locations {
        #[command(subcommand)]
        command: LocationsCommand,
    },
    /// Describe how to sign a phrase in ASL.
    Sign { text: String },
}

#[derive(Debug, Subcommand)]
enum DatasetCommand {
    Stats,
    Lookup { destination: String },
}

#[derive(Debug, Subcommand)]
enum LocationsCommand {
    Rank {
        file: PathBuf,
        #[arg(long = "need")]
        needs: Vec<String>,
    },
    Filter {
        file: PathBuf,
        #[arg(long = "need")]
        needs: Vec<String>,
    },
    Score { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("guide_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Itinerary {
            destination,
            duration,
            needs,
            mobility,
            vision,
            hearing,
            cognitive,
            seed,
            offline,
        } => {
            let destination = destination.trim();
            anyhow::ensure!(!destination.is_empty(), "destination must not be blank");

            let models = if offline {
                GenerativeStack::disabled()
            } else {
                GenerativeStack::load_default()
            };
            let agent = build_agent(&cli.dataset, models).with_score_seed(seed);

            let request = ItineraryRequest {
                destination: destination.to_string(),
                duration,
                accessibility_needs: needs,
                mobility_details: mobility,
                vision_details: vision,
                hearing_details: hearing,
                cognitive_details: cognitive,
            };
            let itinerary = agent.generate_itinerary(&request).await;
            print_json(&itinerary)?;
        }
        Command::Dataset { command } => {
            let dataset = DatasetIndex::try_load(&cli.dataset)
                .with_context(|| format!("failed loading dataset from {}", cli.dataset.display()))?;

            match command {
                DatasetCommand::Stats => {
                    let stats = dataset.stats();
                    print_json(&json!({
                        "records": stats.records,
                        "recordsWithPlan": stats.records_with_plan,
                    }))?;
                }
                DatasetCommand::Lookup { destination } => match dataset.lookup(&destination) {
                    Some(record) => print_json(&json!({
                        "destination": record.destination,
                        "rowIndex": record.row_index,
                        "planDays": record.plan.as_ref().map_or(0, |plan| plan.days.len()),
                    }))?,
                    None => println!("no dataset record matches {destination:?}"),
                },
            }
        }
        Command::Locations { command } => match command {
            LocationsCommand::Rank { file, needs } => {
                let locations = read_locations(&file)?;
                print_json(&scoring::rank(&locations, &needs))?;
            }
            LocationsCommand::Filter { file, needs } => {
                let locations = read_locations(&file)?;
                print_json(&scoring::filter_by_needs(&locations, &needs))?;
            }
            LocationsCommand::Score { file } => {
                let locations = read_locations(&file)?;
                let scored = locations
                    .iter()
                    .map(|location| {
                        json!({
                            "id": location.id,
                            "name": location.name,
                            "accessibilityScore": scoring::score(location),
                            "breakdown": scoring::breakdown(location),
                        })
                    })
                    .collect::<Vec<_>>();
                print_json(&scored)?;
            }
        },
        Command::Sign { text } => {
            let agent = build_agent(&cli.dataset, GenerativeStack::load_default());
            println!("{}", agent.explain_sign(&text).await);
        }
    }

    Ok(())
}

fn build_agent(dataset_path: &Path, models: GenerativeStack) -> GuideAgent {
    let dataset = Arc::new(DatasetIndex::load(dataset_path));
    GuideAgent::new(dataset, models, AppMetrics::shared())
}

/// Accepts either a bare array of locations or `{"locations": [...]}`.
fn read_locations(path: &Path) -> Result<Vec<Location>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading locations from {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let list = match value.get("locations") {
        Some(inner) => inner.clone(),
        None => value,
    };
    serde_json::from_value(list).context("locations do not match the expected shape")
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
