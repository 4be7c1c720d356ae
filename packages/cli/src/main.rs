#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the wildlife collision risk toolchain.
//!
//! `serve` starts the API server, `predict` scores a single query against
//! the configured model and prints the result as JSON, and `summary`
//! prints an overview of the loaded dataset. Every subcommand reads the
//! same environment variables as the server.

use chrono::Datelike as _;
use clap::{Parser, Subcommand};
use wildlife_risk_data::{DataConfig, UniqueValueIndex, eda, load_collisions};
use wildlife_risk_model::{ModelConfig, RiskPolicy};
use wildlife_risk_server::Dashboard;
use wildlife_risk_server_models::PredictRequest;

#[derive(Parser)]
#[command(name = "wildlife_risk", about = "Wildlife collision risk toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Predict the collision risk for one location, time and species
    Predict {
        /// County (e.g. "Värmlands län")
        #[arg(long)]
        county: String,
        /// Municipality within the county
        #[arg(long)]
        municipality: Option<String>,
        /// Species (e.g. "Moose")
        #[arg(long)]
        species: String,
        /// Calendar month (1-12)
        #[arg(long)]
        month: u32,
        /// Hour of day (0-23)
        #[arg(long)]
        hour: u32,
        /// Calendar year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Print an overview of the collision dataset
    Summary {
        /// Number of counties to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(wildlife_risk_server::run_server())
            })
            .await??;
        }
        Commands::Predict {
            county,
            municipality,
            species,
            month,
            hour,
            year,
        } => {
            log::info!("Scoring {species} in {county} for month {month}, hour {hour}");
            let dashboard = Dashboard::load(
                &DataConfig::from_env(),
                &ModelConfig::from_env(),
                RiskPolicy::default(),
            )
            .await?;
            let request = PredictRequest {
                county,
                municipality,
                month,
                hour,
                species,
                year,
                latitude: None,
                longitude: None,
                day_of_year: None,
                weekday: None,
            };
            let prediction = dashboard.predict(&request, chrono::Local::now().year())?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        Commands::Summary { top } => summary(top).await?,
    }

    Ok(())
}

async fn summary(top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = DataConfig::from_env();
    let table = load_collisions(&config).await?;
    let index = UniqueValueIndex::build(&table);
    let years = eda::years(&table);

    println!("Source:    {}", config.location());
    println!("Records:   {}", table.len());
    println!("Columns:   {}", table.columns().join(", "));
    println!("Counties:  {}", index.counties().len());
    println!("Species:   {}", index.species().join(", "));
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        println!("Years:     {first}-{last}");
    }

    println!();
    println!("Top {top} counties:");
    for (county, count) in eda::county_counts(&table, None).into_iter().take(top) {
        println!("  {county:<30} {count:>8}");
    }

    Ok(())
}
