#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the municipal budget map.
//!
//! ```text
//! muni_budget convert <topology> <out.geojson> [--enrich]
//! muni_budget list <topology> [--query <q>]
//! muni_budget locate <topology> --lat <lat> --lon <lon>
//! muni_budget allocate <topology> <id> [--empty] [--set water=10] [--ideas <text>] [--submit <api>]
//! muni_budget submissions [--limit 20] [--db-path <path>]
//! muni_budget serve
//! ```
//!
//! `<topology>` is a file path or an `http(s)://` URL.

mod format;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use muni_budget_allocation::{AllocationSimulator, RecordSinkClient, StartingPoint};
use muni_budget_database::{DEFAULT_DB_PATH, list_recent, open_db};
use muni_budget_map_data::{MapData, MapDataLoader};

#[derive(Parser)]
#[command(name = "muni_budget", about = "Municipal budget map tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a topology document and write it as `GeoJSON`
    Convert {
        /// Topology file or URL
        topology: String,
        /// Output `GeoJSON` file
        output: PathBuf,
        /// Merge resolved municipality fields into feature properties
        #[arg(long)]
        enrich: bool,
    },
    /// List resolved municipalities
    List {
        /// Topology file or URL
        topology: String,
        /// Only show municipalities whose name, province, or district match
        #[arg(long, short)]
        query: Option<String>,
    },
    /// Find the municipality containing a point
    Locate {
        /// Topology file or URL
        topology: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Split a municipality's budget across the spending categories
    Allocate {
        /// Topology file or URL
        topology: String,
        /// Municipality ID
        id: String,
        /// Start from zero instead of the default split
        #[arg(long)]
        empty: bool,
        /// Category percentage, e.g. `water=10` (repeatable)
        #[arg(long = "set", value_parser = format::parse_assignment)]
        assignments: Vec<(String, f64)>,
        /// Revenue ideas, kept only when over budget
        #[arg(long)]
        ideas: Option<String>,
        /// API base to submit to, e.g. `http://localhost:3001/api`
        #[arg(long)]
        submit: Option<String>,
    },
    /// Show recently stored allocation submissions
    Submissions {
        /// Maximum number of submissions to show
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Path to the allocations `SQLite` database
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
    /// Run the API server (configured from the environment)
    Serve,
}

async fn load(topology: &str) -> Result<Arc<MapData>, Box<dyn std::error::Error>> {
    let source = format::topology_source(topology);
    let loader = MapDataLoader::new(source.fetcher()?);
    Ok(loader.get().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            topology,
            output,
            enrich,
        } => {
            let data = load(&topology).await?;
            let collection = data.to_geojson(enrich);
            std::fs::write(&output, serde_json::to_vec(&collection)?)?;
            println!(
                "Wrote {} features to {}",
                collection.features.len(),
                output.display()
            );
        }
        Commands::List { topology, query } => {
            let data = load(&topology).await?;
            let records: Vec<_> = match query.as_deref() {
                Some(q) => data.search(q),
                None => data.records.iter().collect(),
            };

            if records.is_empty() {
                println!("No municipalities found.");
                return Ok(());
            }

            println!("{}", format::record_header());
            println!("{}", "-".repeat(114));
            for record in &records {
                println!("{}", format::record_row(record));
            }
            println!("\n{} municipality(ies)", records.len());
        }
        Commands::Locate { topology, lat, lon } => {
            let data = load(&topology).await?;
            if let Some(record) = data.locate(lat, lon) {
                println!("{}", format::record_details(&record));
            } else {
                eprintln!("not found: no municipality contains ({lat}, {lon})");
                std::process::exit(1);
            }
        }
        Commands::Allocate {
            topology,
            id,
            empty,
            assignments,
            ideas,
            submit,
        } => {
            let data = load(&topology).await?;
            let Some(record) = data.find_by_id(&id) else {
                eprintln!("Municipality not found: {id}");
                std::process::exit(1);
            };

            let start = if empty {
                StartingPoint::Empty
            } else {
                StartingPoint::Defaults
            };
            let mut simulator = AllocationSimulator::new(record, start);
            for (category, percentage) in &assignments {
                simulator.set_percentage(category, *percentage)?;
            }

            println!("{} ({})\n", record.name, format::millions(record.budget));
            println!("{}", format::allocation_table(&simulator));

            if let Some(base) = submit {
                let submission = simulator.build_submission(ideas.as_deref());
                let receipt = RecordSinkClient::new(base)?.submit(&submission).await?;
                println!("\n{} (id {})", receipt.message, receipt.id);
            }
        }
        Commands::Submissions { limit, db_path } => {
            let db = open_db(&db_path).await?;
            let allocations = list_recent(db.as_ref(), limit).await?;

            if allocations.is_empty() {
                println!("No submissions found.");
                return Ok(());
            }

            println!(
                "{:<38} {:<32} {:>8} {:<5} RECEIVED",
                "ID", "MUNICIPALITY", "TOTAL %", "OVER"
            );
            println!("{}", "-".repeat(110));

            for allocation in &allocations {
                let submission = &allocation.submission;
                println!(
                    "{:<38} {:<32} {:>8.2} {:<5} {}",
                    allocation.id,
                    format::truncate(&submission.municipality_name, 32),
                    submission.total_percentage(),
                    if submission.over_budget { "yes" } else { "no" },
                    allocation.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }

            println!("\n{} submission(s)", allocations.len());
        }
        Commands::Serve => {
            // actix-web runs its own system; keep it off this runtime.
            let config = muni_budget_server::ServerConfig::from_env();
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(muni_budget_server::run_server(config))
            })
            .await??;
        }
    }

    log::debug!("Done");
    Ok(())
}
