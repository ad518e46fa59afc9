mod collect;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qcsite-cli")]
#[command(about = "Quick-commerce warehouse site scoring")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the candidate locations in registry order
    Locations,
    /// Collect and score metrics once, then print the results
    Collect {
        /// Only collect this location (case-insensitive)
        #[arg(long)]
        location: Option<String>,
        /// Seed for the simulated provider (overrides `QCSITE_SIMULATION_SEED`)
        #[arg(long)]
        seed: Option<u64>,
        /// Print full records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut config = qcsite_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Locations) => {
            let registry = collect::load_registry(&config)?;
            for location in &registry {
                println!("{}", collect::format_location(location));
            }
        }
        Some(Commands::Collect {
            location,
            seed,
            json,
        }) => {
            if seed.is_some() {
                config.simulation_seed = seed;
            }
            collect::run_collect(&config, location.as_deref(), json).await?;
        }
        None => println!("qcsite-cli: use --help to list commands"),
    }

    Ok(())
}
