mod locate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shopway_core::TransportMode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopway-cli")]
#[command(about = "Shopway store locator and delivery route command line interface")]
struct Cli {
    /// Initial data payload (JSON or YAML); overrides `SHOPWAY_PAYLOAD_PATH`
    #[arg(long, global = true)]
    payload: Option<PathBuf>,

    /// Fallback log filter when `RUST_LOG` is unset
    #[arg(long, global = true, env = "SHOPWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute and display the delivery route to a commerce
    Route {
        /// Commerce id from the payload
        #[arg(long)]
        commerce: i64,
        /// Start latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Start longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Routing profile (car, bike, foot); defaults to the payload setting
        #[arg(long)]
        profile: Option<TransportMode>,
        /// Print the route summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the commerces nearest to a position
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Maximum number of commerces to list
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Load and validate the payload
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(cli.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Route {
            commerce,
            lat,
            lng,
            profile,
            json,
        }) => {
            let mut config = shopway_core::load_widget_config()?;
            if let Some(path) = cli.payload {
                config.payload_path = path;
            }
            locate::run_route(&config, commerce, (lat, lng), profile, json).await?;
        }
        Some(Commands::Nearest { lat, lng, limit }) => {
            locate::run_nearest(&payload_path(cli.payload), (lat, lng), limit)?;
        }
        Some(Commands::Check) => locate::run_check(&payload_path(cli.payload))?,
        None => println!("shopway-cli ready; see --help for commands"),
    }

    Ok(())
}

/// `--payload`, then `SHOPWAY_PAYLOAD_PATH`, then the configured default.
fn payload_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("SHOPWAY_PAYLOAD_PATH").map(PathBuf::from))
        .unwrap_or_else(|| shopway_core::WidgetConfig::default().payload_path)
}

#[cfg(test)]
mod tests;
