//! Traffic Predictor CLI
//!
//! A command-line tool for requesting predictions from the traffic
//! prediction service and inspecting its health and model schemas.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{features, health, predict, Slot};
use std::path::PathBuf;

/// Traffic Predictor CLI
#[derive(Parser)]
#[command(name = "tpctl")]
#[command(author, version, about = "CLI for the Traffic Predictor service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via TPCTL_API_URL env var)
    #[arg(long, env = "TPCTL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a prediction from one of the models
    Predict {
        /// Which model to query
        #[arg(value_enum)]
        slot: Slot,

        /// JSON file holding a feature object
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Feature value as NAME=VALUE (repeatable, overrides --input)
        #[arg(long = "field", short = 'F')]
        fields: Vec<String>,
    },

    /// Show service health and model load status
    Health,

    /// Show the ordered features a loaded model expects
    Features {
        /// Which model to inspect
        #[arg(value_enum)]
        slot: Slot,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let format = match cli.format {
        Some(format) => format,
        None => config
            .default_format
            .as_deref()
            .and_then(|f| output::OutputFormat::from_str(f, true).ok())
            .unwrap_or_default(),
    };

    let client = client::ApiClient::new(&config.api_url(cli.api_url))?;

    match cli.command {
        Commands::Predict {
            slot,
            input,
            fields,
        } => {
            predict::predict(&client, slot, input.as_deref(), &fields, format).await?;
        }
        Commands::Health => {
            health::show_health(&client, format).await?;
        }
        Commands::Features { slot } => {
            features::show_features(&client, slot, format).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
