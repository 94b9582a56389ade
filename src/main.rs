mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "league")]
#[command(about = "Scoreboard backend for a football prediction league")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Create the schema and seed the teams
    InitDb,
    /// Fetch a matchday from football-data.org and store its matches
    Sync {
        #[arg(short, long)]
        matchday: i64,
        #[arg(short, long)]
        season: Option<i64>,
    },
    /// Print a matchday's scoreboard, or write it as CSV
    Scoreboard {
        #[arg(short, long)]
        matchday: i64,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the season standings
    Standings,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting league API server on port {}", port);
            api::serve(config, port).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            cli::init_db(&config).await?;
        }
        Some(Commands::Sync { matchday, season }) => {
            tracing::info!("Syncing matchday {}", matchday);
            cli::sync_matchday(&config, matchday, season).await?;
        }
        Some(Commands::Scoreboard { matchday, csv }) => {
            cli::show_scoreboard(&config, matchday, csv.as_deref()).await?;
        }
        Some(Commands::Standings) => {
            cli::show_standings(&config).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting league API server on port 3000");
            api::serve(config, 3000).await?;
        }
    }

    Ok(())
}
