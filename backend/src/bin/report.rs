//! Statistics report generator.
//!
//! Loads game records from a JSON file into the in-memory repository and
//! prints the statistics report for one selection as JSON.
//!
//! # Usage
//!
//! ```bash
//! SEASON=S3 PLAYER_COUNT=4 cargo run --bin academy-stats-report -- games.json
//! ```
//!
//! # Environment Variables
//!
//! - `SEASON`: `all` (default), `S<n>` or a season number
//! - `PLAYER_COUNT`: `any` (default) or a player count
//! - `STATS_CONFIG`: path to the engine configuration (defaults apply when no
//!   `stats.toml` is found)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use academy_stats::config::EngineConfig;
use academy_stats::db::repositories::LocalRepository;
use academy_stats::models::{PlayerCountSelector, SeasonSelector};
use academy_stats::services::StatsService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .context("usage: academy-stats-report <games.json>")?;

    let config = match EngineConfig::from_default_location() {
        Ok(config) => config,
        Err(e) if env::var("STATS_CONFIG").is_ok() => return Err(e.into()),
        Err(e) => {
            warn!("{}; using default configuration", e);
            EngineConfig::default()
        }
    };

    let season: SeasonSelector = env::var("SEASON").unwrap_or_default().parse()?;
    let player_count: PlayerCountSelector = env::var("PLAYER_COUNT").unwrap_or_default().parse()?;

    let repo = LocalRepository::with_rules(config.rules.clone());
    let ids = repo
        .load_json_file(&path)
        .with_context(|| format!("failed to load games from {}", path))?;
    info!("Loaded {} games from {}", ids.len(), path);

    let service = StatsService::new(Arc::new(config));
    let report = service
        .generate_report(&repo, season, player_count)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
