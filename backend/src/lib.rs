//! # Academy statistics engine
//!
//! Turns recorded plays of the card drinking game into the data behind its
//! statistics page: empirical distributions of per-player and per-card
//! outcomes, the theoretical distributions the deck implies, duration
//! histograms, a chugs-versus-sips cross-tab, per-seat and chug-time
//! summaries, and map data.
//!
//! ## Architecture
//!
//! - [`models`]: game and turn records, seasons and selectors
//! - [`db`]: repository trait, in-memory repository and snapshot checksums
//! - [`services`]: the engine, one module per computation
//! - [`api`]: serializable report payloads
//! - [`config`]: game rules and builder settings, loaded from TOML
//! - [`error`]: engine error taxonomy
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use academy_stats::config::EngineConfig;
//! use academy_stats::db::LocalRepository;
//! use academy_stats::models::{PlayerCountSelector, SeasonSelector};
//! use academy_stats::services::StatsService;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let repo = LocalRepository::new();
//! let service = StatsService::new(Arc::new(EngineConfig::default()));
//! let report = service
//!     .generate_report(&repo, SeasonSelector::All, PlayerCountSelector::Any)
//!     .await
//!     .unwrap();
//! assert_eq!(report.sips.histogram.total_ys, 0);
//! # }
//! ```

// Allow large error types - StatsError carries repository errors with context
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use error::{StatsError, StatsResult};
