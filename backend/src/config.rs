//! Engine configuration file support.
//!
//! The configuration holds the game rules and the tuning knobs of every
//! builder. It is loaded once, validated, and then shared read-only
//! (typically behind an `Arc`) for the lifetime of the process. Several
//! configurations may coexist, e.g. one per game variant in tests.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::error::{StatsError, StatsResult};

/// Game rules: deck composition and supported table sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    /// Distinct card values in one suit; a card's value is its sip count
    #[serde(default = "default_card_values")]
    pub card_values: Vec<u32>,
    /// Drawing this value ends the turn in a chug
    #[serde(default = "default_chug_value")]
    pub chug_value: u32,
    /// Suits each seat contributes to the deck
    #[serde(default = "default_copies_per_player")]
    pub copies_per_player: u32,
    #[serde(default = "default_min_players")]
    pub min_players: u32,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default = "default_sips_per_beer")]
    pub sips_per_beer: u32,
}

fn default_card_values() -> Vec<u32> {
    (2..=14).collect()
}

fn default_chug_value() -> u32 {
    14
}

fn default_copies_per_player() -> u32 {
    1
}

fn default_min_players() -> u32 {
    2
}

fn default_max_players() -> u32 {
    6
}

fn default_sips_per_beer() -> u32 {
    14
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            card_values: default_card_values(),
            chug_value: default_chug_value(),
            copies_per_player: default_copies_per_player(),
            min_players: default_min_players(),
            max_players: default_max_players(),
            sips_per_beer: default_sips_per_beer(),
        }
    }
}

impl GameRules {
    pub fn supported_player_counts(&self) -> RangeInclusive<u32> {
        self.min_players..=self.max_players
    }

    pub fn supports(&self, player_count: u32) -> bool {
        self.supported_player_counts().contains(&player_count)
    }

    /// Copies of each card value in a deck for `player_count` seats.
    pub fn copies(&self, player_count: u32) -> u32 {
        self.copies_per_player * player_count
    }

    pub fn deck_size(&self, player_count: u32) -> u32 {
        self.card_values.len() as u32 * self.copies(player_count)
    }

    /// Cards each seat draws in a full game (one per round).
    pub fn hand_size(&self) -> u32 {
        self.card_values.len() as u32 * self.copies_per_player
    }

    pub fn chug_copies(&self, player_count: u32) -> u32 {
        let per_suit = self
            .card_values
            .iter()
            .filter(|&&v| v == self.chug_value)
            .count() as u32;
        per_suit * self.copies(player_count)
    }

    pub fn max_card_value(&self) -> u32 {
        self.card_values.iter().copied().max().unwrap_or(0)
    }

    /// Largest sip total a single hand can reach.
    pub fn max_hand_sum(&self, player_count: u32) -> u32 {
        let copies = self.copies(player_count) as usize;
        let mut values = self.card_values.clone();
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
            .iter()
            .flat_map(|&v| std::iter::repeat(v).take(copies))
            .take(self.hand_size() as usize)
            .sum()
    }

    /// Most chugs a single hand can contain.
    pub fn max_chugs(&self, player_count: u32) -> u32 {
        self.hand_size().min(self.chug_copies(player_count))
    }
}

/// Distribution model tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Simulated games per approximate model
    #[serde(default = "default_trial_count")]
    pub trial_count: u64,
    /// Hard budget; larger trial counts are refused as intractable
    #[serde(default = "default_max_trials")]
    pub max_trials: u64,
    /// Exact enumeration is used while the state space stays below this
    #[serde(default = "default_tractability_threshold")]
    pub tractability_threshold: u64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_trial_count() -> u64 {
    100_000
}

fn default_max_trials() -> u64 {
    10_000_000
}

fn default_tractability_threshold() -> u64 {
    1_000_000
}

fn default_seed() -> u64 {
    42
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            trial_count: default_trial_count(),
            max_trials: default_max_trials(),
            tractability_threshold: default_tractability_threshold(),
            seed: default_seed(),
        }
    }
}

/// Most buckets a duration histogram may allocate.
pub const MAX_DURATION_BUCKETS: usize = 100_000;

/// Fixed-width binning of a duration outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationBinning {
    pub bucket_width_seconds: f64,
    /// Durations at or above this are reported as overflow
    pub cutoff_seconds: f64,
}

impl DurationBinning {
    pub fn new(bucket_width_seconds: f64, cutoff_seconds: f64) -> Self {
        Self {
            bucket_width_seconds,
            cutoff_seconds,
        }
    }

    pub fn bucket_count(&self) -> usize {
        (self.cutoff_seconds / self.bucket_width_seconds).ceil() as usize
    }

    fn validate(&self, name: &str) -> StatsResult<()> {
        if !(self.bucket_width_seconds.is_finite() && self.bucket_width_seconds > 0.0) {
            return Err(StatsError::Configuration(format!(
                "{}.bucket_width_seconds must be positive",
                name
            )));
        }
        if !(self.cutoff_seconds.is_finite() && self.cutoff_seconds >= self.bucket_width_seconds)
        {
            return Err(StatsError::Configuration(format!(
                "{}.cutoff_seconds must be at least one bucket wide",
                name
            )));
        }
        if self.bucket_count() > MAX_DURATION_BUCKETS {
            return Err(StatsError::Configuration(format!(
                "{} needs {} buckets, at most {} allowed",
                name,
                self.bucket_count(),
                MAX_DURATION_BUCKETS
            )));
        }
        Ok(())
    }
}

/// A duration table may set either field; the other keeps the outcome's
/// own default.
#[derive(Deserialize)]
struct BinningOverrides {
    bucket_width_seconds: Option<f64>,
    cutoff_seconds: Option<f64>,
}

impl BinningOverrides {
    fn apply_to(self, base: DurationBinning) -> DurationBinning {
        DurationBinning {
            bucket_width_seconds: self.bucket_width_seconds.unwrap_or(base.bucket_width_seconds),
            cutoff_seconds: self.cutoff_seconds.unwrap_or(base.cutoff_seconds),
        }
    }
}

fn game_duration_or_default<'de, D>(deserializer: D) -> Result<DurationBinning, D::Error>
where
    D: Deserializer<'de>,
{
    BinningOverrides::deserialize(deserializer).map(|o| o.apply_to(default_game_duration()))
}

fn chug_duration_or_default<'de, D>(deserializer: D) -> Result<DurationBinning, D::Error>
where
    D: Deserializer<'de>,
{
    BinningOverrides::deserialize(deserializer).map(|o| o.apply_to(default_chug_duration()))
}

fn default_game_duration() -> DurationBinning {
    DurationBinning::new(300.0, 3.0 * 3600.0)
}

fn default_chug_duration() -> DurationBinning {
    DurationBinning::new(1.0, 30.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSettings {
    /// Heat-grid cell size in degrees
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution_deg: f64,
}

fn default_grid_resolution() -> f64 {
    0.01
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            grid_resolution_deg: default_grid_resolution(),
        }
    }
}

/// Chug-time summary tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChugSummarySettings {
    /// Chugs at least this slow are listed individually
    #[serde(default = "default_slow_chug_seconds")]
    pub slow_chug_seconds: f64,
    #[serde(default = "default_slow_chug_limit")]
    pub slow_chug_limit: usize,
}

fn default_slow_chug_seconds() -> f64 {
    20.0
}

fn default_slow_chug_limit() -> usize {
    10
}

impl Default for ChugSummarySettings {
    fn default() -> Self {
        Self {
            slow_chug_seconds: default_slow_chug_seconds(),
            slow_chug_limit: default_slow_chug_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabSettings {
    /// Lower edges of the sip-total columns; the last column is open-ended
    #[serde(default = "default_sip_bucket_edges")]
    pub sip_bucket_edges: Vec<u32>,
}

fn default_sip_bucket_edges() -> Vec<u32> {
    vec![0, 60, 80, 100, 120, 140]
}

impl Default for CrossTabSettings {
    fn default() -> Self {
        Self {
            sip_bucket_edges: default_sip_bucket_edges(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rules: GameRules,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(
        default = "default_game_duration",
        deserialize_with = "game_duration_or_default"
    )]
    pub game_duration: DurationBinning,
    #[serde(
        default = "default_chug_duration",
        deserialize_with = "chug_duration_or_default"
    )]
    pub chug_duration: DurationBinning,
    #[serde(default)]
    pub geo: GeoSettings,
    #[serde(default)]
    pub cross_tab: CrossTabSettings,
    #[serde(default)]
    pub chug_summary: ChugSummarySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            model: ModelSettings::default(),
            game_duration: default_game_duration(),
            chug_duration: default_chug_duration(),
            geo: GeoSettings::default(),
            cross_tab: CrossTabSettings::default(),
            chug_summary: ChugSummarySettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(content: &str) -> StatsResult<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            StatsError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load engine configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` if the file parses and validates
    /// * `Err(StatsError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> StatsResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            StatsError::Configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load engine configuration from the default location.
    ///
    /// Uses `STATS_CONFIG` when set, otherwise searches for `stats.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> StatsResult<Self> {
        if let Ok(path) = std::env::var("STATS_CONFIG") {
            return Self::from_file(path);
        }

        let search_paths = [
            PathBuf::from("stats.toml"),
            PathBuf::from("backend/stats.toml"),
            PathBuf::from("../stats.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(StatsError::Configuration(
            "No stats.toml found in standard locations".to_string(),
        ))
    }

    pub fn validate(&self) -> StatsResult<()> {
        let rules = &self.rules;
        if rules.card_values.is_empty() {
            return Err(StatsError::Configuration(
                "rules.card_values must not be empty".to_string(),
            ));
        }
        let mut sorted = rules.card_values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != rules.card_values.len() {
            return Err(StatsError::Configuration(
                "rules.card_values must be distinct".to_string(),
            ));
        }
        if !rules.card_values.contains(&rules.chug_value) {
            return Err(StatsError::Configuration(format!(
                "rules.chug_value {} is not a card value",
                rules.chug_value
            )));
        }
        if rules.copies_per_player == 0 {
            return Err(StatsError::Configuration(
                "rules.copies_per_player must be positive".to_string(),
            ));
        }
        if rules.min_players == 0 || rules.min_players > rules.max_players {
            return Err(StatsError::Configuration(format!(
                "rules player range {}..={} is empty",
                rules.min_players, rules.max_players
            )));
        }
        if rules.sips_per_beer == 0 {
            return Err(StatsError::Configuration(
                "rules.sips_per_beer must be positive".to_string(),
            ));
        }

        if self.model.max_trials == 0 {
            return Err(StatsError::Configuration(
                "model.max_trials must be positive".to_string(),
            ));
        }

        self.game_duration.validate("game_duration")?;
        self.chug_duration.validate("chug_duration")?;

        let res = self.geo.grid_resolution_deg;
        if !(res.is_finite() && res > 0.0 && res <= 180.0) {
            return Err(StatsError::Configuration(
                "geo.grid_resolution_deg must be in (0, 180]".to_string(),
            ));
        }

        let edges = &self.cross_tab.sip_bucket_edges;
        if edges.is_empty() || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StatsError::Configuration(
                "cross_tab.sip_bucket_edges must be non-empty and strictly increasing"
                    .to_string(),
            ));
        }

        let slow = self.chug_summary.slow_chug_seconds;
        if !(slow.is_finite() && slow > 0.0) {
            return Err(StatsError::Configuration(
                "chug_summary.slow_chug_seconds must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
