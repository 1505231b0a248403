//! Public report surface of the statistics engine.
//!
//! This file consolidates the payload types consumed by the rendering layer.
//! Field names are stable: charts read `xs`, `ys`, `total_ys`, `probs`,
//! `probs_exact`, `dist_str` and, for durations, `max_duration`.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ErrorContext, StatsError, StatsResult};
use crate::models::GameId;

/// Sentinel rendered in cross-tab cells of rows without records.
pub const NO_DATA: &str = "—";

/// Counts of an outcome over a fixed, ordered set of labels.
///
/// `ys[i]` counts the samples labelled `xs[i]`; `total_ys` is their sum.
/// Samples falling outside the declared domain are not part of `ys` and are
/// reported in `out_of_domain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram<X> {
    pub xs: Vec<X>,
    pub ys: Vec<u64>,
    pub total_ys: u64,
    #[serde(default)]
    pub out_of_domain: u64,
}

impl<X: PartialOrd + std::fmt::Debug> Histogram<X> {
    /// Build a histogram, checking that labels are strictly ascending and
    /// aligned with the counts.
    pub fn from_counts(xs: Vec<X>, ys: Vec<u64>, out_of_domain: u64) -> StatsResult<Self> {
        let context = || ErrorContext::new("histogram");
        if xs.len() != ys.len() {
            return Err(StatsError::consistency(
                format!("{} labels for {} counts", xs.len(), ys.len()),
                context(),
            ));
        }
        if let Some(w) = xs.windows(2).find(|w| !(w[0] < w[1])) {
            return Err(StatsError::consistency(
                format!("labels not strictly ascending at {:?}", w[1]),
                context(),
            ));
        }
        let total_ys = ys.iter().sum();
        Ok(Self {
            xs,
            ys,
            total_ys,
            out_of_domain,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.total_ys == 0
    }
}

impl<X: PartialEq> Histogram<X> {
    /// Count recorded for label `x` (zero for unknown labels).
    pub fn count_of(&self, x: &X) -> u64 {
        self.xs
            .iter()
            .position(|label| label == x)
            .map_or(0, |i| self.ys[i])
    }
}

/// An integer outcome with its theoretical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    #[serde(flatten)]
    pub histogram: Histogram<u32>,
    /// Model probabilities aligned with `xs`; absent when no model was computed
    pub probs: Option<Vec<f64>>,
    pub probs_exact: bool,
    /// Simulated games behind approximate probabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<u64>,
    pub dist_str: Option<String>,
}

/// A duration outcome binned into fixed-width buckets.
///
/// `xs` are bucket lower bounds in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationReport {
    #[serde(flatten)]
    pub histogram: Histogram<f64>,
    /// Samples without a duration (unfinished games, unmeasured chugs)
    pub dnf_count: u64,
    /// Samples at or above the cutoff
    pub overflow_count: u64,
    pub bucket_width_seconds: f64,
    pub cutoff_seconds: f64,
    /// Cutoff rendered as `H:MM:SS`
    pub max_duration: String,
}

/// One row of a cross-tab. Serialised as `[label, cell, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTabRow {
    pub label: String,
    /// Records in this row, binned or not
    pub total: u64,
    /// Row percentages; `None` for every cell of an empty row
    pub cells: Vec<Option<f64>>,
}

impl Serialize for CrossTabRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len() + 1))?;
        seq.serialize_element(&self.label)?;
        for cell in &self.cells {
            match cell {
                Some(pct) => seq.serialize_element(pct)?,
                None => seq.serialize_element(NO_DATA)?,
            }
        }
        seq.end()
    }
}

/// Row-percentage table relating two outcomes of the same record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    /// Row axis name followed by the column labels
    pub header: Vec<String>,
    pub rows: Vec<CrossTabRow>,
    /// Pairs whose row or column value fell outside every bin
    pub unbinned: u64,
}

/// A single game location for client-side clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMarker {
    pub latitude: f64,
    pub longitude: f64,
    /// Pre-escaped HTML
    pub popup: String,
}

/// A cell of the global heat grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    /// `floor(latitude / resolution)`
    pub row: i64,
    /// `floor(longitude / resolution)`
    pub col: i64,
    /// Cell centre
    pub latitude: f64,
    pub longitude: f64,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatGrid {
    pub resolution_deg: f64,
    /// Sorted by `(row, col)`
    pub cells: Vec<HeatCell>,
    pub max_weight: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReport {
    pub markers: Vec<GeoMarker>,
    pub heat_grid: HeatGrid,
    /// Games without a location
    pub missing_count: u64,
    /// Locations rejected for invalid coordinates
    pub rejected_count: u64,
}

/// Totals over the filtered games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_games: u64,
    pub total_dnf: u64,
    pub total_sips: u64,
    pub total_beers: f64,
    /// Sum over finished games
    pub total_duration_seconds: f64,
    pub total_duration: String,
}

/// One seat's share of a single game.
///
/// Time fields are present only when the game was recorded live, i.e. its
/// first card carries a draw time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatStats {
    pub seat: usize,
    pub total_sips: u32,
    pub turns: u32,
    pub chugs: u32,
    pub sips_per_turn: Option<f64>,
    pub full_beers: u32,
    pub extra_sips: u32,
    pub total_time_seconds: Option<f64>,
    pub time_per_turn_seconds: Option<f64>,
    pub time_per_sip_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSeatStats {
    pub game_id: Option<GameId>,
    pub seats: Vec<SeatStats>,
}

/// A single measured chug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChugRef {
    pub game_id: Option<GameId>,
    pub seat: usize,
    pub seconds: f64,
    /// Game date, `%Y-%m-%d`
    pub date: String,
    pub description: String,
}

/// One seat's sip total in one fully dealt game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSips {
    pub game_id: Option<GameId>,
    pub seat: usize,
    pub sips: u32,
}

/// Chug times and seat extremes over the filtered games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChugSummary {
    /// Chugs in finished games
    pub total_chugs: u64,
    /// Of those, chugs with a measured duration
    pub timed_chugs: u64,
    pub average_chug_seconds: Option<f64>,
    pub fastest_chug: Option<ChugRef>,
    pub most_sips: Option<SeatSips>,
    pub fewest_sips: Option<SeatSips>,
    /// Chugs at or above the slow threshold, latest first
    pub slow_chugs: Vec<ChugRef>,
}

/// The complete statistics page for one selection.
///
/// Every part is computed from the same filtered snapshot, identified by
/// `snapshot_checksum`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub season: String,
    pub player_count: String,
    pub game_count: usize,
    pub snapshot_checksum: String,
    pub game_stats: GameStats,
    pub sips: OutcomeReport,
    pub chugs: OutcomeReport,
    pub turn_sips: OutcomeReport,
    pub game_duration: DurationReport,
    pub chug_duration: DurationReport,
    pub cross_tab: CrossTab,
    pub geo: GeoReport,
    pub chug_summary: ChugSummary,
    pub seat_stats: Vec<GameSeatStats>,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
