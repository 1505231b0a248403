//! Game locations as map markers and a heat grid.
//!
//! Heat cells live on a global grid anchored at (0, 0): a point belongs to
//! cell `(floor(lat / res), floor(lon / res))`, so cells computed for
//! different selections line up.

use std::collections::BTreeMap;

use crate::api::{GeoMarker, GeoReport, HeatCell, HeatGrid};
use crate::error::{ErrorContext, StatsError, StatsResult};
use crate::models::GameRecord;

const UNKNOWN_LOCATION: &str = "Unknown location";

#[derive(Debug, Clone, Copy)]
pub struct GeoAggregator {
    resolution_deg: f64,
}

impl GeoAggregator {
    pub fn new(resolution_deg: f64) -> Self {
        Self { resolution_deg }
    }

    /// Grid cell of a point.
    pub fn cell_of(&self, latitude: f64, longitude: f64) -> (i64, i64) {
        (
            (latitude / self.resolution_deg).floor() as i64,
            (longitude / self.resolution_deg).floor() as i64,
        )
    }

    pub fn build(&self, games: &[GameRecord]) -> StatsResult<GeoReport> {
        if !(self.resolution_deg.is_finite() && self.resolution_deg > 0.0) {
            return Err(StatsError::Configuration(format!(
                "invalid grid resolution {}",
                self.resolution_deg
            )));
        }

        let mut markers = Vec::new();
        let mut weights: BTreeMap<(i64, i64), u64> = BTreeMap::new();
        let mut missing_count = 0u64;
        let mut rejected_count = 0u64;

        for game in games {
            let Some(location) = &game.location else {
                missing_count += 1;
                continue;
            };
            if !valid_coordinates(location.latitude, location.longitude) {
                log::warn!(
                    "Rejecting location ({}, {}) of game {:?}",
                    location.latitude,
                    location.longitude,
                    game.id
                );
                rejected_count += 1;
                continue;
            }

            *weights
                .entry(self.cell_of(location.latitude, location.longitude))
                .or_insert(0) += 1;
            markers.push(GeoMarker {
                latitude: location.latitude,
                longitude: location.longitude,
                popup: popup(&location.label, game),
            });
        }

        let placed: u64 = weights.values().sum();
        if placed != markers.len() as u64 {
            return Err(StatsError::consistency(
                format!("{} markers but {} grid weight", markers.len(), placed),
                ErrorContext::new("geo_aggregator"),
            ));
        }

        let res = self.resolution_deg;
        let cells: Vec<HeatCell> = weights
            .into_iter()
            .map(|((row, col), weight)| HeatCell {
                row,
                col,
                latitude: (row as f64 + 0.5) * res,
                longitude: (col as f64 + 0.5) * res,
                weight,
            })
            .collect();
        let max_weight = cells.iter().map(|c| c.weight).max().unwrap_or(0);

        Ok(GeoReport {
            markers,
            heat_grid: HeatGrid {
                resolution_deg: res,
                cells,
                max_weight,
            },
            missing_count,
            rejected_count,
        })
    }
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

fn popup(label: &str, game: &GameRecord) -> String {
    let label = label.trim();
    let place = if label.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        escape_html(label)
    };
    format!("{}<br>{}", place, game.start_datetime.format("%Y-%m-%d"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use chrono::{TimeZone, Utc};

    fn game_at(location: Option<GeoPoint>) -> GameRecord {
        let mut game = GameRecord::new(3, Utc.with_ymd_and_hms(2016, 4, 9, 19, 30, 0).unwrap());
        game.location = location;
        game
    }

    #[test]
    fn test_duplicate_points_share_a_cell() {
        let point = GeoPoint::new(56.1629, 10.2039, "Aarhus");
        let games = vec![game_at(Some(point.clone())), game_at(Some(point))];
        let report = GeoAggregator::new(0.01).build(&games).unwrap();
        assert_eq!(report.markers.len(), 2);
        assert_eq!(report.heat_grid.cells.len(), 1);
        assert_eq!(report.heat_grid.cells[0].weight, 2);
        assert_eq!(report.heat_grid.max_weight, 2);
        assert_eq!(report.heat_grid.cells[0].row, 5616);
        assert_eq!(report.heat_grid.cells[0].col, 1020);
    }

    #[test]
    fn test_missing_locations_skipped() {
        let games = vec![game_at(None), game_at(Some(GeoPoint::new(1.0, 2.0, "")))];
        let report = GeoAggregator::new(1.0).build(&games).unwrap();
        assert_eq!(report.missing_count, 1);
        assert_eq!(report.markers.len(), 1);
        assert_eq!(report.markers[0].popup, "Unknown location<br>2016-04-09");
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let games = vec![
            game_at(Some(GeoPoint::new(91.0, 0.0, "north"))),
            game_at(Some(GeoPoint::new(f64::NAN, 0.0, "nowhere"))),
            game_at(Some(GeoPoint::new(-33.9, 151.2, "Sydney"))),
        ];
        let report = GeoAggregator::new(1.0).build(&games).unwrap();
        assert_eq!(report.rejected_count, 2);
        assert_eq!(report.markers.len(), 1);
        assert_eq!(report.heat_grid.cells[0].row, -34);
        assert_eq!(report.heat_grid.cells[0].latitude, -33.5);
    }

    #[test]
    fn test_popup_is_escaped() {
        let games = vec![game_at(Some(GeoPoint::new(0.0, 0.0, "<b>Bar & Grill</b>")))];
        let report = GeoAggregator::new(1.0).build(&games).unwrap();
        assert_eq!(
            report.markers[0].popup,
            "&lt;b&gt;Bar &amp; Grill&lt;/b&gt;<br>2016-04-09"
        );
    }

    #[test]
    fn test_cells_sorted_and_comparable() {
        let games = vec![
            game_at(Some(GeoPoint::new(10.5, 20.5, "b"))),
            game_at(Some(GeoPoint::new(-10.5, 20.5, "a"))),
        ];
        let report = GeoAggregator::new(1.0).build(&games).unwrap();
        let keys: Vec<(i64, i64)> = report.heat_grid.cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(keys, vec![(-11, 20), (10, 20)]);

        let alone = GeoAggregator::new(1.0).build(&games[..1]).unwrap();
        assert_eq!(alone.heat_grid.cells[0], report.heat_grid.cells[1].clone());
    }

    #[test]
    fn test_empty_input() {
        let report = GeoAggregator::new(0.01).build(&[]).unwrap();
        assert!(report.markers.is_empty());
        assert!(report.heat_grid.cells.is_empty());
        assert_eq!(report.heat_grid.max_weight, 0);
    }
}
