//! Chug times and seat extremes.
//!
//! Averages and the fastest chug use finished games only. The slow-chug
//! list covers every filtered game, latest draw first.

use chrono::{DateTime, Utc};

use crate::api::{ChugRef, ChugSummary, SeatSips};
use crate::config::{ChugSummarySettings, GameRules};
use crate::models::GameRecord;

fn chug_ref(game: &GameRecord, turn_index: usize, seconds: f64) -> ChugRef {
    let date = game.start_datetime.format("%Y-%m-%d").to_string();
    ChugRef {
        game_id: game.id,
        seat: game.seat_of_turn(turn_index),
        seconds,
        description: format!("Chugged in {:.1} seconds on {}", seconds, date),
        date,
    }
}

/// Compute the chug summary of `games`.
pub fn compute_chug_summary(
    games: &[GameRecord],
    rules: &GameRules,
    settings: &ChugSummarySettings,
) -> ChugSummary {
    let mut total_chugs = 0u64;
    let mut timed_chugs = 0u64;
    let mut total_seconds = 0.0;
    let mut fastest_chug: Option<ChugRef> = None;
    let mut slow: Vec<(Option<DateTime<Utc>>, ChugRef)> = Vec::new();

    for game in games {
        for (i, turn) in game.turns.iter().enumerate() {
            if !turn.chugged {
                continue;
            }
            if game.is_finished() {
                total_chugs += 1;
            }
            let Some(seconds) = turn.chug_duration_seconds else {
                continue;
            };
            if game.is_finished() {
                timed_chugs += 1;
                total_seconds += seconds;
                if fastest_chug.as_ref().map_or(true, |f| seconds < f.seconds) {
                    fastest_chug = Some(chug_ref(game, i, seconds));
                }
            }
            if seconds >= settings.slow_chug_seconds {
                slow.push((turn.drawn_at, chug_ref(game, i, seconds)));
            }
        }
    }

    // Latest first; chugs without a draw time go last
    slow.sort_by(|a, b| b.0.cmp(&a.0));
    let slow_chugs = slow
        .into_iter()
        .take(settings.slow_chug_limit)
        .map(|(_, chug)| chug)
        .collect();

    let mut most_sips: Option<SeatSips> = None;
    let mut fewest_sips: Option<SeatSips> = None;
    let hand_size = rules.hand_size();
    for game in games.iter().filter(|g| g.has_full_hands(hand_size)) {
        for (seat, totals) in game.seat_totals().iter().enumerate() {
            let entry = SeatSips {
                game_id: game.id,
                seat,
                sips: totals.sips,
            };
            if most_sips.as_ref().map_or(true, |m| entry.sips > m.sips) {
                most_sips = Some(entry.clone());
            }
            if fewest_sips.as_ref().map_or(true, |f| entry.sips < f.sips) {
                fewest_sips = Some(entry);
            }
        }
    }

    ChugSummary {
        total_chugs,
        timed_chugs,
        average_chug_seconds: (timed_chugs > 0).then(|| total_seconds / timed_chugs as f64),
        fastest_chug,
        most_sips,
        fewest_sips,
        slow_chugs,
    }
}
