//! Per-seat breakdown of single games.

use crate::api::{GameSeatStats, SeatStats};
use crate::config::GameRules;
use crate::models::GameRecord;

/// Seconds between consecutive card draws, the first measured from the game
/// start. Stops at the first card without a draw time.
pub fn turn_durations(game: &GameRecord) -> Vec<f64> {
    let mut previous = game.start_datetime;
    let mut durations = Vec::new();
    for turn in &game.turns {
        let Some(drawn_at) = turn.drawn_at else {
            break;
        };
        durations.push((drawn_at - previous).num_milliseconds() as f64 / 1000.0);
        previous = drawn_at;
    }
    durations
}

fn ratio(numerator: Option<f64>, denominator: u32) -> Option<f64> {
    match numerator {
        Some(n) if denominator > 0 => Some(n / denominator as f64),
        _ => None,
    }
}

/// Sips, beers and pace of every seat in `game`.
pub fn compute_seat_stats(game: &GameRecord, rules: &GameRules) -> GameSeatStats {
    let totals = game.seat_totals();
    let live = game.turns.first().is_some_and(|t| t.drawn_at.is_some());

    let mut times = vec![0.0; totals.len()];
    let mut timed_turns = vec![0u32; totals.len()];
    if live {
        for (i, seconds) in turn_durations(game).into_iter().enumerate() {
            let seat = game.seat_of_turn(i);
            times[seat] += seconds;
            timed_turns[seat] += 1;
        }
    }

    // In a running game the newest card is still being drunk
    let pending = game
        .turns
        .last()
        .filter(|_| game.is_dnf())
        .map(|t| (game.seat_of_turn(game.turns.len() - 1), t.sips));

    let seats = totals
        .iter()
        .enumerate()
        .map(|(seat, t)| {
            let total_time = live.then_some(times[seat]);
            let paced_sips = match pending {
                Some((pending_seat, sips)) if pending_seat == seat => t.sips - sips,
                _ => t.sips,
            };
            SeatStats {
                seat,
                total_sips: t.sips,
                turns: t.turns,
                chugs: t.chugs,
                sips_per_turn: ratio(Some(t.sips as f64), t.turns),
                full_beers: t.sips / rules.sips_per_beer,
                extra_sips: t.sips % rules.sips_per_beer,
                total_time_seconds: total_time,
                time_per_turn_seconds: ratio(total_time, timed_turns[seat]),
                time_per_sip_seconds: ratio(total_time, paced_sips),
            }
        })
        .collect();

    GameSeatStats {
        game_id: game.id,
        seats,
    }
}
