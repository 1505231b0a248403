#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use academy_stats::models::{GameRecord, GeoPoint, Season, TurnRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to process-global
/// env vars across tests in the same binary.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Evening of the `day`th day of season 1.
pub fn season_one_evening(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 1, 10, 20, 0, 0).unwrap() + Duration::days(day)
}

/// A finished game of `minutes` length with the given turn sips.
pub fn finished_game(players: u32, start: DateTime<Utc>, minutes: i64, sips: &[u32]) -> GameRecord {
    GameRecord::new(players, start)
        .with_season(Season::containing(start))
        .with_end(start + Duration::minutes(minutes))
        .with_turns(sips.iter().map(|&s| TurnRecord::sips(s)).collect())
}

/// A game that was never finished.
pub fn dnf_game(players: u32, start: DateTime<Utc>) -> GameRecord {
    GameRecord::new(players, start).with_season(Season::containing(start))
}

/// A complete game: every card of a `players`-suit deck dealt in a fixed
/// order, with a chug of `chug_seconds` on every ace.
pub fn full_game(players: u32, start: DateTime<Utc>, chug_seconds: f64) -> GameRecord {
    let turns = (0..13u32)
        .flat_map(|round| (0..players).map(move |_| round + 2))
        .map(|value| {
            if value == 14 {
                TurnRecord::chug(value, chug_seconds)
            } else {
                TurnRecord::sips(value)
            }
        })
        .collect();
    GameRecord::new(players, start)
        .with_season(Season::containing(start))
        .with_end(start + Duration::minutes(45))
        .with_turns(turns)
}

pub fn aarhus() -> GeoPoint {
    GeoPoint::new(56.1572, 10.2107, "Aarhus University")
}
