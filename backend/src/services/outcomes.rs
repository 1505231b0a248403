//! Outcome extraction from filtered game records.
//!
//! Per-player outcomes (`sips`, `chugs`) come only from finished games in
//! which every card was dealt, so each sample is a full hand. Per-card and
//! duration outcomes use every filtered game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::GameStats;
use crate::config::GameRules;
use crate::models::{GameRecord, PlayerCountSelector};

/// Integer-valued outcomes with a theoretical model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerOutcome {
    /// Total sips of one player in one finished game
    Sips,
    /// Chugs of one player in one finished game
    Chugs,
    /// Sips of a single card
    TurnSips,
}

impl IntegerOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            IntegerOutcome::Sips => "sips",
            IntegerOutcome::Chugs => "chugs",
            IntegerOutcome::TurnSips => "turn_sips",
        }
    }

    /// Largest value the rules can produce for one player count.
    pub fn max_value(&self, rules: &GameRules, player_count: u32) -> u32 {
        match self {
            IntegerOutcome::Sips => rules.max_hand_sum(player_count),
            IntegerOutcome::Chugs => rules.max_chugs(player_count),
            IntegerOutcome::TurnSips => rules.max_card_value(),
        }
    }

    /// Upper bound of the reported domain for a selection. "Any" uses the
    /// largest bound over every supported player count.
    pub fn domain_max(&self, rules: &GameRules, selector: PlayerCountSelector) -> u32 {
        match selector {
            PlayerCountSelector::Exactly(n) => self.max_value(rules, n),
            PlayerCountSelector::Any => rules
                .supported_player_counts()
                .map(|n| self.max_value(rules, n))
                .max()
                .unwrap_or(0),
        }
    }
}

/// Duration outcomes, binned without a model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationOutcome {
    Game,
    Chug,
}

impl DurationOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            DurationOutcome::Game => "game_duration",
            DurationOutcome::Chug => "chug_duration",
        }
    }
}

/// Observed values of an integer outcome together with how many of them
/// came from each player count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerSamples {
    pub values: Vec<u32>,
    pub per_player_count: BTreeMap<u32, u64>,
}

impl IntegerSamples {
    fn push(&mut self, player_count: u32, value: u32) {
        self.values.push(value);
        *self.per_player_count.entry(player_count).or_insert(0) += 1;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collect the samples of `outcome` from `games`.
pub fn integer_samples(
    games: &[GameRecord],
    outcome: IntegerOutcome,
    rules: &GameRules,
) -> IntegerSamples {
    let hand_size = rules.hand_size();
    let mut samples = IntegerSamples::default();
    for game in games {
        match outcome {
            IntegerOutcome::Sips | IntegerOutcome::Chugs => {
                if !game.has_full_hands(hand_size) {
                    continue;
                }
                for seat in game.seat_totals() {
                    let value = if outcome == IntegerOutcome::Sips {
                        seat.sips
                    } else {
                        seat.chugs
                    };
                    samples.push(game.player_count, value);
                }
            }
            IntegerOutcome::TurnSips => {
                for turn in &game.turns {
                    samples.push(game.player_count, turn.sips);
                }
            }
        }
    }
    samples
}

/// Collect the samples of a duration outcome; `None` marks a missing value.
pub fn duration_samples(games: &[GameRecord], outcome: DurationOutcome) -> Vec<Option<f64>> {
    match outcome {
        DurationOutcome::Game => games.iter().map(|g| g.duration_seconds()).collect(),
        DurationOutcome::Chug => games
            .iter()
            .flat_map(|g| g.turns.iter())
            .filter(|t| t.chugged)
            .map(|t| t.chug_duration_seconds)
            .collect(),
    }
}

/// `(chugs, sips)` for every seat of every fully dealt game.
pub fn chug_sip_pairs(games: &[GameRecord], rules: &GameRules) -> Vec<(u32, u32)> {
    let hand_size = rules.hand_size();
    games
        .iter()
        .filter(|g| g.has_full_hands(hand_size))
        .flat_map(|g| g.seat_totals())
        .map(|seat| (seat.chugs, seat.sips))
        .collect()
}

/// Compute the summary block of the statistics page.
pub fn compute_game_stats(games: &[GameRecord], rules: &GameRules) -> GameStats {
    let total_games = games.len() as u64;
    let total_dnf = games.iter().filter(|g| g.is_dnf()).count() as u64;
    let total_sips: u64 = games.iter().map(|g| g.total_sips()).sum();
    let total_duration_seconds: f64 = games.iter().filter_map(|g| g.duration_seconds()).sum();

    GameStats {
        total_games,
        total_dnf,
        total_sips,
        total_beers: total_sips as f64 / rules.sips_per_beer as f64,
        total_duration_seconds,
        total_duration: format_duration(total_duration_seconds),
    }
}

/// Render seconds as `H:MM:SS`, rounded to the nearest second.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
