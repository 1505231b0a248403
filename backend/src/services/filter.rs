//! Record selection for one report.
//!
//! The filter is the only component that looks at raw records. It produces a
//! [`FilteredGames`] snapshot that every builder shares read-only.

use std::sync::Arc;

use crate::config::GameRules;
use crate::db::checksum::snapshot_checksum;
use crate::error::{StatsError, StatsResult};
use crate::models::{GameRecord, PlayerCountSelector, SeasonSelector};

/// Immutable, chronologically ordered snapshot of the games matching one
/// selection. Cloning shares the underlying records.
#[derive(Debug, Clone)]
pub struct FilteredGames {
    games: Arc<Vec<GameRecord>>,
    season: SeasonSelector,
    player_count: PlayerCountSelector,
}

impl FilteredGames {
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn season(&self) -> SeasonSelector {
        self.season
    }

    pub fn player_count(&self) -> PlayerCountSelector {
        self.player_count
    }

    /// SHA-256 over the selection and the ordered game ids.
    pub fn checksum(&self) -> String {
        snapshot_checksum(&self.games, self.season, self.player_count)
    }
}

/// Selects games by season and player count.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    rules: GameRules,
}

impl RecordFilter {
    pub fn new(rules: GameRules) -> Self {
        Self { rules }
    }

    /// Reject selectors the rules can never match.
    pub fn validate(
        &self,
        season: SeasonSelector,
        player_count: PlayerCountSelector,
    ) -> StatsResult<()> {
        if let SeasonSelector::Only(s) = season {
            if s.number() == 0 {
                return Err(StatsError::invalid_selector("seasons are numbered from 1"));
            }
        }
        if let PlayerCountSelector::Exactly(n) = player_count {
            if !self.rules.supports(n) {
                return Err(StatsError::invalid_selector(format!(
                    "player count {} outside supported range {}..={}",
                    n, self.rules.min_players, self.rules.max_players
                )));
            }
        }
        Ok(())
    }

    /// Keep the records matching both selectors, ordered by start time.
    /// Records starting at the same instant keep their input order.
    pub fn apply<I>(
        &self,
        records: I,
        season: SeasonSelector,
        player_count: PlayerCountSelector,
    ) -> StatsResult<FilteredGames>
    where
        I: IntoIterator<Item = GameRecord>,
    {
        self.validate(season, player_count)?;

        let mut games: Vec<GameRecord> = records
            .into_iter()
            .filter(|g| season.matches(g.season_tag()) && player_count.matches(g.player_count))
            .collect();
        games.sort_by_key(|g| g.start_datetime);

        log::debug!(
            "Filtered {} games for {} / {}",
            games.len(),
            season.label(),
            player_count.label()
        );

        Ok(FilteredGames {
            games: Arc::new(games),
            season,
            player_count,
        })
    }
}
