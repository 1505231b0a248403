//! In-memory local repository implementation.
//!
//! This module provides a local implementation of the repository trait
//! suitable for unit testing, local development and the report binary. All
//! data is stored in memory, providing fast, deterministic, and isolated
//! execution.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::config::GameRules;
use crate::db::repository::{GameRepository, RepositoryError, RepositoryResult};
use crate::models::{GameId, GameRecord, PlayerCountSelector, SeasonSelector};

/// In-memory local repository.
///
/// # Example
/// ```
/// use academy_stats::db::repositories::LocalRepository;
/// use academy_stats::db::repository::GameRepository;
/// use academy_stats::models::{GameRecord, PlayerCountSelector, SeasonSelector};
///
/// # #[tokio::main]
/// # async fn main() {
/// let repo = LocalRepository::new();
/// let game = GameRecord::new(4, chrono::Utc::now());
/// repo.store_game(&game).await.unwrap();
///
/// let games = repo
///     .fetch_games(SeasonSelector::All, PlayerCountSelector::Any)
///     .await
///     .unwrap();
/// assert_eq!(games.len(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    rules: Arc<GameRules>,
}

struct LocalData {
    games: Vec<GameRecord>,
    next_game_id: i64,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            games: Vec::new(),
            next_game_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty repository validating against the default rules.
    pub fn new() -> Self {
        Self::with_rules(GameRules::default())
    }

    /// Create a new empty repository validating against `rules`.
    pub fn with_rules(rules: GameRules) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            rules: Arc::new(rules),
        }
    }

    /// Validate and insert a record, assigning it the next id.
    pub fn store_game_impl(&self, game: &GameRecord) -> RepositoryResult<GameId> {
        validate_game(game, &self.rules)?;

        let mut data = self.data.write();
        let game_id = GameId(data.next_game_id);
        data.next_game_id += 1;
        data.games.push(game.clone().with_id(game_id));
        Ok(game_id)
    }

    /// Load a JSON array of records, storing each one.
    ///
    /// The whole batch is validated before anything is stored.
    pub fn load_json_str(&self, json: &str) -> RepositoryResult<Vec<GameId>> {
        let games: Vec<GameRecord> = serde_json::from_str(json)?;
        for game in &games {
            validate_game(game, &self.rules)?;
        }
        games.iter().map(|g| self.store_game_impl(g)).collect()
    }

    /// Load a JSON file holding an array of records.
    pub fn load_json_file<P: AsRef<Path>>(&self, path: P) -> RepositoryResult<Vec<GameId>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.load_json_str(&content)
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Local repository marked unhealthy"))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject records that the game rules cannot produce.
pub fn validate_game(game: &GameRecord, rules: &GameRules) -> RepositoryResult<()> {
    if !rules.supports(game.player_count) {
        return Err(RepositoryError::validation(
            format!(
                "player count {} outside {}..={}",
                game.player_count, rules.min_players, rules.max_players
            ),
            game.id,
        ));
    }

    let max_turns = (game.player_count * rules.hand_size()) as usize;
    if game.turns.len() > max_turns {
        return Err(RepositoryError::validation(
            format!("{} turns recorded, at most {} possible", game.turns.len(), max_turns),
            game.id,
        ));
    }

    if let Some(end) = game.end_datetime {
        if end < game.start_datetime {
            return Err(RepositoryError::validation(
                "game ends before it starts",
                game.id,
            ));
        }
    }

    for (i, turn) in game.turns.iter().enumerate() {
        match turn.chug_duration_seconds {
            Some(_) if !turn.chugged => {
                return Err(RepositoryError::validation(
                    format!("turn {} has a chug duration but no chug", i),
                    game.id,
                ));
            }
            Some(d) if !(d.is_finite() && d > 0.0) => {
                return Err(RepositoryError::validation(
                    format!("turn {} has non-positive chug duration {}", i, d),
                    game.id,
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

#[async_trait]
impl GameRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_game(&self, game: &GameRecord) -> RepositoryResult<GameId> {
        self.check_health()?;
        self.store_game_impl(game)
    }

    async fn get_game(&self, game_id: GameId) -> RepositoryResult<GameRecord> {
        self.check_health()?;
        self.data
            .read()
            .games
            .iter()
            .find(|g| g.id == Some(game_id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Game {} not found", game_id)))
    }

    async fn fetch_games(
        &self,
        season: SeasonSelector,
        player_count: PlayerCountSelector,
    ) -> RepositoryResult<Vec<GameRecord>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .games
            .iter()
            .filter(|g| season.matches(g.season_tag()) && player_count.matches(g.player_count))
            .cloned()
            .collect())
    }

    async fn game_count(&self) -> RepositoryResult<usize> {
        self.check_health()?;
        Ok(self.data.read().games.len())
    }
}
