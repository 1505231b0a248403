//! Repository trait for game record storage.
//!
//! The engine never reads storage directly: it asks a repository for the
//! records matching a selection and works on the returned copies.

use async_trait::async_trait;

pub mod error;

pub use error::{RepositoryError, RepositoryResult};

use crate::models::{GameId, GameRecord, PlayerCountSelector, SeasonSelector};

/// Storage collaborator supplying game records.
///
/// Records are complete and immutable at query time, and turns inside a
/// game are delivered in play order.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Check whether the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a game record and return its assigned id.
    ///
    /// # Returns
    /// * `Ok(GameId)` - The id assigned to the record
    /// * `Err(RepositoryError::ValidationError)` - If the record breaks the game rules
    async fn store_game(&self, game: &GameRecord) -> RepositoryResult<GameId>;

    /// Fetch a single game.
    async fn get_game(&self, game_id: GameId) -> RepositoryResult<GameRecord>;

    /// Fetch every game matching both selectors, in storage order.
    async fn fetch_games(
        &self,
        season: SeasonSelector,
        player_count: PlayerCountSelector,
    ) -> RepositoryResult<Vec<GameRecord>>;

    /// Number of stored games.
    async fn game_count(&self) -> RepositoryResult<usize>;
}
