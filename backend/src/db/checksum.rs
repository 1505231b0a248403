//! Checksum calculation for report snapshots.

use sha2::{Digest, Sha256};

use crate::models::{GameRecord, PlayerCountSelector, SeasonSelector};

/// Calculate SHA-256 checksum of arbitrary content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum identifying one filtered snapshot.
///
/// Covers the selection and the ordered ids of the games in it, so two
/// reports carry the same checksum only if they were built from the same
/// records in the same order. Unstored games (no id) hash by start time.
pub fn snapshot_checksum(
    games: &[GameRecord],
    season: SeasonSelector,
    player_count: PlayerCountSelector,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(season.label().as_bytes());
    hasher.update(b"|");
    hasher.update(player_count.label().as_bytes());
    for game in games {
        hasher.update(b"|");
        match game.id {
            Some(id) => hasher.update(id.to_string().as_bytes()),
            None => hasher.update(game.start_datetime.to_rfc3339().as_bytes()),
        }
    }
    hex::encode(hasher.finalize())
}
