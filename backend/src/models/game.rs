use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::season::Season;

/// Repository-assigned game identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One card draw: a single player's turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Sips assigned by the card drawn this turn
    pub sips: u32,
    /// Whether the turn ended in a chug
    #[serde(default)]
    pub chugged: bool,
    /// Measured chug duration; only present on chug turns, strictly positive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chug_duration_seconds: Option<f64>,
    /// When the card was drawn, if the game was recorded live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_at: Option<DateTime<Utc>>,
}

impl TurnRecord {
    /// A turn without a chug.
    pub fn sips(sips: u32) -> Self {
        Self {
            sips,
            chugged: false,
            chug_duration_seconds: None,
            drawn_at: None,
        }
    }

    /// A turn that ended in a chug taking `duration_seconds`.
    pub fn chug(sips: u32, duration_seconds: f64) -> Self {
        Self {
            sips,
            chugged: true,
            chug_duration_seconds: Some(duration_seconds),
            drawn_at: None,
        }
    }
}

/// Where a game was played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: String,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }
}

/// Per-seat totals for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTotals {
    pub sips: u32,
    pub chugs: u32,
    pub turns: u32,
}

/// One completed or abandoned play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Assigned by the repository on store
    #[serde(default)]
    pub id: Option<GameId>,
    /// Explicit season tag; derived from the game's timestamps when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    pub player_count: u32,
    pub start_datetime: DateTime<Utc>,
    /// Missing when the game did not finish (DNF)
    #[serde(default)]
    pub end_datetime: Option<DateTime<Utc>>,
    /// Turns in play order; turn `i` belongs to seat `i % player_count`
    #[serde(default)]
    pub turns: Vec<TurnRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl GameRecord {
    pub fn new(player_count: u32, start_datetime: DateTime<Utc>) -> Self {
        Self {
            id: None,
            season: None,
            player_count,
            start_datetime,
            end_datetime: None,
            turns: Vec::new(),
            location: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_datetime.is_some()
    }

    pub fn is_dnf(&self) -> bool {
        !self.is_finished()
    }

    /// Finished with every card dealt, so each seat holds `hand_size` cards.
    pub fn has_full_hands(&self, hand_size: u32) -> bool {
        self.is_finished() && self.turns.len() == (self.player_count * hand_size) as usize
    }

    /// Wall-clock duration in seconds; `None` for DNF games.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.end_datetime
            .map(|end| (end - self.start_datetime).num_milliseconds() as f64 / 1000.0)
    }

    /// End time, else the last recorded card draw, else the start time.
    pub fn last_activity(&self) -> DateTime<Utc> {
        if let Some(end) = self.end_datetime {
            return end;
        }
        self.turns
            .iter()
            .rev()
            .find_map(|t| t.drawn_at)
            .unwrap_or(self.start_datetime)
    }

    /// The explicit season tag, or the season of the last activity.
    pub fn season_tag(&self) -> Season {
        self.season
            .unwrap_or_else(|| Season::containing(self.last_activity()))
    }

    pub fn seat_of_turn(&self, turn_index: usize) -> usize {
        turn_index % self.player_count.max(1) as usize
    }

    /// Sips, chugs and turn counts per seat.
    pub fn seat_totals(&self) -> Vec<SeatTotals> {
        let mut totals = vec![SeatTotals::default(); self.player_count.max(1) as usize];
        for (i, turn) in self.turns.iter().enumerate() {
            let seat = &mut totals[self.seat_of_turn(i)];
            seat.sips += turn.sips;
            seat.turns += 1;
            if turn.chugged {
                seat.chugs += 1;
            }
        }
        totals
    }

    pub fn total_sips(&self) -> u64 {
        self.turns.iter().map(|t| t.sips as u64).sum()
    }

    pub fn with_id(mut self, id: GameId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end_datetime = Some(end);
        self
    }

    pub fn with_turns(mut self, turns: Vec<TurnRecord>) -> Self {
        self.turns = turns;
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 8, 11, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_and_dnf() {
        let game = GameRecord::new(2, start());
        assert!(game.is_dnf());
        assert_eq!(game.duration_seconds(), None);

        let finished = game.with_end(start() + chrono::Duration::seconds(1800));
        assert!(finished.is_finished());
        assert_eq!(finished.duration_seconds(), Some(1800.0));
    }

    #[test]
    fn test_full_hands_need_every_card_and_an_end() {
        let turns: Vec<TurnRecord> = (0..26).map(|i| TurnRecord::sips(2 + i % 13)).collect();
        let complete = GameRecord::new(2, start())
            .with_end(start() + chrono::Duration::minutes(30))
            .with_turns(turns.clone());
        assert!(complete.has_full_hands(13));

        let short = complete.clone().with_turns(turns[..3].to_vec());
        assert!(short.is_finished());
        assert!(!short.has_full_hands(13));

        let mut abandoned = complete;
        abandoned.end_datetime = None;
        assert!(!abandoned.has_full_hands(13));
    }

    #[test]
    fn test_seat_totals_round_robin() {
        let game = GameRecord::new(2, start()).with_turns(vec![
            TurnRecord::sips(2),
            TurnRecord::sips(5),
            TurnRecord::chug(14, 9.5),
            TurnRecord::sips(3),
            TurnRecord::sips(4),
        ]);
        let totals = game.seat_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], SeatTotals { sips: 20, chugs: 1, turns: 3 });
        assert_eq!(totals[1], SeatTotals { sips: 8, chugs: 0, turns: 2 });
        assert_eq!(game.total_sips(), 28);
    }

    #[test]
    fn test_season_tag_prefers_explicit() {
        let game = GameRecord::new(3, start()).with_season(Season(1));
        assert_eq!(game.season_tag(), Season(1));
    }

    #[test]
    fn test_season_tag_derived_from_last_activity() {
        let mut late_turn = TurnRecord::sips(4);
        late_turn.drawn_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap());
        let dnf = GameRecord::new(2, Utc.with_ymd_and_hms(2019, 12, 31, 23, 0, 0).unwrap())
            .with_turns(vec![TurnRecord::sips(2), late_turn]);
        assert_eq!(dnf.season_tag(), Season(15));

        let finished = GameRecord::new(2, start()).with_end(start());
        assert_eq!(finished.season_tag(), Season(14));
    }

    #[test]
    fn test_game_id_is_a_bare_number_on_the_wire() {
        let game = GameRecord::new(2, start()).with_id(GameId(17));
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["id"], 17);
        assert_eq!(GameId(17).to_string(), "17");
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{"player_count": 4, "start_datetime": "2019-08-11T20:00:00Z"}"#;
        let game: GameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(game.player_count, 4);
        assert!(game.turns.is_empty());
        assert!(game.location.is_none());
        assert!(game.id.is_none());
    }
}
