use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::LeagueError;

pub type PlayerId = i64;
pub type MatchId = i64;

/// Length of a match, in seconds, when the caller leaves `endTime` unset.
pub const DEFAULT_MATCH_SECS: i64 = 60 * 60;

/// `0001-01-01T00:00:00Z`, which some clients send for "no value".
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

pub fn is_zero_instant(t: &DateTime<Utc>) -> bool {
    t.timestamp() == ZERO_INSTANT_SECS && t.timestamp_subsec_nanos() == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// `0` means unranked; any other value is unique across players.
    pub ranking: i32,
    pub preferred_cue: String,
    pub profile_picture_url: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `0` until a result is recorded.
    pub winner_id: PlayerId,
    pub table_number: i32,
}

impl Match {
    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1_id == player || self.player2_id == player
    }

    /// The other participant, if `player` plays in this match.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if player == self.player1_id {
            Some(self.player2_id)
        } else if player == self.player2_id {
            Some(self.player1_id)
        } else {
            None
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        (self.winner_id != 0).then_some(self.winner_id)
    }

    /// Half-open interval intersection with `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && self.start_time < end
    }
}

//////////////////////////////////////////////////
// Write models
//////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    #[serde(default)]
    pub ranking: i32,
    #[serde(default)]
    pub preferred_cue: String,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, ranking: i32) -> Self {
        NewPlayer {
            name: name.into(),
            ranking,
            preferred_cue: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), LeagueError> {
        validate_name(&self.name)?;
        validate_ranking(self.ranking)
    }
}

/// Partial update of a player; `points` is not client-writable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub ranking: Option<i32>,
    pub preferred_cue: Option<String>,
}

impl PlayerUpdate {
    pub fn validate(&self) -> Result<(), LeagueError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(ranking) = self.ranking {
            validate_ranking(ranking)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), LeagueError> {
    if name.trim().is_empty() {
        return Err(LeagueError::validation("name must not be empty"));
    }
    Ok(())
}

fn validate_ranking(ranking: i32) -> Result<(), LeagueError> {
    if ranking < 0 {
        return Err(LeagueError::validation("ranking must not be negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub table_number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub table_number: Option<i32>,
    pub winner_id: Option<PlayerId>,
}

impl MatchUpdate {
    pub fn result(winner_id: PlayerId) -> Self {
        MatchUpdate {
            winner_id: Some(winner_id),
            ..Default::default()
        }
    }

    pub fn reschedules(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || self.table_number.is_some()
    }
}

/// A fully resolved reservation: both players, a closed time window and a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub table_number: i32,
}

impl Booking {
    /// Fill in the default end time and check the window is non-empty.
    pub fn resolve(
        player1_id: PlayerId,
        player2_id: PlayerId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        table_number: i32,
    ) -> Result<Self, LeagueError> {
        let end_time = end_time
            .filter(|end| !is_zero_instant(end))
            .unwrap_or(start_time + Duration::seconds(DEFAULT_MATCH_SECS));
        if end_time <= start_time {
            return Err(LeagueError::validation("endTime must be after startTime"));
        }
        Ok(Booking {
            player1_id,
            player2_id,
            start_time,
            end_time,
            table_number,
        })
    }

    pub fn of(m: &Match) -> Self {
        Booking {
            player1_id: m.player1_id,
            player2_id: m.player2_id,
            start_time: m.start_time,
            end_time: m.end_time,
            table_number: m.table_number,
        }
    }
}
