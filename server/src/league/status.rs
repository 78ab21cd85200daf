//! Time-relative match status, derived on read and never stored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::Match;
use crate::error::LeagueError;
use crate::league::League;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Ongoing,
    Finished,
}

/// Both window bounds count as ongoing.
pub fn classify(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> MatchStatus {
    if start > now {
        MatchStatus::Upcoming
    } else if now <= end {
        MatchStatus::Ongoing
    } else {
        MatchStatus::Finished
    }
}

impl Match {
    pub fn status(&self, now: DateTime<Utc>) -> MatchStatus {
        classify(self.start_time, self.end_time, now)
    }
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(MatchStatus::Upcoming),
            "ongoing" => Ok(MatchStatus::Ongoing),
            "finished" => Ok(MatchStatus::Finished),
            other => Err(LeagueError::validation(format!("invalid status {other:?}"))),
        }
    }
}

impl League {
    pub async fn matches(&self, status: Option<MatchStatus>) -> Result<Vec<Match>, LeagueError> {
        self.matches_at(status, Utc::now()).await
    }

    /// Listing as seen at `now`.
    pub async fn matches_at(
        &self,
        status: Option<MatchStatus>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Match>, LeagueError> {
        let mut rows = self.store.matches_where(&Default::default()).await?;
        if let Some(status) = status {
            rows.retain(|m| m.status(now) == status);
        }
        Ok(rows)
    }
}
