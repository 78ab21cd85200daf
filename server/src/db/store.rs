//! Storage ports consumed by the league engine.
//!
//! A [`Store`] hands out plain single-statement reads and opens
//! [`StoreTx`] transactions. Every multi-step decision of the engine
//! (booking, ranking, scoring) runs inside one transaction; dropping a
//! transaction without committing rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{Booking, Match, MatchId, NewPlayer, Player, PlayerId};
use crate::error::LeagueError;

pub type StoreResult<T> = Result<T, LeagueError>;

/// Predicate over the `matches` table. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub table_number: Option<i32>,
    /// Match rows where either seat is one of these players.
    pub involving: Vec<PlayerId>,
    /// Match rows whose window intersects `[start, end)`.
    pub overlapping: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub excluding: Option<MatchId>,
}

impl MatchQuery {
    pub fn on_table(table_number: i32) -> Self {
        MatchQuery {
            table_number: Some(table_number),
            ..Default::default()
        }
    }

    pub fn involving(players: impl IntoIterator<Item = PlayerId>) -> Self {
        MatchQuery {
            involving: players.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn overlapping(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.overlapping = Some((start, end));
        self
    }

    pub fn excluding(mut self, id: Option<MatchId>) -> Self {
        self.excluding = id;
        self
    }

    /// In-process evaluation; stores backed by SQL translate the same rules.
    pub fn matches(&self, m: &Match) -> bool {
        self.table_number.map_or(true, |t| m.table_number == t)
            && (self.involving.is_empty() || self.involving.iter().any(|p| m.involves(*p)))
            && self.overlapping.map_or(true, |(s, e)| m.overlaps(s, e))
            && self.excluding != Some(m.id)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction isolated from every other open transaction.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    async fn player(&self, id: PlayerId) -> StoreResult<Option<Player>>;

    /// All players, or those whose name contains `name` (case-insensitive).
    async fn players(&self, name: Option<&str>) -> StoreResult<Vec<Player>>;

    async fn match_by_id(&self, id: MatchId) -> StoreResult<Option<Match>>;

    async fn matches_where(&self, query: &MatchQuery) -> StoreResult<Vec<Match>>;

    /// Returns `false` when no row had that id.
    async fn delete_match(&self, id: MatchId) -> StoreResult<bool>;
}

#[async_trait]
pub trait StoreTx: Send {
    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>>;

    /// Id of the player currently holding a non-zero `ranking`.
    async fn ranking_holder(&mut self, ranking: i32) -> StoreResult<Option<PlayerId>>;

    async fn insert_player(&mut self, player: &NewPlayer) -> StoreResult<PlayerId>;

    /// Writes name, ranking, preferred cue and picture url. Never points.
    async fn update_player(&mut self, player: &Player) -> StoreResult<()>;

    async fn set_points(&mut self, id: PlayerId, points: i32) -> StoreResult<()>;

    async fn delete_player(&mut self, id: PlayerId) -> StoreResult<bool>;

    /// Reads and locks the match row for the rest of the transaction.
    async fn match_by_id(&mut self, id: MatchId) -> StoreResult<Option<Match>>;

    async fn matches_where(&mut self, query: &MatchQuery) -> StoreResult<Vec<Match>>;

    async fn insert_match(&mut self, booking: &Booking) -> StoreResult<MatchId>;

    /// Writes schedule, table and winner of an existing match.
    async fn update_match(&mut self, m: &Match) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
