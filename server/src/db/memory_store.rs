//! In-process [`Store`] used by the test-suite and for local runs without
//! `DATABASE_URL`.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! private copy of the tables, which is written back on commit. That makes
//! every transaction serializable; dropping one discards its copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::models::{Booking, Match, MatchId, NewPlayer, Player, PlayerId};
use crate::db::store::{MatchQuery, Store, StoreResult, StoreTx};
use crate::error::LeagueError;

#[derive(Debug, Clone, Default)]
struct Tables {
    players: BTreeMap<PlayerId, Player>,
    matches: BTreeMap<MatchId, Match>,
    last_player_id: PlayerId,
    last_match_id: MatchId,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_matches(player: &Player, needle: &str) -> bool {
    player.name.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.tables.lock().await.players.get(&id).cloned())
    }

    async fn players(&self, name: Option<&str>) -> StoreResult<Vec<Player>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .players
            .values()
            .filter(|p| name.map_or(true, |n| name_matches(p, n)))
            .cloned()
            .collect())
    }

    async fn match_by_id(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.tables.lock().await.matches.get(&id).cloned())
    }

    async fn matches_where(&self, query: &MatchQuery) -> StoreResult<Vec<Match>> {
        Ok(select_matches(&*self.tables.lock().await, query))
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        Ok(self.tables.lock().await.matches.remove(&id).is_some())
    }
}

fn select_matches(tables: &Tables, query: &MatchQuery) -> Vec<Match> {
    let mut rows: Vec<Match> = tables
        .matches
        .values()
        .filter(|m| query.matches(m))
        .cloned()
        .collect();
    rows.sort_by_key(|m| (m.start_time, m.id));
    rows
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.work.players.get(&id).cloned())
    }

    async fn ranking_holder(&mut self, ranking: i32) -> StoreResult<Option<PlayerId>> {
        if ranking == 0 {
            return Ok(None);
        }
        Ok(self
            .work
            .players
            .values()
            .find(|p| p.ranking == ranking)
            .map(|p| p.id))
    }

    async fn insert_player(&mut self, player: &NewPlayer) -> StoreResult<PlayerId> {
        self.work.last_player_id += 1;
        let id = self.work.last_player_id;
        self.work.players.insert(
            id,
            Player {
                id,
                name: player.name.clone(),
                ranking: player.ranking,
                preferred_cue: player.preferred_cue.clone(),
                profile_picture_url: String::new(),
                points: 0,
            },
        );
        Ok(id)
    }

    async fn update_player(&mut self, player: &Player) -> StoreResult<()> {
        if let Some(row) = self.work.players.get_mut(&player.id) {
            row.name = player.name.clone();
            row.ranking = player.ranking;
            row.preferred_cue = player.preferred_cue.clone();
            row.profile_picture_url = player.profile_picture_url.clone();
        }
        Ok(())
    }

    async fn set_points(&mut self, id: PlayerId, points: i32) -> StoreResult<()> {
        if let Some(row) = self.work.players.get_mut(&id) {
            row.points = points;
        }
        Ok(())
    }

    async fn delete_player(&mut self, id: PlayerId) -> StoreResult<bool> {
        // Mirrors the ON DELETE RESTRICT foreign keys of the SQL schema.
        if self.work.matches.values().any(|m| m.involves(id)) {
            return Err(LeagueError::conflict(
                "player is referenced by existing matches",
            ));
        }
        Ok(self.work.players.remove(&id).is_some())
    }

    async fn match_by_id(&mut self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.work.matches.get(&id).cloned())
    }

    async fn matches_where(&mut self, query: &MatchQuery) -> StoreResult<Vec<Match>> {
        Ok(select_matches(&self.work, query))
    }

    async fn insert_match(&mut self, booking: &Booking) -> StoreResult<MatchId> {
        self.work.last_match_id += 1;
        let id = self.work.last_match_id;
        self.work.matches.insert(
            id,
            Match {
                id,
                player1_id: booking.player1_id,
                player2_id: booking.player2_id,
                start_time: booking.start_time,
                end_time: booking.end_time,
                winner_id: 0,
                table_number: booking.table_number,
            },
        );
        Ok(id)
    }

    async fn update_match(&mut self, m: &Match) -> StoreResult<()> {
        if let Some(row) = self.work.matches.get_mut(&m.id) {
            row.start_time = m.start_time;
            row.end_time = m.end_time;
            row.table_number = m.table_number;
            row.winner_id = m.winner_id;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
