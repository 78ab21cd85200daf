//! Postgres-backed [`Store`]. Every transaction runs `SERIALIZABLE`, so two
//! concurrent bookings of the same table or player cannot both commit.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::{PgPool, QueryBuilder, Transaction};

use crate::db::models::{Booking, Match, MatchId, NewPlayer, Player, PlayerId};
use crate::db::store::{MatchQuery, Store, StoreResult, StoreTx};

const PLAYER_COLUMNS: &str = "id, name, ranking, preferred_cue, profile_picture_url, points";
const MATCH_COLUMNS: &str =
    "id, player1_id, player2_id, start_time, end_time, winner_id, table_number";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(PgStore { pool })
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `SELECT <columns> FROM matches WHERE ...` with every value bound.
fn select_matches(query: &MatchQuery, lock: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {MATCH_COLUMNS} FROM matches WHERE TRUE"));
    if let Some(table) = query.table_number {
        qb.push(" AND table_number = ").push_bind(table);
    }
    if !query.involving.is_empty() {
        qb.push(" AND (player1_id = ANY(")
            .push_bind(query.involving.clone())
            .push(") OR player2_id = ANY(")
            .push_bind(query.involving.clone())
            .push("))");
    }
    if let Some((start, end)) = query.overlapping {
        qb.push(" AND start_time < ")
            .push_bind(end)
            .push(" AND ")
            .push_bind(start)
            .push(" < end_time");
    }
    if let Some(id) = query.excluding {
        qb.push(" AND id <> ").push_bind(id);
    }
    qb.push(" ORDER BY start_time, id");
    if lock {
        qb.push(" FOR UPDATE");
    }
    qb
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    async fn players(&self, name: Option<&str>) -> StoreResult<Vec<Player>> {
        let players = match name {
            Some(name) => {
                sqlx::query_as::<_, Player>(&format!(
                    "SELECT {PLAYER_COLUMNS} FROM players
                      WHERE strpos(lower(name), lower($1)) > 0
                      ORDER BY id"
                ))
                .bind(name)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Player>(&format!(
                    "SELECT {PLAYER_COLUMNS} FROM players ORDER BY id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(players)
    }

    async fn match_by_id(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let m = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(m)
    }

    async fn matches_where(&self, query: &MatchQuery) -> StoreResult<Vec<Match>> {
        let rows = select_matches(query, false)
            .build_query_as::<Match>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>> {
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(player)
    }

    async fn ranking_holder(&mut self, ranking: i32) -> StoreResult<Option<PlayerId>> {
        let holder = sqlx::query_scalar::<_, PlayerId>(
            "SELECT id FROM players WHERE ranking = $1 AND ranking <> 0 LIMIT 1",
        )
        .bind(ranking)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(holder)
    }

    async fn insert_player(&mut self, player: &NewPlayer) -> StoreResult<PlayerId> {
        let id = sqlx::query_scalar::<_, PlayerId>(
            r#"
            INSERT INTO players (name, ranking, preferred_cue)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&player.name)
        .bind(player.ranking)
        .bind(&player.preferred_cue)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_player(&mut self, player: &Player) -> StoreResult<()> {
        sqlx::query(
            "UPDATE players
                SET name = $2,
                    ranking = $3,
                    preferred_cue = $4,
                    profile_picture_url = $5
              WHERE id = $1",
        )
        .bind(player.id)
        .bind(&player.name)
        .bind(player.ranking)
        .bind(&player.preferred_cue)
        .bind(&player.profile_picture_url)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_points(&mut self, id: PlayerId, points: i32) -> StoreResult<()> {
        sqlx::query("UPDATE players SET points = $2 WHERE id = $1")
            .bind(id)
            .bind(points)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_player(&mut self, id: PlayerId) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }

    async fn match_by_id(&mut self, id: MatchId) -> StoreResult<Option<Match>> {
        let m = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(m)
    }

    async fn matches_where(&mut self, query: &MatchQuery) -> StoreResult<Vec<Match>> {
        let rows = select_matches(query, true)
            .build_query_as::<Match>()
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn insert_match(&mut self, booking: &Booking) -> StoreResult<MatchId> {
        let id = sqlx::query_scalar::<_, MatchId>(
            r#"
            INSERT INTO matches (player1_id, player2_id, start_time, end_time, table_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(booking.player1_id)
        .bind(booking.player2_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.table_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_match(&mut self, m: &Match) -> StoreResult<()> {
        sqlx::query(
            "UPDATE matches
                SET start_time = $2,
                    end_time = $3,
                    table_number = $4,
                    winner_id = $5
              WHERE id = $1",
        )
        .bind(m.id)
        .bind(m.start_time)
        .bind(m.end_time)
        .bind(m.table_number)
        .bind(m.winner_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
