//! Double-booking validation.
//!
//! Two matches conflict when their windows intersect (half-open, so a match
//! ending at 11:00 and one starting at 11:00 do not) and they share a table
//! or a player. The conflict queries and the write run in one serializable
//! transaction.

use crate::db::models::{Booking, Match, MatchId, MatchUpdate, NewMatch, PlayerId};
use crate::db::store::{MatchQuery, StoreTx};
use crate::error::LeagueError;
use crate::league::{finish, scoring, Award, League};

/// Which resource a proposed booking collides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingConflict {
    Table,
    Players,
}

impl BookingConflict {
    pub fn message(self) -> &'static str {
        match self {
            BookingConflict::Table => "table already booked",
            BookingConflict::Players => "players already booked",
        }
    }
}

impl From<BookingConflict> for LeagueError {
    fn from(conflict: BookingConflict) -> Self {
        LeagueError::conflict(conflict.message())
    }
}

/// First conflict of `booking` against `existing`, table checked first.
pub fn find_conflict(
    booking: &Booking,
    existing: &[Match],
    excluding: Option<MatchId>,
) -> Option<BookingConflict> {
    let table = table_query(booking, excluding);
    let players = players_query(booking, excluding);
    if existing.iter().any(|m| table.matches(m)) {
        Some(BookingConflict::Table)
    } else if existing.iter().any(|m| players.matches(m)) {
        Some(BookingConflict::Players)
    } else {
        None
    }
}

fn table_query(booking: &Booking, excluding: Option<MatchId>) -> MatchQuery {
    MatchQuery::on_table(booking.table_number)
        .overlapping(booking.start_time, booking.end_time)
        .excluding(excluding)
}

fn players_query(booking: &Booking, excluding: Option<MatchId>) -> MatchQuery {
    MatchQuery::involving([booking.player1_id, booking.player2_id])
        .overlapping(booking.start_time, booking.end_time)
        .excluding(excluding)
}

/// Store-side version of [`find_conflict`]; reads only the candidate rows.
pub async fn ensure_free(
    tx: &mut dyn StoreTx,
    booking: &Booking,
    excluding: Option<MatchId>,
) -> Result<(), LeagueError> {
    if !tx.matches_where(&table_query(booking, excluding)).await?.is_empty() {
        return Err(BookingConflict::Table.into());
    }
    if !tx.matches_where(&players_query(booking, excluding)).await?.is_empty() {
        return Err(BookingConflict::Players.into());
    }
    Ok(())
}

async fn ensure_player_exists(
    tx: &mut dyn StoreTx,
    seat: u8,
    id: PlayerId,
) -> Result<(), LeagueError> {
    if tx.player(id).await?.is_none() {
        return Err(LeagueError::validation(format!("player{seat} does not exist")));
    }
    Ok(())
}

impl League {
    pub async fn create_match(&self, candidate: NewMatch) -> Result<MatchId, LeagueError> {
        if candidate.player1_id == candidate.player2_id {
            return Err(LeagueError::validation(
                "player1 and player2 must be different",
            ));
        }

        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                ensure_player_exists(&mut *tx, 1, candidate.player1_id).await?;
                ensure_player_exists(&mut *tx, 2, candidate.player2_id).await?;
                let booking = Booking::resolve(
                    candidate.player1_id,
                    candidate.player2_id,
                    candidate.start_time,
                    candidate.end_time,
                    candidate.table_number,
                )?;
                ensure_free(&mut *tx, &booking, None).await?;
                tx.insert_match(&booking).await
            }
            .await;
            finish(tx, outcome).await
        })
        .await
        .map(|id| {
            log::info!(
                "match {id} booked: players {} vs {} on table {}",
                candidate.player1_id,
                candidate.player2_id,
                candidate.table_number
            );
            id
        })
        .map_err(|e| {
            log::warn!("match booking rejected: {e}");
            e
        })
    }

    /// Reschedule and/or record the result of a match in one transaction.
    ///
    /// A new window or table is validated like a fresh booking, ignoring the
    /// match itself. A winner triggers the scoring ledger after the row is
    /// written; the award is returned when that happens.
    pub async fn update_match(
        &self,
        id: MatchId,
        changes: MatchUpdate,
    ) -> Result<(Match, Option<Award>), LeagueError> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                let current = tx
                    .match_by_id(id)
                    .await?
                    .ok_or_else(|| LeagueError::not_found(format!("match {id} not found")))?;
                let mut updated = current.clone();

                if changes.reschedules() {
                    let start_time = changes.start_time.unwrap_or(current.start_time);
                    let end_time = match (changes.start_time, changes.end_time) {
                        (_, Some(end)) => Some(end),
                        (Some(_), None) => None,
                        (None, None) => Some(current.end_time),
                    };
                    let booking = Booking::resolve(
                        current.player1_id,
                        current.player2_id,
                        start_time,
                        end_time,
                        changes.table_number.unwrap_or(current.table_number),
                    )?;
                    ensure_free(&mut *tx, &booking, Some(id)).await?;
                    updated.start_time = booking.start_time;
                    updated.end_time = booking.end_time;
                    updated.table_number = booking.table_number;
                }

                if let Some(winner) = changes.winner_id {
                    if scoring::accept_result(&current, winner)? {
                        updated.winner_id = winner;
                    }
                }

                tx.update_match(&updated).await?;
                let award = if updated.winner_id != current.winner_id {
                    Some(scoring::award(&mut *tx, &updated).await?)
                } else {
                    None
                };
                Ok::<_, LeagueError>((updated, award))
            }
            .await;
            finish(tx, outcome).await
        })
        .await
    }

    pub async fn match_by_id(&self, id: MatchId) -> Result<Match, LeagueError> {
        self.store
            .match_by_id(id)
            .await?
            .ok_or_else(|| LeagueError::not_found(format!("match {id} not found")))
    }

    pub async fn delete_match(&self, id: MatchId) -> Result<(), LeagueError> {
        if !self.store.delete_match(id).await? {
            return Err(LeagueError::not_found(format!("match {id} not found")));
        }
        log::info!("match {id} deleted");
        Ok(())
    }
}
