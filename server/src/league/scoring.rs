//! Points ledger. A win is worth 1 point, or 2 when the winner had fewer
//! points than the loser going into the match (an upset). Losers keep
//! their points.

use serde::Serialize;

use crate::db::models::{Match, MatchId, MatchUpdate, PlayerId};
use crate::db::store::StoreTx;
use crate::error::LeagueError;
use crate::league::League;

pub const WIN_POINTS: i32 = 1;
pub const UPSET_POINTS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub points: i32,
    pub upset: bool,
}

/// Points the winner earns given both players' totals before the match.
pub fn points_for_win(winner_points: i32, loser_points: i32) -> i32 {
    if loser_points > winner_points {
        UPSET_POINTS
    } else {
        WIN_POINTS
    }
}

/// Decide whether `winner` may be recorded on `current`.
///
/// `Ok(true)` means the result is new and must be scored; `Ok(false)` means
/// nothing changes (`winner == 0` on an open match). A match is scored once.
pub fn accept_result(current: &Match, winner: PlayerId) -> Result<bool, LeagueError> {
    if current.winner().is_some() {
        return Err(LeagueError::conflict("result already recorded"));
    }
    if winner == 0 {
        return Ok(false);
    }
    if !current.involves(winner) {
        return Err(LeagueError::validation(
            "winnerId must be player1Id or player2Id",
        ));
    }
    Ok(true)
}

/// Credit the winner of `m`. Runs after the match row carries the winner.
pub async fn award(tx: &mut dyn StoreTx, m: &Match) -> Result<Award, LeagueError> {
    let winner_id = m.winner_id;
    let loser_id = m.opponent_of(winner_id).ok_or_else(|| {
        LeagueError::Internal(format!("winner {winner_id} does not play in match {}", m.id))
    })?;

    let winner = tx
        .player(winner_id)
        .await?
        .ok_or_else(|| LeagueError::not_found(format!("player {winner_id} not found")))?;
    let loser = tx
        .player(loser_id)
        .await?
        .ok_or_else(|| LeagueError::not_found(format!("player {loser_id} not found")))?;

    let points = points_for_win(winner.points, loser.points);
    let total = winner
        .points
        .checked_add(points)
        .ok_or_else(|| LeagueError::Internal(format!("points overflow for player {winner_id}")))?;
    tx.set_points(winner_id, total).await?;

    Ok(Award {
        match_id: m.id,
        winner_id,
        loser_id,
        points,
        upset: points == UPSET_POINTS,
    })
}

impl League {
    /// Record the winner of a match and credit them.
    pub async fn record_result(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
    ) -> Result<Award, LeagueError> {
        if winner_id == 0 {
            return Err(LeagueError::validation("winnerId is required"));
        }
        let (_, award) = self
            .update_match(match_id, MatchUpdate::result(winner_id))
            .await?;
        let award = award.ok_or_else(|| {
            LeagueError::Internal(format!("match {match_id} was not scored"))
        })?;
        log::info!(
            "match {match_id}: player {} beat {} (+{}{})",
            award.winner_id,
            award.loser_id,
            award.points,
            if award.upset { ", upset" } else { "" }
        );
        Ok(award)
    }
}
