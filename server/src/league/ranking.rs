//! Player lifecycle and the ranking guard: at most one player holds any
//! non-zero ranking. The check and the write share one transaction.

use crate::db::models::{NewPlayer, Player, PlayerId, PlayerUpdate};
use crate::db::store::StoreTx;
use crate::error::LeagueError;
use crate::league::{finish, League};

pub const RANKING_TAKEN: &str = "ranking already taken";

/// Fails with `Conflict` when `ranking` is held by anyone but `owner`.
pub async fn guard_ranking(
    tx: &mut dyn StoreTx,
    ranking: i32,
    owner: Option<PlayerId>,
) -> Result<(), LeagueError> {
    if ranking == 0 {
        return Ok(());
    }
    match tx.ranking_holder(ranking).await? {
        Some(holder) if Some(holder) != owner => {
            log::debug!("ranking {ranking} held by player {holder}");
            Err(LeagueError::conflict(RANKING_TAKEN))
        }
        _ => Ok(()),
    }
}

async fn load_player(tx: &mut dyn StoreTx, id: PlayerId) -> Result<Player, LeagueError> {
    tx.player(id)
        .await?
        .ok_or_else(|| LeagueError::not_found(format!("player {id} not found")))
}

impl League {
    pub async fn create_player(&self, candidate: NewPlayer) -> Result<PlayerId, LeagueError> {
        candidate.validate()?;

        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                guard_ranking(&mut *tx, candidate.ranking, None).await?;
                tx.insert_player(&candidate).await
            }
            .await;
            finish(tx, outcome).await
        })
        .await
        .map(|id| {
            log::info!("player {id} ({}) created", candidate.name);
            id
        })
        .map_err(|e| {
            log::warn!("player creation rejected: {e}");
            e
        })
    }

    /// Apply a partial update; a changed ranking goes through the guard again.
    pub async fn update_player(
        &self,
        id: PlayerId,
        changes: PlayerUpdate,
    ) -> Result<Player, LeagueError> {
        changes.validate()?;

        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                let mut player = load_player(&mut *tx, id).await?;
                if let Some(ranking) = changes.ranking {
                    if ranking != player.ranking {
                        guard_ranking(&mut *tx, ranking, Some(id)).await?;
                    }
                    player.ranking = ranking;
                }
                if let Some(name) = changes.name {
                    player.name = name;
                }
                if let Some(cue) = changes.preferred_cue {
                    player.preferred_cue = cue;
                }
                tx.update_player(&player).await?;
                Ok::<_, LeagueError>(player)
            }
            .await;
            finish(tx, outcome).await
        })
        .await
    }

    pub async fn set_profile_picture(&self, id: PlayerId, url: String) -> Result<(), LeagueError> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                let mut player = load_player(&mut *tx, id).await?;
                player.profile_picture_url = url;
                tx.update_player(&player).await
            }
            .await;
            finish(tx, outcome).await
        })
        .await
    }

    /// Remove a player that no match refers to. Returns the deleted row.
    pub async fn delete_player(&self, id: PlayerId) -> Result<Player, LeagueError> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;
            let outcome = async {
                let player = load_player(&mut *tx, id).await?;
                tx.delete_player(id).await?;
                Ok::<_, LeagueError>(player)
            }
            .await;
            finish(tx, outcome).await
        })
        .await
        .map(|player| {
            log::info!("player {id} deleted");
            player
        })
    }

    pub async fn player(&self, id: PlayerId) -> Result<Player, LeagueError> {
        self.store
            .player(id)
            .await?
            .ok_or_else(|| LeagueError::not_found(format!("player {id} not found")))
    }

    pub async fn players(&self, name: Option<&str>) -> Result<Vec<Player>, LeagueError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.store.players(name).await
    }
}
