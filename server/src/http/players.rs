//! Player endpoints (create / list / get / update / delete).

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::db::models::{NewPlayer, PlayerId, PlayerUpdate};
use crate::error::LeagueError;
use crate::league::League;
use crate::storage::{picture_key, ObjectStorage};

#[derive(Deserialize)]
pub struct PlayersQuery {
    /// Case-insensitive substring of the player name.
    pub name: Option<String>,
}

/// POST /api/players
#[post("/players")]
pub async fn create(
    info: web::Json<NewPlayer>,
    league: web::Data<League>,
    storage: web::Data<dyn ObjectStorage>,
) -> Result<HttpResponse, LeagueError> {
    let candidate = info.into_inner();
    let name = candidate.name.clone();

    // 1) Row first, so the picture key can carry the id
    let id = league.create_player(candidate).await?;

    // 2) Upload URL + public location of the picture
    let key = picture_key(id, &name);
    let url = match attach_picture(&league, storage.get_ref(), id, &key).await {
        Ok(url) => url,
        Err(e) => {
            // Undo the row; its ranking is free again.
            log::warn!("picture setup for player {id} failed, removing it: {e}");
            if let Err(undo) = league.delete_player(id).await {
                log::error!("player {id} left without a picture: {undo}");
            }
            return Err(e);
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "id": id,
        "message": "Player created successfully, upload your profile picture to the following URL",
        "url": url,
    })))
}

/// Presign the upload and record where the picture will live.
async fn attach_picture(
    league: &League,
    storage: &dyn ObjectStorage,
    id: PlayerId,
    key: &str,
) -> Result<String, LeagueError> {
    let url = storage.presign_upload(key).await?;
    league.set_profile_picture(id, storage.public_url(key)).await?;
    Ok(url)
}

/// GET /api/players?name=
#[get("/players")]
pub async fn list(
    web::Query(params): web::Query<PlayersQuery>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let players = league.players(params.name.as_deref()).await?;
    Ok(HttpResponse::Ok().json(players))
}

/// GET /api/players/{id}
#[get("/players/{id}")]
pub async fn get_one(
    path: web::Path<PlayerId>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let player = league.player(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// PUT /api/players/{id}
#[put("/players/{id}")]
pub async fn update(
    path: web::Path<PlayerId>,
    info: web::Json<PlayerUpdate>,
    league: web::Data<League>,
    storage: web::Data<dyn ObjectStorage>,
) -> Result<HttpResponse, LeagueError> {
    let id = path.into_inner();
    let before = league.player(id).await?;
    let player = league.update_player(id, info.into_inner()).await?;

    let key = picture_key(id, &player.name);
    if player.name != before.name {
        // The key follows the name; drop the picture stored under the old one.
        let old_key = picture_key(id, &before.name);
        if let Err(e) = storage.delete(&old_key).await {
            log::warn!("could not delete picture {old_key}: {e}");
        }
        league.set_profile_picture(id, storage.public_url(&key)).await?;
    }
    let url = storage.presign_upload(&key).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Player updated successfully, you can update your profile picture using the following URL",
        "url": url,
    })))
}

/// DELETE /api/players/{id}
#[delete("/players/{id}")]
pub async fn remove(
    path: web::Path<PlayerId>,
    league: web::Data<League>,
    storage: web::Data<dyn ObjectStorage>,
) -> Result<HttpResponse, LeagueError> {
    let player = league.delete_player(path.into_inner()).await?;

    let key = picture_key(player.id, &player.name);
    if let Err(e) = storage.delete(&key).await {
        log::warn!("could not delete picture {key}: {e}");
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Player deleted successfully" })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(list)
        .service(get_one)
        .service(update)
        .service(remove);
}
