//! Match endpoints: booking, listing by status, rescheduling and results.

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::models::{Match, MatchId, MatchUpdate, NewMatch, PlayerId};
use crate::error::LeagueError;
use crate::league::{Award, League, MatchStatus};

#[derive(Deserialize)]
pub struct MatchesQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReq {
    pub winner_id: PlayerId,
}

#[derive(Serialize)]
pub struct UpdatedMatch {
    #[serde(rename = "match")]
    pub updated: Match,
    pub award: Option<Award>,
}

/// POST /api/matches
#[post("/matches")]
pub async fn create(
    info: web::Json<NewMatch>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let id = league.create_match(info.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "message": "Match created successfully" })))
}

/// GET /api/matches?status=upcoming|ongoing|finished
#[get("/matches")]
pub async fn list(
    web::Query(params): web::Query<MatchesQuery>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s.parse::<MatchStatus>()?),
    };
    let matches = league.matches(status).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// GET /api/matches/{id}
#[get("/matches/{id}")]
pub async fn get_one(
    path: web::Path<MatchId>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let m = league.match_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// PUT /api/matches/{id}
#[put("/matches/{id}")]
pub async fn update(
    path: web::Path<MatchId>,
    info: web::Json<MatchUpdate>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let (updated, award) = league
        .update_match(path.into_inner(), info.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(UpdatedMatch { updated, award }))
}

/// POST /api/matches/{id}/result
#[post("/matches/{id}/result")]
pub async fn result(
    path: web::Path<MatchId>,
    info: web::Json<ResultReq>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    let award = league.record_result(path.into_inner(), info.winner_id).await?;
    Ok(HttpResponse::Ok().json(award))
}

/// DELETE /api/matches/{id}
#[delete("/matches/{id}")]
pub async fn remove(
    path: web::Path<MatchId>,
    league: web::Data<League>,
) -> Result<HttpResponse, LeagueError> {
    league.delete_match(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Match deleted successfully" })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(list)
        .service(get_one)
        .service(update)
        .service(result)
        .service(remove);
}
