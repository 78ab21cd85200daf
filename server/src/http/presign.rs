use actix_web::{post, web, HttpResponse};
use serde_json::json;

use crate::error::LeagueError;
use crate::storage::ObjectStorage;

/// POST /api/presign/{filename}
#[post("/presign/{filename}")]
pub async fn presign(
    path: web::Path<String>,
    storage: web::Data<dyn ObjectStorage>,
) -> Result<HttpResponse, LeagueError> {
    let url = storage.presign_upload(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(presign);
}
