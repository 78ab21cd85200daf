use crate::error::LeagueError;
use crate::http;
use actix_web::web;

/// Mount every HTTP sub-module under `/api`.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .configure(http::players::init_routes)
            .configure(http::matches::init_routes)
            .configure(http::presign::init_routes)
            .configure(http::health::init_routes),
    );
}

/// Undecodable bodies are reported like any other validation failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| LeagueError::validation(err.to_string()).into())
}
