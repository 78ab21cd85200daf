use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use cue_league_server::{
    config::Settings,
    db::{MemoryStore, PgStore, Store},
    http,
    league::League,
    metrics,
    storage::{MemoryObjectStorage, ObjectStorage, S3Storage},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env();

    // Relational store
    let store: Arc<dyn Store> = match &settings.database_url {
        Some(url) => {
            let store = PgStore::connect(url, settings.db_max_connections)
                .await
                .context("connecting to Postgres")?;
            store.migrate().await.context("running migrations")?;
            Arc::new(store)
        }
        None => {
            log::warn!("DATABASE_URL not set, keeping league data in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // Picture bucket
    let storage: Arc<dyn ObjectStorage> = match &settings.storage {
        Some(s3) => {
            let storage = S3Storage::new(s3).context("configuring object storage")?;
            storage
                .check_bucket()
                .await
                .context("reaching picture bucket")?;
            Arc::new(storage)
        }
        None => {
            log::warn!("AWS_BUCKET_NAME not set, presigned URLs will not be reachable");
            Arc::new(MemoryObjectStorage::new("pictures"))
        }
    };

    let league = web::Data::new(League::new(store, settings.tx_timeout));
    let storage: web::Data<dyn ObjectStorage> = web::Data::from(storage);

    log::info!("listening on {}", settings.server_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(league.clone())
            .app_data(storage.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&settings.server_addr)?
    .run()
    .await?;

    Ok(())
}
