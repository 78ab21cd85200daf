//! Runtime configuration for the league server.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub server_addr: String,
    /// Postgres URL; `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Deadline for every engine transaction.
    pub tx_timeout: Duration,
    /// Picture bucket; `None` keeps pictures in memory.
    pub storage: Option<S3Settings>,
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint (MinIO, localstack, ...).
    pub endpoint: Option<String>,
    pub path_style: bool,
    /// Lifetime of presigned upload URLs.
    pub presign_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| non_empty(key).and_then(|v| v.trim().parse::<u64>().ok());

        let server_addr = non_empty("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into());
        let database_url = non_empty("DATABASE_URL");
        let db_max_connections = parsed("DB_MAX_CONNECTIONS")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(5);
        let tx_timeout = Duration::from_millis(parsed("TX_TIMEOUT_MS").unwrap_or(5_000));

        let storage = non_empty("AWS_BUCKET_NAME").map(|bucket| {
            let endpoint = non_empty("S3_ENDPOINT");
            let path_style = non_empty("S3_PATH_STYLE")
                .and_then(|v| v.trim().parse::<bool>().ok())
                .unwrap_or(endpoint.is_some());
            S3Settings {
                bucket,
                region: non_empty("AWS_REGION").unwrap_or_else(|| "us-east-1".into()),
                access_key_id: lookup("AWS_ACCESS_KEY_ID").unwrap_or_default(),
                secret_access_key: lookup("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
                endpoint,
                path_style,
                presign_ttl: Duration::from_secs(parsed("PRESIGN_TTL_SECS").unwrap_or(900)), // 15 min
            }
        });

        Settings {
            server_addr,
            database_url,
            db_max_connections,
            tx_timeout,
            storage,
        }
    }
}
