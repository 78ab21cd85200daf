//! Object storage for profile pictures. Never called from inside a store
//! transaction.

pub mod s3;

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::PlayerId;
use crate::error::LeagueError;

pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage request failed: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("invalid object storage endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl From<StorageError> for LeagueError {
    fn from(err: StorageError) -> Self {
        LeagueError::Internal(err.to_string())
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Where the object will be readable once uploaded.
    fn public_url(&self, key: &str) -> String;

    /// Time-limited URL the client can `PUT` the object to.
    async fn presign_upload(&self, key: &str) -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Fails when the bucket cannot be listed with the configured credentials.
    async fn check_bucket(&self) -> Result<(), StorageError>;
}

/// Object key of a player's picture: `<id>_<name>`.
pub fn picture_key(id: PlayerId, name: &str) -> String {
    format!("{id}_{}", name.replace('/', "_"))
}

/// Keeps every call in memory; used by tests and local runs without a bucket.
pub struct MemoryObjectStorage {
    bucket: String,
    ttl: Duration,
    presigned: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryObjectStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        MemoryObjectStorage {
            bucket: bucket.into(),
            ttl: Duration::from_secs(900),
            presigned: Mutex::default(),
            deleted: Mutex::default(),
        }
    }

    pub fn presigned_keys(&self) -> Vec<String> {
        self.presigned.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{key}", self.bucket)
    }

    async fn presign_upload(&self, key: &str) -> Result<String, StorageError> {
        if let Ok(mut keys) = self.presigned.lock() {
            keys.push(key.to_owned());
        }
        Ok(format!(
            "{}?expires={}",
            self.public_url(key),
            self.ttl.as_secs()
        ))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut keys) = self.deleted.lock() {
            keys.push(key.to_owned());
        }
        Ok(())
    }

    async fn check_bucket(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
