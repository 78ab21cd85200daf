//! S3-compatible picture bucket backed by `object_store`.

use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::ObjectStore;
use url::Url;

use crate::config::S3Settings;
use crate::storage::{ObjectStorage, StorageError};

pub struct S3Storage {
    store: AmazonS3,
    /// Where objects are publicly readable, bucket included.
    base_url: Url,
    ttl: Duration,
}

impl S3Storage {
    pub fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            .with_access_key_id(&settings.access_key_id)
            .with_secret_access_key(&settings.secret_access_key)
            .with_virtual_hosted_style_request(!settings.path_style);

        // Custom endpoint for MinIO / localstack
        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        Ok(S3Storage {
            store: builder.build()?,
            base_url: base_url(settings)?,
            ttl: settings.presign_ttl,
        })
    }

    /// Presigned URL for `method` on object `key`.
    pub async fn signed_url(&self, method: Method, key: &str) -> Result<Url, StorageError> {
        let url = self
            .store
            .signed_url(method, &ObjectPath::from(key), self.ttl)
            .await?;
        Ok(url)
    }
}

/// `https://<bucket>.<host>` for virtual-hosted buckets, `<endpoint>/<bucket>` otherwise.
fn base_url(settings: &S3Settings) -> Result<Url, StorageError> {
    let endpoint = match &settings.endpoint {
        Some(endpoint) => Url::parse(endpoint)?,
        None => Url::parse(&format!("https://s3.{}.amazonaws.com", settings.region))?,
    };

    if settings.path_style {
        let mut url = endpoint;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(&settings.bucket);
        return Ok(url);
    }

    let host = endpoint.host_str().ok_or(url::ParseError::EmptyHost)?;
    let mut url = endpoint.clone();
    url.set_host(Some(&format!("{}.{host}", settings.bucket)))?;
    Ok(url)
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn public_url(&self, key: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        url.to_string()
    }

    async fn presign_upload(&self, key: &str) -> Result<String, StorageError> {
        Ok(self.signed_url(Method::PUT, key).await?.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.store.delete(&ObjectPath::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_bucket(&self) -> Result<(), StorageError> {
        self.store.list_with_delimiter(None).await?;
        log::info!("picture bucket reachable at {}", self.base_url);
        Ok(())
    }
}
