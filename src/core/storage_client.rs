// src/core/storage_client.rs
//! Object storage client (Supabase Storage REST API).

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::types::response::SignedUrlResponse;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage error {status}: {body}")]
    Status { status: u16, body: String },
}

/// Bucket operations the pipeline and CV list depend on. The caller's
/// access token is threaded explicitly into every call.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload with overwrite: an existing object at `path` is replaced.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        access_token: &str,
    ) -> Result<(), StorageError>;

    /// Issue a time-limited signed viewing URL for `path`.
    async fn signed_url(
        &self,
        path: &str,
        expires_in_secs: u32,
        access_token: &str,
    ) -> Result<String, StorageError>;
}

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: String, anon_key: String, bucket: String) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            anon_key,
            bucket,
        })
    }

    async fn error_for(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StorageError::Status { status, body }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        access_token: &str,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        debug!("Uploading object: {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn signed_url(
        &self,
        path: &str,
        expires_in_secs: u32,
        access_token: &str,
    ) -> Result<String, StorageError> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let signed: SignedUrlResponse = response.json().await?;
        // The API answers with a path relative to the storage root.
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}
