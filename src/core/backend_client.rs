// src/core/backend_client.rs
//! HTTP client for the CV processing backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::profile::StructuredProfile;
use crate::types::response::{CvUploadResponse, ExtractEnvelope, ExtractResponse};
use crate::upload::validate::SelectedFile;

const UPLOAD_ENDPOINT: &str = "/cv/upload";
const EXTRACT_ENDPOINT: &str = "/cv/extract";
const CONVERT_ENDPOINT: &str = "/cv/convert-to-image";
const PARSE_ENDPOINT: &str = "/openai/parse_cv";

/// Preview image parameters sent to the conversion endpoint.
const PREVIEW_FORMAT: &str = "JPEG";
const PREVIEW_BOX: u32 = 300;
const PREVIEW_QUALITY: u32 = 85;

const DEFAULT_TIMEOUT_SECS: u64 = 400;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", message_for(.status, .body))]
    Status { status: u16, body: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn message_for(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body.trim().to_string()
    }
}

impl BackendError {
    /// Message shown to the user: the response body when the server sent
    /// one, otherwise an `HTTP <status>` fallback.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend reported a missing upstream credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// The remote operations the upload pipeline and profile store depend on.
///
/// Constructed once at application assembly and passed in explicitly so
/// tests can substitute a stub.
#[async_trait]
pub trait CvBackend: Send + Sync {
    /// Stage 1: store the original PDF, returning the record identifiers.
    async fn upload_cv(
        &self,
        user_id: &str,
        file: &SelectedFile,
    ) -> Result<CvUploadResponse, BackendError>;

    /// Stage 2: extract the document text.
    async fn extract_text(&self, file: &SelectedFile) -> Result<ExtractResponse, BackendError>;

    /// Stage 3: render the first page as a preview image (JPEG 300x300 q85).
    async fn convert_to_image(&self, file: &SelectedFile) -> Result<Vec<u8>, BackendError>;

    /// Structure raw CV text into the fixed profile schema.
    async fn parse_profile(
        &self,
        text: &str,
        user_id: Option<&str>,
    ) -> Result<StructuredProfile, BackendError>;
}

pub struct HttpCvBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCvBackend {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn file_part(file: &SelectedFile) -> Result<Part, BackendError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(BackendError::Transport)?;
        Ok(part)
    }

    async fn error_for(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        BackendError::Status { status, body }
    }
}

#[async_trait]
impl CvBackend for HttpCvBackend {
    async fn upload_cv(
        &self,
        user_id: &str,
        file: &SelectedFile,
    ) -> Result<CvUploadResponse, BackendError> {
        let url = format!("{}{}", self.base_url, UPLOAD_ENDPOINT);

        let form = Form::new()
            .text("user_id", user_id.to_string())
            .part("file", Self::file_part(file)?);

        info!("Uploading CV original: {}", url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body = response.text().await?;
        debug!("Upload response: {}", body);
        Ok(serde_json::from_str(&body)?)
    }

    async fn extract_text(&self, file: &SelectedFile) -> Result<ExtractResponse, BackendError> {
        let url = format!("{}{}", self.base_url, EXTRACT_ENDPOINT);

        let form = Form::new().part("file", Self::file_part(file)?);

        info!("Requesting text extraction: {}", url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        // The canonical contract answers text/plain; older backends answer
        // with a JSON envelope. Decode both into the tagged union.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.contains("application/json"));

        let body = response.text().await?;
        if is_json {
            let envelope: ExtractEnvelope = serde_json::from_str(&body)?;
            Ok(ExtractResponse::Envelope(envelope))
        } else {
            Ok(ExtractResponse::PlainText(body))
        }
    }

    async fn convert_to_image(&self, file: &SelectedFile) -> Result<Vec<u8>, BackendError> {
        let url = format!(
            "{}{}?format={}&width={}&height={}&quality={}",
            self.base_url, CONVERT_ENDPOINT, PREVIEW_FORMAT, PREVIEW_BOX, PREVIEW_BOX, PREVIEW_QUALITY
        );

        let form = Form::new().part("file", Self::file_part(file)?);

        info!("Requesting preview conversion: {}", url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn parse_profile(
        &self,
        text: &str,
        user_id: Option<&str>,
    ) -> Result<StructuredProfile, BackendError> {
        let url = format!("{}{}", self.base_url, PARSE_ENDPOINT);

        let payload = serde_json::json!({
            "text": text,
            "user_id": user_id,
        });

        info!("Structuring extracted text: {}", url);
        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_uses_body_when_present() {
        let err = BackendError::Status {
            status: 500,
            body: "server error".to_string(),
        };
        assert_eq!(err.user_message(), "server error");
    }

    #[test]
    fn status_error_falls_back_to_http_code() {
        let err = BackendError::Status {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(err.user_message(), "HTTP 502");
    }

    #[test]
    fn unauthorized_is_distinguished() {
        let err = BackendError::Status {
            status: 401,
            body: "missing key".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }
}
