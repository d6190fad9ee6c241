// src/core/record_store.rs
//! Row-level record store client (Supabase PostgREST).
//!
//! Holds the `cvs` table reads used by the CV list and the `profiles`
//! upsert performed on sign-up and sign-in.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::response::CvRow;

/// Source of a user's CV rows, most recent first.
#[async_trait]
pub trait CvRecordSource: Send + Sync {
    async fn list_cvs(&self, user_id: &str, access_token: &str) -> Result<Vec<CvRow>>;
}

/// Profile row upserted on conflict with `user_id`.
#[derive(Debug, Default, Serialize)]
pub struct ProfileUpsert {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

pub struct SupabaseRecordStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseRecordStore {
    pub fn new(base_url: String, anon_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            anon_key,
        })
    }

    /// Upsert a profile row keyed by user id. Failures are reported to the
    /// caller, which treats them as best-effort on the auth path.
    pub async fn upsert_profile(&self, row: &ProfileUpsert, access_token: &str) -> Result<()> {
        let url = format!("{}/rest/v1/profiles?on_conflict=user_id", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await
            .context("Profile upsert request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Profile upsert failed with status {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl CvRecordSource for SupabaseRecordStore {
    async fn list_cvs(&self, user_id: &str, access_token: &str) -> Result<Vec<CvRow>> {
        let url = format!(
            "{}/rest/v1/cvs?select=cv_id,pdf_storage_path&user_id=eq.{}&order=created_at.desc",
            self.base_url, user_id
        );

        debug!("Fetching CV rows for user {}", user_id);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .context("CV list request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("CV list failed with status {}: {}", status, body);
            anyhow::bail!("CV list failed with status {}", status);
        }

        response.json().await.context("Failed to parse CV rows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_upsert_skips_absent_fields() {
        let row = ProfileUpsert {
            user_id: "u-1".to_string(),
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("user_id"));
        assert!(json.contains("email"));
        assert!(!json.contains("plan"));
        assert!(!json.contains("last_login_at"));
    }
}
