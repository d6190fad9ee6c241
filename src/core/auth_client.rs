// src/core/auth_client.rs
//! Identity provider client (Supabase Auth REST API).

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::session::AuthUser;

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<WireMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
}

impl WireUser {
    fn into_auth_user(self, fallback_email: &str) -> AuthUser {
        let metadata = self.user_metadata.unwrap_or_default();
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
            full_name: metadata.full_name,
            avatar_url: metadata.avatar_url,
        }
    }
}

/// Result of a sign-up or sign-in call. The token is absent when the
/// provider requires email confirmation before issuing a session.
#[derive(Debug)]
pub struct SignedIn {
    pub user: AuthUser,
    pub access_token: Option<String>,
}

pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
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

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignedIn> {
        let url = format!("{}/auth/v1/signup", self.base_url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        });

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&payload)
            .send()
            .await
            .context("Sign-up request failed")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read sign-up response")?;
        if !status.is_success() {
            anyhow::bail!("Sign-up failed with status {}: {}", status, body);
        }

        // With email confirmation enabled the provider returns the bare user
        // object instead of a session.
        if let Ok(session) = serde_json::from_str::<SessionResponse>(&body) {
            if let Some(user) = session.user {
                return Ok(SignedIn {
                    user: user.into_auth_user(email),
                    access_token: session.access_token,
                });
            }
        }
        let user: WireUser = serde_json::from_str(&body)
            .with_context(|| format!("Unexpected sign-up response: {}", body))?;

        info!("Signed up user: {}", email);
        Ok(SignedIn {
            user: user.into_auth_user(email),
            access_token: None,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let payload = serde_json::json!({ "email": email, "password": password });

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&payload)
            .send()
            .await
            .context("Sign-in request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sign-in failed with status {}: {}", status, body);
        }

        let session: SessionResponse = response
            .json()
            .await
            .context("Failed to parse sign-in response")?;

        let user = session
            .user
            .ok_or_else(|| anyhow::anyhow!("Sign-in response is missing the user object"))?;

        info!("Signed in user: {}", email);
        Ok(SignedIn {
            user: user.into_auth_user(email),
            access_token: session.access_token,
        })
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Sign-out request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sign-out failed with status {}: {}", status, body);
        }
        Ok(())
    }

    /// Fetch the user behind an access token (id, email, display name, avatar).
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Get-user request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Get user failed with status {}: {}", status, body);
        }

        let user: WireUser = response
            .json()
            .await
            .context("Failed to parse user response")?;

        Ok(user.into_auth_user(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_user_maps_metadata() {
        let raw = r#"{
            "id": "u-1",
            "email": "jane@example.com",
            "user_metadata": {"full_name": "Jane Doe", "avatar_url": "https://cdn/avatar.png"}
        }"#;
        let wire: WireUser = serde_json::from_str(raw).unwrap();
        let user = wire.into_auth_user("fallback@example.com");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn missing_email_falls_back_to_input() {
        let wire: WireUser = serde_json::from_str(r#"{"id": "u-2"}"#).unwrap();
        let user = wire.into_auth_user("typed@example.com");
        assert_eq!(user.email, "typed@example.com");
        assert!(user.full_name.is_none());
    }

    #[test]
    fn session_response_without_token_is_accepted() {
        let raw = r#"{"user": {"id": "u-3", "email": "a@b.c"}}"#;
        let session: SessionResponse = serde_json::from_str(raw).unwrap();
        assert!(session.access_token.is_none());
        assert!(session.user.is_some());
    }
}
