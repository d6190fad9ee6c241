// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Connection settings for one deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the CV processing backend, e.g. `http://localhost:8001`.
    pub backend_url: String,
    /// Base URL of the Supabase project, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,
    /// Publishable anon key sent as `apikey` on every Supabase request.
    #[serde(default)]
    pub supabase_anon_key: String,
    /// Storage bucket holding CV originals and generated previews.
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
    /// Analysis webhook for the mock-interview screen. Empty disables it.
    #[serde(default)]
    pub interview_webhook_url: String,
    /// Where a remembered session is persisted between runs.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_bucket() -> String {
    "cv2interviewBucket".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("data/session.toml")
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: AppConfig,
}

impl AppConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = Self::load_from_file(&environment)?;

        // Secrets may be supplied via the environment instead of the file.
        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            config.supabase_anon_key = key;
        }
        if let Ok(url) = std::env::var("BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(url) = std::env::var("INTERVIEW_WEBHOOK_URL") {
            config.interview_webhook_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("CV2INTERVIEW_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(environment: &str) -> Result<Self> {
        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            anyhow::bail!(
                "config.yaml not found in current directory. Cannot start without configuration."
            );
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(env_config)
    }

    fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            anyhow::bail!("backend_url must not be empty");
        }
        if self.supabase_url.trim().is_empty() {
            anyhow::bail!("supabase_url must not be empty");
        }
        Ok(())
    }

    /// Trailing-slash-free backend base URL.
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Trailing-slash-free Supabase base URL.
    pub fn supabase_base(&self) -> &str {
        self.supabase_url.trim_end_matches('/')
    }
}
