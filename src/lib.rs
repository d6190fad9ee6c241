// src/lib.rs
//! Client core for the cv2interview dashboard: CV upload pipeline, PDF
//! thumbnail rendering, CV list and structured-profile stores, onboarding
//! wizard and mock-interview session, plus typed clients for the external
//! collaborators (processing backend, identity provider, object storage,
//! record store).

pub mod cli;
pub mod config;
pub mod core;
pub mod cv_list;
pub mod interview;
pub mod notify;
pub mod profile_store;
pub mod session;
pub mod thumbnail;
pub mod types;
pub mod upload;
pub mod wizard;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::AppConfig;
use crate::core::backend_client::{CvBackend, HttpCvBackend};
use crate::core::record_store::{ProfileUpsert, SupabaseRecordStore};
use crate::core::storage_client::{ObjectStore, SupabaseStorage};
use crate::core::SupabaseAuth;
use crate::cv_list::CvListStore;
use crate::interview::InterviewSession;
use crate::notify::Notifier;
use crate::profile_store::StructuredProfileStore;
use crate::session::SessionContext;
use crate::upload::pipeline::UploadPipeline;

/// Service assembly for one application run.
///
/// Everything is constructed here and passed into the components that need
/// it; no module-level singletons anywhere.
pub struct AppServices {
    pub config: AppConfig,
    pub backend: Arc<dyn CvBackend>,
    pub storage: Arc<dyn ObjectStore>,
    pub auth: SupabaseAuth,
    pub records: Arc<SupabaseRecordStore>,
    pub cv_list: Arc<CvListStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppServices {
    pub fn from_config(config: AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let backend: Arc<dyn CvBackend> = Arc::new(
            HttpCvBackend::new(config.backend_base().to_string())
                .context("Failed to create backend client")?,
        );

        let storage: Arc<dyn ObjectStore> = Arc::new(SupabaseStorage::new(
            config.supabase_base().to_string(),
            config.supabase_anon_key.clone(),
            config.storage_bucket.clone(),
        )?);

        let auth = SupabaseAuth::new(
            config.supabase_base().to_string(),
            config.supabase_anon_key.clone(),
        )?;

        let records = Arc::new(SupabaseRecordStore::new(
            config.supabase_base().to_string(),
            config.supabase_anon_key.clone(),
        )?);

        let cv_list = Arc::new(CvListStore::new(records.clone(), storage.clone()));

        Ok(Self {
            config,
            backend,
            storage,
            auth,
            records,
            cv_list,
            notifier,
        })
    }

    /// A pipeline instance for one upload trigger.
    pub fn pipeline(&self) -> UploadPipeline {
        UploadPipeline::new(
            self.backend.clone(),
            self.storage.clone(),
            self.cv_list.clone(),
            self.notifier.clone(),
        )
    }

    /// A profile store for one dashboard visit.
    pub fn profile_store(&self) -> StructuredProfileStore {
        StructuredProfileStore::new(self.backend.clone(), self.notifier.clone())
    }

    /// A mock-interview session against the configured webhook.
    pub fn interview(&self) -> Result<InterviewSession> {
        InterviewSession::new(self.config.interview_webhook_url.clone())
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<Option<SessionContext>> {
        let signed = self.auth.sign_up(email, password, full_name).await?;

        // Best-effort: the profile row is created alongside the account.
        let row = ProfileUpsert {
            user_id: signed.user.id.clone(),
            email: Some(signed.user.email.clone()),
            full_name: full_name.map(String::from),
            plan: Some("free".to_string()),
            onboarding_completed: Some(false),
            ..Default::default()
        };
        let token = signed
            .access_token
            .clone()
            .unwrap_or_else(|| self.config.supabase_anon_key.clone());
        if let Err(e) = self.records.upsert_profile(&row, &token).await {
            warn!("profiles upsert on signup failed: {}", e);
        }

        Ok(signed
            .access_token
            .map(|access_token| SessionContext::new(signed.user, access_token)))
    }

    pub async fn sign_in(&self, email: &str, password: &str, remember: bool) -> Result<SessionContext> {
        let signed = self.auth.sign_in(email, password).await?;
        let access_token = signed
            .access_token
            .ok_or_else(|| anyhow::anyhow!("Sign-in did not return a session token"))?;

        let session = SessionContext::new(signed.user, access_token);

        // Best-effort: record the login time on the profile row.
        let row = ProfileUpsert {
            user_id: session.user.id.clone(),
            email: Some(session.user.email.clone()),
            full_name: session.user.full_name.clone(),
            last_login_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        if let Err(e) = self.records.upsert_profile(&row, &session.access_token).await {
            warn!("profiles upsert on sign-in failed: {}", e);
        }

        if remember {
            session::save_session(&self.config.session_file, &session)?;
        } else {
            // A previous remembered session must not outlive this login.
            session::clear_session(&self.config.session_file);
        }

        Ok(session)
    }

    pub async fn sign_out(&self, session: &SessionContext) -> Result<()> {
        self.auth.sign_out(&session.access_token).await?;
        session::clear_session(&self.config.session_file);
        Ok(())
    }

    /// Resume a remembered session, if one is persisted and still valid.
    pub fn resume_session(&self) -> Option<SessionContext> {
        session::load_session(&self.config.session_file)
    }
}
