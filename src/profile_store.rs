// src/profile_store.rs
//! Holds the extracted CV text and the structured profile derived from it.

use std::sync::Arc;

use tracing::warn;

use crate::core::backend_client::CvBackend;
use crate::notify::{Notice, Notifier};
use crate::session::SessionContext;
use crate::types::profile::StructuredProfile;

/// One "current extracted text / structured profile" slot, owned by a single
/// dashboard visit. Submitting text to the structuring endpoint fills the
/// profile draft the wizard's profile step edits.
pub struct StructuredProfileStore {
    backend: Arc<dyn CvBackend>,
    notifier: Arc<dyn Notifier>,
    extracted_text: Option<String>,
    profile: Option<StructuredProfile>,
    parsing: bool,
}

impl StructuredProfileStore {
    pub fn new(backend: Arc<dyn CvBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            extracted_text: None,
            profile: None,
            parsing: false,
        }
    }

    /// Replace the extracted text. `None` clears it when a new upload starts.
    pub fn set_extracted_text(&mut self, text: Option<String>) {
        self.extracted_text = text.filter(|t| !t.trim().is_empty());
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn profile(&self) -> Option<&StructuredProfile> {
        self.profile.as_ref()
    }

    pub fn is_parsing(&self) -> bool {
        self.parsing
    }

    /// Submit the current extracted text to the structuring endpoint.
    ///
    /// On failure the previous profile value is retained; a 401 is reported
    /// as a configuration problem (missing upstream credential) rather than
    /// a parse failure.
    pub async fn structure(&mut self, session: &SessionContext) {
        let Some(text) = self.extracted_text.clone() else {
            return;
        };

        self.parsing = true;
        let result = self
            .backend
            .parse_profile(&text, Some(session.user_id()))
            .await;
        self.parsing = false;

        match result {
            Ok(profile) => {
                self.profile = Some(profile);
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Structuring endpoint rejected credentials: {}", e);
                self.notifier.notify(Notice::error(
                    "Failed to parse CV",
                    "The structuring service is missing or rejecting its upstream credential. Check the backend configuration.",
                ));
            }
            Err(e) => {
                warn!("Structuring failed: {}", e);
                self.notifier
                    .notify(Notice::error("Failed to parse CV", e.user_message()));
            }
        }
    }

    /// Gate for advancing the wizard past the upload step: a meaningful
    /// profile, no structuring request in flight, and non-empty text.
    pub fn next_ready(&self) -> bool {
        !self.parsing
            && self.extracted_text.is_some()
            && self.profile.as_ref().map_or(false, |p| p.is_meaningful())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend_client::BackendError;
    use crate::notify::RecordingNotifier;
    use crate::session::AuthUser;
    use crate::types::response::{CvUploadResponse, ExtractResponse};
    use crate::upload::validate::SelectedFile;
    use async_trait::async_trait;

    struct StubBackend {
        result: Result<StructuredProfile, u16>,
    }

    #[async_trait]
    impl CvBackend for StubBackend {
        async fn upload_cv(
            &self,
            _user_id: &str,
            _file: &SelectedFile,
        ) -> Result<CvUploadResponse, BackendError> {
            unimplemented!("not used by the profile store")
        }

        async fn extract_text(&self, _file: &SelectedFile) -> Result<ExtractResponse, BackendError> {
            unimplemented!("not used by the profile store")
        }

        async fn convert_to_image(&self, _file: &SelectedFile) -> Result<Vec<u8>, BackendError> {
            unimplemented!("not used by the profile store")
        }

        async fn parse_profile(
            &self,
            _text: &str,
            _user_id: Option<&str>,
        ) -> Result<StructuredProfile, BackendError> {
            match &self.result {
                Ok(profile) => Ok(profile.clone()),
                Err(status) => Err(BackendError::Status {
                    status: *status,
                    body: "upstream failure".to_string(),
                }),
            }
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(
            AuthUser {
                id: "user-1".to_string(),
                email: "jane@example.com".to_string(),
                full_name: None,
                avatar_url: None,
            },
            "token".to_string(),
        )
    }

    fn store_with(
        result: Result<StructuredProfile, u16>,
        notifier: Arc<RecordingNotifier>,
    ) -> StructuredProfileStore {
        StructuredProfileStore::new(Arc::new(StubBackend { result }), notifier)
    }

    #[tokio::test]
    async fn empty_profile_blocks_advance_even_with_text() {
        let mut store = store_with(Ok(StructuredProfile::default()), Arc::new(RecordingNotifier::new()));
        store.set_extracted_text(Some("plenty of resume text".to_string()));
        store.structure(&session()).await;

        assert!(store.profile().is_some());
        assert!(!store.next_ready());
    }

    #[tokio::test]
    async fn meaningful_profile_with_text_is_ready() {
        let profile = StructuredProfile {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        let mut store = store_with(Ok(profile), Arc::new(RecordingNotifier::new()));
        store.set_extracted_text(Some("resume text".to_string()));
        store.structure(&session()).await;

        assert!(store.next_ready());
    }

    #[tokio::test]
    async fn no_text_means_no_request_and_not_ready() {
        let profile = StructuredProfile {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        let mut store = store_with(Ok(profile), Arc::new(RecordingNotifier::new()));
        store.set_extracted_text(Some("   ".to_string()));
        store.structure(&session()).await;

        assert!(store.profile().is_none());
        assert!(!store.next_ready());
    }

    #[tokio::test]
    async fn unauthorized_keeps_previous_profile_and_reports_config_error() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut store = store_with(Err(401), notifier.clone());
        store.profile = Some(StructuredProfile {
            email: Some("old@example.com".to_string()),
            ..Default::default()
        });
        store.set_extracted_text(Some("new resume text".to_string()));
        store.structure(&session()).await;

        assert_eq!(
            store.profile().unwrap().email.as_deref(),
            Some("old@example.com")
        );
        let notices = notifier.notices();
        assert!(notices[0].description.contains("credential"));
    }

    #[tokio::test]
    async fn other_failures_surface_the_backend_message() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut store = store_with(Err(500), notifier.clone());
        store.set_extracted_text(Some("resume text".to_string()));
        store.structure(&session()).await;

        assert!(store.profile().is_none());
        assert!(notifier.notices()[0].description.contains("upstream failure"));
    }
}
