// src/cv_list.rs
//! Read-only cache of a user's previously uploaded CVs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::record_store::CvRecordSource;
use crate::core::storage_client::ObjectStore;

/// Lifetime of the signed viewing URLs handed to the dashboard.
pub const SIGNED_URL_TTL_SECS: u32 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvRecord {
    pub cv_id: String,
    pub preview_url: String,
}

/// Fetches the user's CV rows (most recent first) and resolves a signed
/// viewing URL for each. Rows without a storage path, and rows whose URL
/// resolution fails, are dropped rather than reported as errors.
pub struct CvListStore {
    records: Arc<dyn CvRecordSource>,
    storage: Arc<dyn ObjectStore>,
}

impl CvListStore {
    pub fn new(records: Arc<dyn CvRecordSource>, storage: Arc<dyn ObjectStore>) -> Self {
        Self { records, storage }
    }

    /// Returns an ordered list, possibly empty. A failing row source yields
    /// an empty list; the caller keeps whatever it was showing.
    pub async fn fetch(&self, user_id: &str, access_token: &str) -> Vec<CvRecord> {
        let rows = match self.records.list_cvs(user_id, access_token).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Error fetching CVs: {}", e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(path) = row.pdf_storage_path else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            match self
                .storage
                .signed_url(&path, SIGNED_URL_TTL_SECS, access_token)
                .await
            {
                Ok(url) if !url.is_empty() => records.push(CvRecord {
                    cv_id: row.cv_id,
                    preview_url: url,
                }),
                Ok(_) => {}
                Err(e) => {
                    debug!("Dropping CV {} after signing failure: {}", row.cv_id, e);
                }
            }
        }
        records
    }
}
