// src/core/mod.rs
//! Clients for the external collaborators (processing backend, identity
//! provider, object storage, record store).

pub mod auth_client;
pub mod backend_client;
pub mod record_store;
pub mod storage_client;

pub use auth_client::SupabaseAuth;
pub use backend_client::{BackendError, CvBackend, HttpCvBackend};
pub use record_store::{CvRecordSource, ProfileUpsert, SupabaseRecordStore};
pub use storage_client::{ObjectStore, StorageError, SupabaseStorage};
