// src/upload/mod.rs
//! File validation and the five-stage upload pipeline.

pub mod pipeline;
pub mod validate;

pub use pipeline::{CancelToken, PipelineError, UploadObserver, UploadOutcome, UploadPhase, UploadPipeline};
pub use validate::{SelectedFile, ValidationError};
