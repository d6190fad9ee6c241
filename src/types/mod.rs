// src/types/mod.rs
//! Shared domain and wire types.

pub mod profile;
pub mod response;

pub use profile::{EducationEntry, ExperienceEntry, StructuredProfile};
pub use response::{
    AnalysisResult, CvRow, CvUploadResponse, ExtractEnvelope, ExtractResponse, SignedUrlResponse,
};
