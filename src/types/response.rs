// src/types/response.rs
//! Wire types for the processing backend and record store responses.

use serde::{Deserialize, Serialize};

// ===== Backend Response Types =====

/// Response of `POST /cv/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvUploadResponse {
    pub cv_id: String,
    pub pdf_storage_path: String,
    #[serde(default)]
    pub original_pdf_url: Option<String>,
}

/// Decoded body of `POST /cv/extract`.
///
/// Older backend versions answer with a JSON envelope instead of plain text;
/// both shapes are decoded into this tagged union and normalized to one
/// canonical text value in [`ExtractResponse::into_text`].
#[derive(Debug, Clone)]
pub enum ExtractResponse {
    PlainText(String),
    Envelope(ExtractEnvelope),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractEnvelope {
    #[serde(default)]
    pub text_extracted: Option<String>,
    #[serde(default)]
    pub extracted_data: Option<serde_json::Value>,
    #[serde(default)]
    pub extracted_raw: Option<serde_json::Value>,
}

impl ExtractResponse {
    /// Normalize either backend contract to one canonical text value.
    ///
    /// Preference order: plain text body, `text_extracted`, serialized
    /// `extracted_data`, serialized `extracted_raw`, empty string.
    pub fn into_text(self) -> String {
        match self {
            ExtractResponse::PlainText(text) => text.trim().to_string(),
            ExtractResponse::Envelope(envelope) => {
                if let Some(text) = envelope.text_extracted {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        return text;
                    }
                }
                if let Some(data) = envelope.extracted_data {
                    if !data.is_null() {
                        return serde_json::to_string(&data).unwrap_or_default();
                    }
                }
                if let Some(raw) = envelope.extracted_raw {
                    if !raw.is_null() {
                        return serde_json::to_string(&raw).unwrap_or_default();
                    }
                }
                String::new()
            }
        }
    }
}

// ===== Record Store Types =====

/// Row shape returned by the `cvs` table select.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRow {
    pub cv_id: String,
    #[serde(default)]
    pub pdf_storage_path: Option<String>,
}

/// Response of the storage signed-URL endpoint. The URL is relative to the
/// storage API root.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    pub signed_url: String,
}

// ===== Interview Analysis Types =====

/// Structured feedback returned by the interview analysis webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Grade out of 20.
    #[serde(default)]
    pub grade: u8,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default, rename = "nextQuestion")]
    pub next_question: Option<String>,
}
