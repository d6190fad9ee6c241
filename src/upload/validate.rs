// src/upload/validate.rs
use thiserror::Error;

/// Largest accepted CV upload: 10 MiB.
pub const MAX_SIZE: u64 = 10 * 1024 * 1024;

const PDF_MIME: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// A file picked by the user, held in memory until the pipeline has stored it.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build from a file on disk, deriving the MIME type from the extension.
    pub async fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("uploaded_cv.pdf")
            .to_string();

        let mime_type = if name.to_lowercase().ends_with(".pdf") {
            PDF_MIME.to_string()
        } else {
            "application/octet-stream".to_string()
        };

        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a PDF file. Received: {0}")]
    NotPdf(String),
    #[error("Max size is 10MB.")]
    TooLarge,
    #[error("Uploaded file is empty.")]
    Empty,
    #[error("File does not look like a valid PDF.")]
    Corrupted,
}

impl ValidationError {
    /// Short title for the transient notification.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NotPdf(_) => "Invalid file",
            Self::TooLarge => "File too large",
            Self::Empty | Self::Corrupted => "Invalid file",
        }
    }
}

/// Validate a selected file before any network call is attempted.
///
/// MIME type must be `application/pdf`, size must not exceed [`MAX_SIZE`]
/// (a file of exactly 10 MiB is accepted), and the content must start with
/// the PDF magic bytes.
pub fn validate(file: &SelectedFile) -> Result<(), ValidationError> {
    if file.mime_type != PDF_MIME {
        return Err(ValidationError::NotPdf(file.mime_type.clone()));
    }
    if file.bytes.is_empty() {
        return Err(ValidationError::Empty);
    }
    if file.size() > MAX_SIZE {
        return Err(ValidationError::TooLarge);
    }
    if !file.bytes.starts_with(PDF_SIGNATURE) {
        return Err(ValidationError::Corrupted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_of_size(len: usize) -> SelectedFile {
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.resize(len, b' ');
        SelectedFile::new("resume.pdf", "application/pdf", bytes)
    }

    #[test]
    fn accepts_a_valid_pdf() {
        assert!(validate(&pdf_of_size(2 * 1024 * 1024)).is_ok());
    }

    #[test]
    fn rejects_wrong_mime_type() {
        let file = SelectedFile::new("resume.docx", "application/msword", b"%PDF-1.4".to_vec());
        assert_eq!(
            validate(&file),
            Err(ValidationError::NotPdf("application/msword".to_string()))
        );
    }

    #[test]
    fn rejects_over_ten_mib_but_accepts_exactly_ten() {
        assert!(validate(&pdf_of_size(MAX_SIZE as usize)).is_ok());
        assert_eq!(
            validate(&pdf_of_size(MAX_SIZE as usize + 1)),
            Err(ValidationError::TooLarge)
        );
    }

    #[test]
    fn rejects_empty_and_non_pdf_content() {
        let empty = SelectedFile::new("resume.pdf", "application/pdf", vec![]);
        assert_eq!(validate(&empty), Err(ValidationError::Empty));

        let junk = SelectedFile::new("resume.pdf", "application/pdf", b"hello".to_vec());
        assert_eq!(validate(&junk), Err(ValidationError::Corrupted));
    }
}
