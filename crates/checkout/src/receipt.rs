//! Receipt upload pipeline for bank-transfer orders.
//!
//! Validates the proof-of-payment file locally (MIME allow-list, size cap)
//! before any network traffic, generates an image preview from the original
//! bytes, and performs a single-shot multipart transfer. The backend answers
//! with a URL or filename; only the bare storage filename is kept - callers
//! must never assume host or path structure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};

/// Largest accepted receipt: 10 MiB.
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted as proof of payment: images, PDF, Word documents.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// A locally chosen file awaiting upload.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    /// Local filename, for the multipart part only.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// A receipt accepted by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptUpload {
    /// Bare storage-side filename. Never a full URL, never the local name.
    pub stored_filename: String,
    /// `data:` URI preview, present for image uploads. Generated from the
    /// original bytes, so it exists even when the transfer fails and is
    /// retried.
    pub preview_data_uri: Option<String>,
}

/// Upload failures, with validation distinct from transfer so the UI can
/// retry the transfer without re-choosing the file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file's MIME type is not in the allow-list. No network call made.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// The file exceeds the size cap. No network call made.
    #[error("file too large: {size} bytes (limit {MAX_RECEIPT_BYTES})")]
    TooLarge { size: usize },

    /// The transfer itself failed after validation passed.
    #[error(transparent)]
    Transfer(#[from] ApiError),

    /// The upload response carried no usable filename.
    #[error("upload response carried no filename")]
    MissingFilename,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

/// Uploads proof-of-payment files for bank-transfer checkouts.
#[derive(Clone)]
pub struct ReceiptUploader {
    api: ApiClient,
}

impl ReceiptUploader {
    /// Create a new uploader over the given API client.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Validate a file against the allow-list and size cap.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` or `TooLarge`; neither reaches the network.
    pub fn validate(file: &ReceiptFile) -> Result<(), UploadError> {
        if !ALLOWED_MIME_TYPES.contains(&file.content_type.as_str()) {
            return Err(UploadError::UnsupportedType(file.content_type.clone()));
        }
        if file.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(UploadError::TooLarge {
                size: file.bytes.len(),
            });
        }
        Ok(())
    }

    /// Upload a validated file and return the stored filename.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call, or a transfer
    /// error afterwards.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload(&self, file: &ReceiptFile) -> Result<ReceiptUpload, UploadError> {
        Self::validate(file)?;

        // Preview comes from the original bytes, not the upload response,
        // so it is available before the network call resolves.
        let preview_data_uri = image_preview(file);

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(ApiError::Network)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response: UploadResponse = self.api.post_multipart(form).await?;

        let stored = response
            .url
            .or(response.filename)
            .ok_or(UploadError::MissingFilename)?;
        let stored_filename = bare_filename(&stored);
        if stored_filename.is_empty() {
            return Err(UploadError::MissingFilename);
        }

        Ok(ReceiptUpload {
            stored_filename,
            preview_data_uri,
        })
    }
}

/// Keep only the final path segment of whatever the backend returned.
fn bare_filename(stored: &str) -> String {
    stored
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// `data:` URI preview for image MIME types.
fn image_preview(file: &ReceiptFile) -> Option<String> {
    file.content_type.starts_with("image/").then(|| {
        format!(
            "data:{};base64,{}",
            file.content_type,
            BASE64.encode(&file.bytes)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pdf(bytes: Vec<u8>) -> ReceiptFile {
        ReceiptFile {
            file_name: "transfer-slip.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }

    #[test]
    fn test_validate_rejects_unlisted_mime_type() {
        let file = ReceiptFile {
            file_name: "receipt.svg".to_string(),
            content_type: "image/svg+xml".to_string(),
            bytes: vec![0u8; 16],
        };
        let err = ReceiptUploader::validate(&file).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    fn test_validate_rejects_oversized_file() {
        let err = ReceiptUploader::validate(&pdf(vec![0u8; MAX_RECEIPT_BYTES + 1])).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn test_validate_accepts_file_at_the_cap() {
        assert!(ReceiptUploader::validate(&pdf(vec![0u8; MAX_RECEIPT_BYTES])).is_ok());
    }

    #[test]
    fn test_bare_filename_strips_path() {
        assert_eq!(
            bare_filename("https://cdn.example.com/receipts/rcpt_99.pdf"),
            "rcpt_99.pdf"
        );
        assert_eq!(bare_filename("rcpt_99.pdf"), "rcpt_99.pdf");
        assert_eq!(bare_filename("receipts/"), "");
    }

    #[test]
    fn test_image_preview_only_for_images() {
        let image = ReceiptFile {
            file_name: "receipt.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let preview = image_preview(&image).unwrap();
        assert!(preview.starts_with("data:image/png;base64,"));

        assert!(image_preview(&pdf(vec![1, 2, 3])).is_none());
    }
}
