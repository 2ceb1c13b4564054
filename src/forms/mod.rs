//! Form Mapper: turns a multipart submission into a persistence-ready document.
//!
//! Every mapper runs in three phases. All validation happens first, so a
//! rejected form never reaches the blob store. Files are uploaded next.
//! The document is assembled last. Upload failures abort the whole
//! submission; blobs already stored by then are not cleaned up.

pub mod course;
pub mod expert;
pub mod multipart;
pub mod partner;
pub mod testimonial;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::entity::Entity;
use crate::error::AppError;
use crate::forms::multipart::{SubmittedForm, UploadedFile};
use crate::storage::client::BlobStore;

/// A document that can be built from an admin form submission.
#[async_trait]
pub trait FormMapped: Entity {
    /// Validate `form` and build the document, uploading attached files.
    ///
    /// `existing` is the stored document on update; file fields left empty
    /// keep its URLs. Identifiers are left for the caller to fill in.
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError>;
}

/// Object key for an upload: `<prefix>/<epoch-ms>-<sanitised name>`.
pub fn object_key(prefix: &str, file_name: &str, now: DateTime<Utc>) -> String {
    let sanitized_name: String = file_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    let sanitized_name = if sanitized_name.is_empty() {
        "upload.bin".to_string()
    } else {
        sanitized_name
    };
    format!("{}/{}-{}", prefix, now.timestamp_millis(), sanitized_name)
}

/// Upload one file and return its public URL.
pub async fn upload(blobs: &dyn BlobStore, prefix: &str, file: &UploadedFile) -> Result<String, AppError> {
    let key = object_key(prefix, &file.file_name, Utc::now());
    tracing::info!(%key, size = file.bytes.len(), "uploading file");
    blobs
        .store(&key, &file.content_type, file.bytes.clone())
        .await
}

/// Validation-phase check for an image slot: a new file, or a URL kept
/// from the stored document. On create there is nothing to keep.
pub fn require_image<'a>(
    form: &SubmittedForm,
    field: &str,
    kept: Option<&'a str>,
    message: &str,
) -> Result<Option<&'a str>, AppError> {
    if form.file(field).is_some() {
        return Ok(None);
    }
    match kept {
        Some(url) => Ok(Some(url)),
        None => Err(AppError::BadRequest(message.to_string())),
    }
}

/// Upload-phase resolution of an image slot checked by [`require_image`].
pub async fn resolve_image(
    form: &SubmittedForm,
    field: &str,
    kept: Option<&str>,
    blobs: &dyn BlobStore,
    prefix: &str,
) -> Result<String, AppError> {
    match form.file(field) {
        Some(file) => upload(blobs, prefix, file).await,
        None => kept
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required file: {field}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::MockBlobStore;

    fn at_millis(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_object_key_is_timestamp_prefixed() {
        let key = object_key("courses", "rust-cover.png", at_millis(1_700_000_000_123));
        assert_eq!(key, "courses/1700000000123-rust-cover.png");
    }

    #[test]
    fn test_object_key_sanitizes_name() {
        let key = object_key("mentors", "my photo (1).jpg", at_millis(42));
        assert_eq!(key, "mentors/42-my_photo__1_.jpg");

        let key = object_key("partners", "", at_millis(42));
        assert_eq!(key, "partners/42-upload.bin");
    }

    #[test]
    fn test_require_image_on_create() {
        let empty = SubmittedForm::new();
        assert!(require_image(&empty, "logo", None, "Please select a logo").is_err());

        let with_file = SubmittedForm::new().with_file("logo", "a.png", "image/png", vec![1]);
        assert_eq!(require_image(&with_file, "logo", None, "x").unwrap(), None);
    }

    #[test]
    fn test_require_image_on_update_keeps_url() {
        let empty = SubmittedForm::new();
        assert_eq!(
            require_image(&empty, "logo", Some("https://cdn/a.png"), "x").unwrap(),
            Some("https://cdn/a.png")
        );
    }

    #[tokio::test]
    async fn test_resolve_image_uploads_new_file() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_store()
            .withf(|key, content_type, content| {
                key.starts_with("partners/") && key.ends_with("-logo.png")
                    && content_type == "image/png"
                    && content == &vec![7u8, 7]
            })
            .times(1)
            .returning(|key, _, _| Ok(format!("https://blobs.test/{key}")));

        let form = SubmittedForm::new().with_file("logo", "logo.png", "image/png", vec![7, 7]);
        let url = resolve_image(&form, "logo", Some("https://old/logo.png"), &blobs, "partners")
            .await
            .unwrap();
        assert!(url.starts_with("https://blobs.test/partners/"));
    }

    #[tokio::test]
    async fn test_resolve_image_keeps_url_without_upload() {
        let mut blobs = MockBlobStore::new();
        blobs.expect_store().never();

        let url = resolve_image(
            &SubmittedForm::new(),
            "logo",
            Some("https://old/logo.png"),
            &blobs,
            "partners",
        )
        .await
        .unwrap();
        assert_eq!(url, "https://old/logo.png");
    }
}
