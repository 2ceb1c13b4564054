use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A file part of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A multipart submission split into text fields and file fields.
///
/// File parts with no content (an untouched file input) are dropped while
/// reading, so `file()` only ever returns something worth uploading.
#[derive(Debug, Clone, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl SubmittedForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain an axum multipart body.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = SubmittedForm::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
                    form = form.with_file(&name, &file_name, &content_type, data.to_vec());
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{name}': {e}")))?;
                    form = form.with_field(&name, &value);
                }
            }
        }

        form.check_file_types()?;
        Ok(form)
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_file(mut self, name: &str, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        if !bytes.is_empty() {
            self.files.insert(
                name.to_string(),
                UploadedFile {
                    file_name: file_name.to_string(),
                    content_type: content_type.to_string(),
                    bytes,
                },
            );
        }
        self
    }

    /// Only image files are accepted, whichever field they arrive in.
    fn check_file_types(&self) -> Result<(), AppError> {
        match self
            .files
            .iter()
            .find(|(_, file)| !file.content_type.starts_with("image/"))
        {
            Some((name, _)) => Err(AppError::BadRequest(format!(
                "Only image files are allowed (field '{name}')"
            ))),
            None => Ok(()),
        }
    }

    /// Trimmed text value, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {name}")))
    }

    /// A finite, non-negative number. `label` names the field in the error.
    pub fn require_number(&self, name: &str, label: &str) -> Result<f64, AppError> {
        let raw = self
            .text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {name}")))?;
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
            _ => Err(AppError::BadRequest(format!("{label} must be a positive number"))),
        }
    }

    /// A JSON-encoded list. An absent or blank field is an empty list.
    pub fn json_list<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, AppError> {
        match self.text(name) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid JSON in field '{name}': {e}"))),
        }
    }

    /// A non-empty file field.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_trims_and_drops_blank() {
        let form = SubmittedForm::new()
            .with_field("name", "  Acme  ")
            .with_field("blank", "   ");
        assert_eq!(form.text("name"), Some("Acme"));
        assert_eq!(form.text("blank"), None);
        assert_eq!(form.text("missing"), None);
    }

    #[test]
    fn test_require_text_names_the_field() {
        let form = SubmittedForm::new();
        match form.require_text("title") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Missing required field: title"),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }

    #[test]
    fn test_require_number() {
        let form = SubmittedForm::new()
            .with_field("price", "1000")
            .with_field("zero", "0")
            .with_field("negative", "-5")
            .with_field("word", "ten")
            .with_field("inf", "inf");

        assert_eq!(form.require_number("price", "Price").unwrap(), 1000.0);
        assert_eq!(form.require_number("zero", "Zero").unwrap(), 0.0);
        for name in ["negative", "word", "inf"] {
            match form.require_number(name, "Price") {
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Price must be a positive number"),
                other => panic!("Expected BadRequest error, got: {:?}", other),
            }
        }
        assert!(form.require_number("missing", "Price").is_err());
    }

    #[test]
    fn test_json_list() {
        let form = SubmittedForm::new()
            .with_field("features", r#"["Live sessions", "Projects"]"#)
            .with_field("broken", r#"["unterminated"#);

        let features: Vec<String> = form.json_list("features").unwrap();
        assert_eq!(features, vec!["Live sessions", "Projects"]);

        let absent: Vec<String> = form.json_list("targetAudience").unwrap();
        assert!(absent.is_empty());

        match form.json_list::<String>("broken") {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Invalid JSON in field 'broken'")),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_files_are_dropped() {
        let form = SubmittedForm::new()
            .with_file("image", "", "application/octet-stream", vec![])
            .with_file("logo", "logo.png", "image/png", vec![1, 2, 3]);

        assert!(form.file("image").is_none());
        assert_eq!(form.file("logo").unwrap().file_name, "logo.png");
        assert!(form.check_file_types().is_ok());
    }

    #[test]
    fn test_non_image_files_are_rejected() {
        let form = SubmittedForm::new().with_file("logo", "notes.txt", "text/plain", b"hi".to_vec());
        match form.check_file_types() {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Only image files are allowed")),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }
}
