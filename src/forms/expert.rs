use async_trait::async_trait;
use url::Url;

use crate::db::models::Expert;
use crate::error::AppError;
use crate::forms::multipart::SubmittedForm;
use crate::forms::{require_image, resolve_image, FormMapped};
use crate::storage::client::BlobStore;

const PREFIX: &str = "experts";

/// Absolute http(s) URL of the expert's LinkedIn profile, stored as submitted.
fn parse_linkedin(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(raw.to_string()),
        _ => Err(AppError::BadRequest(
            "LinkedIn profile must be a valid URL".to_string(),
        )),
    }
}

#[async_trait]
impl FormMapped for Expert {
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError> {
        let name = form.require_text("name")?;
        let role = form.require_text("role")?;
        let company = form.require_text("company")?;
        let experience = form.require_text("experience")?;
        let linkedin = parse_linkedin(&form.require_text("linkedin")?)?;

        let kept_image = require_image(
            form,
            "image",
            existing.map(|e| e.image.as_str()),
            "Please select an image",
        )?;
        let kept_logo = require_image(
            form,
            "companyLogo",
            existing.map(|e| e.company_logo.as_str()),
            "Please select a company logo",
        )?;

        let image = resolve_image(form, "image", kept_image, blobs, PREFIX).await?;
        let company_logo = resolve_image(form, "companyLogo", kept_logo, blobs, PREFIX).await?;

        Ok(Expert {
            record_id: None,
            id: 0,
            name,
            role,
            company,
            experience,
            linkedin,
            image,
            company_logo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::MockBlobStore;

    fn expert_form() -> SubmittedForm {
        SubmittedForm::new()
            .with_field("name", "Grace")
            .with_field("role", "Principal Engineer")
            .with_field("company", "Hooli")
            .with_field("experience", "15 years")
            .with_field("linkedin", "https://www.linkedin.com/in/grace")
    }

    #[test]
    fn test_parse_linkedin() {
        assert!(parse_linkedin("https://www.linkedin.com/in/grace").is_ok());
        assert!(parse_linkedin("linkedin.com/in/grace").is_err());
        assert!(parse_linkedin("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_linkedin_is_stored_as_submitted() {
        assert_eq!(
            parse_linkedin("https://www.linkedin.com").unwrap(),
            "https://www.linkedin.com"
        );
        assert_eq!(
            parse_linkedin(" https://www.linkedin.com/in/Grace?trk=x ").unwrap(),
            "https://www.linkedin.com/in/Grace?trk=x"
        );
    }

    #[tokio::test]
    async fn test_expert_requires_both_images_on_create() {
        let mut blobs = MockBlobStore::new();
        blobs.expect_store().never();

        let form = expert_form().with_file("image", "grace.jpg", "image/jpeg", vec![1]);
        match Expert::from_form(&form, None, &blobs).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Please select a company logo"),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expert_uploads_both_images() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_store()
            .times(2)
            .returning(|key, _, _| Ok(format!("https://blobs.test/{key}")));

        let form = expert_form()
            .with_file("image", "grace.jpg", "image/jpeg", vec![1])
            .with_file("companyLogo", "hooli.png", "image/png", vec![2]);
        let expert = Expert::from_form(&form, None, &blobs).await.unwrap();

        assert!(expert.image.ends_with("-grace.jpg"));
        assert!(expert.company_logo.ends_with("-hooli.png"));
        assert_eq!(expert.linkedin, "https://www.linkedin.com/in/grace");
    }

    #[tokio::test]
    async fn test_expert_update_replaces_only_sent_image() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_store()
            .withf(|key, _, _| key.ends_with("-hooli-2.png"))
            .times(1)
            .returning(|key, _, _| Ok(format!("https://blobs.test/{key}")));

        let existing = Expert {
            record_id: None,
            id: 3,
            name: "Grace".into(),
            role: "Engineer".into(),
            company: "Hooli".into(),
            experience: "14 years".into(),
            linkedin: "https://www.linkedin.com/in/grace".into(),
            image: "https://blobs.test/experts/1-grace.jpg".into(),
            company_logo: "https://blobs.test/experts/1-hooli.png".into(),
        };
        let form = expert_form().with_file("companyLogo", "hooli-2.png", "image/png", vec![3]);
        let expert = Expert::from_form(&form, Some(&existing), &blobs).await.unwrap();

        assert_eq!(expert.image, existing.image);
        assert!(expert.company_logo.ends_with("-hooli-2.png"));
        assert_eq!(expert.role, "Principal Engineer");
    }
}
