use async_trait::async_trait;

use crate::db::models::{CertPartner, Partner};
use crate::error::AppError;
use crate::forms::multipart::SubmittedForm;
use crate::forms::{require_image, resolve_image, FormMapped};
use crate::storage::client::BlobStore;

/// Name and logo URL, shared by partners and certification partners.
async fn name_and_logo(
    form: &SubmittedForm,
    kept_logo: Option<&str>,
    blobs: &dyn BlobStore,
    prefix: &str,
) -> Result<(String, String), AppError> {
    let name = form.require_text("name")?;
    let kept_logo = require_image(form, "logo", kept_logo, "Please select a logo")?;

    let logo = resolve_image(form, "logo", kept_logo, blobs, prefix).await?;
    Ok((name, logo))
}

#[async_trait]
impl FormMapped for Partner {
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError> {
        let (name, logo) =
            name_and_logo(form, existing.map(|p| p.logo.as_str()), blobs, "partners").await?;
        Ok(Partner {
            record_id: None,
            id: 0,
            name,
            logo,
        })
    }
}

#[async_trait]
impl FormMapped for CertPartner {
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError> {
        let (name, logo) =
            name_and_logo(form, existing.map(|p| p.logo.as_str()), blobs, "certpartners").await?;
        Ok(CertPartner {
            record_id: None,
            name,
            logo,
        })
    }
}
