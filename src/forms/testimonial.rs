use async_trait::async_trait;

use crate::db::models::Testimonial;
use crate::error::AppError;
use crate::forms::multipart::SubmittedForm;
use crate::forms::{require_image, resolve_image, FormMapped};
use crate::storage::client::BlobStore;

#[async_trait]
impl FormMapped for Testimonial {
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError> {
        let name = form.require_text("name")?;
        let role = form.require_text("role")?;
        let company = form.require_text("company")?;
        let course = form.require_text("course")?;
        let testimonial = form.require_text("testimonial")?;
        let kept_image = require_image(
            form,
            "image",
            existing.map(|t| t.image.as_str()),
            "Please select an image",
        )?;

        let image = resolve_image(form, "image", kept_image, blobs, "testimonials").await?;

        Ok(Testimonial {
            record_id: None,
            id: 0,
            name,
            role,
            company,
            course,
            testimonial,
            image,
        })
    }
}
