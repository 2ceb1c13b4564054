use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::models::{Course, Mentor, ProgramFee, ProgramFeature};
use crate::error::AppError;
use crate::forms::multipart::SubmittedForm;
use crate::forms::{require_image, resolve_image, upload, FormMapped};
use crate::storage::client::BlobStore;

const IMAGE_PREFIX: &str = "courses";
const MENTOR_PREFIX: &str = "mentors";

/// File field carrying the photo of the mentor at `index`.
pub fn mentor_image_field(index: usize) -> String {
    format!("mentor_image_{index}")
}

/// File field carrying the company logo of the mentor at `index`.
pub fn mentor_logo_field(index: usize) -> String {
    format!("mentor_logo_{index}")
}

/// A mentor as submitted in the `mentors` JSON field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    /// URL kept from an earlier save, if any.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub company_logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramFeeInput {
    #[serde(rename = "type", default)]
    pub tier: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub features: Vec<ProgramFeatureInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramFeatureInput {
    #[serde(default)]
    pub name: String,
    #[serde(default = "included_by_default")]
    pub included: bool,
}

fn included_by_default() -> bool {
    true
}

/// A fully validated course submission, before any file is uploaded.
#[derive(Debug)]
struct CourseDraft<'a> {
    title: String,
    /// Stored image URL to keep when no new image is sent.
    kept_image: Option<&'a str>,
    rating: f64,
    reviews: i64,
    duration: String,
    level: String,
    price: f64,
    discounted_price: f64,
    next_batch: String,
    category: String,
    description: String,
    features: Vec<String>,
    learning_outcomes: Vec<String>,
    career_opportunities: Vec<String>,
    target_audience: Vec<String>,
    mentors: Vec<Mentor>,
    program_fees: Vec<ProgramFee>,
}

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Trimmed entries of a submitted string list, blanks dropped.
fn non_blank(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_rating(form: &SubmittedForm) -> Result<f64, AppError> {
    let raw = form.require_text("rating")?;
    match raw.parse::<f64>() {
        Ok(r) if (0.0..=5.0).contains(&r) => Ok(r),
        _ => Err(bad_request("Rating must be between 0 and 5")),
    }
}

fn parse_reviews(form: &SubmittedForm) -> Result<i64, AppError> {
    let raw = form.require_text("reviews")?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= i64::MAX as f64 => Ok(n as i64),
        _ => Err(bad_request("Number of reviews must be a positive number")),
    }
}

fn parse_next_batch(form: &SubmittedForm) -> Result<String, AppError> {
    let raw = form.require_text("nextBatch")?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| bad_request("Next batch must be a date (YYYY-MM-DD)"))
}

fn validate_mentors(inputs: Vec<MentorInput>) -> Result<Vec<Mentor>, AppError> {
    if inputs.is_empty() {
        return Err(bad_request("Please add at least one mentor"));
    }

    inputs
        .into_iter()
        .map(|m| {
            let mentor = Mentor {
                name: m.name.trim().to_string(),
                role: m.role.trim().to_string(),
                company: m.company.trim().to_string(),
                description: m.description.trim().to_string(),
                image: blank_to_none(m.image),
                company_logo: blank_to_none(m.company_logo),
            };
            let complete = [&mentor.name, &mentor.role, &mentor.company, &mentor.description]
                .iter()
                .all(|f| !f.is_empty());
            if complete {
                Ok(mentor)
            } else {
                Err(bad_request("Please fill in all mentor details"))
            }
        })
        .collect()
}

/// Fill blank image slots from the stored mentor at the same position.
fn keep_mentor_images(mentors: &mut [Mentor], previous: &[Mentor]) {
    for (mentor, stored) in mentors.iter_mut().zip(previous) {
        if mentor.image.is_none() {
            mentor.image = stored.image.clone();
        }
        if mentor.company_logo.is_none() {
            mentor.company_logo = stored.company_logo.clone();
        }
    }
}

fn validate_program_fees(inputs: Vec<ProgramFeeInput>) -> Result<Vec<ProgramFee>, AppError> {
    if inputs.is_empty() {
        return Err(bad_request("Please add at least one program fee tier"));
    }

    inputs
        .into_iter()
        .map(|fee| {
            let tier = fee.tier.trim().to_string();
            if tier.is_empty() || !fee.price.is_finite() || fee.price <= 0.0 {
                return Err(bad_request("Please fill in all program fee details"));
            }

            let features: Vec<ProgramFeature> = fee
                .features
                .into_iter()
                .filter(|f| !f.name.trim().is_empty())
                .map(|f| ProgramFeature {
                    name: f.name.trim().to_string(),
                    included: f.included,
                })
                .collect();
            if features.is_empty() {
                return Err(bad_request("Each program fee must have at least one feature"));
            }

            Ok(ProgramFee {
                tier,
                price: fee.price,
                features,
            })
        })
        .collect()
}

impl<'a> CourseDraft<'a> {
    /// Every check that does not need the blob store.
    fn validate(form: &SubmittedForm, existing: Option<&'a Course>) -> Result<Self, AppError> {
        let title = form.require_text("title")?;
        let duration = form.require_text("duration")?;
        let level = form.require_text("level")?;
        let category = form.require_text("category")?;
        let description = form.require_text("description")?;

        let kept_image = require_image(
            form,
            "image",
            existing.map(|c| c.image.as_str()),
            "Please select a course image",
        )?;

        let rating = parse_rating(form)?;
        let reviews = parse_reviews(form)?;
        let price = form.require_number("price", "Price")?;
        let discounted_price = form.require_number("discountedPrice", "Discounted price")?;
        if discounted_price > price {
            return Err(bad_request("Discounted price cannot be higher than regular price"));
        }
        let next_batch = parse_next_batch(form)?;

        let features = non_blank(form.json_list("features")?);
        let learning_outcomes = non_blank(form.json_list("learningOutcomes")?);
        let career_opportunities = non_blank(form.json_list("careerOpportunities")?);
        let target_audience = non_blank(form.json_list("targetAudience")?);
        let mentors: Vec<MentorInput> = form.json_list("mentors")?;
        let program_fees: Vec<ProgramFeeInput> = form.json_list("programFees")?;

        if features.is_empty() {
            return Err(bad_request("Please add at least one feature"));
        }
        if learning_outcomes.is_empty() {
            return Err(bad_request("Please add at least one learning outcome"));
        }
        let mut mentors = validate_mentors(mentors)?;
        if let Some(previous) = existing {
            keep_mentor_images(&mut mentors, &previous.mentors);
        }
        let program_fees = validate_program_fees(program_fees)?;

        Ok(Self {
            title,
            kept_image,
            rating,
            reviews,
            duration,
            level,
            price,
            discounted_price,
            next_batch,
            category,
            description,
            features,
            learning_outcomes,
            career_opportunities,
            target_audience,
            mentors,
            program_fees,
        })
    }

    /// Upload attached files and build the document.
    async fn assemble(self, form: &SubmittedForm, blobs: &dyn BlobStore) -> Result<Course, AppError> {
        let image = resolve_image(form, "image", self.kept_image, blobs, IMAGE_PREFIX).await?;

        let mut mentors = self.mentors;
        for (index, mentor) in mentors.iter_mut().enumerate() {
            if let Some(file) = form.file(&mentor_image_field(index)) {
                mentor.image = Some(upload(blobs, MENTOR_PREFIX, file).await?);
            }
            if let Some(file) = form.file(&mentor_logo_field(index)) {
                mentor.company_logo = Some(upload(blobs, MENTOR_PREFIX, file).await?);
            }
        }

        Ok(Course {
            record_id: None,
            id: 0,
            title: self.title,
            image,
            rating: self.rating,
            reviews: self.reviews,
            duration: self.duration,
            level: self.level,
            price: self.price,
            discounted_price: self.discounted_price,
            next_batch: self.next_batch,
            category: self.category,
            description: self.description,
            features: self.features,
            learning_outcomes: self.learning_outcomes,
            career_opportunities: self.career_opportunities,
            target_audience: self.target_audience,
            mentors,
            program_fees: self.program_fees,
        })
    }
}

#[async_trait]
impl FormMapped for Course {
    async fn from_form(
        form: &SubmittedForm,
        existing: Option<&Self>,
        blobs: &dyn BlobStore,
    ) -> Result<Self, AppError> {
        CourseDraft::validate(form, existing)?
            .assemble(form, blobs)
            .await
    }
}
