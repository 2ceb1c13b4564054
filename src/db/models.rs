use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Database-assigned document identifier (`_id`).
///
/// Stored as a BSON ObjectId; rendered as a 24-digit hex string in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub ObjectId);

impl RecordId {
    pub fn new() -> Self {
        RecordId(ObjectId::new())
    }

    /// Parse a 24-digit hex string.
    pub fn parse(raw: &str) -> Option<Self> {
        ObjectId::parse_str(raw).ok().map(RecordId)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.0.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Oid(ObjectId),
        }

        if !deserializer.is_human_readable() {
            return ObjectId::deserialize(deserializer).map(RecordId);
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(hex) => ObjectId::parse_str(&hex)
                .map(RecordId)
                .map_err(serde::de::Error::custom),
            Repr::Oid(oid) => Ok(RecordId(oid)),
        }
    }
}

/// `createdAt` timestamps: BSON dates in the database, RFC 3339 in JSON.
mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            value.serialize(serializer)
        } else {
            bson::DateTime::from_chrono(*value).serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        if deserializer.is_human_readable() {
            DateTime::<Utc>::deserialize(deserializer)
        } else {
            bson::DateTime::deserialize(deserializer).map(|d| d.to_chrono())
        }
    }
}

/// A course offered on the marketing site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    /// Sequential display identifier.
    pub id: i64,
    pub title: String,
    pub image: String,
    pub rating: f64,
    pub reviews: i64,
    pub duration: String,
    pub level: String,
    pub price: f64,
    pub discounted_price: f64,
    /// Start date of the next batch (`YYYY-MM-DD`).
    pub next_batch: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub career_opportunities: Vec<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub mentors: Vec<Mentor>,
    #[serde(default)]
    pub program_fees: Vec<ProgramFee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
    pub name: String,
    pub role: String,
    pub company: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
}

/// One pricing tier of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFee {
    #[serde(rename = "type")]
    pub tier: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<ProgramFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFeature {
    pub name: String,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub id: i64,
    pub name: String,
    pub logo: String,
}

/// Certification partner. Unlike [`Partner`] it has no sequential id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertPartner {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub id: i64,
    pub name: String,
    pub role: String,
    pub company: String,
    pub experience: String,
    pub linkedin: String,
    pub image: String,
    pub company_logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub id: i64,
    pub name: String,
    pub role: String,
    pub company: String,
    pub course: String,
    pub testimonial: String,
    pub image: String,
}

/// A course enquiry submitted on the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    pub course_title: String,
    #[serde(default)]
    pub accept_terms: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A contact-form message submitted on the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}
