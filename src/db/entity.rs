use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::models::{
    CertPartner, Course, Enquiry, Expert, Partner, Query, RecordId, Testimonial,
};
use crate::db::repository::{EntityRepository, Repositories};

/// Every kind of document the back-office manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    Partner,
    CertPartner,
    Expert,
    Testimonial,
    Enquiry,
    Query,
}

/// How a kind's list endpoint orders its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Sequential `id` ascending.
    SequenceAsc,
    /// `createdAt` descending, newest first.
    NewestFirst,
    /// Insertion order.
    Insertion,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Course,
        EntityKind::Partner,
        EntityKind::CertPartner,
        EntityKind::Expert,
        EntityKind::Testimonial,
        EntityKind::Enquiry,
        EntityKind::Query,
    ];

    /// Parse the discriminator used by the shared delete endpoint (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "course" => Some(EntityKind::Course),
            "partner" => Some(EntityKind::Partner),
            "certpartner" => Some(EntityKind::CertPartner),
            "expert" => Some(EntityKind::Expert),
            "testimonial" => Some(EntityKind::Testimonial),
            "enquiry" => Some(EntityKind::Enquiry),
            "query" => Some(EntityKind::Query),
            _ => None,
        }
    }

    /// MongoDB collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Course => "courses",
            EntityKind::Partner => "partners",
            EntityKind::CertPartner => "certpartners",
            EntityKind::Expert => "experts",
            EntityKind::Testimonial => "testimonials",
            EntityKind::Enquiry => "enquiries",
            EntityKind::Query => "queries",
        }
    }

    /// Key wrapping the document in `{ success, <key>: doc }` write responses.
    pub fn response_key(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Partner => "partner",
            EntityKind::CertPartner => "certPartner",
            EntityKind::Expert => "expert",
            EntityKind::Testimonial => "testimonial",
            EntityKind::Enquiry => "enquiry",
            EntityKind::Query => "query",
        }
    }

    /// Whether documents carry a sequential display `id`.
    pub fn is_sequential(&self) -> bool {
        matches!(
            self,
            EntityKind::Course | EntityKind::Partner | EntityKind::Expert | EntityKind::Testimonial
        )
    }

    /// Leads are created by the public site; the admin may only read and delete them.
    pub fn is_read_only(&self) -> bool {
        matches!(self, EntityKind::Enquiry | EntityKind::Query)
    }

    pub fn list_order(&self) -> ListOrder {
        if self.is_read_only() {
            ListOrder::NewestFirst
        } else if self.is_sequential() {
            ListOrder::SequenceAsc
        } else {
            ListOrder::Insertion
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Course => "course",
            EntityKind::Partner => "partner",
            EntityKind::CertPartner => "certpartner",
            EntityKind::Expert => "expert",
            EntityKind::Testimonial => "testimonial",
            EntityKind::Enquiry => "enquiry",
            EntityKind::Query => "query",
        };
        write!(f, "{label}")
    }
}

/// How a request addresses one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// The database identifier (`_id`).
    Record(RecordId),
    /// The sequential display identifier (`id`).
    Sequence(i64),
}

impl EntityRef {
    /// Resolve a raw identifier for `kind`.
    ///
    /// A 24-digit hex string names the database identifier; a positive
    /// integer names the sequential id of kinds that have one. Returns
    /// `None` for anything else, which can never match a document.
    pub fn parse(kind: EntityKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(id) = RecordId::parse(raw) {
            return Some(EntityRef::Record(id));
        }
        if !kind.is_sequential() {
            return None;
        }
        match raw.parse::<i64>() {
            Ok(seq) if seq > 0 => Some(EntityRef::Sequence(seq)),
            _ => None,
        }
    }
}

/// Descriptor tying a document type to its kind and repository.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + Unpin + 'static
{
    const KIND: EntityKind;

    fn record_id(&self) -> Option<RecordId>;

    fn set_record_id(&mut self, id: RecordId);

    /// Sequential display id, for kinds that carry one.
    fn sequence(&self) -> Option<i64> {
        None
    }

    fn set_sequence(&mut self, _seq: i64) {}

    /// Creation time, for kinds listed newest first.
    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn repository(repos: &Repositories) -> Arc<dyn EntityRepository<Self>>;

    /// Whether `target` addresses this document.
    fn matches(&self, target: &EntityRef) -> bool {
        match target {
            EntityRef::Record(id) => self.record_id() == Some(*id),
            EntityRef::Sequence(seq) => self.sequence() == Some(*seq),
        }
    }
}

macro_rules! sequential_entity {
    ($ty:ty, $kind:expr, $field:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn record_id(&self) -> Option<RecordId> {
                self.record_id
            }

            fn set_record_id(&mut self, id: RecordId) {
                self.record_id = Some(id);
            }

            fn sequence(&self) -> Option<i64> {
                Some(self.id)
            }

            fn set_sequence(&mut self, seq: i64) {
                self.id = seq;
            }

            fn repository(repos: &Repositories) -> Arc<dyn EntityRepository<Self>> {
                repos.$field.clone()
            }
        }
    };
}

sequential_entity!(Course, EntityKind::Course, courses);
sequential_entity!(Partner, EntityKind::Partner, partners);
sequential_entity!(Expert, EntityKind::Expert, experts);
sequential_entity!(Testimonial, EntityKind::Testimonial, testimonials);

impl Entity for CertPartner {
    const KIND: EntityKind = EntityKind::CertPartner;

    fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    fn repository(repos: &Repositories) -> Arc<dyn EntityRepository<Self>> {
        repos.cert_partners.clone()
    }
}

impl Entity for Enquiry {
    const KIND: EntityKind = EntityKind::Enquiry;

    fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn repository(repos: &Repositories) -> Arc<dyn EntityRepository<Self>> {
        repos.enquiries.clone()
    }
}

impl Entity for Query {
    const KIND: EntityKind = EntityKind::Query;

    fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn repository(repos: &Repositories) -> Arc<dyn EntityRepository<Self>> {
        repos.queries.clone()
    }
}
