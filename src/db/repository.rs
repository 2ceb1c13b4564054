use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};

use crate::db::entity::{Entity, EntityKind, EntityRef, ListOrder};
use crate::db::models::{
    CertPartner, Course, Enquiry, Expert, Partner, Query, RecordId, Testimonial,
};
use crate::error::AppError;

/// Persistence access for one entity kind.
///
/// Each operation is a single-document write or a read; there is no
/// transaction spanning calls. This trait allows mocking the database
/// layer in tests.
#[async_trait]
pub trait EntityRepository<T: Entity>: Send + Sync {
    /// All documents, in the kind's list order.
    async fn find_all(&self) -> Result<Vec<T>, AppError>;

    /// Find a document by its database identifier.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<T>, AppError>;

    /// Find a document by its sequential display identifier.
    async fn find_by_sequence(&self, seq: i64) -> Result<Option<T>, AppError>;

    /// Highest sequential id currently stored, if any.
    async fn max_sequence(&self) -> Result<Option<i64>, AppError>;

    /// Insert a new document and return it with its database identifier set.
    async fn insert(&self, doc: T) -> Result<T, AppError>;

    /// Replace the addressed document in full. Returns the stored document,
    /// or `None` if nothing matched.
    async fn replace(&self, target: EntityRef, doc: T) -> Result<Option<T>, AppError>;

    /// Delete the addressed document. Returns it, or `None` if nothing matched.
    async fn delete(&self, target: EntityRef) -> Result<Option<T>, AppError>;

    async fn find(&self, target: EntityRef) -> Result<Option<T>, AppError> {
        match target {
            EntityRef::Record(id) => self.find_by_id(id).await,
            EntityRef::Sequence(seq) => self.find_by_sequence(seq).await,
        }
    }
}

/// Compute the sequential id for a new document: one above the current
/// maximum, or `1` for an empty collection.
///
/// Read-then-write with no atomic counter: two concurrent creates can
/// observe the same maximum and produce a duplicate id.
pub async fn next_sequence<T: Entity>(repo: &dyn EntityRepository<T>) -> Result<i64, AppError> {
    let next = repo.max_sequence().await?.map(|max| max + 1).unwrap_or(1);
    tracing::debug!(kind = %T::KIND, next, "assigned sequential id");
    Ok(next)
}

/// One repository per entity kind.
#[derive(Clone)]
pub struct Repositories {
    pub courses: Arc<dyn EntityRepository<Course>>,
    pub partners: Arc<dyn EntityRepository<Partner>>,
    pub cert_partners: Arc<dyn EntityRepository<CertPartner>>,
    pub experts: Arc<dyn EntityRepository<Expert>>,
    pub testimonials: Arc<dyn EntityRepository<Testimonial>>,
    pub enquiries: Arc<dyn EntityRepository<Enquiry>>,
    pub queries: Arc<dyn EntityRepository<Query>>,
}

impl Repositories {
    /// MongoDB-backed repositories sharing one database handle.
    pub fn mongo(db: &mongodb::Database) -> Self {
        Self {
            courses: Arc::new(MongoRepository::new(db)),
            partners: Arc::new(MongoRepository::new(db)),
            cert_partners: Arc::new(MongoRepository::new(db)),
            experts: Arc::new(MongoRepository::new(db)),
            testimonials: Arc::new(MongoRepository::new(db)),
            enquiries: Arc::new(MongoRepository::new(db)),
            queries: Arc::new(MongoRepository::new(db)),
        }
    }

    /// Delete one document of `kind` addressed by `raw_id`.
    pub async fn delete(&self, kind: EntityKind, raw_id: &str) -> Result<(), AppError> {
        let deleted = match kind {
            EntityKind::Course => delete_one(self.courses.as_ref(), raw_id).await?,
            EntityKind::Partner => delete_one(self.partners.as_ref(), raw_id).await?,
            EntityKind::CertPartner => delete_one(self.cert_partners.as_ref(), raw_id).await?,
            EntityKind::Expert => delete_one(self.experts.as_ref(), raw_id).await?,
            EntityKind::Testimonial => delete_one(self.testimonials.as_ref(), raw_id).await?,
            EntityKind::Enquiry => delete_one(self.enquiries.as_ref(), raw_id).await?,
            EntityKind::Query => delete_one(self.queries.as_ref(), raw_id).await?,
        };

        if !deleted {
            return Err(AppError::NotFound(format!("{kind} not found")));
        }

        tracing::info!(%kind, id = raw_id, "deleted document");
        Ok(())
    }
}

async fn delete_one<T: Entity>(repo: &dyn EntityRepository<T>, raw_id: &str) -> Result<bool, AppError> {
    let Some(target) = EntityRef::parse(T::KIND, raw_id) else {
        return Ok(false);
    };
    Ok(repo.delete(target).await?.is_some())
}

/// MongoDB implementation of [`EntityRepository`], one collection per kind.
pub struct MongoRepository<T: Entity> {
    collection: mongodb::Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(T::KIND.collection()),
        }
    }
}

fn filter_for(target: EntityRef) -> Document {
    match target {
        EntityRef::Record(id) => doc! { "_id": id.0 },
        EntityRef::Sequence(seq) => doc! { "id": seq },
    }
}

fn sort_for(order: ListOrder) -> Document {
    match order {
        ListOrder::SequenceAsc => doc! { "id": 1 },
        ListOrder::NewestFirst => doc! { "createdAt": -1 },
        ListOrder::Insertion => doc! { "_id": 1 },
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for MongoRepository<T> {
    async fn find_all(&self) -> Result<Vec<T>, AppError> {
        use futures::TryStreamExt;

        let mut cursor = self
            .collection
            .find(doc! {})
            .sort(sort_for(T::KIND.list_order()))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut documents = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            documents.push(doc);
        }

        Ok(documents)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<T>, AppError> {
        self.collection
            .find_one(doc! { "_id": id.0 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_sequence(&self, seq: i64) -> Result<Option<T>, AppError> {
        if !T::KIND.is_sequential() {
            return Ok(None);
        }
        self.collection
            .find_one(doc! { "id": seq })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn max_sequence(&self) -> Result<Option<i64>, AppError> {
        if !T::KIND.is_sequential() {
            return Ok(None);
        }
        let highest = self
            .collection
            .find_one(doc! {})
            .sort(doc! { "id": -1 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(highest.and_then(|d| d.sequence()))
    }

    async fn insert(&self, mut doc: T) -> Result<T, AppError> {
        let result = self
            .collection
            .insert_one(&doc)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let oid = result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::Database(format!(
                "{} insert returned a non-ObjectId _id",
                T::KIND
            ))
        })?;
        doc.set_record_id(RecordId(oid));

        Ok(doc)
    }

    async fn replace(&self, target: EntityRef, doc: T) -> Result<Option<T>, AppError> {
        use mongodb::options::ReturnDocument;

        self.collection
            .find_one_and_replace(filter_for(target), &doc)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, target: EntityRef) -> Result<Option<T>, AppError> {
        self.collection
            .find_one_and_delete(filter_for(target))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
