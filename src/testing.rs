//! In-memory stand-ins for the database, blob store and deploy hook.
//!
//! Used by unit tests and by the router tests under `tests/`, which run
//! without Docker. The MongoDB and S3 implementations have their own
//! container-backed tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::api::deploy::DeployHook;
use crate::db::entity::{Entity, EntityRef, ListOrder};
use crate::db::models::{Course, Mentor, ProgramFee, ProgramFeature, RecordId};
use crate::db::repository::{EntityRepository, Repositories};
use crate::error::AppError;
use crate::storage::client::BlobStore;

/// Vec-backed repository. Documents keep insertion order internally.
pub struct InMemoryRepository<T: Entity> {
    documents: Mutex<Vec<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, AppError> {
        self.documents
            .lock()
            .map_err(|_| AppError::Internal(format!("{} store lock poisoned", T::KIND)))
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for InMemoryRepository<T> {
    async fn find_all(&self) -> Result<Vec<T>, AppError> {
        let mut documents = self.lock()?.clone();
        match T::KIND.list_order() {
            ListOrder::SequenceAsc => documents.sort_by_key(|d| d.sequence()),
            ListOrder::NewestFirst => documents.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            ListOrder::Insertion => {}
        }
        Ok(documents)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<T>, AppError> {
        self.find(EntityRef::Record(id)).await
    }

    async fn find_by_sequence(&self, seq: i64) -> Result<Option<T>, AppError> {
        self.find(EntityRef::Sequence(seq)).await
    }

    async fn max_sequence(&self) -> Result<Option<i64>, AppError> {
        Ok(self.lock()?.iter().filter_map(|d| d.sequence()).max())
    }

    async fn insert(&self, mut doc: T) -> Result<T, AppError> {
        doc.set_record_id(RecordId::new());
        self.lock()?.push(doc.clone());
        Ok(doc)
    }

    async fn replace(&self, target: EntityRef, mut doc: T) -> Result<Option<T>, AppError> {
        let mut documents = self.lock()?;
        let Some(slot) = documents.iter_mut().find(|d| d.matches(&target)) else {
            return Ok(None);
        };
        if let Some(id) = slot.record_id() {
            doc.set_record_id(id);
        }
        *slot = doc.clone();
        Ok(Some(doc))
    }

    async fn delete(&self, target: EntityRef) -> Result<Option<T>, AppError> {
        let mut documents = self.lock()?;
        Ok(documents
            .iter()
            .position(|d| d.matches(&target))
            .map(|index| documents.remove(index)))
    }

    async fn find(&self, target: EntityRef) -> Result<Option<T>, AppError> {
        Ok(self.lock()?.iter().find(|d| d.matches(&target)).cloned())
    }
}

/// Repositories for every kind, all in memory and empty.
pub fn in_memory_repositories() -> Repositories {
    Repositories {
        courses: Arc::new(InMemoryRepository::new()),
        partners: Arc::new(InMemoryRepository::new()),
        cert_partners: Arc::new(InMemoryRepository::new()),
        experts: Arc::new(InMemoryRepository::new()),
        testimonials: Arc::new(InMemoryRepository::new()),
        enquiries: Arc::new(InMemoryRepository::new()),
        queries: Arc::new(InMemoryRepository::new()),
    }
}

/// An object written to a [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// Blob store that records what it was given and serves it from
/// `https://blobs.test/<key>`.
#[derive(Default)]
pub struct MemoryBlobStore {
    stored: Mutex<Vec<StoredBlob>>,
    failing: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails.
    pub fn failing() -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn stored(&self) -> Vec<StoredBlob> {
        self.stored.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, key: &str, content_type: &str, content: Vec<u8>) -> Result<String, AppError> {
        if self.failing {
            return Err(AppError::Storage(format!("Refusing to store '{key}'")));
        }
        self.stored
            .lock()
            .map_err(|_| AppError::Internal("blob store lock poisoned".into()))?
            .push(StoredBlob {
                key: key.to_string(),
                content_type: content_type.to_string(),
                size: content.len(),
            });
        Ok(format!("https://blobs.test/{key}"))
    }
}

/// Deploy hook that counts how often it fired.
#[derive(Default)]
pub struct RecordingDeployHook {
    triggered: AtomicUsize,
    failing: bool,
}

impl RecordingDeployHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook whose every trigger fails as an unreachable endpoint would.
    pub fn failing() -> Self {
        Self {
            triggered: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn count(&self) -> usize {
        self.triggered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeployHook for RecordingDeployHook {
    async fn trigger(&self) -> Result<(), AppError> {
        self.triggered.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Upstream("Failed to trigger deployment".into()));
        }
        Ok(())
    }
}

/// A complete, valid course with sequential id `seq`.
pub fn sample_course(seq: i64) -> Course {
    Course {
        record_id: None,
        id: seq,
        title: format!("Rust for Backend Engineers #{seq}"),
        image: "https://blobs.test/courses/1-rust.png".into(),
        rating: 4.5,
        reviews: 120,
        duration: "12 weeks".into(),
        level: "Intermediate".into(),
        price: 1000.0,
        discounted_price: 800.0,
        next_batch: "2026-11-02".into(),
        category: "Programming".into(),
        description: "Ship production services in Rust.".into(),
        features: vec!["Live sessions".into()],
        learning_outcomes: vec!["Write async services".into()],
        career_opportunities: vec!["Backend engineer".into()],
        target_audience: vec!["Working developers".into()],
        mentors: vec![Mentor {
            name: "Ada".into(),
            role: "Staff Engineer".into(),
            company: "Initech".into(),
            description: "Ten years of systems work".into(),
            image: None,
            company_logo: None,
        }],
        program_fees: vec![ProgramFee {
            tier: "Self-paced".into(),
            price: 800.0,
            features: vec![ProgramFeature {
                name: "Recordings".into(),
                included: true,
            }],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CertPartner, Enquiry};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_find_all_orders_by_sequence() {
        let repo = InMemoryRepository::<Course>::new();
        for seq in [3, 1, 2] {
            repo.insert(sample_course(seq)).await.unwrap();
        }
        let ids: Vec<i64> = repo.find_all().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_find_all_orders_leads_newest_first() {
        let repo = InMemoryRepository::<Enquiry>::new();
        let now = Utc::now();
        for (name, age) in [("old", 2), ("new", 0), ("mid", 1)] {
            repo.insert(Enquiry {
                record_id: None,
                name: name.into(),
                email: format!("{name}@example.com"),
                phone: "5550101".into(),
                college: None,
                course_title: "Rust".into(),
                accept_terms: true,
                created_at: now - Duration::hours(age),
            })
            .await
            .unwrap();
        }
        let names: Vec<String> = repo.find_all().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_replace_keeps_record_id() {
        let repo = InMemoryRepository::<CertPartner>::new();
        let stored = repo
            .insert(CertPartner {
                record_id: None,
                name: "ISO Board".into(),
                logo: "a.png".into(),
            })
            .await
            .unwrap();
        let id = stored.record_id.unwrap();

        let replaced = repo
            .replace(
                EntityRef::Record(id),
                CertPartner {
                    record_id: None,
                    name: "ISO Council".into(),
                    logo: "b.png".into(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.record_id, Some(id));
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().name, "ISO Council");
    }

    #[tokio::test]
    async fn test_failing_doubles() {
        assert!(MemoryBlobStore::failing().store("k", "image/png", vec![1]).await.is_err());

        let hook = RecordingDeployHook::failing();
        assert!(hook.trigger().await.is_err());
        assert_eq!(hook.count(), 1);
    }
}
