use axum::extract::{Multipart, Path, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Serialize;

use crate::app::AppState;
use crate::auth::guard::AdminSession;
use crate::db::entity::{Entity, EntityRef};
use crate::db::repository::{next_sequence, EntityRepository};
use crate::error::AppError;
use crate::forms::multipart::SubmittedForm;
use crate::forms::FormMapped;
use crate::storage::client::BlobStore;

/// `{ "success": true }`
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Body of a successful create or update: `{ success: true, <key>: doc }`.
pub fn written<T: Entity>(doc: &T) -> Result<serde_json::Value, AppError> {
    let doc = serde_json::to_value(doc)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {e}", T::KIND)))?;

    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), serde_json::Value::Bool(true));
    body.insert(T::KIND.response_key().to_string(), doc);
    Ok(serde_json::Value::Object(body))
}

/// Load the document `raw_id` addresses, or fail with not-found.
pub async fn find_entity<T: Entity>(repo: &dyn EntityRepository<T>, raw_id: &str) -> Result<T, AppError> {
    let found = match EntityRef::parse(T::KIND, raw_id) {
        Some(target) => repo.find(target).await?,
        None => None,
    };
    found.ok_or_else(|| AppError::NotFound(format!("{} not found", T::KIND)))
}

/// Map a create form and insert it, assigning the next sequential id.
pub async fn create_entity<T: FormMapped>(
    repo: &dyn EntityRepository<T>,
    blobs: &dyn BlobStore,
    form: &SubmittedForm,
) -> Result<T, AppError> {
    let mut doc = T::from_form(form, None, blobs).await?;
    if T::KIND.is_sequential() {
        doc.set_sequence(next_sequence(repo).await?);
    }

    let stored = repo.insert(doc).await?;
    tracing::info!(
        kind = %T::KIND,
        id = ?stored.record_id().map(|id| id.to_string()),
        seq = ?stored.sequence(),
        "created document"
    );
    Ok(stored)
}

/// Map an update form over the stored document named by its `id` field and
/// replace that document in full.
///
/// The database identifier and sequential id of the stored document are
/// carried over; everything else comes from the form.
pub async fn update_entity<T: FormMapped>(
    repo: &dyn EntityRepository<T>,
    blobs: &dyn BlobStore,
    form: &SubmittedForm,
) -> Result<T, AppError> {
    let raw_id = form
        .text("id")
        .ok_or_else(|| AppError::BadRequest("Missing required field: id".into()))?;
    let existing = find_entity(repo, raw_id).await?;
    let record_id = existing.record_id().ok_or_else(|| {
        AppError::Internal(format!("Stored {} has no database identifier", T::KIND))
    })?;

    let mut doc = T::from_form(form, Some(&existing), blobs).await?;
    doc.set_record_id(record_id);
    if let Some(seq) = existing.sequence() {
        doc.set_sequence(seq);
    }

    let stored = repo
        .replace(EntityRef::Record(record_id), doc)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", T::KIND)))?;
    tracing::info!(kind = %T::KIND, id = %record_id, "updated document");
    Ok(stored)
}

/// `GET /api/admin/<kind>`
pub async fn list<T: Entity>(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Vec<T>>, AppError> {
    let docs = T::repository(&state.repos).find_all().await?;
    Ok(Json(docs))
}

/// `GET /api/admin/<kind>/{id}`
pub async fn get<T: Entity>(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<T>, AppError> {
    let repo = T::repository(&state.repos);
    let doc = find_entity(repo.as_ref(), &id).await?;
    Ok(Json(doc))
}

/// `POST /api/admin/<kind>` (multipart)
pub async fn create<T: FormMapped>(
    State(state): State<AppState>,
    _session: AdminSession,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<serde_json::Value>, AppError> {
    let form = SubmittedForm::from_multipart(multipart).await?;
    let repo = T::repository(&state.repos);
    let doc = create_entity(repo.as_ref(), state.blob_store.as_ref(), &form).await?;
    Ok(Json(written(&doc)?))
}

/// `PUT /api/admin/<kind>` (multipart, with an `id` field)
pub async fn update<T: FormMapped>(
    State(state): State<AppState>,
    _session: AdminSession,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<serde_json::Value>, AppError> {
    let form = SubmittedForm::from_multipart(multipart).await?;
    let repo = T::repository(&state.repos);
    let doc = update_entity(repo.as_ref(), state.blob_store.as_ref(), &form).await?;
    Ok(Json(written(&doc)?))
}
