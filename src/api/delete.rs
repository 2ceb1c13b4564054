use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::api::crud::Ack;
use crate::db::entity::EntityKind;
use crate::db::repository::Repositories;
use crate::error::AppError;

/// Body of the shared delete endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: Option<String>,
    /// Entity-kind discriminator (`course`, `partner`, `certpartner`, ...).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Core delete logic, separated from the HTTP layer for testability.
pub async fn process_delete(repos: &Repositories, request: DeleteRequest) -> Result<Ack, AppError> {
    let id = request.id.as_deref().map(str::trim).unwrap_or_default();
    let kind = request.kind.as_deref().map(str::trim).unwrap_or_default();
    if id.is_empty() || kind.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }

    let kind = EntityKind::from_str_ci(kind).ok_or_else(|| {
        tracing::warn!(kind, "delete requested for unknown type");
        AppError::BadRequest("Invalid type specified".into())
    })?;

    repos.delete(kind, id).await?;
    Ok(Ack::ok())
}

/// `DELETE /api/admin/delete`
pub async fn delete_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    _session: crate::auth::guard::AdminSession,
    WithRejection(axum::Json(request), _): WithRejection<axum::Json<DeleteRequest>, AppError>,
) -> Result<axum::Json<Ack>, AppError> {
    let ack = process_delete(&state.repos, request).await?;
    Ok(axum::Json(ack))
}
