use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::deploy::DeployHook;
use crate::api::{crud, delete::delete_handler, deploy::deploy_handler};
use crate::auth::login::{login_handler, logout_handler, session_handler, AdminSecret};
use crate::auth::session::SessionKeys;
use crate::db::models::{CertPartner, Course, Enquiry, Expert, Partner, Query, Testimonial};
use crate::db::repository::Repositories;
use crate::storage::client::BlobStore;

/// Upper bound for a whole form submission, all images included.
const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub blob_store: Arc<dyn BlobStore>,
    pub deploy_hook: Arc<dyn DeployHook>,
    pub session_keys: SessionKeys,
    pub admin_secret: AdminSecret,
    pub secure_cookies: bool,
}

impl AppState {
    /// State over in-memory collaborators, for tests and local experiments.
    pub fn in_memory(admin_secret: &str) -> Self {
        Self {
            repos: crate::testing::in_memory_repositories(),
            blob_store: Arc::new(crate::testing::MemoryBlobStore::new()),
            deploy_hook: Arc::new(crate::testing::RecordingDeployHook::new()),
            session_keys: SessionKeys::from_secret(admin_secret),
            admin_secret: AdminSecret::new(admin_secret),
            secure_cookies: false,
        }
    }
}

/// `GET /health`
async fn health() -> &'static str {
    "ok"
}

/// Build the HTTP router: auth endpoints, per-kind CRUD, shared delete,
/// deploy and health.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/admin/auth", post(login_handler))
        .route("/api/admin/logout", post(logout_handler))
        .route("/api/admin/session", get(session_handler))
        .route(
            "/api/admin/courses",
            get(crud::list::<Course>)
                .post(crud::create::<Course>)
                .put(crud::update::<Course>),
        )
        .route("/api/admin/courses/{id}", get(crud::get::<Course>))
        .route(
            "/api/admin/partners",
            get(crud::list::<Partner>)
                .post(crud::create::<Partner>)
                .put(crud::update::<Partner>),
        )
        .route("/api/admin/partners/{id}", get(crud::get::<Partner>))
        .route(
            "/api/admin/certpartners",
            get(crud::list::<CertPartner>)
                .post(crud::create::<CertPartner>)
                .put(crud::update::<CertPartner>),
        )
        .route("/api/admin/certpartners/{id}", get(crud::get::<CertPartner>))
        .route(
            "/api/admin/experts",
            get(crud::list::<Expert>)
                .post(crud::create::<Expert>)
                .put(crud::update::<Expert>),
        )
        .route("/api/admin/experts/{id}", get(crud::get::<Expert>))
        .route(
            "/api/admin/testimonials",
            get(crud::list::<Testimonial>)
                .post(crud::create::<Testimonial>)
                .put(crud::update::<Testimonial>),
        )
        .route("/api/admin/testimonials/{id}", get(crud::get::<Testimonial>))
        .route("/api/admin/enquiries", get(crud::list::<Enquiry>))
        .route("/api/admin/enquiries/{id}", get(crud::get::<Enquiry>))
        .route("/api/admin/queries", get(crud::list::<Query>))
        .route("/api/admin/queries/{id}", get(crud::get::<Query>))
        .route("/api/admin/delete", delete(delete_handler))
        .route("/api/admin/deploy", post(deploy_handler))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
