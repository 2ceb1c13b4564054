#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};

use coursedesk::app::{build_router, AppState};
use coursedesk::auth::login::AdminSecret;
use coursedesk::auth::session::SessionKeys;
use coursedesk::testing::{in_memory_repositories, MemoryBlobStore, RecordingDeployHook};

pub const ADMIN_SECRET: &str = "test-admin-secret";

/// The full router over in-memory collaborators.
///
/// The state, blob store and deploy hook are kept so tests can seed data
/// and inspect side effects.
pub struct TestApp {
    pub state: AppState,
    pub blobs: Arc<MemoryBlobStore>,
    pub deploy_hook: Arc<RecordingDeployHook>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MemoryBlobStore::new(), RecordingDeployHook::new())
    }

    /// An app whose blob store refuses every upload.
    pub fn with_failing_blob_store() -> Self {
        Self::build(MemoryBlobStore::failing(), RecordingDeployHook::new())
    }

    /// An app whose deploy hook is unreachable.
    pub fn with_failing_deploy_hook() -> Self {
        Self::build(MemoryBlobStore::new(), RecordingDeployHook::failing())
    }

    fn build(blobs: MemoryBlobStore, deploy_hook: RecordingDeployHook) -> Self {
        let blobs = Arc::new(blobs);
        let deploy_hook = Arc::new(deploy_hook);
        let state = AppState {
            repos: in_memory_repositories(),
            blob_store: blobs.clone(),
            deploy_hook: deploy_hook.clone(),
            session_keys: SessionKeys::from_secret(ADMIN_SECRET),
            admin_secret: AdminSecret::new(ADMIN_SECRET),
            secure_cookies: false,
        };
        let router = build_router(state.clone());

        Self {
            state,
            blobs,
            deploy_hook,
            router,
        }
    }

    /// Build an `axum_test::TestServer` from this app's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
    }
}

/// Log in with the configured secret; the session cookie is saved on `server`.
pub async fn login(server: &axum_test::TestServer) {
    server
        .post("/api/admin/auth")
        .json(&serde_json::json!({ "password": ADMIN_SECRET }))
        .await
        .assert_status_ok();
}

/// A minimal 1x1 PNG.
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, // bit depth, color type, CRC
        0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, // IDAT chunk
        0x08, 0xD7, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, // compressed data
        0x00, 0x02, 0x00, 0x01, 0xE2, 0x21, 0xBC, 0x33, // CRC
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
        0xAE, 0x42, 0x60, 0x82,
    ]
}

pub fn png_part(file_name: &str) -> Part {
    Part::bytes(png_bytes())
        .file_name(file_name.to_string())
        .mime_type("image/png")
}

/// Course scalar fields and nested lists, without any file.
pub fn course_fields(title: &str, price: &str, discounted_price: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("rating", "4.5")
        .add_text("reviews", "120")
        .add_text("duration", "12 weeks")
        .add_text("level", "Intermediate")
        .add_text("price", price.to_string())
        .add_text("discountedPrice", discounted_price.to_string())
        .add_text("nextBatch", "2026-11-02")
        .add_text("category", "Programming")
        .add_text("description", "Ship production services in Rust.")
        .add_text("features", r#"["Live sessions","Code reviews"]"#)
        .add_text("learningOutcomes", r#"["Write async services"]"#)
        .add_text("careerOpportunities", r#"["Backend engineer"]"#)
        .add_text("targetAudience", "[]")
        .add_text(
            "mentors",
            r#"[{"name":"Ada","role":"Staff Engineer","company":"Initech","description":"Ten years of systems work"}]"#,
        )
        .add_text(
            "programFees",
            r#"[{"type":"Self-paced","price":800,"features":[{"name":"Recordings","included":true},{"name":"Mentoring","included":false}]}]"#,
        )
}

/// A complete course create form, image included.
pub fn course_form(title: &str, price: &str, discounted_price: &str) -> MultipartForm {
    course_fields(title, price, discounted_price).add_part("image", png_part("cover.png"))
}
