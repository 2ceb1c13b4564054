use axum_extra::extract::{CookieJar, WithRejection};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::crud::Ack;
use crate::app::AppState;
use crate::auth::guard::AdminSession;
use crate::auth::session::{removal_cookie, session_cookie};
use crate::error::AppError;

/// The single configured admin credential.
///
/// Only a SHA-256 digest is kept; candidates are hashed and compared in
/// constant time so the comparison does not leak a matching prefix.
#[derive(Clone)]
pub struct AdminSecret {
    digest: [u8; 32],
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

impl AdminSecret {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.digest[..].ct_eq(&candidate[..]).into()
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// Answer of the session check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub success: bool,
    pub is_authenticated: bool,
    /// Epoch milliseconds of the refreshed activity stamp.
    pub last_activity: i64,
}

/// Check `password` and, on a match, mint a session token.
///
/// Every mismatch is answered the same way; there is no lockout.
pub fn authenticate(state: &AppState, password: &str) -> Result<String, AppError> {
    if !state.admin_secret.matches(password) {
        tracing::warn!("admin login rejected");
        return Err(AppError::Auth("Invalid password".into()));
    }
    tracing::info!("admin logged in");
    state.session_keys.issue(Utc::now())
}

/// `POST /api/admin/auth` sets the session cookie on a correct password.
pub async fn login_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    jar: CookieJar,
    WithRejection(axum::Json(req), _): WithRejection<axum::Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, axum::Json<Ack>), AppError> {
    let token = authenticate(&state, &req.password)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));
    Ok((jar, axum::Json(Ack::ok())))
}

/// `POST /api/admin/logout` discards the session cookie.
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, axum::Json<Ack>) {
    (jar.add(removal_cookie()), axum::Json(Ack::ok()))
}

/// `GET /api/admin/session`: page-load check.
///
/// Runs the guard and re-issues the token stamped now, sliding the
/// inactivity window forward.
pub async fn session_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    _session: AdminSession,
    jar: CookieJar,
) -> Result<(CookieJar, axum::Json<SessionStatus>), AppError> {
    let now = Utc::now();
    let token = state.session_keys.issue(now)?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    Ok((
        jar,
        axum::Json(SessionStatus {
            success: true,
            is_authenticated: true,
            last_activity: now.timestamp_millis(),
        }),
    ))
}
