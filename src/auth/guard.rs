use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::app::AppState;
use crate::auth::session::{SessionClaims, SESSION_COOKIE};
use crate::error::AppError;

/// Proof that the request carries a live admin session.
///
/// Taking this extractor as a handler argument is what guards a route:
/// requests without a valid, unexpired session cookie are answered with
/// `401 { success: false, message }` before the handler runs.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: SessionClaims,
}

impl<S> FromRequestParts<S> for AdminSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| AppError::Auth("Unauthorized".into()))?;

        let claims = state
            .session_keys
            .validate(cookie.value(), Utc::now())
            .inspect_err(|e| tracing::warn!(path = %parts.uri.path(), "admin request rejected: {e}"))?;

        Ok(Self { claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};
    use chrono::Duration;

    fn parts_with_cookie(cookie: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/admin/courses");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let state = AppState::in_memory("s3cret");
        let mut parts = parts_with_cookie(None);

        match AdminSession::from_request_parts(&mut parts, &state).await {
            Err(AppError::Auth(msg)) => assert_eq!(msg, "Unauthorized"),
            other => panic!("Expected Auth error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_cookie_passes() {
        let state = AppState::in_memory("s3cret");
        let token = state.session_keys.issue(Utc::now()).unwrap();
        let mut parts = parts_with_cookie(Some(format!("{SESSION_COOKIE}={token}")));

        let session = AdminSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(session.claims.is_authenticated);
    }

    #[tokio::test]
    async fn test_idle_session_is_rejected() {
        let state = AppState::in_memory("s3cret");
        let token = state
            .session_keys
            .issue(Utc::now() - Duration::seconds(1801))
            .unwrap();
        let mut parts = parts_with_cookie(Some(format!("{SESSION_COOKIE}={token}")));

        match AdminSession::from_request_parts(&mut parts, &state).await {
            Err(AppError::Auth(msg)) => assert_eq!(msg, "Session expired"),
            other => panic!("Expected Auth error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forged_cookie_is_rejected() {
        let state = AppState::in_memory("s3cret");
        let forged = crate::auth::session::SessionKeys::from_secret("guess")
            .issue(Utc::now())
            .unwrap();
        let mut parts = parts_with_cookie(Some(format!("{SESSION_COOKIE}={forged}")));

        assert!(matches!(
            AdminSession::from_request_parts(&mut parts, &state).await,
            Err(AppError::Auth(_))
        ));
    }
}
