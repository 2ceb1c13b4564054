use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "admin-session";

/// A session with no activity for longer than this is expired.
pub const INACTIVITY_WINDOW_SECS: i64 = 30 * 60;

/// Payload of the signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub is_authenticated: bool,
    /// Epoch milliseconds of the last successful guard check or login.
    pub last_activity: i64,
    /// Hard expiry (epoch seconds), mirrors the cookie max-age.
    pub exp: i64,
}

impl SessionClaims {
    /// Fresh authenticated claims stamped at `now`.
    pub fn authenticated_at(now: DateTime<Utc>) -> Self {
        Self {
            is_authenticated: true,
            last_activity: now.timestamp_millis(),
            exp: now.timestamp() + INACTIVITY_WINDOW_SECS,
        }
    }

    /// Milliseconds elapsed since the last recorded activity.
    pub fn idle_millis(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis() - self.last_activity
    }
}

/// Signs and verifies session tokens (HS256).
///
/// The token is self-contained: no server-side session store exists, the
/// expiry is an attribute of the payload.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a session that was active at `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        encode(
            &Header::new(Algorithm::HS256),
            &SessionClaims::authenticated_at(now),
            &self.encoding,
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))
    }

    /// Check a token against the inactivity window.
    ///
    /// Rejects tokens that fail to decode or verify, that are not
    /// authenticated, or whose last activity is more than
    /// [`INACTIVITY_WINDOW_SECS`] before `now`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is judged below against `now`, without leeway.
        validation.validate_exp = false;

        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!("rejected session token: {e}");
                AppError::Auth("Invalid session".into())
            })?
            .claims;

        if !claims.is_authenticated || claims.idle_millis(now) > INACTIVITY_WINDOW_SECS * 1000 {
            return Err(AppError::Auth("Session expired".into()));
        }

        Ok(claims)
    }
}

/// Build the cookie that carries `token` to the client.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(INACTIVITY_WINDOW_SECS))
        .build()
}

/// A cookie that, once added to a jar, discards the session on the client.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .removal()
        .build()
}
