use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::error::AppError;

/// Runtime configuration.
///
/// Sources, later ones winning: built-in defaults, an optional TOML file,
/// then `COURSEDESK_*` environment variables (e.g. `COURSEDESK_ADMIN_SECRET`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    /// The single admin credential checked by the login endpoint.
    pub admin_secret: String,
    /// HMAC key for session tokens. Defaults to the admin secret.
    #[serde(default)]
    pub session_signing_key: Option<String>,
    /// Mark the session cookie `Secure` (enable behind TLS).
    pub secure_cookies: bool,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub s3_bucket: String,
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    /// Public base URL under which stored blobs are readable.
    pub blob_public_url: Url,
    #[serde(default)]
    pub deploy_hook_url: Option<Url>,
}

impl AppConfig {
    /// Load configuration from defaults, `path` (if it exists) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(Environment::with_prefix("COURSEDESK"));
        Self::from_builder(builder)
    }

    /// The key used to sign and verify session tokens.
    pub fn signing_key(&self) -> &str {
        self.session_signing_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.admin_secret)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, AppError> {
        let builder = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")
            .and_then(|b| b.set_default("secure_cookies", false))
            .and_then(|b| b.set_default("mongodb_uri", "mongodb://localhost:27017"))
            .and_then(|b| b.set_default("mongodb_database", "coursedesk"))
            .and_then(|b| b.set_default("s3_bucket", "coursedesk-uploads"))
            .map_err(config_error)?;
        Ok(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        if config.admin_secret.trim().is_empty() {
            return Err(AppError::Internal("admin_secret must not be empty".into()));
        }

        Ok(config)
    }
}

fn config_error(err: config::ConfigError) -> AppError {
    AppError::Internal(format!("Invalid configuration: {err}"))
}
