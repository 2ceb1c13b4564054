use async_trait::async_trait;
use url::Url;

use crate::api::crud::Ack;
use crate::error::AppError;

const DEPLOY_FAILED: &str = "Failed to trigger deployment";

/// External build hook that republishes the public site.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeployHook: Send + Sync {
    async fn trigger(&self) -> Result<(), AppError>;
}

/// Deploy hook reached with a bodiless `POST` to a configured URL.
pub struct HttpDeployHook {
    client: reqwest::Client,
    url: Option<Url>,
}

impl HttpDeployHook {
    /// `url` may be unset, in which case every trigger fails.
    pub fn new(client: reqwest::Client, url: Option<Url>) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl DeployHook for HttpDeployHook {
    async fn trigger(&self) -> Result<(), AppError> {
        let Some(url) = &self.url else {
            tracing::error!("deploy requested but no deploy hook URL is configured");
            return Err(AppError::Upstream(DEPLOY_FAILED.into()));
        };

        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, "deploy hook request failed");
                AppError::Upstream(DEPLOY_FAILED.into())
            })?;

        tracing::info!(status = %response.status(), "deployment triggered");
        Ok(())
    }
}

/// `POST /api/admin/deploy`
pub async fn deploy_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    _session: crate::auth::guard::AdminSession,
) -> Result<axum::Json<Ack>, AppError> {
    state.deploy_hook.trigger().await?;
    Ok(axum::Json(Ack::ok()))
}
