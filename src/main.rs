use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use coursedesk::api::deploy::HttpDeployHook;
use coursedesk::app::{build_router, AppState};
use coursedesk::auth::login::AdminSecret;
use coursedesk::auth::session::SessionKeys;
use coursedesk::config::AppConfig;
use coursedesk::db::repository::Repositories;
use coursedesk::storage::client::S3BlobStore;

/// Admin back-office API for the course-marketing site.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Optional TOML configuration file; `COURSEDESK_*` variables override it.
    #[arg(long, env = "COURSEDESK_CONFIG", default_value = "coursedesk.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursedesk=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load(Some(args.config.as_path())).context("Failed to load configuration")?;

    tracing::info!("Starting coursedesk...");

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo_db = mongo_client.database(&config.mongodb_database);
    tracing::info!(database = %config.mongodb_database, "MongoDB client initialized");

    // Connect to S3
    let blob_store = S3BlobStore::connect(
        config.s3_bucket.clone(),
        config.s3_endpoint.as_deref(),
        config.blob_public_url.clone(),
    )
    .await;
    tracing::info!(bucket = %config.s3_bucket, "S3 blob store initialized");

    if config.deploy_hook_url.is_none() {
        tracing::warn!("No deploy hook URL configured; deploy requests will fail");
    }
    let deploy_hook = HttpDeployHook::new(reqwest::Client::new(), config.deploy_hook_url.clone());

    let state = AppState {
        repos: Repositories::mongo(&mongo_db),
        blob_store: Arc::new(blob_store),
        deploy_hook: Arc::new(deploy_hook),
        session_keys: SessionKeys::from_secret(config.signing_key()),
        admin_secret: AdminSecret::new(&config.admin_secret),
        secure_cookies: config.secure_cookies,
    };

    let app = build_router(state);

    tracing::info!("Listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
