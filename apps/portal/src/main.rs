use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use auth_cell::{FileTokenStorage, SessionStore};
use doctor_cell::DirectoryService;
use patient_cell::ProfileService;
use shared_config::PortalConfig;
use shared_utils::Notices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hospital portal");

    let config = Arc::new(PortalConfig::from_env());
    info!("Using backend at {}", config.backend_url);

    let directory = Arc::new(DirectoryService::new(&config));
    let profiles = Arc::new(ProfileService::new(&config));
    let session = Arc::new(SessionStore::new(
        Arc::new(FileTokenStorage::new(config.token_store_path.clone())),
        profiles.clone(),
        directory.clone(),
        Notices::new(),
    ));

    let restored = session.restore().await;
    info!("Session restored (authenticated: {})", restored.is_authenticated);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(config.clone(), session, directory, profiles)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
