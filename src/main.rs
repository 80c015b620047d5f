use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ecoguard::{build_router, AppState, Config, GeminiClient, SessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecoguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("refusing to start without configuration")?;
    tracing::debug!("Loaded {:?}", config);

    let client = GeminiClient::new(&config)?;
    tracing::info!("Using model {}", client.model());

    let sessions = Arc::new(SessionStore::new(config.session_ttl, config.max_sessions));
    let _sweeper = sessions.spawn_sweeper((config.session_ttl / 4).max(Duration::from_secs(1)));

    let app = build_router(AppState::with_sessions(Arc::new(client), sessions));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
