use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use rental_web::{app, AppState};
use rental_store::{app_config::Config, RestClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_web=debug,rental_store=debug,rental_order=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting rental web on port {}, backend {}", config.server.port, config.api.base_url);

    let backend = RestClient::new(&config.api).context("Failed to build backend client")?;
    let state = AppState::from_backend(Arc::new(backend), &config.cache, &config.session);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
