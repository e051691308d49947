//! Server entry point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bhorti_config::Settings;
use bhorti_llm::ModelRegistry;
use bhorti_server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with env-filter; RUST_LOG overrides the default.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bhorti_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    tracing::info!(
        save_dir = %settings.paths.save_dir,
        reasoning = %settings.models.reasoning.model,
        answer = %settings.models.answer.model,
        "settings loaded"
    );

    let registry = Arc::new(ModelRegistry::from_config(
        &settings.models,
        std::path::Path::new(&settings.paths.save_dir),
    )?);

    let state = AppState::new(settings.clone(), registry);
    state.try_autoload();

    let router = create_router(state);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
