use std::sync::Arc;

use anyhow::Context;
use leetnotes_lib::config::Config;
use leetnotes_lib::services::{
    LlmSolutionGenerator, QuotaService, SolutionCache, SolutionService, SystemClock,
};
use leetnotes_lib::{api, db, AppState};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting LeetNotes server");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Data directory: {:?}", config.data_dir);

    let pool = db::init_database(config.data_dir.clone())
        .context("Failed to initialize database")?;
    tracing::info!("Database initialized");

    let quota_service = Arc::new(QuotaService::new(
        pool.clone(),
        config.plan_limits.clone(),
        Arc::new(SystemClock),
    ));
    let solution_cache = Arc::new(
        SolutionCache::standard(pool.clone(), &config.cache, config.redis_url.as_deref()).await,
    );

    if config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY not set, cache misses will fail with 503");
    }
    let generator = Arc::new(LlmSolutionGenerator::new(config.llm.clone()));
    let solution_service = Arc::new(SolutionService::new(
        quota_service.clone(),
        solution_cache.clone(),
        generator,
    ));

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState {
        pool,
        config,
        quota_service,
        solution_cache,
        solution_service,
    });

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("LeetNotes server listening on http://{}", bind_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("LeetNotes server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
