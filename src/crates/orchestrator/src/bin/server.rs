//! datalab server binary.
//!
//! Wires the service container together: settings, gateways, registry with
//! its eviction loop, the coordinator, and the axum router.

use orchestrator::api::{create_router, AppState};
use orchestrator::{Settings, TaskRegistry, TaskService};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    tooling::logging::init_logging(&settings.log_level);

    tracing::info!("Loading configuration");
    let settings = Arc::new(settings);
    tracing::info!(
        planning_model = %settings.planning_llm.model,
        code_generation_model = %settings.code_generation_llm.model,
        answering_model = %settings.answering_llm.model,
        "Models configured"
    );
    if settings.api_key.is_empty() {
        tracing::warn!("API_KEY is not configured, authentication is disabled");
    }

    let models = settings.node_models()?;
    let sandbox = sandbox::SandboxClient::new(settings.sandbox.clone())?;

    let registry = TaskRegistry::new();
    let _cleanup = registry.spawn_cleanup(settings.cleanup_interval(), settings.expiry());

    let service = Arc::new(TaskService::new(
        models,
        sandbox,
        registry.clone(),
        settings.clone(),
    ));

    let state = AppState {
        service,
        registry,
        settings: settings.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!("Starting datalab server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("datalab server shut down gracefully");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
