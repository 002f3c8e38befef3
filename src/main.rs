use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use study_planner::{
    api::{AppState, create_router},
    config::{Config, LoggingConfig},
    llm_providers::LLMProviderFactory,
    log_system_event,
    plan_client::PlanRequestClient,
    session_service::SessionService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let _guard = setup_logging(&LoggingConfig::from_env())?;

    let config = Config::from_env()?;
    config.validate()?;

    log_system_event!(startup, component = "server", "Starting Study Planner server");

    let provider = LLMProviderFactory::from_config(&config.llm)?;
    let plan_client =
        PlanRequestClient::with_content_limit(Arc::new(provider), config.planner.max_content_chars);

    info!(
        provider = plan_client.provider_name(),
        model = plan_client.model_name(),
        "Initialized plan client"
    );

    let state = AppState {
        session_service: SessionService::with_idle_ttl(
            plan_client,
            Duration::from_secs(config.planner.session_idle_ttl_secs),
        ),
    };

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = config.server.address();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_system_event!(shutdown, component = "server", "Study Planner server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn setup_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = logging.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
    });

    // File output with daily rotation, no ANSI colors
    let (file_layer, guard) = if logging.file_enabled {
        std::fs::create_dir_all(&logging.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create log directory: {}", e);
        });
        let file_appender =
            tracing_appender::rolling::daily(&logging.log_directory, "study-planner.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        log_directory = %logging.log_directory,
        file_enabled = logging.file_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
