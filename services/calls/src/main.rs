use std::sync::Arc;

use sea_orm::Database;
use tokio::sync::watch;
use tracing::info;

use carecall_calls::config::CallsConfig;
use carecall_calls::infra::llm::OpenAiCompatibleClient;
use carecall_calls::infra::vapi::VapiGateway;
use carecall_calls::router::build_router;
use carecall_calls::state::AppState;
use carecall_calls::worker::run_dispatcher;
use carecall_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = CallsConfig::from_env().expect("invalid configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let llm = OpenAiCompatibleClient::new(config.llm.clone()).expect("failed to build LLM client");
    let voice =
        VapiGateway::new(config.voice.clone()).expect("failed to build voice provider client");
    if config.voice.api_key.is_none() {
        tracing::warn!("VAPI_API_KEY is not set; calls will fail until it is configured");
    }

    let http_addr = format!("0.0.0.0:{}", config.calls_port);
    let state = AppState {
        db,
        config: Arc::new(config),
        llm,
        voice,
    };

    // Dispatcher
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_dispatcher(state.clone(), shutdown_rx));

    // HTTP server
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("calls service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .expect("server error");

    let _ = shutdown_tx.send(true);
    let _ = worker.await;
}
