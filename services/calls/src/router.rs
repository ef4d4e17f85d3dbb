use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use carecall_core::health::{database_ready, healthz};
use carecall_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    call_log::{get_call_log, list_call_logs},
    dispatch::run_dispatch,
    preview::{preview_time, preview_translation},
    schedule::{cancel_schedule, create_schedule, get_schedule, list_schedules},
    test_call::place_test_call,
    webhook::receive_voice_event,
};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    database_ready(&state.db).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Schedules
        .route("/schedules", post(create_schedule))
        .route("/schedules", get(list_schedules))
        .route("/schedules/{id}", get(get_schedule))
        .route("/schedules/{id}/cancel", post(cancel_schedule))
        // Operator
        .route("/dispatch/run", post(run_dispatch))
        .route("/calls/test", post(place_test_call))
        // Call logs
        .route("/call-logs", get(list_call_logs))
        .route("/call-logs/{id}", get(get_call_log))
        // Provider webhook
        .route("/webhooks/voice", post(receive_voice_event))
        // Preview
        .route("/preview/time", post(preview_time))
        .route("/preview/translation", post(preview_translation))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
