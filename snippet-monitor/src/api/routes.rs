//! Route handlers.

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};

use crate::api::server::AppState;
use crate::domain::RunAggregate;
use crate::render::render_html;

/// Report and run routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(report_page))
        .route("/api/zones", get(zones_json))
        .route("/api/run", post(trigger_run))
        .with_state(state)
}

/// Liveness route, kept apart so it can skip request tracing.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Fresh on-demand audit rendered as HTML.
async fn report_page(State(state): State<AppState>) -> Html<String> {
    let aggregate = state.service.on_demand().await;
    Html(render_html(&aggregate))
}

/// Fresh on-demand audit as JSON.
async fn zones_json(State(state): State<AppState>) -> Json<RunAggregate> {
    Json(state.service.on_demand().await)
}

/// Run the scheduled pipeline now and return its aggregate.
async fn trigger_run(State(state): State<AppState>) -> Json<RunAggregate> {
    Json(state.service.scheduled().await)
}

async fn health_check() -> &'static str {
    "ok"
}
