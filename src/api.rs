// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::coordinator::Coordinator;
use crate::sensor::{SensorView, WikipediaSensor};

#[derive(Clone)]
pub struct AppState {
    pub sensor: WikipediaSensor,
    pub coordinator: Arc<Coordinator>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/sensor", get(get_sensor))
        .route("/api/refresh", post(refresh_now))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn get_sensor(State(state): State<AppState>) -> Json<SensorView> {
    Json(state.sensor.render())
}

/// Run one refresh now, serialized with the scheduler.
async fn refresh_now(State(state): State<AppState>) -> Response {
    match state.coordinator.refresh().await {
        Ok(()) => {
            let view = state.sensor.render();
            tracing::info!(target: "api", state = %view.state, "manual refresh");
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(e) => {
            tracing::warn!(target: "api", error = %e, "manual refresh failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
