// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::FilterRequestHandler;
use crate::domain::envelope::{FilterRequest, FilterResponse};

pub const APPLY_FILTER_PATH: &str = "/api/apply-filter";

pub struct AppState {
    pub handler: Arc<FilterRequestHandler>,
    pub start_time: Instant,
}

pub fn app(handler: Arc<FilterRequestHandler>) -> Router {
    let state = Arc::new(AppState {
        handler,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        .route(APPLY_FILTER_PATH, post(apply_filter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn apply_filter(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> (StatusCode, Json<FilterResponse>) {
    // An unreadable body carries no image URL
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(%rejection, "Unreadable filter request body");
            FilterRequest::default()
        }
    };

    let response = state.handler.handle(request).await;
    let status = StatusCode::from_u16(response.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}
