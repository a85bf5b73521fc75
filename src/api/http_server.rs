// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: routing, state, health, graceful shutdown

use axum::{
    extract::{DefaultBodyLimit, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::caption::{caption_handler, caption_upload_handler};
use super::ui::INDEX_HTML;
use crate::pipeline::CaptionPipeline;
use crate::version::VERSION;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Request body cap: the image limit plus base64/multipart overhead
const MAX_BODY_SIZE: usize = MAX_IMAGE_SIZE + MAX_IMAGE_SIZE / 2;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CaptionPipeline>,
    pub compose_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub describer_available: bool,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Web UI
        .route("/", get(index_handler))
        // Health check
        .route("/health", get(health_handler))
        // Caption endpoints
        .route("/v1/caption", post(caption_handler))
        .route("/v1/caption/upload", post(caption_upload_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until ctrl-c
pub async fn serve(state: AppState, listen_addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let describer_available = state.pipeline.describer_available();
    axum::Json(HealthResponse {
        status: if describer_available {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: VERSION.to_string(),
        describer_available,
    })
}
