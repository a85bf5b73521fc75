// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Health endpoint tests for GET /health

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::DynamicImage;
use std::sync::Arc;
use tower::ServiceExt;

use memocap::api::http_server::{build_router, AppState};
use memocap::compose::{CaptionComposer, ComposeOutcome};
use memocap::pipeline::CaptionPipeline;
use memocap::vision::describer::{DescribeOutcome, ImageDescriber};

struct StubDescriber {
    available: bool,
}

#[async_trait]
impl ImageDescriber for StubDescriber {
    async fn describe(&self, _image: &DynamicImage) -> DescribeOutcome {
        DescribeOutcome::Described("a gray square".to_string())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

struct StubComposer;

#[async_trait]
impl CaptionComposer for StubComposer {
    async fn compose(&self, _description: &str, _memory: &str) -> ComposeOutcome {
        ComposeOutcome::Composed("A caption.".to_string())
    }
}

fn test_state(describer_available: bool) -> AppState {
    let pipeline = CaptionPipeline::new(
        Arc::new(StubDescriber {
            available: describer_available,
        }),
        Arc::new(StubComposer),
    );
    AppState {
        pipeline: Arc::new(pipeline),
        compose_model: "gemini-1.5-flash".to_string(),
    }
}

async fn get_health(state: AppState) -> (StatusCode, serde_json::Value) {
    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_when_model_loaded() {
    let (status, body) = get_health(test_state(true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["describerAvailable"], true);
}

#[tokio::test]
async fn test_health_when_model_missing() {
    let (status, body) = get_health(test_state(false)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["describerAvailable"], false);
}

#[tokio::test]
async fn test_index_serves_ui() {
    let app = build_router(test_state(true));
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Memory Caption Generator"));
}
