// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Caption endpoint tests for POST /v1/caption and POST /v1/caption/upload
//!
//! These tests verify that the handlers correctly:
//! - Validate requests and return appropriate errors
//! - Reject unsupported upload file types
//! - Return 503 when the vision model is unavailable
//! - Return the caption and description on the happy path

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

use memocap::api::http_server::{build_router, AppState};
use memocap::compose::{CaptionComposer, ComposeOutcome};
use memocap::pipeline::CaptionPipeline;
use memocap::vision::describer::{DescribeOutcome, ImageDescriber};

/// Create a 100x100 gray PNG as raw bytes
fn test_png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(100, 100, |_, _| Rgb([128u8, 128u8, 128u8]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

struct StubDescriber {
    available: bool,
}

#[async_trait]
impl ImageDescriber for StubDescriber {
    async fn describe(&self, _image: &DynamicImage) -> DescribeOutcome {
        DescribeOutcome::Described("a red apple on a table".to_string())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

struct StubComposer;

#[async_trait]
impl CaptionComposer for StubComposer {
    async fn compose(&self, _description: &str, memory: &str) -> ComposeOutcome {
        ComposeOutcome::Composed(format!("A caption about: {}", memory))
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

fn json_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/caption")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Hand-built multipart body with a photo part and an optional memory part
fn multipart_request(file_name: &str, photo: &[u8], memory: Option<&str>) -> Request<Body> {
    let boundary = "test-boundary-7f3a";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(photo);
    body.extend_from_slice(b"\r\n");
    if let Some(memory) = memory {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"memory\"\r\n\r\n{memory}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v1/caption/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_caption_happy_path() {
    let app = build_router(test_state(true));
    let image = STANDARD.encode(test_png_bytes());

    let response = app
        .oneshot(json_request(serde_json::json!({
            "image": image,
            "memory": "first harvest"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["description"], "a red apple on a table");
    assert_eq!(body["caption"], "A caption about: first harvest");
    assert_eq!(body["captionDegraded"], false);
    assert_eq!(body["descriptionDegraded"], false);
    assert_eq!(body["model"], "gemini-1.5-flash");
}

#[tokio::test]
async fn test_caption_missing_image_is_400() {
    let app = build_router(test_state(true));

    let response = app
        .oneshot(json_request(serde_json::json!({ "memory": "first harvest" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_caption_invalid_base64_is_400() {
    let app = build_router(test_state(true));

    let response = app
        .oneshot(json_request(serde_json::json!({
            "image": "not valid base64!!!",
            "memory": "first harvest"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_caption_unavailable_model_is_503() {
    let app = build_router(test_state(false));
    let image = STANDARD.encode(test_png_bytes());

    let response = app
        .oneshot(json_request(serde_json::json!({
            "image": image,
            "memory": "first harvest"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(response).await;
    assert_eq!(body["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_upload_happy_path() {
    let app = build_router(test_state(true));

    let response = app
        .oneshot(multipart_request(
            "photo.png",
            &test_png_bytes(),
            Some("first harvest"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["caption"], "A caption about: first harvest");
}

#[tokio::test]
async fn test_upload_blank_memory_uses_default() {
    let app = build_router(test_state(true));

    let response = app
        .oneshot(multipart_request("photo.png", &test_png_bytes(), Some("   ")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["caption"], "A caption about: My favourite moment.");
}

#[tokio::test]
async fn test_upload_unsupported_extension_is_400() {
    let app = build_router(test_state(true));

    let response = app
        .oneshot(multipart_request(
            "photo.gif",
            &test_png_bytes(),
            Some("first harvest"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_upload_body_over_two_megabytes_accepted() {
    // Bodies between axum's 2 MiB extractor default and the 10 MB image
    // cap must still reach the handler
    let app = build_router(test_state(true));

    let png = test_png_bytes();
    let boundary = "test-boundary-7f3a";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"photo.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&png);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"memory\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice("first harvest".as_bytes());
    body.extend_from_slice(b"\r\n");
    // Unknown field pushing the body past 2 MiB; the handler skips it
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"padding\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(&vec![b'a'; 3 * 1024 * 1024]);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    assert!(body.len() > 2 * 1024 * 1024);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/caption/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["caption"], "A caption about: first harvest");
}

#[tokio::test]
async fn test_upload_missing_photo_is_400() {
    let app = build_router(test_state(true));

    let boundary = "test-boundary-7f3a";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"memory\"\r\n\r\nfirst harvest\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/v1/caption/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
