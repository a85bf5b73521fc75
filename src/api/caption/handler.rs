// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption endpoint handlers

use axum::extract::{Multipart, State};
use axum::Json;
use image::DynamicImage;
use tracing::info;

use super::request::{validate_file_name, CaptionRequest, DEFAULT_MEMORY};
use super::response::CaptionResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::PipelineError;
use crate::vision::image_utils::{decode_base64_image, decode_image_bytes};

/// POST /v1/caption - Generate a caption from a base64 image and a memory
///
/// Describes the image with BLIP, then blends the description with the
/// user's memory via the generative model.
pub async fn caption_handler(
    State(state): State<AppState>,
    Json(request): Json<CaptionRequest>,
) -> Result<Json<CaptionResponse>, ApiError> {
    request.validate()?;

    // validate() guarantees image is present
    let encoded = request.image.as_deref().unwrap_or_default();
    let (image, info) = decode_base64_image(encoded)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    info!(
        "Caption request: {}x{} {:?}",
        info.width, info.height, info.format
    );

    run_pipeline(&state, &image, request.effective_memory()).await
}

/// POST /v1/caption/upload - Multipart variant used by the web form
///
/// Expects a `photo` file part (jpg/jpeg/png) and an optional `memory`
/// text part.
pub async fn caption_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CaptionResponse>, ApiError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut memory: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("photo") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                validate_file_name(&file_name)?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read photo: {}", e)))?;
                image_bytes = Some(bytes.to_vec());
            }
            Some("memory") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read memory: {}", e)))?;
                memory = Some(text);
            }
            _ => {}
        }
    }

    let bytes = image_bytes.ok_or_else(|| ApiError::ValidationError {
        field: "photo".to_string(),
        message: "photo file is required".to_string(),
    })?;

    let (image, info) =
        decode_image_bytes(&bytes).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    info!(
        "Caption upload: {}x{} {:?}",
        info.width, info.height, info.format
    );

    let memory = memory.unwrap_or_default();
    let memory = match memory.trim() {
        "" => DEFAULT_MEMORY.to_string(),
        trimmed => trimmed.to_string(),
    };

    run_pipeline(&state, &image, &memory).await
}

async fn run_pipeline(
    state: &AppState,
    image: &DynamicImage,
    memory: &str,
) -> Result<Json<CaptionResponse>, ApiError> {
    let run = state.pipeline.run(image, memory).await.map_err(|e| match e {
        PipelineError::DescriberUnavailable => {
            ApiError::ServiceUnavailable("Image description model is not available".to_string())
        }
    })?;

    Ok(Json(CaptionResponse::from_run(&run, &state.compose_model)))
}
