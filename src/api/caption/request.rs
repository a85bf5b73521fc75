// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// File extensions the upload form accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Maximum image size (10MB base64 encoded)
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Memory used when the user leaves the field blank
pub const DEFAULT_MEMORY: &str = "My favourite moment.";

fn default_memory() -> String {
    DEFAULT_MEMORY.to_string()
}

/// Request for a photo caption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    /// Base64-encoded image data
    #[serde(default)]
    pub image: Option<String>,

    /// Personal memory to blend into the caption
    #[serde(default = "default_memory")]
    pub memory: String,
}

impl CaptionRequest {
    /// Validate the caption request
    pub fn validate(&self) -> Result<(), ApiError> {
        // Validate image is provided
        if self.image.as_ref().map(|s| s.is_empty()).unwrap_or(true) {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }

        // Validate image size
        if let Some(ref image) = self.image {
            if image.len() > MAX_IMAGE_SIZE {
                return Err(ApiError::ValidationError {
                    field: "image".to_string(),
                    message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
                });
            }
        }

        Ok(())
    }

    /// Memory to use for composition, falling back when blank
    pub fn effective_memory(&self) -> &str {
        let trimmed = self.memory.trim();
        if trimmed.is_empty() {
            DEFAULT_MEMORY
        } else {
            trimmed
        }
    }
}

/// Check an uploaded file name against the supported extensions
pub fn validate_file_name(file_name: &str) -> Result<(), ApiError> {
    let extension = file_name
        .rsplit('.')
        .next()
        .filter(|ext| *ext != file_name)
        .map(|ext| ext.to_lowercase());

    match extension {
        Some(ref ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ApiError::ValidationError {
            field: "photo".to_string(),
            message: format!(
                "unsupported file type for '{}', supported: {:?}",
                file_name, SUPPORTED_EXTENSIONS
            ),
        }),
    }
}
