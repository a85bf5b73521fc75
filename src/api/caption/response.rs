// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption response types

use serde::{Deserialize, Serialize};

use crate::pipeline::CaptionRun;

/// Response for a photo caption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResponse {
    /// The generated caption (or the fallback text)
    pub caption: String,

    /// Factual description produced by the vision model
    pub description: String,

    /// True when the caption is the fallback text
    pub caption_degraded: bool,

    /// True when the description is the fallback text
    pub description_degraded: bool,

    /// Generative model used for composition
    pub model: String,

    /// Total processing time in milliseconds
    pub processing_time_ms: u64,
}

impl CaptionResponse {
    pub fn from_run(run: &CaptionRun, model: &str) -> Self {
        Self {
            caption: run.caption.text().to_string(),
            description: run.description.text().to_string(),
            caption_degraded: run.caption.is_degraded(),
            description_degraded: run.description.is_degraded(),
            model: model.to_string(),
            processing_time_ms: run.describe_ms + run.compose_ms,
        }
    }
}
