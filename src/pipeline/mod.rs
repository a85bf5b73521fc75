// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end caption pipeline: describe an image, then compose a caption
//! from the description and the user's memory.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use thiserror::Error;
use tracing::{info, warn};

use crate::compose::{CaptionComposer, ComposeOutcome};
use crate::vision::describer::{DescribeOutcome, ImageDescriber};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image description model is not available")]
    DescriberUnavailable,
}

/// Outcome of one pipeline run. Both stages always produce text;
/// degraded stages carry the corresponding placeholder.
#[derive(Debug)]
pub struct CaptionRun {
    pub description: DescribeOutcome,
    pub caption: ComposeOutcome,
    pub describe_ms: u64,
    pub compose_ms: u64,
}

/// Glues the vision describer and the caption composer together
pub struct CaptionPipeline {
    describer: Arc<dyn ImageDescriber>,
    composer: Arc<dyn CaptionComposer>,
}

impl CaptionPipeline {
    pub fn new(describer: Arc<dyn ImageDescriber>, composer: Arc<dyn CaptionComposer>) -> Self {
        Self {
            describer,
            composer,
        }
    }

    /// Whether the vision model can serve requests
    pub fn describer_available(&self) -> bool {
        self.describer.is_available()
    }

    /// Run both stages once. The description feeds the composer even when
    /// degraded, so the user always gets a caption attempt.
    pub async fn run(&self, image: &DynamicImage, memory: &str) -> Result<CaptionRun, PipelineError> {
        if !self.describer.is_available() {
            return Err(PipelineError::DescriberUnavailable);
        }

        let describe_start = Instant::now();
        let description = self.describer.describe(image).await;
        let describe_ms = describe_start.elapsed().as_millis() as u64;

        if let Some(diagnostic) = description.diagnostic() {
            warn!("⚠️ Description degraded: {}", diagnostic);
        } else {
            info!("Image described in {}ms", describe_ms);
        }

        let compose_start = Instant::now();
        let caption = self.composer.compose(description.text(), memory).await;
        let compose_ms = compose_start.elapsed().as_millis() as u64;

        if let Some(diagnostic) = caption.diagnostic() {
            warn!("⚠️ Caption degraded: {}", diagnostic);
        } else {
            info!("Caption composed in {}ms", compose_ms);
        }

        Ok(CaptionRun {
            description,
            caption,
            describe_ms,
            compose_ms,
        })
    }
}
