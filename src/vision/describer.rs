// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Describer service: lazy once-guarded model loading and degraded
//! per-call outcomes

use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, warn};

use super::blip::BlipModel;
use crate::config::VisionConfig;

/// Fixed text returned when a describe call fails
pub const DESCRIBE_FALLBACK: &str = "Could not describe the image.";

/// Result of a describe call
///
/// A failed call degrades to the fixed fallback text instead of
/// propagating an error; the diagnostic is kept for display.
#[derive(Debug, Clone, PartialEq)]
pub enum DescribeOutcome {
    /// Model-produced description
    Described(String),
    /// Underlying call failed, fallback text applies
    Degraded { diagnostic: String },
}

impl DescribeOutcome {
    /// The text to show and pass downstream (fallback when degraded)
    pub fn text(&self) -> &str {
        match self {
            Self::Described(text) => text,
            Self::Degraded { .. } => DESCRIBE_FALLBACK,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Described(_) => None,
            Self::Degraded { diagnostic } => Some(diagnostic),
        }
    }
}

/// An image-to-description service
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe an image; never fails, degrades instead
    async fn describe(&self, image: &DynamicImage) -> DescribeOutcome;

    /// False once initialization has failed for good
    fn is_available(&self) -> bool;
}

/// BLIP-backed describer with memoized model loading
///
/// The model is loaded at most once per process. A failed load is
/// memoized too: the describer then reports itself unavailable and
/// every later call degrades without retrying the load.
pub struct BlipDescriber {
    config: VisionConfig,
    model: OnceCell<Option<Arc<BlipModel>>>,
}

impl BlipDescriber {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
        }
    }

    /// Trigger model loading now; true if the describer is usable
    ///
    /// Called at startup so an unusable model is reported once instead
    /// of on the first upload.
    pub async fn ensure_loaded(&self) -> bool {
        self.model().await.is_some()
    }

    async fn model(&self) -> Option<Arc<BlipModel>> {
        self.model
            .get_or_init(|| async {
                match BlipModel::load(&self.config).await {
                    Ok(model) => Some(Arc::new(model)),
                    Err(e) => {
                        error!("Failed to load the image model: {:#}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

#[async_trait]
impl ImageDescriber for BlipDescriber {
    async fn describe(&self, image: &DynamicImage) -> DescribeOutcome {
        let Some(model) = self.model().await else {
            return DescribeOutcome::Degraded {
                diagnostic: "the image model is not loaded".to_string(),
            };
        };

        // ONNX inference is CPU-bound; keep it off the async runtime
        let image = image.clone();
        let result = tokio::task::spawn_blocking(move || model.describe(&image)).await;

        match result {
            Ok(Ok(description)) if !description.trim().is_empty() => {
                DescribeOutcome::Described(description)
            }
            Ok(Ok(_)) => {
                warn!("Image model returned an empty description");
                DescribeOutcome::Degraded {
                    diagnostic: "the model returned an empty description".to_string(),
                }
            }
            Ok(Err(e)) => {
                warn!("Error during image description: {:#}", e);
                DescribeOutcome::Degraded {
                    diagnostic: format!("{:#}", e),
                }
            }
            Err(e) => {
                error!("Describe task failed: {}", e);
                DescribeOutcome::Degraded {
                    diagnostic: e.to_string(),
                }
            }
        }
    }

    fn is_available(&self) -> bool {
        // Unknown until the first load attempt; only a memoized failure
        // makes the describer unavailable
        !matches!(self.model.get(), Some(None))
    }
}
