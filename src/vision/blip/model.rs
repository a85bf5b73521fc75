// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP captioning pipeline combining the vision encoder and text decoder

use anyhow::{Context, Result};
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

use super::decoder::BlipTextDecoder;
use super::encoder::BlipVisionEncoder;
use crate::config::VisionConfig;
use crate::vision::fetch::{resolve_model_files, BlipExportFiles};
use crate::vision::preprocessing::preprocess_for_blip;

/// BLIP image captioning model
///
/// Encodes an image once and generates a short factual description.
#[derive(Clone)]
pub struct BlipModel {
    encoder: BlipVisionEncoder,
    decoder: BlipTextDecoder,
    max_new_tokens: usize,
}

impl std::fmt::Debug for BlipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipModel")
            .field("max_new_tokens", &self.max_new_tokens)
            .finish_non_exhaustive()
    }
}

impl BlipModel {
    /// Load the BLIP pipeline for the given configuration
    ///
    /// Model files are resolved locally first, from the Hub otherwise.
    pub async fn load(config: &VisionConfig) -> Result<Self> {
        let files = resolve_model_files(config).await?;
        Self::from_files(&files, config.max_new_tokens)
    }

    /// Build the pipeline from already-resolved export files
    pub fn from_files(files: &BlipExportFiles, max_new_tokens: usize) -> Result<Self> {
        let encoder = BlipVisionEncoder::new(&files.vision_encoder)
            .context("Failed to load BLIP vision encoder")?;
        let decoder =
            BlipTextDecoder::new(files.text_decoder.as_path(), files.tokenizer.as_path())
                .context("Failed to load BLIP text decoder")?;

        info!("✅ BLIP captioning pipeline ready (CPU-only)");

        Ok(Self {
            encoder,
            decoder,
            max_new_tokens,
        })
    }

    /// Describe an image
    ///
    /// Preprocesses to the encoder's fixed input, extracts visual
    /// features, then generates text within the configured token budget.
    pub fn describe(&self, image: &DynamicImage) -> Result<String> {
        let start = Instant::now();

        debug!("Preprocessing image {}x{}", image.width(), image.height());
        let preprocessed = preprocess_for_blip(image);

        let embeddings = self
            .encoder
            .encode(&preprocessed)
            .context("Failed to encode image")?;

        let description = self
            .decoder
            .generate(&embeddings, self.max_new_tokens)
            .context("Failed to generate description")?;

        info!(
            "Described image in {}ms: '{}'",
            start.elapsed().as_millis(),
            description
        );

        Ok(description)
    }
}
