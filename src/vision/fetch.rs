// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model file resolution: local directory first, Hugging Face Hub second

use anyhow::{Context, Result};
use hf_hub::api::tokio::{Api, ApiRepo};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::VisionConfig;

/// Candidate file names for the vision encoder, in preference order
const VISION_ENCODER_NAMES: &[&str] = &["vision_model.onnx", "vision_encoder.onnx"];

/// Candidate file names for the text decoder
const TEXT_DECODER_NAMES: &[&str] = &["text_decoder_model.onnx", "text_decoder.onnx"];

/// Hub paths tried for each component (ONNX exports keep them under onnx/)
const HUB_VISION_ENCODER: &[&str] = &["onnx/vision_model.onnx", "vision_model.onnx"];
const HUB_TEXT_DECODER: &[&str] = &["onnx/text_decoder_model.onnx", "text_decoder_model.onnx"];

/// Resolved paths for a BLIP ONNX export
#[derive(Debug, Clone)]
pub struct BlipExportFiles {
    pub vision_encoder: PathBuf,
    pub text_decoder: PathBuf,
    pub tokenizer: PathBuf,
}

/// Locate the export files for the configured model
///
/// Tries the configured local directory first. When the directory does
/// not hold a complete export and offline mode is not set, the files are
/// fetched from the configured Hub repository (cached by `hf-hub`).
pub async fn resolve_model_files(config: &VisionConfig) -> Result<BlipExportFiles> {
    if let Some(files) = find_local(&config.model_dir) {
        info!(
            "Using local BLIP export from {}",
            config.model_dir.display()
        );
        return Ok(files);
    }

    if config.offline {
        anyhow::bail!(
            "BLIP export not found in {} and offline mode is set",
            config.model_dir.display()
        );
    }

    info!(
        "Local BLIP export not found in {}, fetching from {}",
        config.model_dir.display(),
        config.model_repo
    );
    fetch_from_hub(&config.model_repo).await
}

/// Check a local directory for a complete export
fn find_local(dir: &Path) -> Option<BlipExportFiles> {
    let vision_encoder = first_existing(dir, VISION_ENCODER_NAMES)?;
    let text_decoder = first_existing(dir, TEXT_DECODER_NAMES)?;
    let tokenizer = dir.join("tokenizer.json");
    if !tokenizer.exists() {
        return None;
    }
    Some(BlipExportFiles {
        vision_encoder,
        text_decoder,
        tokenizer,
    })
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|p| p.exists())
}

/// Download the export from the Hub (files land in the hf-hub cache)
async fn fetch_from_hub(repo: &str) -> Result<BlipExportFiles> {
    let api = Api::new().context("Failed to initialize Hugging Face Hub client")?;
    let repo_api = api.model(repo.to_string());

    let vision_encoder = get_first(&repo_api, HUB_VISION_ENCODER)
        .await
        .with_context(|| format!("Failed to fetch vision encoder from {}", repo))?;
    let text_decoder = get_first(&repo_api, HUB_TEXT_DECODER)
        .await
        .with_context(|| format!("Failed to fetch text decoder from {}", repo))?;
    let tokenizer = repo_api
        .get("tokenizer.json")
        .await
        .with_context(|| format!("Failed to fetch tokenizer from {}", repo))?;

    Ok(BlipExportFiles {
        vision_encoder,
        text_decoder,
        tokenizer,
    })
}

/// Try Hub paths in order, returning the first that resolves
async fn get_first(repo: &ApiRepo, names: &[&str]) -> Result<PathBuf> {
    let mut last_err = None;
    for name in names {
        match repo.get(name).await {
            Ok(path) => return Ok(path),
            Err(e) => last_err = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "none of {:?} could be fetched: {:?}",
        names,
        last_err
    ))
}
