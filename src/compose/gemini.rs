// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gemini client for caption composition via the generateContent API

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::prompt::build_caption_prompt;
use super::{CaptionComposer, ComposeOutcome};
use crate::config::ComposeConfig;

// --- generateContent serde structs ---

#[derive(serde::Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Part {
    text: String,
}

#[derive(serde::Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini text-generation service
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &ComposeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "Gemini client configured: endpoint={}, model={}",
            endpoint, config.model
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Submit a prompt and return the trimmed response text
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Gemini error body: {}", body);
            anyhow::bail!("Gemini returned HTTP {}", status);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        extract_text(&parsed)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no caption text"))
    }
}

/// Pull the first candidate's text out of a response, trimmed
fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text = content
        .parts
        .iter()
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join("");
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[async_trait]
impl CaptionComposer for GeminiClient {
    async fn compose(&self, description: &str, memory: &str) -> ComposeOutcome {
        let prompt = build_caption_prompt(description, memory);

        match self.generate(&prompt).await {
            Ok(caption) => ComposeOutcome::Composed(caption),
            Err(e) => {
                warn!("Error connecting to the Gemini API: {:#}", e);
                ComposeOutcome::Degraded {
                    diagnostic: format!("{:#}", e),
                }
            }
        }
    }
}
