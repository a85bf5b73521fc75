// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption composition: blending a factual image description with a
//! personal memory into a social-media caption.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::build_caption_prompt;

use async_trait::async_trait;

/// Placeholder caption shown when composition fails
pub const COMPOSE_FALLBACK: &str = "Failed to generate caption.";

/// Result of a composition attempt. A degraded outcome carries the
/// placeholder caption plus a diagnostic for logs; it is never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeOutcome {
    /// Caption produced by the generative model
    Composed(String),
    /// Composition failed; callers should show the fallback text
    Degraded { diagnostic: String },
}

impl ComposeOutcome {
    /// Text to display for this outcome
    pub fn text(&self) -> &str {
        match self {
            ComposeOutcome::Composed(caption) => caption,
            ComposeOutcome::Degraded { .. } => COMPOSE_FALLBACK,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ComposeOutcome::Degraded { .. })
    }

    /// Diagnostic detail, present only for degraded outcomes
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ComposeOutcome::Composed(_) => None,
            ComposeOutcome::Degraded { diagnostic } => Some(diagnostic),
        }
    }
}

/// Turns a description and a memory into a caption
#[async_trait]
pub trait CaptionComposer: Send + Sync {
    async fn compose(&self, description: &str, memory: &str) -> ComposeOutcome;
}
