// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! memocap: photo caption service
//!
//! Describes an uploaded photo with a BLIP captioning model running on
//! CPU, then blends the description with the user's personal memory into
//! a social-media caption via the Gemini API.

pub mod api;
pub mod compose;
pub mod config;
pub mod pipeline;
pub mod version;
pub mod vision;

pub use compose::{CaptionComposer, ComposeOutcome, GeminiClient, COMPOSE_FALLBACK};
pub use config::{AppConfig, Cli, ComposeConfig, ConfigError, VisionConfig};
pub use pipeline::{CaptionPipeline, CaptionRun, PipelineError};
pub use vision::describer::{BlipDescriber, DescribeOutcome, ImageDescriber, DESCRIBE_FALLBACK};
