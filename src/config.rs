// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from CLI flags, environment variables and .env

use clap::Parser;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default Hugging Face repository holding the BLIP ONNX export
pub const DEFAULT_MODEL_REPO: &str = "Xenova/blip-image-captioning-large";

/// Default local directory searched for the model files
pub const DEFAULT_MODEL_DIR: &str = "./models/blip-image-captioning-onnx";

/// Default generative model used for caption composition
pub const DEFAULT_COMPOSE_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini API base URL
pub const DEFAULT_COMPOSE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Command-line options (all overridable via environment)
#[derive(Parser, Debug, Clone)]
#[command(name = "memocap", version, about = "Photo caption service with memory blending")]
pub struct Cli {
    /// Address to bind the HTTP server on
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server on
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory searched for the BLIP ONNX export before falling back
    /// to the Hugging Face Hub
    #[arg(long, env = "BLIP_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Never download model files; fail model loading if they are not
    /// present locally
    #[arg(long, env = "MODEL_OFFLINE", default_value_t = false)]
    pub offline: bool,
}

impl Cli {
    /// Defaults without reading the real process arguments (for tests)
    pub fn defaults() -> Self {
        Self::parse_from(["memocap"])
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set. Add it to the environment or a .env file.")]
    MissingApiKey,

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Configuration for the vision describer
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Local directory holding the ONNX export
    pub model_dir: PathBuf,
    /// Hub repository to fetch the export from when the directory is empty
    pub model_repo: String,
    /// Generated-token budget for a description
    pub max_new_tokens: usize,
    /// Skip Hub downloads entirely
    pub offline: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_repo: DEFAULT_MODEL_REPO.to_string(),
            max_new_tokens: 50,
            offline: false,
        }
    }
}

/// Configuration for the remote caption composer
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Gemini API key (required)
    pub api_key: String,
    /// Generative model name
    pub model: String,
    /// API base URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_COMPOSE_MODEL.to_string(),
            endpoint: DEFAULT_COMPOSE_ENDPOINT.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub vision: VisionConfig,
    pub compose: ComposeConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_lookup(cli, |key| env::var(key).ok())
    }

    fn from_lookup(
        cli: &Cli,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = match get("GEMINI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(ConfigError::MissingApiKey),
        };

        let max_new_tokens = parse_or("DESCRIBE_MAX_TOKENS", &get, 50)?;
        let timeout_secs = parse_or("COMPOSE_TIMEOUT_SECS", &get, 120)?;

        let config = Self {
            listen_addr: format!("{}:{}", cli.host, cli.port),
            vision: VisionConfig {
                model_dir: cli.model_dir.clone(),
                model_repo: get("BLIP_MODEL_REPO")
                    .unwrap_or_else(|| DEFAULT_MODEL_REPO.to_string()),
                max_new_tokens,
                offline: cli.offline,
            },
            compose: ComposeConfig {
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_COMPOSE_MODEL.to_string()),
                endpoint: get("GEMINI_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_COMPOSE_ENDPOINT.to_string()),
                timeout_secs,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the assembled configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vision.max_new_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DESCRIBE_MAX_TOKENS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.compose.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "COMPOSE_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    get: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
