// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use memocap::api::http_server::{serve, AppState};
use memocap::compose::GeminiClient;
use memocap::config::{AppConfig, Cli};
use memocap::pipeline::CaptionPipeline;
use memocap::version::get_version_string;
use memocap::vision::describer::BlipDescriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Starting {}", get_version_string());

    // Configuration errors are fatal before anything binds
    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let composer = GeminiClient::new(&config.compose)?;
    let compose_model = config.compose.model.clone();

    let describer = Arc::new(BlipDescriber::new(config.vision.clone()));
    if describer.ensure_loaded().await {
        info!("Image description model loaded");
    } else {
        warn!("⚠️ BLIP model failed to load; caption requests will be refused");
    }

    let pipeline = Arc::new(CaptionPipeline::new(describer, Arc::new(composer)));

    let state = AppState {
        pipeline,
        compose_model,
    };

    serve(state, &config.listen_addr).await
}
