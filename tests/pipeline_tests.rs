// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Caption pipeline tests with mocked describer and composer
//!
//! These tests verify that the pipeline:
//! - Passes the description and the memory through to the composer
//! - Refuses to run when the vision model is unavailable
//! - Degrades each stage independently, never failing the request

use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;
use std::sync::Mutex;

use memocap::compose::{CaptionComposer, ComposeOutcome, COMPOSE_FALLBACK};
use memocap::pipeline::{CaptionPipeline, PipelineError};
use memocap::vision::describer::{DescribeOutcome, ImageDescriber, DESCRIBE_FALLBACK};

fn test_image() -> DynamicImage {
    DynamicImage::new_rgb8(16, 16)
}

/// Describer that always returns a fixed description
struct FixedDescriber {
    description: String,
}

#[async_trait]
impl ImageDescriber for FixedDescriber {
    async fn describe(&self, _image: &DynamicImage) -> DescribeOutcome {
        DescribeOutcome::Described(self.description.clone())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Describer whose model never loaded
struct UnavailableDescriber;

#[async_trait]
impl ImageDescriber for UnavailableDescriber {
    async fn describe(&self, _image: &DynamicImage) -> DescribeOutcome {
        DescribeOutcome::Degraded {
            diagnostic: "model not loaded".to_string(),
        }
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Describer that fails at inference time
struct FailingDescriber;

#[async_trait]
impl ImageDescriber for FailingDescriber {
    async fn describe(&self, _image: &DynamicImage) -> DescribeOutcome {
        DescribeOutcome::Degraded {
            diagnostic: "inference failed".to_string(),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Composer that records its inputs and returns a fixed caption
struct RecordingComposer {
    calls: Mutex<Vec<(String, String)>>,
    caption: String,
}

impl RecordingComposer {
    fn new(caption: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            caption: caption.to_string(),
        }
    }
}

#[async_trait]
impl CaptionComposer for RecordingComposer {
    async fn compose(&self, description: &str, memory: &str) -> ComposeOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((description.to_string(), memory.to_string()));
        ComposeOutcome::Composed(self.caption.clone())
    }
}

/// Composer that always degrades
struct FailingComposer;

#[async_trait]
impl CaptionComposer for FailingComposer {
    async fn compose(&self, _description: &str, _memory: &str) -> ComposeOutcome {
        ComposeOutcome::Degraded {
            diagnostic: "HTTP 500".to_string(),
        }
    }
}

#[tokio::test]
async fn test_happy_path_feeds_description_and_memory_to_composer() {
    let describer = Arc::new(FixedDescriber {
        description: "a red apple on a table".to_string(),
    });
    let composer = Arc::new(RecordingComposer::new(
        "Our first harvest, sweeter than it looks.",
    ));
    let pipeline = CaptionPipeline::new(describer, composer.clone());

    let run = pipeline
        .run(&test_image(), "first harvest")
        .await
        .expect("pipeline should run");

    let calls = composer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "a red apple on a table");
    assert_eq!(calls[0].1, "first harvest");

    assert_eq!(run.description.text(), "a red apple on a table");
    assert_eq!(run.caption.text(), "Our first harvest, sweeter than it looks.");
    assert_ne!(run.caption.text(), COMPOSE_FALLBACK);
    assert_ne!(run.caption.text(), DESCRIBE_FALLBACK);
    assert!(!run.description.is_degraded());
    assert!(!run.caption.is_degraded());
}

#[tokio::test]
async fn test_unavailable_describer_refuses_request() {
    let pipeline = CaptionPipeline::new(
        Arc::new(UnavailableDescriber),
        Arc::new(RecordingComposer::new("unused")),
    );

    assert!(!pipeline.describer_available());
    let result = pipeline.run(&test_image(), "first harvest").await;
    assert!(matches!(result, Err(PipelineError::DescriberUnavailable)));
}

#[tokio::test]
async fn test_failed_composer_yields_description_and_fallback_caption() {
    let pipeline = CaptionPipeline::new(
        Arc::new(FixedDescriber {
            description: "a sunset over the ocean".to_string(),
        }),
        Arc::new(FailingComposer),
    );

    let run = pipeline
        .run(&test_image(), "our last evening in Lisbon")
        .await
        .expect("pipeline should run");

    assert_eq!(run.description.text(), "a sunset over the ocean");
    assert!(!run.description.is_degraded());
    assert_eq!(run.caption.text(), COMPOSE_FALLBACK);
    assert!(run.caption.is_degraded());
}

#[tokio::test]
async fn test_degraded_description_still_reaches_composer() {
    let composer = Arc::new(RecordingComposer::new("A moment to remember."));
    let pipeline = CaptionPipeline::new(Arc::new(FailingDescriber), composer.clone());

    let run = pipeline
        .run(&test_image(), "first harvest")
        .await
        .expect("pipeline should run");

    // The composer receives the fallback description text
    let calls = composer.calls.lock().unwrap();
    assert_eq!(calls[0].0, DESCRIBE_FALLBACK);
    assert!(run.description.is_degraded());
    assert!(!run.caption.is_degraded());
}

#[tokio::test]
async fn test_both_stages_degraded_yields_both_fallbacks() {
    let pipeline =
        CaptionPipeline::new(Arc::new(FailingDescriber), Arc::new(FailingComposer));

    let run = pipeline
        .run(&test_image(), "first harvest")
        .await
        .expect("pipeline should run");

    assert_eq!(run.description.text(), DESCRIBE_FALLBACK);
    assert_eq!(run.caption.text(), COMPOSE_FALLBACK);
}
