// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP vision encoder model
//!
//! Extracts visual features from a preprocessed image for the text decoder.

use anyhow::{Context, Result};
use ndarray::{Array2, Array4, Axis, Ix2, Ix3};
use ort::execution_providers::CPU as CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::super::preprocessing::BLIP_INPUT_SIZE;

/// Expected input size for the BLIP encoder
pub const ENCODER_INPUT_SIZE: u32 = BLIP_INPUT_SIZE;

/// BLIP vision encoder
///
/// Runs on CPU; a description request is a one-shot interactive call and
/// does not compete for GPU memory.
#[derive(Clone)]
pub struct BlipVisionEncoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for BlipVisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipVisionEncoder")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl BlipVisionEncoder {
    /// Load the vision encoder from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime fails to
    /// initialize the session.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("BLIP vision encoder not found: {}", model_path.display());
        }

        info!("Loading BLIP vision encoder from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(ort::Error::<()>::from)
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load BLIP vision encoder from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("BLIP encoder loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Encode an image into visual features
    ///
    /// # Arguments
    /// - `input`: Preprocessed tensor of shape [1, 3, 384, 384] (NCHW)
    ///
    /// # Returns
    /// - `Result<Array2<f32>>`: Image embeddings of shape [seq_len, hidden_dim]
    pub fn encode(&self, input: &Array4<f32>) -> Result<Array2<f32>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        if shape[2] != ENCODER_INPUT_SIZE as usize || shape[3] != ENCODER_INPUT_SIZE as usize {
            debug!(
                "Input size {}x{} differs from expected {}x{}",
                shape[2], shape[3], ENCODER_INPUT_SIZE, ENCODER_INPUT_SIZE
            );
        }

        let mut session = self.session.lock().unwrap();

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Encoder inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Encoder output shape: {:?}", output.shape());

        // last_hidden_state arrives as [1, seq_len, hidden] for this export
        let embeddings = match output.ndim() {
            3 => output
                .to_owned()
                .into_dimensionality::<Ix3>()?
                .index_axis_move(Axis(0), 0),
            2 => output.to_owned().into_dimensionality::<Ix2>()?,
            n => anyhow::bail!("Unexpected encoder output rank: {}", n),
        };

        debug!(
            "Encoded to {} sequences x {} dimensions",
            embeddings.nrows(),
            embeddings.ncols()
        );

        Ok(embeddings)
    }
}
