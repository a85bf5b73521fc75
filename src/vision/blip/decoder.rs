// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP text decoder model
//!
//! Generates a natural-language description from visual embeddings.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, IxDyn};
use ort::execution_providers::CPU as CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Default maximum new tokens for a description
pub const DEFAULT_MAX_NEW_TOKENS: usize = 50;

/// Hard cap on the generated-token budget
pub const MAX_NEW_TOKENS_LIMIT: usize = 500;

/// BLIP text decoder
///
/// Cross-attends over image embeddings and generates tokens greedily.
#[derive(Clone)]
pub struct BlipTextDecoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Tokenizer for decoding generated IDs
    tokenizer: Arc<Tokenizer>,
    /// Vocabulary size
    vocab_size: usize,
    /// Generation start token (BLIP's [DEC], falling back to [CLS])
    bos_token_id: u32,
    /// Generation stop token
    eos_token_id: u32,
}

impl std::fmt::Debug for BlipTextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipTextDecoder")
            .field("vocab_size", &self.vocab_size)
            .field("bos_token_id", &self.bos_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl BlipTextDecoder {
    /// Load the text decoder and its tokenizer
    ///
    /// # Errors
    /// Returns error if either file is missing or ONNX Runtime fails to
    /// initialize the session.
    pub fn new<P: AsRef<Path>>(model_path: P, tokenizer_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("BLIP text decoder not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("BLIP tokenizer not found: {}", tokenizer_path.display());
        }

        info!("Loading BLIP text decoder from {}", model_path.display());

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        let vocab_size = tokenizer.get_vocab_size(true);
        debug!("Loaded tokenizer with {} tokens", vocab_size);

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
                "Failed to load BLIP text decoder from {}",
                model_path.display()
            ))?;

        let input_names: Vec<_> = session.inputs().iter().map(|i| i.name()).collect();
        debug!("Decoder inputs: {:?}", input_names);

        // BLIP starts generation from its dedicated decoder token; BERT
        // specials cover older exports.
        let bos_token_id = tokenizer
            .token_to_id("[DEC]")
            .or_else(|| tokenizer.token_to_id("[CLS]"))
            .unwrap_or(101);
        let eos_token_id = tokenizer
            .token_to_id("[SEP]")
            .or_else(|| tokenizer.token_to_id("</s>"))
            .unwrap_or(102);

        debug!(
            "Special tokens - BOS: {}, EOS: {}",
            bos_token_id, eos_token_id
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            vocab_size,
            bos_token_id,
            eos_token_id,
        })
    }

    /// Get the vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Generate a description from image embeddings
    ///
    /// # Arguments
    /// - `image_embeddings`: Visual features from the encoder [seq_len, hidden_dim]
    /// - `max_new_tokens`: Generated-token budget for this call
    ///
    /// # Process
    /// 1. Start from the decoder start token
    /// 2. Greedy autoregressive loop, stopping at EOS or the budget
    /// 3. Decode token IDs to text, skipping special tokens
    pub fn generate(&self, image_embeddings: &Array2<f32>, max_new_tokens: usize) -> Result<String> {
        let budget = max_new_tokens.clamp(1, MAX_NEW_TOKENS_LIMIT);
        let mut tokens = vec![self.bos_token_id];

        for step in 0..budget {
            let logits = self.forward(image_embeddings, &tokens)?;
            let next_token = self.argmax(&logits)?;

            if next_token == self.eos_token_id {
                debug!("Generation stopped at EOS after {} tokens", step + 1);
                break;
            }
            tokens.push(next_token);
        }

        // Skip the start token when decoding
        let generated = &tokens[1..];
        let output_text = self
            .tokenizer
            .decode(generated, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        let cleaned = output_text.trim().to_string();
        debug!("Generated {} tokens: '{}'", generated.len(), cleaned);

        Ok(cleaned)
    }

    /// Run a single forward pass through the decoder
    fn forward(&self, encoder_hidden_states: &Array2<f32>, input_ids: &[u32]) -> Result<Vec<f32>> {
        let mut session = self.session.lock().unwrap();

        let token_len = input_ids.len();
        let mut input_ids_array = Array2::<i64>::zeros((1, token_len));
        for (i, &token) in input_ids.iter().enumerate() {
            input_ids_array[[0, i]] = token as i64;
        }
        let attention_mask = Array2::<i64>::ones((1, token_len));

        // Encoder hidden states as [1, seq_len, hidden_dim]
        let (seq_len, hidden_dim) = (encoder_hidden_states.nrows(), encoder_hidden_states.ncols());
        let mut encoder_input = Array3::<f32>::zeros((1, seq_len, hidden_dim));
        encoder_input
            .index_axis_mut(ndarray::Axis(0), 0)
            .assign(encoder_hidden_states);
        let encoder_attention_mask = Array2::<i64>::ones((1, seq_len));

        let input_ids_value =
            Value::from_array(input_ids_array).context("Failed to create input IDs tensor")?;
        let attention_mask_value =
            Value::from_array(attention_mask).context("Failed to create attention mask tensor")?;
        let encoder_value = Value::from_array(encoder_input)
            .context("Failed to create encoder hidden states tensor")?;
        let encoder_mask_value = Value::from_array(encoder_attention_mask)
            .context("Failed to create encoder attention mask tensor")?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value,
                "encoder_hidden_states" => encoder_value,
                "encoder_attention_mask" => encoder_mask_value
            ])
            .context("Decoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let output_shape = output_tensor.shape();
        let (last_pos, vocab_size) = last_logits_position(output_shape)?;

        // Logits for the last position, [vocab_size]
        let mut logits = vec![0.0f32; vocab_size];
        for (v, logit) in logits.iter_mut().enumerate() {
            *logit = match output_shape.len() {
                3 => output_tensor[IxDyn(&[0, last_pos, v])],
                _ => output_tensor[IxDyn(&[last_pos, v])],
            };
        }

        Ok(logits)
    }

    /// Greedy decoding: highest-probability token, never the start token
    fn argmax(&self, logits: &[f32]) -> Result<u32> {
        let (max_idx, _) = logits
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx as u32 != self.bos_token_id)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| anyhow::anyhow!("Empty logits vector after filtering"))?;

        Ok(max_idx as u32)
    }
}

/// Index of the last sequence position and the vocabulary size for a
/// decoder logits tensor, shaped `[1, seq_len, vocab]` or `[seq_len, vocab]`
fn last_logits_position(shape: &[usize]) -> Result<(usize, usize)> {
    let (seq_len, vocab_size) = match shape.len() {
        3 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        n => anyhow::bail!("Unexpected decoder output rank: {}", n),
    };
    let last_pos = seq_len
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("Decoder output has an empty sequence axis"))?;
    Ok((last_pos, vocab_size))
}
