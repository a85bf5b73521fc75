// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP image captioning: ONNX vision encoder + text decoder

pub mod decoder;
pub mod encoder;
pub mod model;

pub use decoder::{BlipTextDecoder, DEFAULT_MAX_NEW_TOKENS};
pub use encoder::BlipVisionEncoder;
pub use model::BlipModel;
