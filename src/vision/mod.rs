// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision pipeline: image decoding, preprocessing and BLIP captioning

pub mod blip;
pub mod describer;
pub mod fetch;
pub mod image_utils;
pub mod preprocessing;

pub use blip::BlipModel;
pub use describer::{
    BlipDescriber, DescribeOutcome, ImageDescriber, DESCRIBE_FALLBACK,
};
pub use image_utils::{decode_base64_image, decode_image_bytes, ImageError, ImageInfo};
