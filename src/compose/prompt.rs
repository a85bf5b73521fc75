// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt template for blending a description with a personal memory

/// Build the caption prompt
///
/// Both inputs are embedded verbatim; the template does no escaping or
/// sanitization of either string.
pub fn build_caption_prompt(description: &str, memory: &str) -> String {
    format!(
        "You are a creative photo caption writer for social media.\n\
         Your task is to combine a factual description of an image with a user's \
         personal memory to create a short, engaging, and heartfelt caption.\n\
         \n\
         Factual Image Description: \"{description}\"\n\
         User's Personal Memory: \"{memory}\"\n\
         \n\
         Based on both pieces of information, write a perfect caption. \
         Make it sound natural and personal, and keep it universal."
    )
}
