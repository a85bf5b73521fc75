// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption endpoint: request/response types and handlers

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{caption_handler, caption_upload_handler};
pub use request::{CaptionRequest, DEFAULT_MEMORY, SUPPORTED_EXTENSIONS};
pub use response::CaptionResponse;
