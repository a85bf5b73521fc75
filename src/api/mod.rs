// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP API: routing, handlers, error responses, embedded UI

pub mod caption;
pub mod errors;
pub mod http_server;
pub mod ui;

pub use caption::{CaptionRequest, CaptionResponse};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{build_router, serve, AppState, HealthResponse};
