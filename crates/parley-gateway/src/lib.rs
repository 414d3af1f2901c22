// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! axum HTTP surface for the Parley webhook chatbot.
//!
//! Every request passes the [`auth::admission_gate`] first and the
//! [`ratelimit::rate_limit_middleware`] second before reaching a handler.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod ratelimit;
pub mod server;

pub use auth::AuthenticatedPrincipal;
pub use error::ApiError;
pub use ratelimit::{Admission, RateLimiter, spawn_sweeper};
pub use server::{AppState, build_router, start_server};
