// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley webhook chatbot.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Missing or incorrect shared-secret credential.
    #[error("unauthenticated request")]
    Unauthenticated,

    /// The client's token bucket is empty.
    ///
    /// `client` may be the caller's credential, so it stays out of the
    /// message.
    #[error("rate limit exceeded")]
    RateLimited { client: String, retry_after: Duration },

    /// Malformed or incomplete input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint would be violated (e.g. intent name).
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// Optimistic-concurrency version mismatch. Re-read and retry.
    #[error("{entity} {id} was modified concurrently (expected version {expected_version})")]
    Conflict {
        entity: &'static str,
        id: String,
        expected_version: i64,
    },

    /// An inbound provider message id was already recorded.
    #[error("message {external_id} was already recorded")]
    Duplicate { external_id: String },

    /// Outbound send failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ParleyError::Storage {
            source: Box::new(err),
        }
    }
}

/// Failure of a single outbound send attempt.
///
/// There is no retry or outbox: callers decide whether to log and move on
/// (the webhook pipeline) or surface the failure (the manual send endpoint).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Connection, TLS or body-transfer failure.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// The provider answered 2xx but the body could not be understood.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// The dispatcher is missing credentials or endpoint settings.
    #[error("dispatcher misconfigured: {0}")]
    Config(String),
}
