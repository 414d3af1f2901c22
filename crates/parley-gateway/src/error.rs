// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`ParleyError`] to HTTP responses with a `{"error": ...}` body.

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use parley_core::{DispatchError, ParleyError};
use serde::Serialize;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper so handlers can return `Result<_, ApiError>` and use `?`.
#[derive(Debug)]
pub struct ApiError(pub ParleyError);

impl From<ParleyError> for ApiError {
    fn from(err: ParleyError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ParleyError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ParleyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ParleyError::Validation(_) => StatusCode::BAD_REQUEST,
            ParleyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ParleyError::Conflict { .. }
            | ParleyError::AlreadyExists { .. }
            | ParleyError::Duplicate { .. } => StatusCode::CONFLICT,
            ParleyError::Dispatch(DispatchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ParleyError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            ParleyError::Config(_) | ParleyError::Storage { .. } | ParleyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Whole seconds to advertise, rounded up so a retry is never early.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        }

        let retry_after = match &self.0 {
            ParleyError::RateLimited { retry_after, .. } => Some(retry_after_secs(*retry_after)),
            _ => None,
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ParleyError) -> StatusCode {
        ApiError(err).status()
    }

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(status_of(ParleyError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ParleyError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ParleyError::NotFound {
                entity: "intent",
                id: "i".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ParleyError::Conflict {
                entity: "conversation",
                id: "c".into(),
                expected_version: 1
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ParleyError::Dispatch(DispatchError::Provider {
                status: 500,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ParleyError::Dispatch(DispatchError::Timeout {
                duration: Duration::from_secs(1)
            })),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(ParleyError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = ApiError(ParleyError::RateLimited {
            client: "c".into(),
            retry_after: Duration::from_millis(200),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn retry_after_rounds_partial_seconds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1900)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(18)), 18);
        assert_eq!(retry_after_secs(Duration::from_millis(18_001)), 19);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn rate_limited_body_does_not_echo_client_key() {
        let err = ParleyError::RateLimited {
            client: "test-api-key".into(),
            retry_after: Duration::from_secs(5),
        };
        assert!(!err.to_string().contains("test-api-key"));
    }
}
