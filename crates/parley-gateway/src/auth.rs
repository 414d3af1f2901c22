// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret admission gate.
//!
//! Requests to allow-listed paths pass untouched. Every other request must
//! carry the configured header with a value equal to the configured API
//! key; otherwise the request is rejected with 401 before any handler or
//! the rate limiter runs. Fails closed: with no API key configured only
//! public paths are reachable.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parley_config::model::AuthConfig;
use parley_core::ParleyError;
use parley_core::secret::constant_time_eq;
use tracing::warn;

use crate::error::ApiError;
use crate::server::AppState;

/// Marker inserted into request extensions once the gate admits a
/// request that needed credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPrincipal;

/// Whether `path` is on the allow-list. An entry ending in `/*` matches
/// its prefix and everything below it.
pub fn is_public_path(public_paths: &[String], path: &str) -> bool {
    public_paths.iter().any(|entry| match entry.strip_suffix("/*") {
        Some(prefix) => {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => path == entry,
    })
}

/// Checks the credential header of a non-public request.
pub fn authenticate(config: &AuthConfig, presented: Option<&str>) -> Result<(), ParleyError> {
    let Some(expected) = config.api_key.as_deref() else {
        return Err(ParleyError::Unauthenticated);
    };
    match presented {
        Some(value) if constant_time_eq(value, expected) => Ok(()),
        _ => Err(ParleyError::Unauthenticated),
    }
}

/// Axum middleware enforcing [`authenticate`] on non-public paths.
pub async fn admission_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = &state.config.auth;
    if is_public_path(&auth.public_paths, request.uri().path()) {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(auth.header_name.as_str())
        .and_then(|v| v.to_str().ok());

    match authenticate(auth, presented) {
        Ok(()) => {
            request.extensions_mut().insert(AuthenticatedPrincipal);
            next.run(request).await
        }
        Err(e) => {
            warn!(
                path = %request.uri().path(),
                credential_present = presented.is_some(),
                "rejected unauthenticated request"
            );
            ApiError(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> AuthConfig {
        AuthConfig {
            api_key: api_key.map(str::to_string),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn exact_public_paths() {
        let paths = vec!["/webhook".to_string(), "/health".to_string()];
        assert!(is_public_path(&paths, "/webhook"));
        assert!(is_public_path(&paths, "/health"));
        assert!(!is_public_path(&paths, "/webhooks"));
        assert!(!is_public_path(&paths, "/webhook/extra"));
        assert!(!is_public_path(&paths, "/admin/intents"));
    }

    #[test]
    fn wildcard_public_paths() {
        let paths = vec!["/docs/*".to_string()];
        assert!(is_public_path(&paths, "/docs"));
        assert!(is_public_path(&paths, "/docs/index.html"));
        assert!(!is_public_path(&paths, "/docsx"));
    }

    #[test]
    fn matching_key_is_accepted() {
        assert!(authenticate(&config(Some("k3y")), Some("k3y")).is_ok());
    }

    #[test]
    fn wrong_or_missing_key_is_rejected() {
        let cfg = config(Some("k3y"));
        assert!(matches!(
            authenticate(&cfg, Some("nope")),
            Err(ParleyError::Unauthenticated)
        ));
        assert!(matches!(
            authenticate(&cfg, None),
            Err(ParleyError::Unauthenticated)
        ));
    }

    #[test]
    fn no_configured_key_fails_closed() {
        let cfg = config(None);
        assert!(authenticate(&cfg, Some("")).is_err());
        assert!(authenticate(&cfg, Some("anything")).is_err());
    }
}
