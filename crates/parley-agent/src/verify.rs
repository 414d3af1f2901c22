// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook subscription handshake.

use parley_core::secret::constant_time_eq;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No handshake parameters at all: a liveness probe.
    Liveness,
    /// Echo this challenge back.
    Verified(String),
    /// Mode and token were right but no challenge was sent.
    MissingChallenge,
    /// Wrong mode, wrong token, or no verify token configured.
    Rejected,
}

/// Decides the response to a `GET /webhook` handshake.
///
/// The challenge is echoed only when `mode` is `subscribe` and `token`
/// equals the configured verify token.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: Option<&str>,
) -> Verification {
    if mode.is_none() && token.is_none() && challenge.is_none() {
        return Verification::Liveness;
    }

    let token_ok = match (token, expected_token) {
        (Some(given), Some(expected)) => constant_time_eq(given, expected),
        _ => false,
    };
    if mode != Some("subscribe") || !token_ok {
        warn!(mode = ?mode, "webhook verification failed");
        return Verification::Rejected;
    }

    match challenge {
        Some(challenge) => {
            info!("webhook verified");
            Verification::Verified(challenge.to_string())
        }
        None => Verification::MissingChallenge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: Option<&str> = Some("SECRET");

    #[test]
    fn subscribe_with_matching_token_echoes_challenge() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("SECRET"), Some("abc123"), SECRET),
            Verification::Verified("abc123".into())
        );
    }

    #[test]
    fn wrong_token_or_mode_is_rejected() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("nope"), Some("abc"), SECRET),
            Verification::Rejected
        );
        assert_eq!(
            verify_subscription(Some("unsubscribe"), Some("SECRET"), Some("abc"), SECRET),
            Verification::Rejected
        );
        assert_eq!(
            verify_subscription(None, Some("SECRET"), Some("abc"), SECRET),
            Verification::Rejected
        );
    }

    #[test]
    fn unconfigured_token_rejects_everything() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some(""), Some("abc"), None),
            Verification::Rejected
        );
    }

    #[test]
    fn bare_request_is_liveness() {
        assert_eq!(verify_subscription(None, None, None, SECRET), Verification::Liveness);
    }

    #[test]
    fn missing_challenge_is_reported() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("SECRET"), None, SECRET),
            Verification::MissingChallenge
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn rejection_is_logged_without_the_token() {
        verify_subscription(Some("subscribe"), Some("leaked-token"), Some("abc"), SECRET);
        assert!(logs_contain("webhook verification failed"));
        assert!(!logs_contain("leaked-token"));
    }
}
