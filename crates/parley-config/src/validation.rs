// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Checks constraints serde cannot express. All failures are collected;
//! validation does not stop at the first one.

use http::HeaderName;

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.host.trim().is_empty() {
        fail("server.host must not be empty".to_string());
    }

    for (key, value) in [
        ("auth.header_name", &config.auth.header_name),
        ("rate_limit.identity_header", &config.rate_limit.identity_header),
    ] {
        if HeaderName::from_bytes(value.as_bytes()).is_err() {
            fail(format!("{key} `{value}` is not a valid HTTP header name"));
        }
    }

    if let Some(key) = &config.auth.api_key
        && key.is_empty()
    {
        fail("auth.api_key must not be empty when set".to_string());
    }

    for path in &config.auth.public_paths {
        if !path.starts_with('/') {
            fail(format!("auth.public_paths entry `{path}` must start with `/`"));
        }
    }

    let limits = &config.rate_limit;
    for (key, value) in [
        ("rate_limit.capacity", limits.capacity),
        ("rate_limit.refill_tokens", limits.refill_tokens),
        ("rate_limit.refill_period_secs", limits.refill_period_secs),
        ("rate_limit.idle_ttl_secs", limits.idle_ttl_secs),
        ("rate_limit.sweep_interval_secs", limits.sweep_interval_secs),
        ("whatsapp.timeout_secs", config.whatsapp.timeout_secs),
    ] {
        if value < 1 {
            fail(format!("{key} must be at least 1, got {value}"));
        }
    }

    let base_url = config.whatsapp.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "whatsapp.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.whatsapp.api_version.trim().is_empty() {
        fail("whatsapp.api_version must not be empty".to_string());
    }

    if config.bot.fallback_response.trim().is_empty() {
        fail("bot.fallback_response must not be empty".to_string());
    }

    if config.bot.history_limit < 1 {
        fail(format!(
            "bot.history_limit must be at least 1, got {}",
            config.bot.history_limit
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &ParleyConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn zero_capacity_fails() {
        let mut config = ParleyConfig::default();
        config.rate_limit.capacity = 0;
        assert!(messages(&config).iter().any(|m| m.contains("rate_limit.capacity")));
    }

    #[test]
    fn invalid_header_name_fails() {
        let mut config = ParleyConfig::default();
        config.auth.header_name = "X API Key".into();
        assert!(messages(&config).iter().any(|m| m.contains("auth.header_name")));
    }

    #[test]
    fn relative_public_path_fails() {
        let mut config = ParleyConfig::default();
        config.auth.public_paths.push("webhook".into());
        assert!(messages(&config).iter().any(|m| m.contains("public_paths")));
    }

    #[test]
    fn bad_base_url_scheme_fails() {
        let mut config = ParleyConfig::default();
        config.whatsapp.base_url = "ftp://graph.facebook.com".into();
        assert!(messages(&config).iter().any(|m| m.contains("whatsapp.base_url")));
    }

    #[test]
    fn errors_are_collected_not_short_circuited() {
        let mut config = ParleyConfig::default();
        config.storage.database_path = String::new();
        config.bot.fallback_response = "  ".into();
        config.whatsapp.timeout_secs = 0;
        assert_eq!(messages(&config).len(), 3);
    }
}
