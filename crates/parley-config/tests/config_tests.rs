// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading.

use std::io::Write;
use std::path::Path;

use figment::Jail;
use parley_config::diagnostic::ConfigError;
use parley_config::{
    load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str,
};
use parley_core::CorrelationPolicy;
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9090
log_level = "debug"

[auth]
header_name = "X-Api-Token"
api_key = "admin-secret"
public_paths = ["/webhook", "/health", "/docs/*"]

[rate_limit]
enabled = false
capacity = 5
refill_tokens = 1
refill_period_secs = 10

[whatsapp]
base_url = "http://localhost:9999"
api_version = "v18.0"
access_token = "EAAG"
verify_token = "verify"
phone_number_id = "1234567890"
timeout_secs = 3

[bot]
fallback_response = "Pardon?"
correlation = "per_event"
history_limit = 20

[storage]
database_path = "/tmp/parley-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.bind_addr(), "0.0.0.0:9090");
    assert_eq!(config.auth.api_key.as_deref(), Some("admin-secret"));
    assert_eq!(config.auth.public_paths.len(), 3);
    assert!(!config.rate_limit.enabled);
    assert_eq!(config.rate_limit.capacity, 5);
    assert_eq!(config.rate_limit.refill_tokens, 1);
    assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("1234567890"));
    assert_eq!(config.whatsapp.timeout_secs, 3);
    assert_eq!(config.bot.fallback_response, "Pardon?");
    assert_eq!(config.bot.correlation, CorrelationPolicy::PerEvent);
    assert_eq!(config.bot.history_limit, 20);
    assert!(!config.storage.wal_mode);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.server.port, 8080);
    assert!(config.auth.api_key.is_none());
    assert!(config.whatsapp.access_token.is_none());
    assert_eq!(config.whatsapp.base_url, "https://graph.facebook.com");
    assert_eq!(
        config.bot.fallback_response,
        "I'm sorry, I don't understand. Could you please rephrase?"
    );
}

#[test]
fn typo_produces_unknown_key_with_suggestion() {
    let errors = load_and_validate_str("[whatsapp]\nacess_token = \"x\"\n")
        .expect_err("typo should be rejected");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "acess_token" && s == "access_token"
    )));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n")
        .expect_err("string port should be rejected");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

#[test]
fn semantic_errors_surface_as_validation() {
    let errors = load_and_validate_str("[rate_limit]\ncapacity = 0\n")
        .expect_err("zero capacity should be rejected");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("capacity"))
    ));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "parley.toml",
            "[server]\nport = 7000\n\n[whatsapp]\naccess_token = \"from-file\"\n",
        )?;
        jail.set_env("PARLEY_SERVER_PORT", "7100");
        jail.set_env("PARLEY_WHATSAPP_ACCESS_TOKEN", "from-env");
        jail.set_env("PARLEY_RATE_LIMIT_CAPACITY", "3");

        let config = load_config_from_path(Path::new("parley.toml"))?;
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.whatsapp.access_token.as_deref(), Some("from-env"));
        assert_eq!(config.rate_limit.capacity, 3);
        Ok(())
    });
}

#[test]
#[serial]
fn explicit_path_is_validated() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[bot]\nfallback_response = \"\"").unwrap();

    let errors = load_and_validate_path(file.path()).expect_err("empty fallback is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("fallback_response"))
    ));
}
