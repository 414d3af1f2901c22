// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a mistyped key
//! is reported at startup instead of silently ignored.

use std::fmt;
use std::time::Duration;

use parley_core::CorrelationPolicy;
use serde::{Deserialize, Serialize};

/// Top-level Parley configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Shared-secret admission gate.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Per-client token buckets.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// WhatsApp Cloud API credentials and endpoint.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Reply behavior.
    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Admission gate configuration.
///
/// With no `api_key` configured every non-public request is rejected.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Header that carries the shared secret.
    #[serde(default = "default_auth_header")]
    pub header_name: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass the gate. An entry ending in `/*` matches the
    /// prefix and everything below it.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("header_name", &self.header_name)
            .field("api_key", &redacted(&self.api_key))
            .field("public_paths", &self.public_paths)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header_name: default_auth_header(),
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

fn default_auth_header() -> String {
    "X-API-Key".to_string()
}

fn default_public_paths() -> Vec<String> {
    vec!["/webhook".to_string(), "/health".to_string()]
}

/// Token-bucket rate limiting. Each client starts with `capacity` tokens;
/// every full `refill_period_secs` adds `refill_tokens`, capped at capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_capacity")]
    pub capacity: u64,

    #[serde(default = "default_capacity")]
    pub refill_tokens: u64,

    #[serde(default = "default_refill_period_secs")]
    pub refill_period_secs: u64,

    /// Header whose value identifies the client. Falls back to the peer address.
    #[serde(default = "default_auth_header")]
    pub identity_header: String,

    /// Buckets untouched this long are evicted.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_capacity(),
            refill_tokens: default_capacity(),
            refill_period_secs: default_refill_period_secs(),
            identity_header: default_auth_header(),
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn refill_period(&self) -> Duration {
        Duration::from_secs(self.refill_period_secs)
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> u64 {
    100
}

fn default_refill_period_secs() -> u64 {
    60
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// WhatsApp Cloud API settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Bearer token for the send API.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Token echoed back by the provider during webhook verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// Sending phone number id. Also used as the sender id of outbound messages.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("access_token", &redacted(&self.access_token))
            .field("verify_token", &redacted(&self.verify_token))
            .field("phone_number_id", &self.phone_number_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            access_token: None,
            verify_token: None,
            phone_number_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WhatsAppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v17.0".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Reply behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Sent when no active intent matches.
    #[serde(default = "default_fallback_response")]
    pub fallback_response: String,

    #[serde(default)]
    pub correlation: CorrelationPolicy,

    /// Default page size for the history endpoint.
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            fallback_response: default_fallback_response(),
            correlation: CorrelationPolicy::default(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_fallback_response() -> String {
    "I'm sorry, I don't understand. Could you please rephrase?".to_string()
}

fn default_history_limit() -> i64 {
    50
}

/// SQLite storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .display()
        .to_string()
}

fn redacted(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "[redacted]",
        None => "None",
    }
}
