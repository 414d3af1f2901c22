// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/parley/parley.toml`,
//! `~/.config/parley/parley.toml`, `./parley.toml`, `PARLEY_*` variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// Sections that `PARLEY_<SECTION>_<KEY>` variables may address.
const SECTIONS: &[&str] = &["server", "auth", "rate_limit", "whatsapp", "bot", "storage"];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/parley/parley.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("parley/parley.toml"));
    }
    paths.push(PathBuf::from("parley.toml"));
    paths
}

/// Loads configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Loads a TOML string over the compiled defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads a single explicit file with env overrides, skipping the hierarchy.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full hierarchy before extraction.
pub fn build_figment() -> Figment {
    search_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(ParleyConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    )
    .merge(env_provider())
}

/// `PARLEY_*` provider with an explicit section split.
///
/// Keys contain underscores, so a plain `split("_")` would turn
/// `PARLEY_WHATSAPP_ACCESS_TOKEN` into `whatsapp.access.token`.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    // Longest section first so `rate_limit_` is not mistaken for another.
    let mut sections: Vec<&str> = SECTIONS.to_vec();
    sections.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for section in sections {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("whatsapp_access_token"), "whatsapp.access_token");
        assert_eq!(map_env_key("rate_limit_idle_ttl_secs"), "rate_limit.idle_ttl_secs");
        assert_eq!(map_env_key("server_port"), "server.port");
        assert_eq!(map_env_key("auth_api_key"), "auth.api_key");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("nonsense"), "nonsense");
    }

    #[test]
    fn search_paths_end_with_local_file() {
        let paths = search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/parley/parley.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("parley.toml")));
    }
}
