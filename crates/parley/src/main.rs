// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a WhatsApp webhook chatbot.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use parley_config::{ConfigError, ParleyConfig};

/// Parley - a WhatsApp webhook chatbot.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Load this file (plus PARLEY_* env vars) instead of the search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<ParleyConfig, Vec<ConfigError>> {
    match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Commands::Serve) => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("parley: {e}");
                ExitCode::FAILURE
            }
        },
        Some(Commands::CheckConfig) => {
            print_summary(&config);
            ExitCode::SUCCESS
        }
        None => {
            println!("parley: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

fn print_summary(config: &ParleyConfig) {
    let set = |v: &Option<String>| if v.is_some() { "set" } else { "missing" };
    println!("configuration OK");
    println!("  listen            {}", config.server.bind_addr());
    println!("  database          {}", config.storage.database_path);
    println!("  api key           {}", set(&config.auth.api_key));
    println!(
        "  rate limit        {}",
        if config.rate_limit.enabled {
            format!(
                "{} tokens, +{} every {}s",
                config.rate_limit.capacity,
                config.rate_limit.refill_tokens,
                config.rate_limit.refill_period_secs
            )
        } else {
            "disabled".to_string()
        }
    );
    println!("  whatsapp token    {}", set(&config.whatsapp.access_token));
    println!("  verify token      {}", set(&config.whatsapp.verify_token));
    println!("  phone number id   {}", set(&config.whatsapp.phone_number_id));
    println!("  correlation       {}", config.bot.correlation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["parley", "serve", "--config", "/tmp/p.toml"]);
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));

        let cli = Cli::parse_from(["parley", "check-config"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = parley_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.server.port, 8080);
    }
}
