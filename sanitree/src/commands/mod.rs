// sanitree/src/commands/mod.rs
//! Command implementations and the helpers they share.

pub mod discover;
pub mod rules;
pub mod sanitize;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::io;
use std::path::Path;

use sanitree_core::{find_user_config, merge_rules, SanitizeConfig};

use crate::cli::{Cli, Commands};
use crate::ui::output_format;
use crate::ui::theme::ThemeMap;

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing success messages to stderr.
pub fn success_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_success_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Loads the embedded defaults and merges the user configuration over them.
///
/// An explicit path must exist. Without one, the first `sanitree.yaml` found in the
/// user configuration directories is used, if any.
pub fn load_config(explicit: Option<&Path>) -> Result<SanitizeConfig> {
    let defaults = SanitizeConfig::load_default_rules().context("Failed to load default rules")?;

    let user_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_user_config(),
    };
    let user_config = match user_path {
        Some(path) => {
            info!("Using configuration file {}", path.display());
            Some(
                SanitizeConfig::load_from_file(&path)
                    .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
            )
        }
        None => {
            debug!("No user configuration found; using defaults only.");
            None
        }
    };

    let merged = merge_rules(defaults, user_config);
    merged.validate().context("Merged configuration is invalid")?;
    Ok(merged)
}

/// Runs the selected subcommand.
pub fn dispatch(cli: &Cli, theme: &ThemeMap) -> Result<()> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Sanitize(cmd) => sanitize::run_sanitize_command(cmd, config_path, cli.quiet, theme),
        Commands::Discover(cmd) => discover::run_discover_command(cmd, config_path, cli.quiet, theme),
        Commands::Rules(cmd) => rules::run_rules_command(cmd, config_path, theme),
    }
}
