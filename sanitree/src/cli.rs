// sanitree/src/cli.rs
//! This file defines the command-line interface (CLI) for the sanitree application,
//! including all available commands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "sanitree",
    author = "Sanitree Team",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scrub emails, IP addresses and hostnames from a directory tree",
    long_about = "Sanitree produces a sanitized copy of a directory tree. Emails and AWS internal hostnames are replaced with fixed markers; every distinct IP address and hostname gets a stable alias (ipaddr-1, host-1, ...) so relationships between machines survive anonymization. The alias table is saved as a ledger and the result is packed into a zip archive.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    /// Path to a custom configuration file (YAML), merged over the defaults.
    #[arg(
        long = "config",
        value_name = "FILE",
        global = true,
        env = "SANITREE_CONFIG",
        help = "Path to a custom configuration file (YAML). Defaults to the first sanitree.yaml found in the user config directories."
    )]
    pub config: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `sanitree` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the whole pipeline and writes the sanitized tree, ledger and archive.
    #[command(about = "Sanitize a directory tree into a mirrored copy, writing the ledger and archive.")]
    Sanitize(SanitizeCommand),

    /// Runs discovery only and emits the replacement ledger.
    #[command(about = "Discover IP addresses and hostnames and print (or save) the replacement ledger.")]
    Discover(DiscoverCommand),

    /// Lists the active patterns in the order they are applied.
    #[command(about = "List the static rules and alias categories in application order.")]
    Rules(RulesCommand),
}

/// Rule filtering shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleSelection {
    /// Explicitly enable these rule names (comma-separated), including opt-in rules.
    #[arg(long, short = 'e', value_delimiter = ',', help = "Enable these rule names (comma-separated), including opt-in rules.")]
    pub enable: Vec<String>,

    /// Explicitly disable these rule names (comma-separated).
    #[arg(long, short = 'x', value_delimiter = ',', help = "Disable these rule names (comma-separated).")]
    pub disable: Vec<String>,
}

/// Arguments for the `sanitize` command.
#[derive(Args, Debug, Clone, Default)]
pub struct SanitizeCommand {
    /// Tree to sanitize.
    #[arg(long, short = 's', value_name = "DIR", help = "Source tree to sanitize (overrides settings.source_root).")]
    pub source: Option<PathBuf>,

    /// Parent of the per-run output directory.
    #[arg(long = "clean-root", value_name = "DIR", help = "Directory receiving <run-id>/ with the sanitized copy.")]
    pub clean_root: Option<PathBuf>,

    /// Directory receiving the ledger.
    #[arg(long = "ledger-dir", value_name = "DIR", help = "Directory receiving match-<run-id>.json.")]
    pub ledger_dir: Option<PathBuf>,

    /// Directory receiving the result archive.
    #[arg(long = "archive-dir", value_name = "DIR", help = "Directory receiving support-archive-<run-id>.zip.")]
    pub archive_dir: Option<PathBuf>,

    /// Run identifier; a timestamp when omitted.
    #[arg(long = "run-id", value_name = "ID", help = "Name of the run's artifacts. Defaults to the current timestamp.")]
    pub run_id: Option<String>,

    #[arg(long = "no-unpack", help = "Do not expand zip files found in the source tree.")]
    pub no_unpack: bool,

    #[arg(long = "no-archive", help = "Do not create the result archive.")]
    pub no_archive: bool,

    #[arg(long = "strict-encoding", help = "Abort on invalid UTF-8 instead of dropping the offending bytes.")]
    pub strict_encoding: bool,

    #[arg(long = "atomic-writes", help = "Write each output file to a temporary sibling and rename it into place.")]
    pub atomic_writes: bool,

    /// Suppress the run summary.
    #[arg(long = "no-summary", help = "Suppress the run summary table.")]
    pub no_summary: bool,

    #[command(flatten)]
    pub selection: RuleSelection,
}

/// Arguments for the `discover` command.
#[derive(Args, Debug, Clone, Default)]
pub struct DiscoverCommand {
    /// Tree to scan.
    #[arg(long, short = 's', value_name = "DIR", help = "Source tree to scan (overrides settings.source_root).")]
    pub source: Option<PathBuf>,

    /// Write the ledger here instead of printing it.
    #[arg(long = "ledger-dir", value_name = "DIR", help = "Write match-<run-id>.json into this directory instead of printing the ledger.")]
    pub ledger_dir: Option<PathBuf>,

    #[arg(long = "run-id", value_name = "ID", help = "Name of the ledger file. Defaults to the current timestamp.")]
    pub run_id: Option<String>,

    #[arg(long = "strict-encoding", help = "Abort on invalid UTF-8 instead of dropping the offending bytes.")]
    pub strict_encoding: bool,
}

/// Arguments for the `rules` command.
#[derive(Args, Debug, Clone, Default)]
pub struct RulesCommand {
    #[command(flatten)]
    pub selection: RuleSelection,
}
