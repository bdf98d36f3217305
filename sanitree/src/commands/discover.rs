//! `sanitree discover`: scan a tree and emit the ledger without writing a copy.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::path::Path;

use sanitree_core::{discover_only, new_run_id, EncodingPolicy, Ledger};

use crate::cli::DiscoverCommand;
use crate::commands::{load_config, success_msg};
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

pub fn run_discover_command(
    cmd: &DiscoverCommand,
    config_path: Option<&Path>,
    quiet: bool,
    theme: &ThemeMap,
) -> Result<()> {
    let config = load_config(config_path)?;
    let source = cmd
        .source
        .clone()
        .or_else(|| config.settings.source_root.clone())
        .context("No source directory given and settings.source_root is not configured")?;
    if !source.is_dir() {
        anyhow::bail!("Source directory {} does not exist", source.display());
    }

    let tolerate = config.settings.tolerate_invalid_encoding() && !cmd.strict_encoding;
    let (allocator, stats) = discover_only(&config, &source, EncodingPolicy::from_tolerance(tolerate))?;
    let ledger = Ledger::from_allocator(&allocator);

    match &cmd.ledger_dir {
        Some(dir) => {
            let run_id = cmd.run_id.clone().unwrap_or_else(new_run_id);
            let path = ledger.write_to_dir(dir, &run_id)?;
            if !quiet {
                success_msg(
                    format!("Replacement dictionary of matches is saved here: {}", path.display()),
                    theme,
                );
            }
        }
        None => {
            let rendered = ledger.render()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(rendered.as_bytes())?;
            out.flush()?;
        }
    }

    if !quiet {
        let counts: Vec<(String, usize)> = ledger
            .sections
            .iter()
            .map(|s| (s.label.clone(), s.mapping.len()))
            .collect();
        let stderr_supports_color = io::stderr().is_terminal();
        summary::print_alias_counts(&counts, &mut io::stderr(), theme, stderr_supports_color)?;
        success_msg(
            format!(
                "Scanned {} file(s), {} line(s); {} line(s) contributed a value.",
                stats.files_scanned, stats.lines_scanned, stats.lines_matched
            ),
            theme,
        );
    }
    Ok(())
}
