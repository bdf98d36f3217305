//! `sanitree sanitize`: the full pipeline.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::info;
use std::io;
use std::path::Path;

use sanitree_core::{new_run_id, run_sanitize, RunOptions, RunSettings};

use crate::cli::SanitizeCommand;
use crate::commands::{info_msg, load_config, success_msg, warn_msg};
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

/// Applies command-line overrides on top of the configured settings.
fn apply_overrides(settings: &mut RunSettings, cmd: &SanitizeCommand) {
    if let Some(source) = &cmd.source {
        settings.source_root = Some(source.clone());
    }
    if let Some(clean_root) = &cmd.clean_root {
        settings.clean_root = Some(clean_root.clone());
    }
    if let Some(ledger_dir) = &cmd.ledger_dir {
        settings.ledger_dir = Some(ledger_dir.clone());
    }
    if let Some(archive_dir) = &cmd.archive_dir {
        settings.archive_dir = Some(archive_dir.clone());
    }
    if cmd.no_unpack {
        settings.unpack_archives = Some(false);
    }
    if cmd.no_archive {
        settings.create_archive = Some(false);
    }
    if cmd.strict_encoding {
        settings.tolerate_invalid_encoding = Some(false);
    }
    if cmd.atomic_writes {
        settings.atomic_writes = Some(true);
    }
}

pub fn run_sanitize_command(
    cmd: &SanitizeCommand,
    config_path: Option<&Path>,
    quiet: bool,
    theme: &ThemeMap,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.set_active_rules(&cmd.selection.enable, &cmd.selection.disable);
    apply_overrides(&mut config.settings, cmd);

    let run_id = cmd.run_id.clone().unwrap_or_else(new_run_id);
    let options = RunOptions::from_config(&config, run_id)?;
    if !options.source_root.is_dir() {
        anyhow::bail!("Source directory {} does not exist", options.source_root.display());
    }
    if config.active_rules().is_empty() && config.aliases.is_empty() {
        warn_msg("No rules are active; the copy will be identical to the source.", theme);
    }

    info!("Sanitizing {} as run {}", options.source_root.display(), options.run_id);
    let report = run_sanitize(&config, &options, |phase| {
        if !quiet {
            info_msg(phase.to_string(), theme);
        }
    })
    .with_context(|| format!("Run {} failed", options.run_id))?;

    if quiet {
        return Ok(());
    }
    success_msg(
        format!("Replacement dictionary of matches is saved here: {}", report.ledger_path.display()),
        theme,
    );
    success_msg(format!("Cleaned files are here: {}", report.destination.display()), theme);
    if let Some(archive) = &report.archive_path {
        success_msg(format!("Archive of cleaned files: {}", archive.display()), theme);
    }
    if report.discovery.files_skipped > 0 {
        warn_msg(
            format!("{} unreadable file(s) were skipped during discovery.", report.discovery.files_skipped),
            theme,
        );
    }
    if !cmd.no_summary {
        let stderr_supports_color = io::stderr().is_terminal();
        summary::print_run_summary(&report, &mut io::stderr(), theme, stderr_supports_color)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn overrides_only_touch_named_settings() {
        let mut settings = RunSettings {
            source_root: Some(PathBuf::from("/configured/source")),
            clean_root: Some(PathBuf::from("/configured/clean")),
            ..Default::default()
        };
        let cmd = SanitizeCommand {
            clean_root: Some(PathBuf::from("/cli/clean")),
            no_archive: true,
            strict_encoding: true,
            ..Default::default()
        };
        apply_overrides(&mut settings, &cmd);

        assert_eq!(settings.source_root, Some(PathBuf::from("/configured/source")));
        assert_eq!(settings.clean_root, Some(PathBuf::from("/cli/clean")));
        assert!(!settings.create_archive());
        assert!(!settings.tolerate_invalid_encoding());
        assert!(settings.unpack_archives());
        assert!(!settings.atomic_writes());
    }
}
