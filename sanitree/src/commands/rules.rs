//! `sanitree rules`: show what a run would apply, in order.

use anyhow::Result;
use is_terminal::IsTerminal;
use std::io;
use std::path::Path;

use sanitree_core::{compile_alias_rules, compile_rules};

use crate::cli::RulesCommand;
use crate::commands::load_config;
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

pub fn run_rules_command(cmd: &RulesCommand, config_path: Option<&Path>, theme: &ThemeMap) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.set_active_rules(&cmd.selection.enable, &cmd.selection.disable);
    let active = config.active_rules();

    // Compile so that listing also proves the patterns are usable.
    compile_rules(active.clone())?;
    compile_alias_rules(&config.aliases)?;

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    summary::print_rules_table(&active, &config.aliases, &mut stdout.lock(), theme, supports_color)?;
    Ok(())
}
