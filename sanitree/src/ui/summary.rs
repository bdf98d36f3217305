//! Tabular summaries rendered with `comfy-table`.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use owo_colors::AnsiColors;
use std::io::{self, Write};

use sanitree_core::{AliasRule, RedactionRule, RunReport};

use crate::ui::theme::{color_for, ThemeEntry, ThemeMap};

/// Longest pattern shown in the rules table before it is elided.
const PATTERN_PREVIEW_LEN: usize = 48;

fn table_color(color: AnsiColors) -> Color {
    match color {
        AnsiColors::Black => Color::Black,
        AnsiColors::Red => Color::DarkRed,
        AnsiColors::Green => Color::DarkGreen,
        AnsiColors::Yellow => Color::DarkYellow,
        AnsiColors::Blue => Color::DarkBlue,
        AnsiColors::Magenta => Color::DarkMagenta,
        AnsiColors::Cyan => Color::DarkCyan,
        AnsiColors::White => Color::Grey,
        AnsiColors::BrightBlack => Color::DarkGrey,
        AnsiColors::BrightRed => Color::Red,
        AnsiColors::BrightGreen => Color::Green,
        AnsiColors::BrightYellow => Color::Yellow,
        AnsiColors::BrightBlue => Color::Blue,
        AnsiColors::BrightMagenta => Color::Magenta,
        AnsiColors::BrightCyan => Color::Cyan,
        _ => Color::White,
    }
}

fn styled(text: impl ToString, entry: ThemeEntry, theme: &ThemeMap, enable_colors: bool) -> Cell {
    let cell = Cell::new(text);
    match color_for(theme, entry) {
        Some(color) if enable_colors => cell.fg(table_color(color)),
        _ => cell,
    }
}

fn new_table(headers: &[&str], theme: &ThemeMap, enable_colors: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !enable_colors {
        table.force_no_tty();
    }
    table.set_header(
        headers
            .iter()
            .map(|h| styled(h, ThemeEntry::Header, theme, enable_colors))
            .collect::<Vec<_>>(),
    );
    table
}

fn preview(pattern: &str) -> String {
    if pattern.chars().count() <= PATTERN_PREVIEW_LEN {
        pattern.to_string()
    } else {
        let head: String = pattern.chars().take(PATTERN_PREVIEW_LEN).collect();
        format!("{}...", head)
    }
}

/// Prints the per-category alias counts and pass statistics of a finished run.
pub fn print_run_summary<W: Write>(
    report: &RunReport,
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    let mut table = new_table(&["Category", "Distinct values"], theme, enable_colors);
    for (label, count) in &report.alias_counts {
        table.add_row(vec![
            styled(label, ThemeEntry::SummaryName, theme, enable_colors),
            styled(count, ThemeEntry::SummaryCount, theme, enable_colors),
        ]);
    }
    writeln!(writer, "{}", table)?;

    let mut stats = new_table(&["Pass", "Files", "Lines", "Lines matched"], theme, enable_colors);
    stats.add_row(vec![
        Cell::new("discovery"),
        Cell::new(format!(
            "{} ({} skipped)",
            report.discovery.files_scanned, report.discovery.files_skipped
        )),
        Cell::new(report.discovery.lines_scanned),
        Cell::new(report.discovery.lines_matched),
    ]);
    stats.add_row(vec![
        Cell::new("substitution"),
        Cell::new(report.substitution.files_written),
        Cell::new(report.substitution.lines_written),
        Cell::new(report.substitution.lines_rewritten),
    ]);
    writeln!(writer, "{}", stats)
}

/// Prints the alias counts of a discovery-only run.
pub fn print_alias_counts<W: Write>(
    counts: &[(String, usize)],
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    let mut table = new_table(&["Category", "Distinct values"], theme, enable_colors);
    for (label, count) in counts {
        table.add_row(vec![
            styled(label, ThemeEntry::SummaryName, theme, enable_colors),
            styled(count, ThemeEntry::SummaryCount, theme, enable_colors),
        ]);
    }
    writeln!(writer, "{}", table)
}

/// Prints static rules followed by alias categories, numbered in application order.
pub fn print_rules_table<W: Write>(
    rules: &[RedactionRule],
    aliases: &[AliasRule],
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    let mut table = new_table(&["#", "Name", "Kind", "Replacement", "Pattern"], theme, enable_colors);
    let mut position = 0;
    for rule in rules {
        position += 1;
        table.add_row(vec![
            Cell::new(position),
            styled(&rule.name, ThemeEntry::SummaryName, theme, enable_colors),
            Cell::new("static"),
            Cell::new(&rule.replace_with),
            Cell::new(preview(rule.pattern.as_deref().unwrap_or(""))),
        ]);
    }
    for alias in aliases {
        position += 1;
        table.add_row(vec![
            Cell::new(position),
            styled(&alias.name, ThemeEntry::SummaryName, theme, enable_colors),
            Cell::new("alias"),
            Cell::new(format!("{}-<n>", alias.prefix)),
            Cell::new(preview(&alias.pattern)),
        ]);
    }
    writeln!(writer, "{}", table)
}
