//! Colours used for console output.
//!
//! Each logical kind of message maps to an optional foreground colour. Colour is only
//! applied when the target stream is a terminal.

use owo_colors::AnsiColors;
use std::collections::HashMap;

/// Type alias for the theme map, providing a consistent type definition.
pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

/// The different logical parts of the output that can be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeEntry {
    /// Progress and general informational messages.
    Info,
    /// Messages reporting a produced artifact.
    Success,
    Warn,
    Error,
    /// Table headers.
    Header,
    /// Category or rule names in summaries.
    SummaryName,
    /// Counts in summaries.
    SummaryCount,
}

/// Represents the style configuration for a specific `ThemeEntry`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThemeStyle {
    pub fg: Option<AnsiColors>,
}

impl ThemeStyle {
    /// Returns the default theme map.
    pub fn default_theme_map() -> ThemeMap {
        [
            (ThemeEntry::Info, AnsiColors::Cyan),
            (ThemeEntry::Success, AnsiColors::Green),
            (ThemeEntry::Warn, AnsiColors::Yellow),
            (ThemeEntry::Error, AnsiColors::Red),
            (ThemeEntry::Header, AnsiColors::BrightWhite),
            (ThemeEntry::SummaryName, AnsiColors::Magenta),
            (ThemeEntry::SummaryCount, AnsiColors::BrightGreen),
        ]
        .into_iter()
        .map(|(entry, color)| (entry, ThemeStyle { fg: Some(color) }))
        .collect()
    }
}

/// Looks up the foreground colour for an entry, if any.
pub fn color_for(theme: &ThemeMap, entry: ThemeEntry) -> Option<AnsiColors> {
    theme.get(&entry).and_then(|style| style.fg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_covers_message_kinds() {
        let theme = ThemeStyle::default_theme_map();
        assert_eq!(color_for(&theme, ThemeEntry::Error), Some(AnsiColors::Red));
        assert_eq!(color_for(&theme, ThemeEntry::Warn), Some(AnsiColors::Yellow));
        assert!(color_for(&ThemeMap::new(), ThemeEntry::Info).is_none());
    }
}
