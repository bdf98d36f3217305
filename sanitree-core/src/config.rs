//! Configuration management for `sanitree-core`.
//!
//! This module defines the core data structures for static redaction rules, aliasing
//! rules and run settings. It handles deserialization of YAML configurations and
//! provides utilities for loading, merging, filtering and validating them.
//!
//! Rule order is significant: static rules are applied in declaration order, and the
//! order of `aliases` decides both the per-line discovery precedence and the order in
//! which resolved alias patterns are appended to the registry.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// File name looked up in the user configuration directories.
pub const USER_CONFIG_FILE_NAME: &str = "sanitree.yaml";

lazy_static! {
    static ref CAPTURE_GROUP_REF: Regex = Regex::new(r"\$(\d+)").unwrap();
}

/// A rule whose matches are always replaced with the same text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactionRule {
    /// Unique identifier for the rule (e.g., "email").
    pub name: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: Option<String>,
    /// The string to replace matches with. May reference capture groups as `$1`.
    pub replace_with: String,
    /// If true, enables multiline mode for the regex engine.
    pub multiline: bool,
    /// If true, the dot character `.` in regex will match newlines.
    pub dot_matches_new_line: bool,
    /// If true, the rule is disabled unless explicitly enabled.
    pub opt_in: bool,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
    /// Metadata tags for categorization.
    pub tags: Option<Vec<String>>,
}

impl Default for RedactionRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            pattern: None,
            replace_with: "[REDACTED]".to_string(),
            multiline: false,
            dot_matches_new_line: false,
            opt_in: false,
            enabled: None,
            tags: None,
        }
    }
}

/// A rule whose distinct matches each receive their own counter-based alias.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AliasRule {
    /// Category name used by the allocator (e.g. "ip").
    pub name: String,
    /// Label written into the ledger header (e.g. "IP").
    pub label: String,
    /// Alias prefix; aliases read `<prefix>-<n>`.
    pub prefix: String,
    /// The regex pattern string.
    pub pattern: String,
    pub description: Option<String>,
}

/// Run settings. Every field is optional so a user file can override only what it names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunSettings {
    /// Tree to sanitize.
    pub source_root: Option<PathBuf>,
    /// Parent of the per-run destination directories.
    pub clean_root: Option<PathBuf>,
    /// Directory receiving `match-<run-id>.json`.
    pub ledger_dir: Option<PathBuf>,
    /// Directory receiving `support-archive-<run-id>.zip`.
    pub archive_dir: Option<PathBuf>,
    pub tolerate_invalid_encoding: Option<bool>,
    pub atomic_writes: Option<bool>,
    pub unpack_archives: Option<bool>,
    pub create_archive: Option<bool>,
}

impl RunSettings {
    pub fn tolerate_invalid_encoding(&self) -> bool {
        self.tolerate_invalid_encoding.unwrap_or(true)
    }

    pub fn atomic_writes(&self) -> bool {
        self.atomic_writes.unwrap_or(false)
    }

    pub fn unpack_archives(&self) -> bool {
        self.unpack_archives.unwrap_or(true)
    }

    pub fn create_archive(&self) -> bool {
        self.create_archive.unwrap_or(true)
    }

    /// Overlays every field set in `other` on top of `self`.
    fn overlay(&mut self, other: RunSettings) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if other.$field.is_some() {
                        debug!("Overriding setting '{}' with user value.", stringify!($field));
                        self.$field = other.$field;
                    }
                )*
            };
        }
        take!(
            source_root,
            clean_root,
            ledger_dir,
            archive_dir,
            tolerate_invalid_encoding,
            atomic_writes,
            unpack_archives,
            create_archive
        );
    }
}

/// Represents the top-level configuration structure for sanitree.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SanitizeConfig {
    pub settings: RunSettings,
    /// Static rules, applied in this order.
    pub rules: Vec<RedactionRule>,
    /// Aliasing categories, in priority order.
    pub aliases: Vec<AliasRule>,
}

impl SanitizeConfig {
    /// Loads a configuration from a YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SanitizeConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        info!(
            "Loaded {} rules and {} alias categories from file {}.",
            config.rules.len(),
            config.aliases.len(),
            path.display()
        );

        Ok(config)
    }

    /// Loads the default rules, alias categories and settings from the embedded configuration.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let config: SanitizeConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default rules")?;

        debug!(
            "Loaded {} default rules and {} alias categories.",
            config.rules.len(),
            config.aliases.len()
        );
        Ok(config)
    }

    /// Filters static rules based on enable/disable lists provided via CLI.
    ///
    /// Rules named in `enable_rules` are switched on even if opt-in or disabled in a file.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();

        debug!("Initial rules count before filtering: {}", self.rules.len());

        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist.", rule_name);
        }

        for rule_name in disable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `disable_rules` list does not exist.", rule_name);
        }

        self.rules.retain_mut(|rule| {
            let rule_name_str = rule.name.as_str();
            if disable_set.contains(rule_name_str) {
                return false;
            }
            if enable_set.contains(rule_name_str) {
                rule.enabled = Some(true);
                return true;
            }
            !rule.opt_in && rule.enabled != Some(false)
        });

        debug!("Final active rules count after filtering: {}", self.rules.len());
    }

    /// Static rules that will be compiled, in application order.
    pub fn active_rules(&self) -> Vec<RedactionRule> {
        self.rules
            .iter()
            .filter(|r| r.enabled != Some(false) && (!r.opt_in || r.enabled == Some(true)))
            .cloned()
            .collect()
    }

    /// Validates rule integrity (regex compilation, capture groups, alias prefixes).
    pub fn validate(&self) -> Result<()> {
        validate_rules(&self.rules, &self.aliases)
    }
}

/// Merges a user-defined configuration over the defaults.
///
/// A user rule with the name of a default rule replaces it in place, keeping the
/// default's position; new rules are appended. Alias categories merge the same way.
pub fn merge_rules(default_config: SanitizeConfig, user_config: Option<SanitizeConfig>) -> SanitizeConfig {
    debug!(
        "merge_rules called. Initial default rules count: {}",
        default_config.rules.len()
    );

    let SanitizeConfig {
        mut settings,
        mut rules,
        mut aliases,
    } = default_config;

    if let Some(user_cfg) = user_config {
        debug!(
            "User config provided. Merging {} user rules and {} alias categories.",
            user_cfg.rules.len(),
            user_cfg.aliases.len()
        );
        for user_rule in user_cfg.rules {
            match rules.iter_mut().find(|r| r.name == user_rule.name) {
                Some(existing) => *existing = user_rule,
                None => rules.push(user_rule),
            }
        }
        for user_alias in user_cfg.aliases {
            match aliases.iter_mut().find(|a| a.name == user_alias.name) {
                Some(existing) => *existing = user_alias,
                None => aliases.push(user_alias),
            }
        }
        settings.overlay(user_cfg.settings);
    }

    debug!("Final total rules after merge: {}", rules.len());

    SanitizeConfig {
        settings,
        rules,
        aliases,
    }
}

/// Locations searched for a user configuration file, most specific first.
pub fn config_candidate_paths() -> Vec<PathBuf> {
    let candidates = vec![
        dirs::config_dir().map(|p| p.join("sanitree").join(USER_CONFIG_FILE_NAME)),
        dirs::home_dir().map(|p| p.join(".sanitree").join(USER_CONFIG_FILE_NAME)),
        Some(PathBuf::from("/etc/sanitree").join(USER_CONFIG_FILE_NAME)),
    ];
    candidates.into_iter().flatten().collect()
}

/// Returns the first user configuration file that exists, if any.
pub fn find_user_config() -> Option<PathBuf> {
    let found = config_candidate_paths().into_iter().find(|p| p.is_file());
    if let Some(path) = &found {
        debug!("Found user configuration at {}", path.display());
    }
    found
}

fn validate_rules(rules: &[RedactionRule], aliases: &[AliasRule]) -> Result<()> {
    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        let pattern = match &rule.pattern {
            Some(p) if !p.is_empty() => p,
            Some(_) => {
                errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
                continue;
            }
            None => {
                errors.push(format!("Rule '{}' is missing the `pattern` field.", rule.name));
                continue;
            }
        };

        if pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule '{}': pattern length ({}) exceeds maximum allowed ({}).",
                rule.name,
                pattern.len(),
                MAX_PATTERN_LENGTH
            ));
            continue;
        }

        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
                continue;
            }
        };

        // captures_len includes the implicit whole-match group 0.
        let group_count = regex.captures_len() - 1;
        for cap in CAPTURE_GROUP_REF.captures_iter(&rule.replace_with) {
            if let Some(Ok(group_num)) = cap.get(1).map(|g| g.as_str().parse::<usize>()) {
                if group_num > group_count {
                    errors.push(format!(
                        "Rule '{}': replacement references non-existent capture group '${}'.",
                        rule.name, group_num
                    ));
                }
            }
        }
    }

    for alias in aliases {
        if alias.name.is_empty() {
            errors.push("An alias category has an empty `name` field.".to_string());
        } else if !names.insert(alias.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", alias.name));
        }

        if alias.label.trim().is_empty() {
            errors.push(format!("Alias category '{}' has an empty `label` field.", alias.name));
        }

        if alias.prefix.is_empty() {
            errors.push(format!("Alias category '{}' has an empty `prefix` field.", alias.name));
        } else if !prefixes.insert(alias.prefix.clone()) {
            errors.push(format!(
                "Alias category '{}' reuses prefix '{}'.",
                alias.name, alias.prefix
            ));
        }

        if alias.pattern.is_empty() {
            errors.push(format!("Alias category '{}' has an empty `pattern` field.", alias.name));
        } else if let Err(e) = Regex::new(&alias.pattern) {
            errors.push(format!(
                "Alias category '{}' has an invalid regex pattern: {}",
                alias.name, e
            ));
        }
    }

    if !errors.is_empty() {
        let full_error_message = format!("Rule validation failed:\n{}", errors.join("\n"));
        Err(anyhow!(full_error_message))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str, replace_with: &str) -> RedactionRule {
        RedactionRule {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            replace_with: replace_with.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_rules_are_valid_and_ordered() {
        let config = SanitizeConfig::load_default_rules().unwrap();
        config.validate().unwrap();
        let names: Vec<&str> = config.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["email", "aws_internal_hostname"]);
        let aliases: Vec<(&str, &str)> = config
            .aliases
            .iter()
            .map(|a| (a.name.as_str(), a.prefix.as_str()))
            .collect();
        assert_eq!(aliases, vec![("ip", "ipaddr"), ("hostname", "host")]);
    }

    #[test]
    fn validation_rejects_missing_capture_group() {
        let rules = vec![rule("bad", "abc", "$1")];
        let err = validate_rules(&rules, &[]).unwrap_err();
        assert!(err.to_string().contains("non-existent capture group"));
    }

    #[test]
    fn validation_ignores_non_capturing_groups() {
        let rules = vec![rule("ok", "(?:a)(b)", "$1")];
        assert!(validate_rules(&rules, &[]).is_ok());
        let rules = vec![rule("bad", "(?:a)(?:b)", "$1")];
        assert!(validate_rules(&rules, &[]).is_err());
    }

    #[test]
    fn validation_rejects_shared_alias_prefix() {
        let aliases = vec![
            AliasRule {
                name: "a".into(),
                label: "A".into(),
                prefix: "x".into(),
                pattern: "a".into(),
                description: None,
            },
            AliasRule {
                name: "b".into(),
                label: "B".into(),
                prefix: "x".into(),
                pattern: "b".into(),
                description: None,
            },
        ];
        let err = validate_rules(&[], &aliases).unwrap_err();
        assert!(err.to_string().contains("reuses prefix"));
    }

    #[test]
    fn merge_keeps_default_position() {
        let default_config = SanitizeConfig {
            rules: vec![rule("first", "a", "A"), rule("second", "b", "B")],
            ..Default::default()
        };
        let user = SanitizeConfig {
            rules: vec![rule("first", "a", "OVERRIDE"), rule("third", "c", "C")],
            settings: RunSettings {
                atomic_writes: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge_rules(default_config, Some(user));
        let order: Vec<(&str, &str)> = merged
            .rules
            .iter()
            .map(|r| (r.name.as_str(), r.replace_with.as_str()))
            .collect();
        assert_eq!(order, vec![("first", "OVERRIDE"), ("second", "B"), ("third", "C")]);
        assert!(merged.settings.atomic_writes());
        assert!(merged.settings.tolerate_invalid_encoding());
    }

    #[test]
    fn enable_list_overrides_opt_in() {
        let mut config = SanitizeConfig {
            rules: vec![
                RedactionRule {
                    opt_in: true,
                    ..rule("optional", "x", "X")
                },
                rule("always", "y", "Y"),
            ],
            ..Default::default()
        };
        config.set_active_rules(&["optional".to_string()], &["always".to_string()]);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].name, "optional");
        assert_eq!(config.active_rules().len(), 1);
    }
}
