//! compiler.rs - Compiles configured rules into ready-to-run patterns.
//!
//! Static rules become [`CompiledPattern`]s with a fixed replacement; alias rules
//! become [`AliasMatcher`]s used by the discovery pass. Literal patterns for values
//! resolved during discovery are also built here.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::alias::AliasCategory;
use crate::config::{AliasRule, RedactionRule, MAX_PATTERN_LENGTH};
use crate::errors::SanitreeError;

const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// How the text matched by a pattern is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Fixed text; `$n` references to capture groups are expanded.
    Static(String),
    /// Alias minted during discovery; inserted verbatim.
    Alias { category: String, alias: String },
}

/// A single compiled pattern ready for application.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Rule name for static patterns, `<category>:<alias>` for resolved aliases.
    pub name: String,
    pub regex: Regex,
    pub replacement: Replacement,
}

impl CompiledPattern {
    /// Builds the literal pattern that rewrites every occurrence of `raw` to `alias`.
    pub fn resolved_alias(category: &AliasCategory, raw: &str, alias: &str) -> Result<Self, SanitreeError> {
        let regex = Regex::new(&regex::escape(raw))
            .map_err(|e| SanitreeError::RuleCompilationError(format!("{}:{}", category.name, alias), e))?;
        Ok(Self {
            name: format!("{}:{}", category.name, alias),
            regex,
            replacement: Replacement::Alias {
                category: category.name.clone(),
                alias: alias.to_string(),
            },
        })
    }
}

/// Ordered collection of compiled static rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledPattern>,
}

/// A compiled aliasing matcher used during discovery.
#[derive(Debug, Clone)]
pub struct AliasMatcher {
    pub category: AliasCategory,
    pub regex: Regex,
}

impl AliasMatcher {
    /// First match on the line, if any.
    pub fn first_match<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.regex.find(line).map(|m| m.as_str())
    }
}

fn build_regex(name: &str, pattern: &str, multiline: bool, dot_matches_new_line: bool) -> Result<Regex, SanitreeError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(SanitreeError::PatternLengthExceeded(
            name.to_string(),
            pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    RegexBuilder::new(pattern)
        .multi_line(multiline)
        .dot_matches_new_line(dot_matches_new_line)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| SanitreeError::RuleCompilationError(name.to_string(), e))
}

fn collect_errors<T>(compiled: Vec<T>, errors: Vec<SanitreeError>, what: &str) -> Result<Vec<T>, SanitreeError> {
    if errors.is_empty() {
        debug!("Finished compiling {}. Total compiled: {}.", what, compiled.len());
        return Ok(compiled);
    }
    let error_message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("\n");
    Err(SanitreeError::Fatal(format!(
        "Failed to compile {} {}:\n{}",
        errors.len(),
        what,
        error_message
    )))
}

/// Compiles static rules in the given order. All failures are reported together.
pub fn compile_rules(rules_to_compile: Vec<RedactionRule>) -> Result<CompiledRules, SanitreeError> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled_rules = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        let Some(pattern) = rule.pattern.as_deref() else {
            warn!("Skipping rule '{}' because its pattern is missing.", &rule.name);
            continue;
        };
        debug!("Attempting to compile rule: '{}'", &rule.name);

        match build_regex(&rule.name, pattern, rule.multiline, rule.dot_matches_new_line) {
            Ok(regex) => {
                log::debug!(
                    target: "sanitree_core::sanitizer",
                    "Rule '{}' compiled successfully.",
                    &rule.name
                );
                compiled_rules.push(CompiledPattern {
                    regex,
                    replacement: Replacement::Static(rule.replace_with),
                    name: rule.name,
                });
            }
            Err(e) => compilation_errors.push(e),
        }
    }

    collect_errors(compiled_rules, compilation_errors, "rule(s)").map(|rules| CompiledRules { rules })
}

/// Compiles alias rules into discovery matchers, preserving category order.
pub fn compile_alias_rules(alias_rules: &[AliasRule]) -> Result<Vec<AliasMatcher>, SanitreeError> {
    debug!("Starting compilation of {} alias categories.", alias_rules.len());

    let mut matchers = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in alias_rules {
        match build_regex(&rule.name, &rule.pattern, false, false) {
            Ok(regex) => matchers.push(AliasMatcher {
                category: AliasCategory::from(rule),
                regex,
            }),
            Err(e) => compilation_errors.push(e),
        }
    }

    collect_errors(matchers, compilation_errors, "alias categories")
}
