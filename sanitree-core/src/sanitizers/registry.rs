//! registry.rs - The ordered pattern list applied during substitution.
//!
//! Patterns run one after another over the whole line: pattern N sees the output of
//! pattern N-1. Putting static rules (emails) ahead of resolved alias patterns (bare
//! IPs, hostnames) lets a whole email be consumed before its domain part could be
//! rewritten piecemeal.
//!
//! The registry is assembled by [`PatternRegistryBuilder`] once discovery has finished
//! and is immutable afterwards.

use log::debug;
use regex::NoExpand;
use std::borrow::Cow;

use crate::alias::AliasAllocator;
use crate::engine::SanitizationEngine;
use crate::errors::SanitreeError;
use crate::sanitizers::compiler::{CompiledPattern, CompiledRules, Replacement};

/// Collects patterns in application order.
#[derive(Debug, Default)]
pub struct PatternRegistryBuilder {
    patterns: Vec<CompiledPattern>,
}

impl PatternRegistryBuilder {
    /// Starts from the static rules, kept in declaration order.
    pub fn new(static_rules: CompiledRules) -> Self {
        Self {
            patterns: static_rules.rules,
        }
    }

    /// Appends a pattern.
    pub fn register(&mut self, pattern: CompiledPattern) -> &mut Self {
        self.patterns.push(pattern);
        self
    }

    /// Appends one literal pattern per discovered value: categories in allocator
    /// order, values in first-seen order.
    pub fn register_aliases(&mut self, allocator: &AliasAllocator) -> Result<&mut Self, SanitreeError> {
        for (category, mapping) in allocator.mappings() {
            debug!(
                "Registering {} resolved pattern(s) for category '{}'.",
                mapping.len(),
                category.name
            );
            for (raw, alias) in mapping.iter() {
                self.register(CompiledPattern::resolved_alias(category, raw, alias)?);
            }
        }
        Ok(self)
    }

    pub fn build(self) -> PatternRegistry {
        debug!("Pattern registry finalized with {} pattern(s).", self.patterns.len());
        PatternRegistry {
            patterns: self.patterns,
        }
    }
}

/// Immutable, ordered list of patterns.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
}

impl PatternRegistry {
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Runs every pattern over the line in order.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(line);
        for pattern in &self.patterns {
            let rewritten = match &pattern.replacement {
                Replacement::Static(text) => changed(pattern.regex.replace_all(&current, text.as_str())),
                Replacement::Alias { alias, .. } => {
                    changed(pattern.regex.replace_all(&current, NoExpand(alias.as_str())))
                }
            };
            if let Some(s) = rewritten {
                current = Cow::Owned(s);
            }
        }
        current
    }
}

fn changed(replaced: Cow<'_, str>) -> Option<String> {
    match replaced {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    }
}

impl SanitizationEngine for PatternRegistry {
    fn sanitize_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        self.apply(line)
    }

    fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasCategory;
    use crate::config::RedactionRule;
    use crate::sanitizers::compiler::compile_rules;

    fn static_rules(rules: &[(&str, &str, &str)]) -> CompiledRules {
        compile_rules(
            rules
                .iter()
                .map(|(name, pattern, replace_with)| RedactionRule {
                    name: name.to_string(),
                    pattern: Some(pattern.to_string()),
                    replace_with: replace_with.to_string(),
                    ..Default::default()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn unmatched_line_is_borrowed() {
        let registry = PatternRegistryBuilder::new(static_rules(&[("digits", r"\d+", "#")])).build();
        assert!(matches!(registry.apply("no numbers here"), Cow::Borrowed(_)));
    }

    #[test]
    fn later_patterns_see_earlier_output() {
        let registry = PatternRegistryBuilder::new(static_rules(&[
            ("word", "secret", "token42"),
            ("digits", r"\d+", "#"),
        ]))
        .build();
        assert_eq!(registry.apply("a secret b"), "a token# b");
    }

    #[test]
    fn all_matches_of_a_pattern_are_replaced() {
        let registry = PatternRegistryBuilder::new(static_rules(&[("digits", r"\d+", "#")])).build();
        assert_eq!(registry.apply("1 and 22 and 333"), "# and # and #");
    }

    #[test]
    fn capture_groups_expand_in_static_replacements() {
        let registry =
            PatternRegistryBuilder::new(static_rules(&[("user", r"user=(\w+)", "user=<$1>")])).build();
        assert_eq!(registry.apply("user=bob"), "user=<bob>");
    }

    #[test]
    fn aliases_follow_static_rules_in_category_order() {
        let mut alloc = AliasAllocator::new([
            AliasCategory::new("ip", "IP", "ipaddr"),
            AliasCategory::new("hostname", "Hostname", "host"),
        ])
        .unwrap();
        alloc.observe("hostname", "db.example.com").unwrap();
        alloc.observe("ip", "10.0.0.5").unwrap();

        let mut builder = PatternRegistryBuilder::new(static_rules(&[("email", r"\S+@\S+", "EMAIL")]));
        builder.register_aliases(&alloc).unwrap();
        let registry = builder.build();

        let names: Vec<&str> = registry.patterns().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["email", "ip:ipaddr-1", "hostname:host-1"]);
        assert_eq!(
            registry.apply("ops@db.example.com db.example.com 10.0.0.5"),
            "EMAIL host-1 ipaddr-1"
        );
    }

    #[test]
    fn alias_text_is_not_expanded() {
        let category = AliasCategory::new("odd", "Odd", "$1");
        let mut builder = PatternRegistryBuilder::default();
        builder.register(CompiledPattern::resolved_alias(&category, "x", "$1-1").unwrap());
        assert_eq!(builder.build().apply("x"), "$1-1");
    }
}
