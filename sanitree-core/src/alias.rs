//! Alias allocation for identifiers discovered in the source tree.
//!
//! Each aliasing category owns an independent [`AliasMapping`] and counter. The first
//! time a raw value is observed under a category it receives `<prefix>-<n>` with the
//! next integer suffix; later observations return the same alias. Insertion order is
//! kept because it drives both the ledger layout and the order in which resolved alias
//! patterns are applied.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::config::AliasRule;
use crate::errors::SanitreeError;
use crate::pii_log::log_alias_assigned_debug;

/// Identity of an aliasing category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasCategory {
    pub name: String,
    pub label: String,
    pub prefix: String,
}

impl AliasCategory {
    pub fn new(name: impl Into<String>, label: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            prefix: prefix.into(),
        }
    }

    fn format_alias(&self, n: u64) -> String {
        format!("{}-{}", self.prefix, n)
    }
}

impl From<&AliasRule> for AliasCategory {
    fn from(rule: &AliasRule) -> Self {
        AliasCategory::new(&rule.name, &rule.label, &rule.prefix)
    }
}

/// Raw value → alias, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl AliasMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.index.get(raw).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(raw, alias)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Inserts a pair unless the key is already present. Returns false on duplicates.
    fn insert(&mut self, raw: String, alias: String) -> bool {
        if self.index.contains_key(&raw) {
            return false;
        }
        self.index.insert(raw.clone(), self.entries.len());
        self.entries.push((raw, alias));
        true
    }
}

impl Serialize for AliasMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (raw, alias) in &self.entries {
            map.serialize_entry(raw, alias)?;
        }
        map.end()
    }
}

struct AliasMappingVisitor;

impl<'de> Visitor<'de> for AliasMappingVisitor {
    type Value = AliasMapping;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of raw values to aliases")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = AliasMapping::new();
        while let Some((raw, alias)) = access.next_entry::<String, String>()? {
            if !mapping.insert(raw.clone(), alias) {
                return Err(serde::de::Error::custom(format!("duplicate key '{}'", raw)));
            }
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for AliasMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AliasMappingVisitor)
    }
}

#[derive(Debug, Clone)]
struct Namespace {
    category: AliasCategory,
    counter: u64,
    mapping: AliasMapping,
}

/// Run-scoped allocator holding one namespace per aliasing category.
#[derive(Debug, Clone, Default)]
pub struct AliasAllocator {
    namespaces: Vec<Namespace>,
}

impl AliasAllocator {
    /// Creates an allocator for the given categories, kept in the given order.
    pub fn new(categories: impl IntoIterator<Item = AliasCategory>) -> Result<Self, SanitreeError> {
        let mut namespaces: Vec<Namespace> = Vec::new();
        for category in categories {
            if namespaces.iter().any(|ns| ns.category.name == category.name) {
                return Err(SanitreeError::Fatal(format!(
                    "alias category '{}' declared twice",
                    category.name
                )));
            }
            namespaces.push(Namespace {
                category,
                counter: 0,
                mapping: AliasMapping::new(),
            });
        }
        Ok(Self { namespaces })
    }

    /// Returns the alias for `raw_value`, allocating the next one on first sight.
    pub fn observe(&mut self, category: &str, raw_value: &str) -> Result<&str, SanitreeError> {
        let ns = self
            .namespaces
            .iter_mut()
            .find(|ns| ns.category.name == category)
            .ok_or_else(|| SanitreeError::UnknownCategory(category.to_string()))?;

        if ns.mapping.get(raw_value).is_none() {
            ns.counter += 1;
            let alias = ns.category.format_alias(ns.counter);
            log_alias_assigned_debug(&ns.category.name, raw_value, &alias);
            ns.mapping.insert(raw_value.to_string(), alias);
        }

        // Present by construction.
        ns.mapping
            .get(raw_value)
            .ok_or_else(|| SanitreeError::Fatal("alias vanished after insertion".to_string()))
    }

    pub fn categories(&self) -> impl Iterator<Item = &AliasCategory> {
        self.namespaces.iter().map(|ns| &ns.category)
    }

    pub fn mapping(&self, category: &str) -> Option<&AliasMapping> {
        self.namespaces
            .iter()
            .find(|ns| ns.category.name == category)
            .map(|ns| &ns.mapping)
    }

    /// Every category with its mapping, in configured order.
    pub fn mappings(&self) -> impl Iterator<Item = (&AliasCategory, &AliasMapping)> {
        self.namespaces.iter().map(|ns| (&ns.category, &ns.mapping))
    }

    /// Total number of distinct values across all categories.
    pub fn total(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.mapping.len()).sum()
    }

    /// Installs a previously recorded mapping, e.g. one read back from a ledger.
    ///
    /// The category counter resumes after the highest suffix present.
    pub fn restore(&mut self, category: &str, mapping: AliasMapping) -> Result<(), SanitreeError> {
        let ns = self
            .namespaces
            .iter_mut()
            .find(|ns| ns.category.name == category)
            .ok_or_else(|| SanitreeError::UnknownCategory(category.to_string()))?;

        let prefix = format!("{}-", ns.category.prefix);
        let mut highest = 0;
        for (raw, alias) in mapping.iter() {
            let n = alias
                .strip_prefix(&prefix)
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| {
                    SanitreeError::LedgerFormat(format!(
                        "alias '{}' for '{}' does not carry prefix '{}'",
                        alias, raw, ns.category.prefix
                    ))
                })?;
            highest = highest.max(n);
        }
        ns.counter = highest;
        ns.mapping = mapping;
        Ok(())
    }
}
