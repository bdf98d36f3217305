// sanitree-core/src/pipeline.rs
//! One-shot, non-interactive runs.
//!
//! [`run_sanitize`] strings the collaborators and both passes together in the order a
//! run needs them: unpack, clone skeleton, discover, write ledger, build the registry,
//! substitute, archive. Progress is reported through a callback, one call per phase.

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::alias::AliasAllocator;
use crate::archive::{create_result_archive, unpack_archives};
use crate::config::SanitizeConfig;
use crate::errors::SanitreeError;
use crate::ledger::Ledger;
use crate::passes::discovery::{run_discovery, DiscoveryStats};
use crate::passes::substitution::{run_substitution, SubstitutionOptions, SubstitutionStats};
use crate::sanitizers::compiler::{compile_alias_rules, compile_rules, AliasMatcher};
use crate::sanitizers::registry::{PatternRegistry, PatternRegistryBuilder};
use crate::text::EncodingPolicy;
use crate::tree::clone_dir_tree;

/// Format of run identifiers: month-day-year-hour-minute-second, local time.
pub const RUN_ID_FORMAT: &str = "%m-%d-%Y-%H-%M-%S";

/// A fresh run identifier based on the current local time.
pub fn new_run_id() -> String {
    Local::now().format(RUN_ID_FORMAT).to_string()
}

/// Coarse progress steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unpacking,
    CloningTree,
    Discovering,
    WritingLedger,
    Substituting,
    Archiving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Phase::Unpacking => "Unpacking zip files in the source directory, if any...",
            Phase::CloningTree => "Creating directory structure for the sanitized copy...",
            Phase::Discovering => "Searching for IP address and hostname patterns. This might take a while...",
            Phase::WritingLedger => "Saving the replacement dictionary...",
            Phase::Substituting => "Replacing all matches. This might take a while...",
            Phase::Archiving => "Creating archive of cleaned files...",
        };
        f.write_str(text)
    }
}

/// Everything a run needs besides the rules themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub run_id: String,
    pub source_root: PathBuf,
    /// Parent of the per-run destination directory.
    pub clean_root: PathBuf,
    pub ledger_dir: PathBuf,
    /// `None` disables archiving.
    pub archive_dir: Option<PathBuf>,
    pub unpack_archives: bool,
    pub tolerate_invalid_encoding: bool,
    pub atomic_writes: bool,
}

impl RunOptions {
    /// Builds options from the configured settings. Every path must be set.
    pub fn from_config(config: &SanitizeConfig, run_id: impl Into<String>) -> Result<Self> {
        let settings = &config.settings;
        let required = |value: &Option<PathBuf>, key: &str| {
            value
                .clone()
                .with_context(|| format!("Setting '{}' is not configured", key))
        };
        Ok(Self {
            run_id: run_id.into(),
            source_root: required(&settings.source_root, "source_root")?,
            clean_root: required(&settings.clean_root, "clean_root")?,
            ledger_dir: required(&settings.ledger_dir, "ledger_dir")?,
            archive_dir: if settings.create_archive() {
                Some(required(&settings.archive_dir, "archive_dir")?)
            } else {
                None
            },
            unpack_archives: settings.unpack_archives(),
            tolerate_invalid_encoding: settings.tolerate_invalid_encoding(),
            atomic_writes: settings.atomic_writes(),
        })
    }

    /// Directory receiving the sanitized copy: `<clean_root>/<run_id>`.
    pub fn destination(&self) -> PathBuf {
        self.clean_root.join(&self.run_id)
    }

    pub fn encoding_policy(&self) -> EncodingPolicy {
        EncodingPolicy::from_tolerance(self.tolerate_invalid_encoding)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub destination: PathBuf,
    pub ledger_path: PathBuf,
    pub archive_path: Option<PathBuf>,
    pub archives_unpacked: usize,
    pub discovery: DiscoveryStats,
    pub substitution: SubstitutionStats,
    /// `(category label, distinct values)` in category order.
    pub alias_counts: Vec<(String, usize)>,
    pub pattern_count: usize,
}

/// Compiled alias matchers plus an empty allocator for their categories.
fn prepare_discovery(config: &SanitizeConfig) -> Result<(Vec<AliasMatcher>, AliasAllocator)> {
    let matchers = compile_alias_rules(&config.aliases).context("Failed to compile alias rules")?;
    let allocator = AliasAllocator::new(matchers.iter().map(|m| m.category.clone()))?;
    Ok((matchers, allocator))
}

/// Runs discovery alone and returns the populated allocator.
pub fn discover_only(config: &SanitizeConfig, source_root: &Path, policy: EncodingPolicy) -> Result<(AliasAllocator, DiscoveryStats)> {
    let (matchers, mut allocator) = prepare_discovery(config)?;
    let stats = run_discovery(source_root, &matchers, &mut allocator, policy)
        .with_context(|| format!("Discovery failed under {}", source_root.display()))?;
    Ok((allocator, stats))
}

/// Builds the final registry: active static rules, then the resolved aliases.
pub fn build_registry(config: &SanitizeConfig, allocator: &AliasAllocator) -> Result<PatternRegistry> {
    let static_rules = compile_rules(config.active_rules()).context("Failed to compile redaction rules")?;
    let mut builder = PatternRegistryBuilder::new(static_rules);
    builder.register_aliases(allocator)?;
    Ok(builder.build())
}

/// Absolute form of `path` with symlinks and `..` resolved as far as the path exists.
fn resolve_existing_prefix(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).with_context(|| format!("Cannot resolve {}", path.display()))?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }
    let mut resolved = fs::canonicalize(existing).with_context(|| format!("Cannot resolve {}", path.display()))?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// Whether `path` is `root` or somewhere below it, after resolving both.
fn lies_within(path: &Path, root: &Path) -> Result<bool> {
    Ok(resolve_existing_prefix(path)?.starts_with(resolve_existing_prefix(root)?))
}

/// Executes a complete run.
pub fn run_sanitize(
    config: &SanitizeConfig,
    options: &RunOptions,
    mut on_phase: impl FnMut(Phase),
) -> Result<RunReport> {
    info!("Starting sanitize run {}", options.run_id);

    let destination = options.destination();
    if lies_within(&destination, &options.source_root)? {
        bail!(
            "Destination {} lies inside the source tree {}",
            destination.display(),
            options.source_root.display()
        );
    }
    // Unpacking rewrites the source tree, so refuse before it runs.
    if destination.exists() {
        return Err(SanitreeError::DestinationExists(destination).into());
    }

    // Compile everything up front so a bad rule fails before any file is touched.
    let (matchers, mut allocator) = prepare_discovery(config)?;
    let static_rules = compile_rules(config.active_rules()).context("Failed to compile redaction rules")?;

    let archives_unpacked = if options.unpack_archives {
        on_phase(Phase::Unpacking);
        unpack_archives(&options.source_root)
            .with_context(|| format!("Failed to unpack archives under {}", options.source_root.display()))?
    } else {
        0
    };

    on_phase(Phase::CloningTree);
    clone_dir_tree(&options.source_root, &destination)
        .with_context(|| format!("Failed to create directory skeleton at {}", destination.display()))?;

    on_phase(Phase::Discovering);
    let discovery = run_discovery(
        &options.source_root,
        &matchers,
        &mut allocator,
        options.encoding_policy(),
    )
    .with_context(|| format!("Discovery failed under {}", options.source_root.display()))?;

    on_phase(Phase::WritingLedger);
    let ledger_path = Ledger::from_allocator(&allocator)
        .write_to_dir(&options.ledger_dir, &options.run_id)
        .context("Failed to write replacement ledger")?;

    let mut builder = PatternRegistryBuilder::new(static_rules);
    builder.register_aliases(&allocator)?;
    let registry = builder.build();

    on_phase(Phase::Substituting);
    let substitution = run_substitution(
        &options.source_root,
        &destination,
        &registry,
        SubstitutionOptions {
            encoding: options.encoding_policy(),
            atomic_writes: options.atomic_writes,
        },
    )
    .context("Substitution failed")?;

    let archive_path = match &options.archive_dir {
        Some(dir) => {
            on_phase(Phase::Archiving);
            Some(create_result_archive(&destination, dir, &options.run_id).context("Failed to create result archive")?)
        }
        None => None,
    };

    let alias_counts = allocator
        .mappings()
        .map(|(category, mapping)| (category.label.clone(), mapping.len()))
        .collect();

    info!("Sanitize run {} completed", options.run_id);
    Ok(RunReport {
        run_id: options.run_id.clone(),
        destination,
        ledger_path,
        archive_path,
        archives_unpacked,
        discovery,
        substitution,
        alias_counts,
        pattern_count: registry.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunSettings;

    #[test]
    fn run_id_has_expected_shape() {
        let id = new_run_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 6);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn options_require_paths() {
        let config = SanitizeConfig::default();
        let err = RunOptions::from_config(&config, "x").unwrap_err();
        assert!(err.to_string().contains("source_root"));
    }

    #[test]
    fn archive_dir_is_optional_when_archiving_is_off() {
        let config = SanitizeConfig {
            settings: RunSettings {
                source_root: Some("/in".into()),
                clean_root: Some("/out".into()),
                ledger_dir: Some("/ledger".into()),
                create_archive: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let options = RunOptions::from_config(&config, "r1").unwrap();
        assert_eq!(options.archive_dir, None);
        assert_eq!(options.destination(), PathBuf::from("/out/r1"));
        assert!(options.tolerate_invalid_encoding);
    }

    #[test]
    fn relative_paths_are_resolved_before_comparing() {
        // Test binaries run from the crate directory, which holds `src`.
        assert!(lies_within(Path::new("src/clean/run-1"), Path::new("./src")).unwrap());
        assert!(lies_within(Path::new("./src"), Path::new("src/../src")).unwrap());
        assert!(!lies_within(Path::new("clean/run-1"), Path::new("./src")).unwrap());
    }

    #[test]
    fn registry_respects_disabled_rules() {
        let mut config = SanitizeConfig::load_default_rules().unwrap();
        config.set_active_rules(&[], &["email".to_string()]);
        let (_, mut allocator) = prepare_discovery(&config).unwrap();
        allocator.observe("ip", "10.1.2.3").unwrap();

        let registry = build_registry(&config, &allocator).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.apply("a@b.example.com 10.1.2.3"), "a@b.example.com ipaddr-1");
    }
}
