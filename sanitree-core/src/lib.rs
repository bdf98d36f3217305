// sanitree-core/src/lib.rs
//! # Sanitree Core Library
//!
//! `sanitree-core` scrubs a directory tree of sensitive identifiers. It walks every file
//! twice: a discovery pass collects IP addresses and hostnames and assigns each distinct
//! value a counter-based alias (`ipaddr-1`, `host-1`, ...), then a substitution pass writes
//! a mirrored copy of the tree in which static rules (emails, AWS internal hostnames) and
//! every discovered value have been replaced. The alias table is saved as a ledger so the
//! mapping can be audited or reversed by whoever holds it.
//!
//! ## Modules
//!
//! * `config`: `RedactionRule`s, `AliasRule`s and run settings, loaded from YAML.
//! * `alias`: order-preserving alias mappings and the per-category counters.
//! * `sanitizers`: rule compilation and the ordered pattern registry.
//! * `engine`: the `SanitizationEngine` trait the substitution pass runs against.
//! * `passes`: the discovery and substitution sweeps.
//! * `ledger`: writing and reading the replacement dictionary.
//! * `tree`: file enumeration and directory skeleton cloning.
//! * `archive`: unpacking inbound zips and packing the result.
//! * `text`: line splitting and the invalid-encoding policy.
//! * `pii_log`: debug logging that never leaks raw values unless explicitly allowed.
//! * `pipeline`: one-shot runs tying everything together.
//!
//! ## Usage Example
//!
//! ```rust
//! use sanitree_core::{AliasAllocator, AliasCategory, PatternRegistryBuilder, SanitizeConfig, compile_rules};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = SanitizeConfig::load_default_rules()?;
//!
//!     let mut allocator = AliasAllocator::new([AliasCategory::new("ip", "IP", "ipaddr")])?;
//!     allocator.observe("ip", "10.1.2.3")?;
//!
//!     let mut builder = PatternRegistryBuilder::new(compile_rules(config.active_rules())?);
//!     builder.register_aliases(&allocator)?;
//!     let registry = builder.build();
//!
//!     assert_eq!(
//!         registry.apply("user@corp.example.com from 10.1.2.3"),
//!         "*** EMAIL REPLACED *** from ipaddr-1"
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Module-level operations return [`SanitreeError`]; the pipeline wraps them in
//! `anyhow::Error` with context describing the phase that failed.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod alias;
pub mod archive;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod passes;
pub mod pii_log;
pub mod pipeline;
pub mod sanitizers;
pub mod text;
pub mod tree;

/// Re-exports the configuration types and loaders.
pub use config::{
    config_candidate_paths,
    find_user_config,
    merge_rules,
    AliasRule,
    RedactionRule,
    RunSettings,
    SanitizeConfig,
    MAX_PATTERN_LENGTH,
};

pub use errors::SanitreeError;

pub use engine::SanitizationEngine;

pub use alias::{AliasAllocator, AliasCategory, AliasMapping};

pub use sanitizers::compiler::{
    compile_alias_rules,
    compile_rules,
    AliasMatcher,
    CompiledPattern,
    CompiledRules,
    Replacement,
};
pub use sanitizers::registry::{PatternRegistry, PatternRegistryBuilder};

pub use ledger::{ledger_file_name, Ledger, LedgerSection};

pub use text::EncodingPolicy;

pub use passes::discovery::{run_discovery, DiscoveryStats};
pub use passes::substitution::{run_substitution, SubstitutionOptions, SubstitutionStats};

/// Re-exports the one-shot entry points.
pub use pipeline::{
    build_registry,
    discover_only,
    new_run_id,
    run_sanitize,
    Phase,
    RunOptions,
    RunReport,
};

pub use pii_log::redact_sensitive;
