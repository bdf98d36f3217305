//! errors.rs - Custom error types for the sanitree-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// This enum represents all possible error types in the `sanitree-core` library.
///
/// `#[non_exhaustive]` keeps room for new variants without breaking callers
/// that match on it.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SanitreeError {
    #[error("Failed to compile rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Invalid UTF-8 in {path} at line {line}")]
    InvalidEncoding { path: PathBuf, line: usize },

    #[error("Destination directory {0} does not exist; the directory skeleton must be cloned before substitution")]
    MissingDestinationDir(PathBuf),

    #[error("Destination {0} already exists")]
    DestinationExists(PathBuf),

    #[error("Unknown alias category '{0}'")]
    UnknownCategory(String),

    #[error("Malformed ledger: {0}")]
    LedgerFormat(String),

    #[error("Failed to walk directory tree: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}
