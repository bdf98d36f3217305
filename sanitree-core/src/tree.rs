//! Directory-tree helpers shared by both passes.
//!
//! Traversal is sorted by file name at every level so that discovery assigns the
//! same aliases to the same tree on every run. Symlinks are not followed.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::SanitreeError;

/// A regular file found under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the root it was found under.
    pub relative: PathBuf,
}

/// Lists every regular file under `root` in deterministic order.
pub fn collect_files(root: &Path) -> Result<Vec<SourceFile>, SanitreeError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| SanitreeError::Fatal(format!("{} escaped {}: {}", entry.path().display(), root.display(), e)))?
            .to_path_buf();
        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            relative,
        });
    }
    debug!("Collected {} file(s) under {}", files.len(), root.display());
    Ok(files)
}

/// Creates `dest` and every subdirectory of `src` beneath it, without any files.
///
/// `dest` itself must not exist yet.
pub fn clone_dir_tree(src: &Path, dest: &Path) -> Result<usize, SanitreeError> {
    if dest.exists() {
        return Err(SanitreeError::DestinationExists(dest.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(dest)?;

    let mut created = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| SanitreeError::Fatal(e.to_string()))?;
        fs::create_dir(dest.join(relative))?;
        created += 1;
    }
    info!(
        "Created directory skeleton at {} ({} subdirectories)",
        dest.display(),
        created
    );
    Ok(created)
}
