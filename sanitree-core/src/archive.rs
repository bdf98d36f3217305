//! Zip handling around the core passes.
//!
//! Inbound: zip files found in the source tree are expanded next to where they were
//! found and then removed, so their contents go through both passes like any other
//! file. Outbound: the sanitized tree is packed into `support-archive-<run-id>.zip`.

use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::errors::SanitreeError;

/// Name of the output archive for a run.
pub fn archive_file_name(run_id: &str) -> String {
    format!("support-archive-{}.zip", run_id)
}

/// Expands every `*.zip` under `root` into its containing directory and deletes it.
///
/// Returns the number of archives expanded. A corrupt archive aborts the operation.
pub fn unpack_archives(root: &Path) -> Result<usize, SanitreeError> {
    let mut archives = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "zip") {
            archives.push(entry.into_path());
        }
    }

    for archive_path in &archives {
        let dest = archive_path.parent().unwrap_or(root);
        let extracted = extract_into(archive_path, dest)?;
        fs::remove_file(archive_path)?;
        info!(
            "Unpacked {} ({} entries) into {}",
            archive_path.display(),
            extracted,
            dest.display()
        );
    }
    Ok(archives.len())
}

fn extract_into(archive_path: &Path, dest: &Path) -> Result<usize, SanitreeError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(
                "Skipping entry '{}' in {}: unsafe path",
                entry.name(),
                archive_path.display()
            );
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted {}", out_path.display());
        extracted += 1;
    }
    Ok(extracted)
}

/// Zip entry names always use `/`, whatever the host separator is.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Packs `tree` into `archive_dir/support-archive-<run-id>.zip`.
pub fn create_result_archive(tree: &Path, archive_dir: &Path, run_id: &str) -> Result<PathBuf, SanitreeError> {
    fs::create_dir_all(archive_dir)?;
    let path = archive_dir.join(archive_file_name(run_id));
    if path.exists() {
        return Err(SanitreeError::DestinationExists(path));
    }

    let mut zip = ZipWriter::new(File::create(&path)?);
    let file_options: FileOptions<'_, ()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options: FileOptions<'_, ()> = FileOptions::default().unix_permissions(0o755);

    let mut files = 0;
    for entry in WalkDir::new(tree).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.path() == path.as_path() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(tree)
            .map_err(|e| SanitreeError::Fatal(e.to_string()))?;
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, file_options)?;
            io::copy(&mut File::open(entry.path())?, &mut zip)?;
            files += 1;
        }
    }
    zip.finish()?;

    info!("Created archive of cleaned files: {} ({} files)", path.display(), files);
    Ok(path)
}
