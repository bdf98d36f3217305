// sanitree-core/src/ledger.rs
//! The replacement ledger written at the end of discovery.
//!
//! The file is meant to be read by people auditing a run, so it keeps the simple
//! layout of one labelled JSON object per category:
//!
//! ```text
//! # IP replacement dictionary:
//! {"10.1.2.3":"ipaddr-1"}
//! # Hostname replacement dictionary:
//! {"db.example.com":"host-1"}
//! ```
//!
//! Keys appear in first-seen order, so parsing the file back reconstructs the exact
//! mappings used during substitution.
//!
//! License: MIT OR APACHE 2.0

use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::alias::{AliasAllocator, AliasMapping};
use crate::errors::SanitreeError;

const HEADER_SUFFIX: &str = "replacement dictionary:";

/// Name of the ledger file for a run.
pub fn ledger_file_name(run_id: &str) -> String {
    format!("match-{}.json", run_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSection {
    pub label: String,
    pub mapping: AliasMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub sections: Vec<LedgerSection>,
}

impl Ledger {
    /// Snapshots every mapping of the allocator, in category order.
    pub fn from_allocator(allocator: &AliasAllocator) -> Self {
        let sections = allocator
            .mappings()
            .map(|(category, mapping)| LedgerSection {
                label: category.label.clone(),
                mapping: mapping.clone(),
            })
            .collect();
        Self { sections }
    }

    pub fn mapping(&self, label: &str) -> Option<&AliasMapping> {
        self.sections
            .iter()
            .find(|s| s.label == label)
            .map(|s| &s.mapping)
    }

    pub fn render(&self) -> Result<String, SanitreeError> {
        let mut out = String::new();
        for section in &self.sections {
            let json = serde_json::to_string(&section.mapping)
                .map_err(|e| SanitreeError::Fatal(format!("failed to serialize ledger: {}", e)))?;
            out.push_str(&format!("# {} {}\n", section.label, HEADER_SUFFIX));
            out.push_str(&json);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn parse(text: &str) -> Result<Self, SanitreeError> {
        let mut sections = Vec::new();
        let mut pending: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                if let Some(label) = pending.take() {
                    return Err(SanitreeError::LedgerFormat(format!(
                        "section '{}' has no mapping before line {}",
                        label,
                        idx + 1
                    )));
                }
                let label = header
                    .trim()
                    .strip_suffix(HEADER_SUFFIX)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        SanitreeError::LedgerFormat(format!("unrecognised header at line {}", idx + 1))
                    })?;
                pending = Some(label.to_string());
                continue;
            }
            let label = pending.take().ok_or_else(|| {
                SanitreeError::LedgerFormat(format!("mapping without a header at line {}", idx + 1))
            })?;
            let mapping: AliasMapping = serde_json::from_str(line).map_err(|e| {
                SanitreeError::LedgerFormat(format!("invalid mapping at line {}: {}", idx + 1, e))
            })?;
            sections.push(LedgerSection { label, mapping });
        }

        if let Some(label) = pending {
            return Err(SanitreeError::LedgerFormat(format!(
                "section '{}' has no mapping",
                label
            )));
        }
        Ok(Self { sections })
    }

    /// Writes `match-<run-id>.json` into `dir`. Refuses to overwrite an existing ledger.
    pub fn write_to_dir(&self, dir: &Path, run_id: &str) -> Result<PathBuf, SanitreeError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(ledger_file_name(run_id));
        let rendered = self.render()?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => SanitreeError::DestinationExists(path.clone()),
                _ => SanitreeError::IoError(e),
            })?;
        file.write_all(rendered.as_bytes())?;
        file.sync_all()?;
        info!("Replacement dictionary of matches is saved here: {}", path.display());
        Ok(path)
    }

    pub fn read_from_file(path: &Path) -> Result<Self, SanitreeError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Loads every section into the allocator category with the same label.
    pub fn restore_into(&self, allocator: &mut AliasAllocator) -> Result<(), SanitreeError> {
        for section in &self.sections {
            let name = allocator
                .categories()
                .find(|c| c.label == section.label)
                .map(|c| c.name.clone())
                .ok_or_else(|| SanitreeError::UnknownCategory(section.label.clone()))?;
            allocator.restore(&name, section.mapping.clone())?;
        }
        Ok(())
    }
}
