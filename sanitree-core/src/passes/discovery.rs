//! Discovery pass: find identifiers and allocate their aliases.
//!
//! Every line is offered to the alias matchers in category order. The first category
//! that matches contributes its first match on the line and the line is done. With the
//! default categories this means a line holding both an IP and a hostname only
//! registers the IP; the hostname is picked up from other lines where it appears
//! alone. This precedence is kept on purpose and can under-count hostnames.

use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::alias::AliasAllocator;
use crate::errors::SanitreeError;
use crate::pii_log::log_discovery_match_debug;
use crate::sanitizers::compiler::AliasMatcher;
use crate::text::{carriage_return_segments, decode, for_each_line, split_terminator, EncodingPolicy};
use crate::tree::{collect_files, SourceFile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub lines_scanned: usize,
    pub lines_matched: usize,
}

/// Offers one line to the matchers. Returns the matcher and value observed, if any.
pub fn observe_line<'m, 'l>(
    line: &'l str,
    matchers: &'m [AliasMatcher],
    allocator: &mut AliasAllocator,
) -> Result<Option<(&'m AliasMatcher, &'l str)>, SanitreeError> {
    for matcher in matchers {
        if let Some(found) = matcher.first_match(line) {
            allocator.observe(&matcher.category.name, found)?;
            return Ok(Some((matcher, found)));
        }
    }
    Ok(None)
}

/// Scans every file under `source_root` and populates `allocator`.
///
/// Files that cannot be opened or read are skipped with a warning. Under
/// [`EncodingPolicy::Strict`] invalid UTF-8 aborts the pass.
pub fn run_discovery(
    source_root: &Path,
    matchers: &[AliasMatcher],
    allocator: &mut AliasAllocator,
    policy: EncodingPolicy,
) -> Result<DiscoveryStats, SanitreeError> {
    let files = collect_files(source_root)?;
    info!(
        "Searching {} file(s) under {} for aliasable identifiers",
        files.len(),
        source_root.display()
    );

    let mut stats = DiscoveryStats::default();
    for file in &files {
        match scan_file(file, matchers, allocator, policy, &mut stats) {
            Ok(()) => stats.files_scanned += 1,
            Err(SanitreeError::IoError(e)) => {
                warn!("Skipping {}: {}", file.path.display(), e);
                stats.files_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for (category, mapping) in allocator.mappings() {
        info!("Discovered {} distinct {} value(s)", mapping.len(), category.label);
    }
    Ok(stats)
}

fn scan_file(
    file: &SourceFile,
    matchers: &[AliasMatcher],
    allocator: &mut AliasAllocator,
    policy: EncodingPolicy,
    stats: &mut DiscoveryStats,
) -> Result<(), SanitreeError> {
    debug!("Scanning {}", file.path.display());
    let reader = BufReader::new(File::open(&file.path)?);
    let display = file.relative.display().to_string();

    for_each_line(reader, |line_number, raw| -> Result<(), SanitreeError> {
        let (content, _) = split_terminator(raw);
        let line = decode(content, policy).ok_or_else(|| SanitreeError::InvalidEncoding {
            path: file.path.clone(),
            line: line_number,
        })?;
        // A lone `\r` ends a line too, so progress-redraw output is scanned per segment.
        for segment in carriage_return_segments(&line) {
            stats.lines_scanned += 1;
            if let Some((matcher, found)) = observe_line(segment, matchers, allocator)? {
                stats.lines_matched += 1;
                log_discovery_match_debug(&display, line_number, &matcher.category.name, found);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasCategory;
    use crate::config::SanitizeConfig;
    use crate::sanitizers::compiler::compile_alias_rules;
    use std::fs;
    use tempfile::TempDir;

    fn default_setup() -> (Vec<AliasMatcher>, AliasAllocator) {
        let config = SanitizeConfig::load_default_rules().unwrap();
        let matchers = compile_alias_rules(&config.aliases).unwrap();
        let allocator = AliasAllocator::new(matchers.iter().map(|m| m.category.clone())).unwrap();
        (matchers, allocator)
    }

    #[test]
    fn ip_takes_priority_over_hostname_on_a_line() {
        let (matchers, mut alloc) = default_setup();
        observe_line("db.example.com connected from 10.0.0.5", &matchers, &mut alloc).unwrap();
        assert_eq!(alloc.mapping("ip").unwrap().get("10.0.0.5"), Some("ipaddr-1"));
        assert!(alloc.mapping("hostname").unwrap().is_empty());
    }

    #[test]
    fn only_first_match_on_a_line_is_observed() {
        let (matchers, mut alloc) = default_setup();
        observe_line("10.0.0.1 -> 10.0.0.2", &matchers, &mut alloc).unwrap();
        let ips: Vec<(&str, &str)> = alloc.mapping("ip").unwrap().iter().collect();
        assert_eq!(ips, vec![("10.0.0.1", "ipaddr-1")]);
    }

    #[test]
    fn hostname_is_observed_when_no_ip_is_present() {
        let (matchers, mut alloc) = default_setup();
        assert!(observe_line("resolving api.example.org", &matchers, &mut alloc)
            .unwrap()
            .is_some());
        assert_eq!(alloc.mapping("hostname").unwrap().get("api.example.org"), Some("host-1"));
        assert!(observe_line("nothing to see", &matchers, &mut alloc)
            .unwrap()
            .is_none());
    }

    #[test]
    fn discovery_walks_the_tree_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/later.log"), "peer 192.168.1.1\n").unwrap();
        fs::write(dir.path().join("a.log"), "peer 10.9.8.7\nhost web.example.com\n").unwrap();

        let (matchers, mut alloc) = default_setup();
        let stats = run_discovery(dir.path(), &matchers, &mut alloc, EncodingPolicy::Ignore).unwrap();

        assert_eq!(stats.files_scanned, 2);
        assert_eq!(stats.lines_scanned, 3);
        assert_eq!(stats.lines_matched, 3);
        let ips: Vec<(&str, &str)> = alloc.mapping("ip").unwrap().iter().collect();
        assert_eq!(ips, vec![("10.9.8.7", "ipaddr-1"), ("192.168.1.1", "ipaddr-2")]);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("progress.log"),
            b"peer 10.0.0.1\rpeer 10.0.0.2\rdb.example.com up\n",
        )
        .unwrap();

        let (matchers, mut alloc) = default_setup();
        let stats = run_discovery(dir.path(), &matchers, &mut alloc, EncodingPolicy::Ignore).unwrap();

        assert_eq!(stats.lines_scanned, 3);
        assert_eq!(stats.lines_matched, 3);
        let ips: Vec<(&str, &str)> = alloc.mapping("ip").unwrap().iter().collect();
        assert_eq!(ips, vec![("10.0.0.1", "ipaddr-1"), ("10.0.0.2", "ipaddr-2")]);
        assert_eq!(alloc.mapping("hostname").unwrap().get("db.example.com"), Some("host-1"));
    }

    #[test]
    fn strict_policy_surfaces_invalid_bytes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bin.log"), b"ok\nbad \xff 10.0.0.1\n").unwrap();

        let (matchers, mut alloc) = default_setup();
        let err = run_discovery(dir.path(), &matchers, &mut alloc, EncodingPolicy::Strict).unwrap_err();
        assert!(matches!(err, SanitreeError::InvalidEncoding { line: 2, .. }));

        let mut alloc = AliasAllocator::new([
            AliasCategory::new("ip", "IP", "ipaddr"),
            AliasCategory::new("hostname", "Hostname", "host"),
        ])
        .unwrap();
        run_discovery(dir.path(), &matchers, &mut alloc, EncodingPolicy::Ignore).unwrap();
        assert_eq!(alloc.mapping("ip").unwrap().get("10.0.0.1"), Some("ipaddr-1"));
    }
}
