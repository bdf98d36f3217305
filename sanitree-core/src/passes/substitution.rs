//! Substitution pass: write the sanitized mirror of the source tree.
//!
//! Each source line is split from its terminator, rewritten by the engine and written
//! back with the original terminator, so lines without a match come out byte-for-byte
//! (minus any invalid UTF-8 dropped by the encoding policy). Destination directories
//! are never created here; the skeleton must be cloned first.

use log::{debug, info};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::engine::SanitizationEngine;
use crate::errors::SanitreeError;
use crate::text::{decode, for_each_line, split_terminator, EncodingPolicy};
use crate::tree::{collect_files, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionOptions {
    pub encoding: EncodingPolicy,
    /// Write each file to a temporary sibling and rename it into place.
    pub atomic_writes: bool,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            encoding: EncodingPolicy::Ignore,
            atomic_writes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionStats {
    pub files_written: usize,
    pub lines_written: usize,
    pub lines_rewritten: usize,
}

/// Rewrites every file under `source_root` into the same relative path under `dest_root`.
pub fn run_substitution(
    source_root: &Path,
    dest_root: &Path,
    engine: &dyn SanitizationEngine,
    options: SubstitutionOptions,
) -> Result<SubstitutionStats, SanitreeError> {
    let files = collect_files(source_root)?;
    info!(
        "Replacing matches in {} file(s) with {} pattern(s)",
        files.len(),
        engine.patterns().len()
    );

    let mut stats = SubstitutionStats::default();
    for file in &files {
        let dest = dest_root.join(&file.relative);
        let parent = dest.parent().unwrap_or(dest_root);
        if !parent.is_dir() {
            return Err(SanitreeError::MissingDestinationDir(parent.to_path_buf()));
        }
        debug!("Original file: {}", file.path.display());
        debug!("Cleaned file: {}", dest.display());

        // Output files take the source file's permissions in both write modes.
        let permissions = fs::metadata(&file.path)?.permissions();
        if options.atomic_writes {
            let mut tmp = NamedTempFile::new_in(parent)?;
            tmp.as_file().set_permissions(permissions)?;
            sanitize_file(file, engine, options.encoding, tmp.as_file_mut(), &mut stats)?;
            tmp.persist(&dest).map_err(|e| SanitreeError::IoError(e.error))?;
        } else {
            let out = File::create(&dest)?;
            out.set_permissions(permissions)?;
            sanitize_file(file, engine, options.encoding, out, &mut stats)?;
        }
        stats.files_written += 1;
    }

    info!(
        "Wrote {} file(s), {} of {} line(s) rewritten",
        stats.files_written, stats.lines_rewritten, stats.lines_written
    );
    Ok(stats)
}

fn sanitize_file<W: Write>(
    file: &SourceFile,
    engine: &dyn SanitizationEngine,
    encoding: EncodingPolicy,
    out: W,
    stats: &mut SubstitutionStats,
) -> Result<(), SanitreeError> {
    let reader = BufReader::new(File::open(&file.path)?);
    let mut writer = BufWriter::new(out);

    for_each_line(reader, |line_number, raw| -> Result<(), SanitreeError> {
        let (content, terminator) = split_terminator(raw);
        let line = decode(content, encoding).ok_or_else(|| SanitreeError::InvalidEncoding {
            path: file.path.clone(),
            line: line_number,
        })?;
        let sanitized = engine.sanitize_line(&line);
        if matches!(sanitized, Cow::Owned(_)) {
            stats.lines_rewritten += 1;
        }
        writer.write_all(sanitized.as_bytes())?;
        writer.write_all(terminator)?;
        stats.lines_written += 1;
        Ok(())
    })?;

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizers::compiler::CompiledPattern;
    use std::fs;
    use tempfile::TempDir;

    /// Upper-cases every line; enough to exercise the pass without regexes.
    struct Shout;

    impl SanitizationEngine for Shout {
        fn sanitize_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
            if line.chars().any(|c| c.is_ascii_lowercase()) {
                Cow::Owned(line.to_ascii_uppercase())
            } else {
                Cow::Borrowed(line)
            }
        }

        fn patterns(&self) -> &[CompiledPattern] {
            &[]
        }
    }

    #[test]
    fn terminators_survive_rewriting() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("mixed.txt"), b"one\r\nTWO\nthree").unwrap();

        let stats = run_substitution(src.path(), dest.path(), &Shout, SubstitutionOptions::default()).unwrap();

        assert_eq!(fs::read(dest.path().join("mixed.txt")).unwrap(), b"ONE\r\nTWO\nTHREE");
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.lines_written, 3);
        assert_eq!(stats.lines_rewritten, 2);
    }

    #[test]
    fn missing_destination_directory_is_an_error() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir(src.path().join("sub")).unwrap();
        fs::write(src.path().join("sub/file.log"), "x\n").unwrap();

        let err = run_substitution(src.path(), dest.path(), &Shout, SubstitutionOptions::default()).unwrap_err();
        match err {
            SanitreeError::MissingDestinationDir(path) => assert_eq!(path, dest.path().join("sub")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.path().join("sub").exists());
    }

    #[test]
    fn atomic_writes_leave_no_temporary_files() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("a.log"), "abc\n").unwrap();

        let options = SubstitutionOptions {
            atomic_writes: true,
            ..Default::default()
        };
        run_substitution(src.path(), dest.path(), &Shout, options).unwrap();

        let names: Vec<_> = fs::read_dir(dest.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.log")]);
        assert_eq!(fs::read_to_string(dest.path().join("a.log")).unwrap(), "ABC\n");
    }

    #[cfg(unix)]
    #[test]
    fn both_write_modes_copy_source_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        fs::write(src.path().join("c.log"), "abc\n").unwrap();
        fs::set_permissions(src.path().join("c.log"), fs::Permissions::from_mode(0o640)).unwrap();

        for atomic_writes in [false, true] {
            let dest = TempDir::new().unwrap();
            let options = SubstitutionOptions {
                atomic_writes,
                ..Default::default()
            };
            run_substitution(src.path(), dest.path(), &Shout, options).unwrap();
            let mode = fs::metadata(dest.path().join("c.log")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o640, "atomic_writes = {atomic_writes}");
        }
    }

    #[test]
    fn invalid_bytes_are_dropped_under_ignore() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("b.log"), b"OK\xff\n").unwrap();

        run_substitution(src.path(), dest.path(), &Shout, SubstitutionOptions::default()).unwrap();
        assert_eq!(fs::read(dest.path().join("b.log")).unwrap(), b"OK\n");
    }
}
