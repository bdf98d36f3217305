//! Line-oriented text reading with an explicit invalid-encoding policy.

use std::borrow::Cow;
use std::io::{self, BufRead};

/// What to do with byte sequences that are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Drop offending bytes and keep going.
    Ignore,
    /// Report the first offending line.
    Strict,
}

impl EncodingPolicy {
    pub fn from_tolerance(tolerate_invalid_encoding: bool) -> Self {
        if tolerate_invalid_encoding {
            EncodingPolicy::Ignore
        } else {
            EncodingPolicy::Strict
        }
    }
}

/// Decodes `bytes`, dropping invalid UTF-8 sequences. Returns `None` under
/// [`EncodingPolicy::Strict`] when invalid bytes are present.
pub fn decode(bytes: &[u8], policy: EncodingPolicy) -> Option<Cow<'_, str>> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(Cow::Borrowed(s)),
        Err(_) if policy == EncodingPolicy::Strict => None,
        Err(_) => Some(Cow::Owned(drop_invalid(bytes))),
    }
}

fn drop_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to marks a UTF-8 prefix.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of input.
                    None => return out,
                }
            }
        }
    }
}

/// Splits a raw line into content and its terminator (`\n`, `\r\n` or nothing).
pub fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        line.split_at(line.len())
    }
}

/// Splits line content on lone carriage returns, the way universal-newline readers do.
/// A trailing `\r` closes the last segment rather than opening an empty one.
pub fn carriage_return_segments(content: &str) -> impl Iterator<Item = &str> {
    content.strip_suffix('\r').unwrap_or(content).split('\r')
}

/// Reads `reader` line by line, invoking `f(line_number, raw_line)` with each raw line
/// including its terminator. Line numbers start at 1.
pub fn for_each_line<R, F, E>(mut reader: R, mut f: F) -> Result<(), E>
where
    R: BufRead,
    F: FnMut(usize, &[u8]) -> Result<(), E>,
    E: From<io::Error>,
{
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        line_number += 1;
        f(line_number, &buf)?;
    }
}
