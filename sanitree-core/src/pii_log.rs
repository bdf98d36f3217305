// sanitree-core/src/pii_log.rs
//! Logging helpers that keep raw identifiers out of debug logs.
//!
//! Discovered values are the very data this crate exists to hide, so they are masked
//! in log output unless `SANITREE_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("SANITREE_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_alias_assigned_debug(category: &str, original_sensitive_content: &str, alias: &str) {
    debug!(
        "Assigned alias: Category='{}', Original='{}', Alias='{}'",
        category,
        get_loggable_content(original_sensitive_content),
        alias
    );
}

pub fn log_discovery_match_debug(
    path: &str,
    line_number: usize,
    category: &str,
    original_sensitive_content: &str,
) {
    debug!(
        "{}:{} matched category '{}': '{}'",
        path,
        line_number,
        category,
        get_loggable_content(original_sensitive_content)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_long_string() {
        assert_eq!(redact_sensitive("10.10.10.10"), "[REDACTED: 11 chars]".to_string());
    }
}
