// sanitree-core/src/engine.rs
//! Defines the core SanitizationEngine trait.
//!
//! The substitution pass only needs something that can rewrite one line at a time.
//! [`PatternRegistry`](crate::sanitizers::registry::PatternRegistry) is the engine
//! used in practice; tests and embedders can provide their own.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

use crate::sanitizers::compiler::CompiledPattern;

/// A trait that defines the core functionality of a sanitization engine.
pub trait SanitizationEngine {
    /// Rewrites a single line (without its terminator).
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    fn sanitize_line<'a>(&self, line: &'a str) -> Cow<'a, str>;

    /// The patterns applied by this engine, in application order.
    fn patterns(&self) -> &[CompiledPattern];
}
