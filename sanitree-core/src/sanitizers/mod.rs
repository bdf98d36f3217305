//! Rule compilation and the ordered pattern registry.
//!
//! `compiler` turns configured rules into compiled regexes; `registry` assembles them,
//! together with the aliases resolved during discovery, into the single ordered list
//! applied by the substitution pass.

pub mod compiler;
pub mod registry;
