// sanitree-core/src/passes/mod.rs
//! The two sweeps over the source tree.
//!
//! `discovery` must complete before `substitution` starts: the patterns applied by the
//! second pass are built from the aliases collected by the first.

pub mod discovery;
pub mod substitution;
