// sanitree/src/ui/mod.rs
//! Console presentation: colours, one-line messages and summary tables.

pub mod output_format;
pub mod summary;
pub mod theme;
