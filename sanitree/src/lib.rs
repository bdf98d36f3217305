// sanitree/src/lib.rs
//! # Sanitree CLI Application
//!
//! This crate provides the command-line front end for `sanitree-core`: argument
//! parsing, configuration loading, logging setup and console output.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

pub use commands::dispatch;
