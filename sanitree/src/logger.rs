// sanitree/src/logger.rs
//! Logger initialisation for the binary.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialises `env_logger`.
///
/// `RUST_LOG` is honoured unless `level_override` is given, in which case it wins for
/// every module. Without either, only warnings and errors are shown. Safe to call more
/// than once; later calls are ignored.
pub fn init_logger(level_override: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level_override {
        builder.filter_level(level);
    }
    builder.format_target(false);
    let _ = builder.try_init();
}
