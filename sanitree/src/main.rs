// sanitree/src/main.rs
//! Sanitree entry point.
//!
//! Loads `.env`, parses the command line, initialises logging and dispatches to the
//! selected command. Any error is reported on stderr with a non-zero exit code.

use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

use sanitree::cli::Cli;
use sanitree::commands::error_msg;
use sanitree::logger;
use sanitree::ui::theme::ThemeStyle;

fn main() -> ExitCode {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.quiet {
        logger::init_logger(Some(LevelFilter::Off));
    } else if cli.debug {
        logger::init_logger(Some(LevelFilter::Debug));
    } else {
        logger::init_logger(None);
    }

    let theme_map = ThemeStyle::default_theme_map();
    match sanitree::dispatch(&cli, &theme_map) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error_msg(format!("{:#}", e), &theme_map);
            ExitCode::FAILURE
        }
    }
}
