//! Binary crate for the `weather-tui` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the full-screen search UI
//! - Human-friendly output formatting

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod configure;
mod logging;
mod present;
mod tui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
