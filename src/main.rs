//! Tileblend - compose floor transition tiles from the command line

use std::process::ExitCode;

use tileblend::cli;

fn main() -> ExitCode {
    cli::run()
}
