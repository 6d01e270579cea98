//! Binary entrypoint for the interactive Voyage trip planner.

use std::process::ExitCode;

use voyage_agent::start_voyage_agent;

/// Start a console conversation: destination first, then trip length.
fn main() -> ExitCode {
    start_voyage_agent::run_console()
}
