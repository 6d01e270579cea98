//! Voyage server binary exposing the planner over HTTP.
//! Run with: cargo run --bin voyage-server

use std::process::ExitCode;

use voyage_agent::start_voyage_agent;

fn main() -> ExitCode {
    start_voyage_agent::run()
}
