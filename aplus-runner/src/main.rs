mod app;
mod cli;
mod execution;
mod harness;
mod runner;
mod stats;
mod suite;

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    app::run()
}
