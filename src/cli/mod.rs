//! CLI module for estimar
//!
//! Command handlers and output utilities for the `estimar` binary.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, DecodeArgs, EstimateArgs};
pub use commands::run_command;
pub use logging::LogLevel;
