//! Estimar CLI
//!
//! Resource-estimation entry point for the estimar library.
//!
//! # Usage
//!
//! ```bash
//! # Estimate a preset
//! estimar estimate --preset llama-3-8b
//!
//! # Estimate a custom model with optimizations
//! estimar estimate --hidden-size 4096 --layers 32 --zero-stage 2 --lora-rank 64
//!
//! # Decode a shared configuration string
//! estimar decode <SHARE>
//!
//! # List presets and hardware profiles
//! estimar presets
//! estimar hardware
//! ```

use clap::Parser;
use estimar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
