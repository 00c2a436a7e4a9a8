//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Estimar: LLM resource estimation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "estimar")]
#[command(version)]
#[command(
    about = "Estimate LLM parameter counts, VRAM footprints, disk sizes, and training cost/energy"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run every estimator for a configuration and print a report
    Estimate(EstimateArgs),

    /// Decode a shared configuration string and print it
    Decode(DecodeArgs),

    /// List the named architecture presets
    Presets,

    /// List accelerator and cloud instance profiles
    Hardware,
}

/// Arguments for the estimate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct EstimateArgs {
    /// Start from a named preset (see `estimar presets`)
    #[arg(long)]
    pub preset: Option<String>,

    /// Start from a shared configuration string
    #[arg(long, value_name = "SHARE", conflicts_with = "preset")]
    pub from: Option<String>,

    /// Hidden size H
    #[arg(long)]
    pub hidden_size: Option<u64>,

    /// Layer count L
    #[arg(long)]
    pub layers: Option<u64>,

    /// Attention head count
    #[arg(long)]
    pub heads: Option<u64>,

    /// Vocabulary size V
    #[arg(long)]
    pub vocab: Option<u64>,

    /// Sequence length S
    #[arg(long)]
    pub seq_len: Option<u64>,

    /// Global batch size
    #[arg(long)]
    pub global_batch: Option<u64>,

    /// Micro-batch size per device
    #[arg(long)]
    pub micro_batch: Option<u64>,

    /// Precision format id (fp32, fp16, bf16, fp8-e4m3, int8, ...)
    #[arg(long)]
    pub precision: Option<String>,

    /// Accelerator id (see `estimar hardware`)
    #[arg(long)]
    pub hardware: Option<String>,

    /// Device count
    #[arg(long)]
    pub devices: Option<u32>,

    /// Disable the fused-attention kernel assumption
    #[arg(long)]
    pub no_fused_attention: bool,

    /// Activation-checkpointing retention factor (0.1-1.0)
    #[arg(long)]
    pub checkpoint_retention: Option<f64>,

    /// ZeRO-style sharding stage (0-3)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub zero_stage: Option<u8>,

    /// CPU offload percentage (0-100, needs --zero-stage >= 1)
    #[arg(long)]
    pub cpu_offload: Option<f64>,

    /// Mixture-of-experts expert count
    #[arg(long)]
    pub moe_experts: Option<u64>,

    /// Mixture-of-experts active experts per token
    #[arg(long, requires = "moe_experts")]
    pub moe_top_k: Option<u64>,

    /// Low-rank adapter rank
    #[arg(long)]
    pub lora_rank: Option<u64>,

    /// Training step count
    #[arg(long)]
    pub steps: Option<u64>,

    /// Assumed tokens/second/device
    #[arg(long)]
    pub tokens_per_sec: Option<f64>,

    /// Grid carbon intensity in kg CO2e per kWh
    #[arg(long)]
    pub carbon_intensity: Option<f64>,

    /// Print the shareable configuration string with the report
    #[arg(long)]
    pub share: bool,

    /// Persist the configuration to this file (restored on the next run)
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,
}

/// Arguments for the decode command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DecodeArgs {
    /// Shared configuration string
    #[arg(value_name = "SHARE")]
    pub share: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_estimate_with_preset() {
        let cli = Cli::try_parse_from(["estimar", "estimate", "--preset", "llama-3-8b"]).unwrap();
        match cli.command {
            Command::Estimate(args) => assert_eq!(args.preset.as_deref(), Some("llama-3-8b")),
            _ => panic!("expected Estimate command"),
        }
    }

    #[test]
    fn test_parse_estimate_overrides() {
        let cli = Cli::try_parse_from([
            "estimar",
            "estimate",
            "--hidden-size",
            "2048",
            "--layers",
            "24",
            "--zero-stage",
            "2",
            "--moe-experts",
            "8",
            "--moe-top-k",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Estimate(args) => {
                assert_eq!(args.hidden_size, Some(2048));
                assert_eq!(args.layers, Some(24));
                assert_eq!(args.zero_stage, Some(2));
                assert_eq!(args.moe_experts, Some(8));
                assert_eq!(args.moe_top_k, Some(2));
            }
            _ => panic!("expected Estimate command"),
        }
    }

    #[test]
    fn test_zero_stage_range_enforced() {
        assert!(Cli::try_parse_from(["estimar", "estimate", "--zero-stage", "4"]).is_err());
    }

    #[test]
    fn test_moe_top_k_requires_experts() {
        assert!(Cli::try_parse_from(["estimar", "estimate", "--moe-top-k", "2"]).is_err());
    }

    #[test]
    fn test_preset_conflicts_with_from() {
        assert!(Cli::try_parse_from([
            "estimar", "estimate", "--preset", "llama-3-8b", "--from", "abc"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from(["estimar", "decode", "eyJ2IjoxfQ"]).unwrap();
        match cli.command {
            Command::Decode(args) => assert_eq!(args.share, "eyJ2IjoxfQ"),
            _ => panic!("expected Decode command"),
        }
    }
}
