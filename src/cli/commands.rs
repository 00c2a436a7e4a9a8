//! CLI command handlers

use super::args::{Cli, Command, DecodeArgs, EstimateArgs};
use super::logging::{log, LogLevel};
use crate::catalog::{self, ACCELERATORS, CLOUD_INSTANCES, PRECISION_FORMATS};
use crate::cost::PriceSource;
use crate::error::Result;
use crate::memory::{VramAdvisory, BYTES_PER_GB};
use crate::optimize::{LoraSettings, MoeSettings, ShardingStage};
use crate::session::{
    Advisory, FileShareStore, LoadOutcome, MemoryShareStore, Session, ShareStore,
};
use std::time::Instant;

/// Dispatch a parsed CLI invocation.
pub fn run_command(cli: Cli) -> Result<()> {
    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    match cli.command {
        Command::Estimate(args) => run_estimate(&args, level),
        Command::Decode(args) => run_decode(&args, level),
        Command::Presets => run_presets(level),
        Command::Hardware => run_hardware(level),
    }
}

fn run_estimate(args: &EstimateArgs, level: LogLevel) -> Result<()> {
    match &args.state_file {
        Some(path) => {
            let mut session = Session::new(FileShareStore::new(path));
            estimate_in(&mut session, args, level)?;
            session.flush()
        }
        None => {
            let mut session = Session::new(MemoryShareStore::default());
            estimate_in(&mut session, args, level)
        }
    }
}

fn estimate_in<S: ShareStore>(
    session: &mut Session<S>,
    args: &EstimateArgs,
    level: LogLevel,
) -> Result<()> {
    if let LoadOutcome::Discarded(e) = session.load_persisted() {
        eprintln!("Warning: discarded invalid persisted configuration: {e}");
    }
    let now = Instant::now();

    if let Some(preset) = &args.preset {
        session.apply_preset(preset, now)?;
    }
    if let Some(share) = &args.from {
        session.import(share, now)?;
    }

    apply_overrides(session, args, now)?;

    // The session keeps at most one advisory; later edits overwrite it
    if let Some(advisory) = session.take_advisory() {
        match advisory {
            Advisory::BatchClamped { global_batch, micro_batch_per_device } => log(
                level,
                LogLevel::Normal,
                &format!(
                    "Note: batch sizes clamped to global={global_batch}, micro={micro_batch_per_device} (micro must not exceed global)"
                ),
            ),
            Advisory::ValueClamped { field } => log(
                level,
                LogLevel::Normal,
                &format!("Note: {field} clamped into its valid range"),
            ),
        }
    }

    print_report(session, args, level)
}

fn apply_overrides<S: ShareStore>(
    session: &mut Session<S>,
    args: &EstimateArgs,
    now: Instant,
) -> Result<()> {
    if let Some(v) = args.hidden_size {
        session.set_hidden_size(v, now);
    }
    if let Some(v) = args.layers {
        session.set_num_layers(v, now);
    }
    if let Some(v) = args.heads {
        session.set_num_heads(v, now);
    }
    if let Some(v) = args.vocab {
        session.set_vocab_size(v, now);
    }
    if let Some(v) = args.seq_len {
        session.set_sequence_length(v, now);
    }
    if let Some(v) = args.global_batch {
        session.set_global_batch(v, now);
    }
    if let Some(v) = args.micro_batch {
        session.set_micro_batch(v, now);
    }
    if let Some(v) = &args.precision {
        session.set_precision(v, now)?;
    }
    if let Some(v) = &args.hardware {
        session.set_hardware(v, now)?;
    }
    if let Some(v) = args.devices {
        session.set_device_count(v, now);
    }
    if args.no_fused_attention {
        session.set_fused_attention(false, now);
    }
    if let Some(v) = args.checkpoint_retention {
        session.set_checkpoint_retention(v, now);
    }
    if let Some(v) = args.zero_stage {
        // Range enforced by the arg parser
        if let Ok(stage) = ShardingStage::try_from(v) {
            session.set_sharding_stage(stage, now);
        }
    }
    if let Some(v) = args.cpu_offload {
        session.set_cpu_offload_pct(v, now);
    }
    if let Some(experts) = args.moe_experts {
        let top_k = args.moe_top_k.unwrap_or(2);
        session.set_moe(Some(MoeSettings { experts, top_k }), now);
    }
    if let Some(rank) = args.lora_rank {
        session.set_lora(Some(LoraSettings { rank }), now);
    }
    if let Some(v) = args.steps {
        session.set_training_steps(v, now);
    }
    if let Some(v) = args.tokens_per_sec {
        session.set_tokens_per_sec_per_device(v, now);
    }
    if let Some(v) = args.carbon_intensity {
        session.set_grid_carbon_intensity(v, now);
    }
    Ok(())
}

fn print_report<S: ShareStore>(
    session: &Session<S>,
    args: &EstimateArgs,
    level: LogLevel,
) -> Result<()> {
    let config = session.config();
    let snap = session.snapshot();
    let accelerator = catalog::accelerator(&config.hardware_id).unwrap_or(&ACCELERATORS[0]);

    log(level, LogLevel::Normal, &format!("Model: {}", config.model.architecture.name()));
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  H={} L={} heads={} V={} S={}",
            config.model.hidden_size,
            config.model.num_layers,
            config.model.num_heads,
            config.model.vocab_size,
            config.model.sequence_length
        ),
    );

    log(level, LogLevel::Normal, "\nParameters");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Total:      {}{}",
            format_params(snap.census.total_params),
            if snap.census.is_moe { " (MoE)" } else { "" }
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("  Trainable:  {}", format_params(snap.census.trainable_params)),
    );
    if snap.census.is_moe {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Active/tok: {} ({:.1}% of total)",
                format_params(snap.census.active_params),
                snap.census.active_fraction() * 100.0
            ),
        );
    }
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Grad accumulation steps: {}  (global {} / micro {} x {} devices)",
            snap.accumulation_steps,
            config.model.global_batch,
            config.model.micro_batch_per_device,
            config.device_count
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Chinchilla-optimal tokens: {}",
            format_params(snap.chinchilla_optimal_tokens)
        ),
    );

    log(level, LogLevel::Normal, "\nMemory per device");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Training:   {:.2} GB / {} GB on {} ({:.0}%)",
            snap.memory.training_total_gb(),
            accelerator.vram_gb,
            accelerator.name,
            snap.vram_utilization * 100.0
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("  Inference:  {:.2} GB", snap.memory.inference_total_gb()),
    );
    match snap.vram_advisory {
        VramAdvisory::Exceeded => log(
            level,
            LogLevel::Normal,
            "  Warning: estimated VRAM exceeds device capacity",
        ),
        VramAdvisory::High => log(
            level,
            LogLevel::Normal,
            "  Note: memory usage is very high; consider optimizations",
        ),
        VramAdvisory::Ok => {}
    }
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Weights {:.1} GB | Optimizer {:.1} GB | Gradients {:.1} GB | Activations {:.1} GB | Overhead {:.1} GB | CPU swap {:.1} GB",
            snap.memory.weights_bytes / BYTES_PER_GB,
            snap.memory.optimizer_bytes / BYTES_PER_GB,
            snap.memory.gradient_bytes / BYTES_PER_GB,
            snap.memory.activation_bytes / BYTES_PER_GB,
            snap.memory.overhead_bytes / BYTES_PER_GB,
            snap.memory.cpu_swap_bytes / BYTES_PER_GB,
        ),
    );

    log(level, LogLevel::Normal, "\nDisk");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Weights {:.2} GB | Optimizer {:.2} GB | Full checkpoint {:.2} GB",
            snap.disk.model_file_bytes / BYTES_PER_GB,
            snap.disk.optimizer_file_bytes / BYTES_PER_GB,
            snap.disk.full_checkpoint_bytes / BYTES_PER_GB,
        ),
    );

    log(level, LogLevel::Normal, "\nTraining cost & impact");
    match &snap.cost {
        Some(cost) => {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "  Wall time:  {:.1} h  ({:.1} device-hours)",
                    cost.wall_hours(),
                    cost.device_hours
                ),
            );
            log(
                level,
                LogLevel::Normal,
                &format!("  Energy:     {:.0} kWh  ({:.2} kg CO2e)", cost.energy_kwh, cost.carbon_kg),
            );
            let pricing = match cost.price_source {
                PriceSource::CloudInstance { id } => format!("{id} pricing"),
                PriceSource::FlatHourly => "flat per-device pricing".to_string(),
                PriceSource::ScaledCloudInstance { id } => format!("scaled from {id}"),
                PriceSource::Unpriced => "no pricing data".to_string(),
            };
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "  Cost:       ${:.2}  (${:.2}/h, {pricing})",
                    cost.cost_usd, cost.hourly_rate_usd
                ),
            );
        }
        None => log(
            level,
            LogLevel::Normal,
            "  Unavailable (steps, throughput, and device count must be positive)",
        ),
    }

    if args.share {
        log(level, LogLevel::Normal, &format!("\nShare: {}", session.share_string()?));
    }
    Ok(())
}

fn run_decode(args: &DecodeArgs, level: LogLevel) -> Result<()> {
    let config = crate::share::decode(&args.share).map_err(crate::error::EstimarError::from)?;
    let rendered = serde_json::to_string_pretty(&config)
        .unwrap_or_else(|_| format!("{config:?}"));
    log(level, LogLevel::Normal, &rendered);
    if catalog::accelerator(&config.hardware_id).is_none() {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "Note: unknown hardware id '{}'; '{}' will be used",
                config.hardware_id,
                catalog::DEFAULT_ACCELERATOR_ID
            ),
        );
    }
    Ok(())
}

fn run_presets(level: LogLevel) -> Result<()> {
    for preset in catalog::presets() {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "{:<14} {:<34} H={} L={} V={} S={}",
                preset.id,
                preset.description,
                preset.model.hidden_size,
                preset.model.num_layers,
                preset.model.vocab_size,
                preset.model.sequence_length
            ),
        );
    }
    Ok(())
}

fn run_hardware(level: LogLevel) -> Result<()> {
    log(level, LogLevel::Normal, "Accelerators");
    for gpu in ACCELERATORS {
        let price = gpu
            .hourly_usd
            .map(|p| format!("${p:.2}/h"))
            .unwrap_or_else(|| "unpriced".to_string());
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  {:<14} {:<28} {:>4.0} GB  {:>4.0} W  {}",
                gpu.id, gpu.name, gpu.vram_gb, gpu.power_watts, price
            ),
        );
    }
    log(level, LogLevel::Normal, "\nCloud instances");
    for instance in CLOUD_INSTANCES {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  {:<16} {}x {:<14} ${:.2}/h  ({})",
                instance.id,
                instance.accelerator_count,
                instance.accelerator_id,
                instance.hourly_usd,
                instance.note
            ),
        );
    }
    log(level, LogLevel::Normal, "\nPrecision formats");
    for p in PRECISION_FORMATS {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  {:<10} {:<16} {:>2} bits  {:.3}x  {}",
                p.id, p.name, p.bits, p.memory_factor, p.note
            ),
        );
    }
    Ok(())
}

/// Format a parameter count as a compact billions/millions figure.
fn format_params(count: u64) -> String {
    let count = count as f64;
    if count >= 1e9 {
        format!("{:.2} B", count / 1e9)
    } else if count >= 1e6 {
        format!("{:.2} M", count / 1e6)
    } else {
        format!("{count:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_params() {
        assert_eq!(format_params(7_490_000_000), "7.49 B");
        assert_eq!(format_params(340_000_000), "340.00 M");
        assert_eq!(format_params(1234), "1234");
    }
}
