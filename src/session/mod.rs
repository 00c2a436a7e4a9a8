//! Calculator session: the single owner of the configuration
//!
//! One mutable configuration value, edited only through the entry points
//! here; every estimator is a read-only projection of it. Each entry point
//! re-runs batch reconciliation before dependent estimators recompute, and
//! schedules a debounced persistence write of the encoded configuration.
//!
//! There is no background thread: the debounce is an explicit deadline the
//! host polls with [`Session::tick`]. A newer edit supersedes a pending
//! write; nothing is persisted until the initial load pass has completed,
//! so a freshly restored configuration cannot be clobbered while it
//! settles.

mod store;

use crate::batch::{self, BatchEdit};
use crate::catalog::{self, PRECISION_FORMATS};
use crate::census::{self, ParameterCensus};
use crate::cost::{self, CostAssumptions, CostProjection};
use crate::disk::{self, DiskFootprint};
use crate::error::{EstimarError, Result};
use crate::memory::{self, MemoryFootprint, VramAdvisory};
use crate::model::{Architecture, ModelDescription};
use crate::optimize::{LoraSettings, MoeSettings, OptimizationProfile, ShardingStage};
use crate::share::{self, SharedConfig};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub use store::{FileShareStore, MemoryShareStore, ShareStore};

/// Delay between the last edit and the persistence write.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

/// The complete user-editable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Model description
    pub model: ModelDescription,
    /// Optimization profile
    pub optimization: OptimizationProfile,
    /// Precision format id (always a known catalog id)
    pub precision_id: String,
    /// Accelerator id (always a known catalog id)
    pub hardware_id: String,
    /// Device count, >= 1
    pub device_count: u32,
    /// Cost assumptions
    pub cost: CostAssumptions,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            model: ModelDescription::default(),
            optimization: OptimizationProfile::default(),
            precision_id: "bf16".to_string(),
            hardware_id: catalog::DEFAULT_ACCELERATOR_ID.to_string(),
            device_count: 8,
            cost: CostAssumptions::default(),
        }
    }
}

/// One-shot advisory raised when a domain violation was corrected locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    /// The batch pair was clamped to restore `micro <= global`
    BatchClamped { global_batch: u64, micro_batch_per_device: u64 },
    /// A numeric field was clamped into its declared range
    ValueClamped { field: &'static str },
}

/// Outcome of the startup load pass.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A persisted configuration was decoded and applied wholesale
    Restored,
    /// Nothing was persisted; defaults remain
    NothingStored,
    /// The persisted payload was invalid, discarded, and cleared
    Discarded(crate::share::ShareDecodeError),
}

/// Read-only snapshot of every derived result for the current
/// configuration. Serializes for reports; never deserialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Parameter counts
    pub census: ParameterCensus,
    /// Per-device memory footprint
    pub memory: MemoryFootprint,
    /// Checkpoint disk sizes
    pub disk: DiskFootprint,
    /// Cost/energy projection, when the inputs permit one
    pub cost: Option<CostProjection>,
    /// Gradient accumulation steps
    pub accumulation_steps: u64,
    /// Chinchilla-optimal token estimate
    pub chinchilla_optimal_tokens: u64,
    /// Training VRAM utilization against the selected accelerator
    pub vram_utilization: f64,
    /// Fit advisory for the selected accelerator
    pub vram_advisory: VramAdvisory,
}

/// Session owning the configuration and its persistence.
pub struct Session<S: ShareStore> {
    config: CalculatorConfig,
    store: S,
    pending_write: Option<(String, Instant)>,
    load_completed: bool,
    advisory: Option<Advisory>,
}

impl<S: ShareStore> Session<S> {
    /// Create a session with the default configuration. Call
    /// [`Session::load_persisted`] before editing to restore prior state.
    pub fn new(store: S) -> Self {
        Self {
            config: CalculatorConfig::default(),
            store,
            pending_write: None,
            load_completed: false,
            advisory: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Take the pending one-shot advisory, if any.
    pub fn take_advisory(&mut self) -> Option<Advisory> {
        self.advisory.take()
    }

    /// Startup load pass: decode any persisted payload and either replace
    /// the configuration wholesale or discard the payload and clear the
    /// store. Persistence writes are suppressed until this has run.
    pub fn load_persisted(&mut self) -> LoadOutcome {
        let outcome = match self.store.load() {
            None => LoadOutcome::NothingStored,
            Some(payload) => match share::decode(&payload) {
                Ok(shared) => {
                    self.apply_shared(&shared);
                    LoadOutcome::Restored
                }
                Err(e) => {
                    self.store.clear();
                    LoadOutcome::Discarded(e)
                }
            },
        };
        self.load_completed = true;
        outcome
    }

    /// Import a share string by hand (e.g. pasted from a link), with the
    /// same wholesale-replacement semantics as the startup load.
    pub fn import(&mut self, text: &str, now: Instant) -> Result<()> {
        let shared = share::decode(text)?;
        self.apply_shared(&shared);
        self.schedule_persist(now);
        Ok(())
    }

    fn apply_shared(&mut self, shared: &SharedConfig) {
        self.config = CalculatorConfig {
            model: shared.to_model(),
            optimization: shared.optimization.clone(),
            precision_id: shared.precision.clone(),
            // Unknown hardware ids substitute the default accelerator
            hardware_id: shared.resolve_hardware().id.to_string(),
            device_count: shared.device_count,
            cost: shared.cost,
        };
    }

    /// The shareable string for the current configuration.
    pub fn share_string(&self) -> Result<String> {
        Ok(share::encode(&self.shared())?)
    }

    fn shared(&self) -> SharedConfig {
        SharedConfig::new(
            &self.config.model,
            &self.config.optimization,
            &self.config.precision_id,
            &self.config.hardware_id,
            self.config.device_count,
            &self.config.cost,
        )
    }

    // --- mutation entry points -------------------------------------------

    pub fn set_architecture(&mut self, architecture: Architecture, now: Instant) {
        self.config.model.architecture = architecture;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_hidden_size(&mut self, hidden_size: u64, now: Instant) {
        self.config.model.hidden_size = hidden_size.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_num_layers(&mut self, num_layers: u64, now: Instant) {
        self.config.model.num_layers = num_layers.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_num_heads(&mut self, num_heads: u64, now: Instant) {
        self.config.model.num_heads = num_heads.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_vocab_size(&mut self, vocab_size: u64, now: Instant) {
        self.config.model.vocab_size = vocab_size.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_sequence_length(&mut self, sequence_length: u64, now: Instant) {
        self.config.model.sequence_length = sequence_length.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_global_batch(&mut self, global_batch: u64, now: Instant) {
        self.config.model.global_batch = global_batch.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_micro_batch(&mut self, micro_batch: u64, now: Instant) {
        self.config.model.micro_batch_per_device = micro_batch.max(1);
        self.finish_edit(BatchEdit::Micro, now);
    }

    pub fn set_fused_attention(&mut self, enabled: bool, now: Instant) {
        self.config.optimization.fused_attention = enabled;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_checkpoint_retention(&mut self, retention: f64, now: Instant) {
        let clamped = if retention.is_finite() { retention.clamp(0.1, 1.0) } else { 1.0 };
        if (clamped - retention).abs() > f64::EPSILON || !retention.is_finite() {
            self.advisory = Some(Advisory::ValueClamped { field: "checkpoint_retention" });
        }
        self.config.optimization.checkpoint_retention = clamped;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_sharding_stage(&mut self, stage: ShardingStage, now: Instant) {
        self.config.optimization.sharding_stage = stage;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_cpu_offload_pct(&mut self, pct: f64, now: Instant) {
        let clamped = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
        if (clamped - pct).abs() > f64::EPSILON || !pct.is_finite() {
            self.advisory = Some(Advisory::ValueClamped { field: "cpu_offload_pct" });
        }
        self.config.optimization.cpu_offload_pct = clamped;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_moe(&mut self, moe: Option<MoeSettings>, now: Instant) {
        let normalized = moe.map(|m| {
            let experts = m.experts.max(1);
            MoeSettings { experts, top_k: m.top_k.clamp(1, experts) }
        });
        if normalized != moe {
            self.advisory = Some(Advisory::ValueClamped { field: "moe" });
        }
        self.config.optimization.moe = normalized;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_lora(&mut self, lora: Option<LoraSettings>, now: Instant) {
        self.config.optimization.lora = lora.map(|l| LoraSettings { rank: l.rank.max(1) });
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_precision(&mut self, precision_id: &str, now: Instant) -> Result<()> {
        if catalog::precision(precision_id).is_none() {
            return Err(EstimarError::UnknownPrecision { id: precision_id.to_string() });
        }
        self.config.precision_id = precision_id.to_string();
        self.finish_edit(BatchEdit::Global, now);
        Ok(())
    }

    pub fn set_hardware(&mut self, hardware_id: &str, now: Instant) -> Result<()> {
        if catalog::accelerator(hardware_id).is_none() {
            return Err(EstimarError::config_value(
                "hardware_id",
                format!("unknown accelerator '{hardware_id}'"),
                "run `estimar hardware` to list known accelerators",
            ));
        }
        self.config.hardware_id = hardware_id.to_string();
        self.finish_edit(BatchEdit::Global, now);
        Ok(())
    }

    pub fn set_device_count(&mut self, device_count: u32, now: Instant) {
        self.config.device_count = device_count.max(1);
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_training_steps(&mut self, steps: u64, now: Instant) {
        self.config.cost.training_steps = steps;
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_tokens_per_sec_per_device(&mut self, tokens_per_sec: f64, now: Instant) {
        self.config.cost.tokens_per_sec_per_device =
            if tokens_per_sec.is_finite() { tokens_per_sec.max(0.0) } else { 0.0 };
        self.finish_edit(BatchEdit::Global, now);
    }

    pub fn set_grid_carbon_intensity(&mut self, kg_per_kwh: f64, now: Instant) {
        self.config.cost.grid_carbon_kg_per_kwh =
            if kg_per_kwh.is_finite() { kg_per_kwh.max(0.0) } else { 0.0 };
        self.finish_edit(BatchEdit::Global, now);
    }

    /// Load a named preset: replaces the model description and suggested
    /// device count, leaving optimizations and cost assumptions alone.
    pub fn apply_preset(&mut self, preset_id: &str, now: Instant) -> Result<()> {
        let preset = catalog::preset(preset_id)
            .ok_or_else(|| EstimarError::UnknownPreset { id: preset_id.to_string() })?;
        self.config.model = preset.model;
        self.config.device_count = preset.device_count;
        self.finish_edit(BatchEdit::Global, now);
        Ok(())
    }

    fn finish_edit(&mut self, edited: BatchEdit, now: Instant) {
        let r = batch::reconcile(
            self.config.model.global_batch,
            self.config.model.micro_batch_per_device,
            edited,
        );
        if r.clamped {
            self.advisory = Some(Advisory::BatchClamped {
                global_batch: r.global_batch,
                micro_batch_per_device: r.micro_batch_per_device,
            });
        }
        self.config.model.global_batch = r.global_batch;
        self.config.model.micro_batch_per_device = r.micro_batch_per_device;
        self.schedule_persist(now);
    }

    // --- persistence ------------------------------------------------------

    fn schedule_persist(&mut self, now: Instant) {
        if !self.load_completed {
            return;
        }
        if let Ok(payload) = self.share_string() {
            self.pending_write = Some((payload, now + PERSIST_DEBOUNCE));
        }
    }

    /// Poll the debounce: writes the pending payload once its deadline has
    /// passed. Call periodically (or after sleeping) from the host.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        let due = matches!(&self.pending_write, Some((_, deadline)) if now >= *deadline);
        if due {
            if let Some((payload, _)) = self.pending_write.take() {
                self.store.save(&payload)?;
            }
        }
        Ok(())
    }

    /// Write any pending payload immediately (e.g. on shutdown).
    pub fn flush(&mut self) -> Result<()> {
        if let Some((payload, _)) = self.pending_write.take() {
            self.store.save(&payload)?;
        }
        Ok(())
    }

    /// Whether a persistence write is pending.
    pub fn has_pending_write(&self) -> bool {
        self.pending_write.is_some()
    }

    // --- derived results --------------------------------------------------

    /// Recompute every derived result from the current configuration.
    pub fn snapshot(&self) -> Snapshot {
        let precision = catalog::precision(&self.config.precision_id)
            .unwrap_or(&PRECISION_FORMATS[0]);
        let accelerator = catalog::accelerator(&self.config.hardware_id)
            .unwrap_or(&catalog::ACCELERATORS[0]);

        let census = census::census(&self.config.model, &self.config.optimization);
        let memory = memory::estimate(
            &census,
            precision,
            &self.config.optimization,
            &self.config.model,
            self.config.device_count,
        );
        let disk = disk::estimate(&census, precision);
        let cost = cost::project(
            &self.config.cost,
            &self.config.model,
            accelerator,
            self.config.device_count,
        );
        let accumulation_steps = batch::accumulation_steps(
            self.config.model.global_batch,
            self.config.model.micro_batch_per_device,
            self.config.device_count,
        );

        Snapshot {
            census,
            memory,
            disk,
            cost,
            accumulation_steps,
            chinchilla_optimal_tokens: census.chinchilla_optimal_tokens(),
            vram_utilization: memory.utilization(accelerator.vram_gb),
            vram_advisory: memory.advisory(accelerator.vram_gb),
        }
    }
}
