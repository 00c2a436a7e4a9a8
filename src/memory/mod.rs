//! Memory footprint estimator
//!
//! Per-device byte totals for training and inference, composing five
//! memory-reduction techniques whose effects interact multiplicatively:
//! mixed precision, ZeRO-style state sharding, activation checkpointing,
//! fused-attention kernels, and CPU offload.
//!
//! The formulas are deliberate heuristics reproduced exactly; they do not
//! model any particular framework's allocator.

use crate::catalog::PrecisionFormat;
use crate::census::ParameterCensus;
use crate::model::ModelDescription;
use crate::optimize::OptimizationProfile;
use serde::{Deserialize, Serialize};

/// Bytes per GB in reports (binary gigabyte).
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Fused-attention activation discount, applied above 1024 tokens.
const FUSED_ATTENTION_FACTOR: f64 = 0.7;

/// MoE routing/dispatch activation surcharge.
const MOE_ACTIVATION_FACTOR: f64 = 1.1;

/// Temporary/fragmentation overhead share of the live components.
const OVERHEAD_FACTOR: f64 = 0.10;

/// Per-device memory footprint in bytes.
///
/// Optimizer and gradient fields are the on-device totals actually
/// retained after CPU offload; the offloaded share is `cpu_swap_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryFootprint {
    /// Model weights (sharded at stage 3)
    pub weights_bytes: f64,
    /// Optimizer state retained on device
    pub optimizer_bytes: f64,
    /// Gradients retained on device
    pub gradient_bytes: f64,
    /// Activations for one micro-batch
    pub activation_bytes: f64,
    /// Temporary buffers and fragmentation overhead
    pub overhead_bytes: f64,
    /// Bytes swapped to host memory by CPU offload
    pub cpu_swap_bytes: f64,
    /// Training total per device
    pub training_total_bytes: f64,
    /// Inference total per device (weights unsharded, no optimizer state)
    pub inference_total_bytes: f64,
}

impl MemoryFootprint {
    /// Training total in GB.
    pub fn training_total_gb(&self) -> f64 {
        self.training_total_bytes / BYTES_PER_GB
    }

    /// Inference total in GB.
    pub fn inference_total_gb(&self) -> f64 {
        self.inference_total_bytes / BYTES_PER_GB
    }

    /// Training VRAM utilization against a device capacity, as a fraction.
    pub fn utilization(&self, vram_gb: f64) -> f64 {
        if vram_gb <= 0.0 {
            return f64::INFINITY;
        }
        self.training_total_gb() / vram_gb
    }

    /// Advisory level for the given device capacity.
    pub fn advisory(&self, vram_gb: f64) -> VramAdvisory {
        let utilization = self.utilization(vram_gb);
        if utilization > 1.0 {
            VramAdvisory::Exceeded
        } else if utilization > 0.95 {
            VramAdvisory::High
        } else {
            VramAdvisory::Ok
        }
    }
}

/// VRAM fit advisory, mirroring the three warning levels users see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VramAdvisory {
    /// Within acceptable range (<= 95% of capacity)
    Ok,
    /// Very high usage (95-100%); optimizations recommended
    High,
    /// Estimate exceeds device capacity
    Exceeded,
}

/// Estimate the per-device memory footprint.
///
/// `device_count` below 1 is treated as 1: the estimators never divide by
/// zero, they degrade.
pub fn estimate(
    census: &ParameterCensus,
    precision: &PrecisionFormat,
    profile: &OptimizationProfile,
    model: &ModelDescription,
    device_count: u32,
) -> MemoryFootprint {
    let n = f64::from(device_count.max(1));
    let stage = profile.sharding_stage;
    let storage = precision.storage_bytes_per_param();
    let compute = precision.compute_bytes_per_param();

    // 1. Weights: storage precision, plus 16-bit adapters under LoRA.
    //    Only stage 3 partitions weights.
    let unsharded_weights =
        census.total_params as f64 * storage + census.adapter_params as f64 * 2.0;
    let weights = if stage.shards_weights() { unsharded_weights / n } else { unsharded_weights };

    // 2. Optimizer state: two 32-bit moment buffers per trainable param,
    //    regardless of model precision.
    let mut optimizer = census.trainable_params as f64 * 4.0 * 2.0;
    if stage.shards_optimizer() {
        optimizer /= n;
    }

    // 3. Gradients at compute precision.
    let mut gradients = census.trainable_params as f64 * compute;
    if stage.shards_gradients() {
        gradients /= n;
    }

    // 4. Activations for one micro-batch.
    let b = model.micro_batch_per_device as f64;
    let s = model.sequence_length as f64;
    let h = model.hidden_size as f64;
    let l = model.num_layers as f64;
    let mut activations = b * s * h * l * compute * 28.0 + b * s * h * compute;
    if profile.fused_attention && model.sequence_length > 1024 {
        activations *= FUSED_ATTENTION_FACTOR;
    }
    let retention = profile.retention_clamped();
    if retention < 1.0 {
        activations *= retention;
    }
    if census.is_moe {
        activations *= MOE_ACTIVATION_FACTOR;
    }

    // 5. Overhead on the pre-offload components.
    let overhead = OVERHEAD_FACTOR * (weights + optimizer + gradients + activations);

    // 6. CPU offload of sharded optimizer/gradient state.
    let offload = profile.offload_fraction();
    let mut cpu_swap = 0.0;
    if offload > 0.0 {
        let mut offloadable = 0.0;
        if stage.shards_optimizer() {
            offloadable += optimizer;
        }
        if stage.shards_gradients() {
            offloadable += gradients;
        }
        cpu_swap = offloadable * offload;
        if stage.shards_optimizer() {
            optimizer *= 1.0 - offload;
        }
        if stage.shards_gradients() {
            gradients *= 1.0 - offload;
        }
    }

    let training_total = weights + activations + optimizer + gradients + overhead;

    // 8. Inference: unsharded weights, no optimizer/gradients, half the
    //    activation and overhead shares.
    let inference_total = unsharded_weights + 0.5 * activations + 0.5 * overhead;

    MemoryFootprint {
        weights_bytes: weights,
        optimizer_bytes: optimizer,
        gradient_bytes: gradients,
        activation_bytes: activations,
        overhead_bytes: overhead,
        cpu_swap_bytes: cpu_swap,
        training_total_bytes: training_total,
        inference_total_bytes: inference_total,
    }
}
