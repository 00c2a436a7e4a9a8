//! Disk footprint estimator
//!
//! On-disk sizes for the three checkpoint artifacts: weights-only file,
//! optimizer-state file, and the combined full checkpoint.

use crate::catalog::PrecisionFormat;
use crate::census::ParameterCensus;
use serde::{Deserialize, Serialize};

/// On-disk checkpoint sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskFootprint {
    /// Model weights at storage precision
    pub model_file_bytes: f64,
    /// Optimizer state: two 32-bit moment buffers per trainable parameter
    pub optimizer_file_bytes: f64,
    /// Full checkpoint: weights + optimizer state, plus a separately
    /// saved 16-bit adapter artifact when LoRA is active
    pub full_checkpoint_bytes: f64,
}

/// Estimate on-disk sizes from the census and storage precision.
pub fn estimate(census: &ParameterCensus, precision: &PrecisionFormat) -> DiskFootprint {
    let model_file_bytes = census.total_params as f64 * precision.storage_bytes_per_param();
    let optimizer_file_bytes = census.trainable_params as f64 * 4.0 * 2.0;
    let adapter_artifact = census.adapter_params as f64 * 2.0;
    DiskFootprint {
        model_file_bytes,
        optimizer_file_bytes,
        full_checkpoint_bytes: model_file_bytes + optimizer_file_bytes + adapter_artifact,
    }
}
