//! Cost and energy projector
//!
//! Wall-clock time, device-hours, energy, carbon, and monetary cost for a
//! training run, from a token-throughput assumption and the selected
//! hardware profile. Fails closed: non-positive throughput, step count, or
//! device count yields no projection rather than a division-by-zero
//! result.
//!
//! Carbon intensity is kilograms CO2e per kWh throughout the crate.

use crate::catalog::{AcceleratorProfile, CLOUD_INSTANCES};
use crate::model::ModelDescription;
use serde::{Deserialize, Serialize};

/// User-supplied cost assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    /// Number of optimizer steps in the run
    pub training_steps: u64,
    /// Assumed sustained throughput per device
    pub tokens_per_sec_per_device: f64,
    /// Grid carbon intensity in kg CO2e per kWh
    pub grid_carbon_kg_per_kwh: f64,
}

impl Default for CostAssumptions {
    /// 100k steps at 3000 tok/s/device on a US-average grid.
    fn default() -> Self {
        Self {
            training_steps: 100_000,
            tokens_per_sec_per_device: 3000.0,
            grid_carbon_kg_per_kwh: 0.386,
        }
    }
}

/// How the hourly rate was resolved.
///
/// Output-only: serialized into reports but never read back, so the
/// catalog ids can stay borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceSource {
    /// Exact cloud instance match on accelerator type and count
    CloudInstance { id: &'static str },
    /// Accelerator's flat hourly price multiplied by device count
    FlatHourly,
    /// Cloud instance with a different accelerator count, scaled
    /// proportionally
    ScaledCloudInstance { id: &'static str },
    /// No pricing data; cost reported as zero
    Unpriced,
}

/// Projected training cost and environmental impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostProjection {
    /// Total tokens processed over the run
    pub total_tokens: f64,
    /// Wall-clock duration in seconds
    pub wall_seconds: f64,
    /// Device-hours consumed
    pub device_hours: f64,
    /// Energy use in kWh
    pub energy_kwh: f64,
    /// Emissions in kg CO2e
    pub carbon_kg: f64,
    /// Resolved cluster-wide hourly rate in USD
    pub hourly_rate_usd: f64,
    /// Projected monetary cost in USD
    pub cost_usd: f64,
    /// Provenance of the hourly rate
    pub price_source: PriceSource,
}

impl CostProjection {
    /// Wall-clock duration in hours.
    pub fn wall_hours(&self) -> f64 {
        self.wall_seconds / 3600.0
    }
}

/// Resolve the cluster-wide hourly rate for `device_count` accelerators.
///
/// Resolution order: exact cloud instance match, flat per-device price,
/// proportionally scaled cloud instance, then unpriced at rate zero.
pub fn resolve_hourly_rate(
    accelerator: &AcceleratorProfile,
    device_count: u32,
) -> (f64, PriceSource) {
    if let Some(exact) = CLOUD_INSTANCES
        .iter()
        .find(|i| i.accelerator_id == accelerator.id && i.accelerator_count == device_count)
    {
        return (exact.hourly_usd, PriceSource::CloudInstance { id: exact.id });
    }
    if let Some(flat) = accelerator.hourly_usd {
        return (flat * f64::from(device_count), PriceSource::FlatHourly);
    }
    if let Some(scaled) = CLOUD_INSTANCES.iter().find(|i| i.accelerator_id == accelerator.id) {
        let per_device = scaled.hourly_usd / f64::from(scaled.accelerator_count);
        return (
            per_device * f64::from(device_count),
            PriceSource::ScaledCloudInstance { id: scaled.id },
        );
    }
    (0.0, PriceSource::Unpriced)
}

/// Project training cost and energy, or `None` when any throughput input
/// is non-positive.
pub fn project(
    assumptions: &CostAssumptions,
    model: &ModelDescription,
    accelerator: &AcceleratorProfile,
    device_count: u32,
) -> Option<CostProjection> {
    if assumptions.training_steps == 0
        || assumptions.tokens_per_sec_per_device <= 0.0
        || device_count == 0
    {
        return None;
    }

    let n = f64::from(device_count);
    let total_tokens = assumptions.training_steps as f64
        * model.global_batch as f64
        * model.sequence_length as f64;
    let device_throughput = assumptions.tokens_per_sec_per_device * n;
    let wall_seconds = total_tokens / device_throughput;
    let wall_hours = wall_seconds / 3600.0;
    let device_hours = wall_hours * n;
    let energy_kwh = wall_hours * (accelerator.power_watts * n) / 1000.0;
    let carbon_kg = energy_kwh * assumptions.grid_carbon_kg_per_kwh;

    let (hourly_rate_usd, price_source) = resolve_hourly_rate(accelerator, device_count);
    let cost_usd = wall_hours * hourly_rate_usd;

    Some(CostProjection {
        total_tokens,
        wall_seconds,
        device_hours,
        energy_kwh,
        carbon_kg,
        hourly_rate_usd,
        cost_usd,
        price_source,
    })
}
