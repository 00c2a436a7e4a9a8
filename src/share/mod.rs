//! Shareable configuration codec
//!
//! Serializes the full input configuration to a versioned, validated,
//! URL-shareable string and restores it. Decoding is strict: malformed
//! text, unknown schema versions, and out-of-domain fields are rejected
//! outright so a corrupt payload can never be partially applied. The one
//! lenient case is an unknown hardware id, which substitutes the
//! documented default accelerator instead of failing.

mod base64;

use crate::catalog::{self, AcceleratorProfile};
use crate::cost::CostAssumptions;
use crate::model::{Architecture, ModelDescription};
use crate::optimize::OptimizationProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current schema version. Decoders reject anything else.
pub const SCHEMA_VERSION: u32 = 1;

/// Codec failures. Any of these discards the payload wholesale.
#[derive(Debug, Error)]
pub enum ShareDecodeError {
    /// Not valid URL-safe base64
    #[error("malformed share string (not valid base64)")]
    MalformedText,

    /// Base64 decoded but the body is not a valid configuration document
    #[error("malformed configuration body: {message}")]
    MalformedBody { message: String },

    /// Explicitly versioned payload from an unknown (likely future) schema
    #[error("unsupported schema version {version} (supported: {SCHEMA_VERSION})")]
    UnsupportedVersion { version: u32 },

    /// A field is outside its declared domain
    #[error("invalid value for {field}: {value} (expected {constraint})")]
    InvalidRange {
        field: &'static str,
        value: String,
        constraint: &'static str,
    },
}

/// Model dimensions as carried on the wire (architecture is a sibling
/// field, matching the published configuration string format).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedModel {
    pub hidden_size: u64,
    pub num_layers: u64,
    pub num_heads: u64,
    pub vocab_size: u64,
    pub sequence_length: u64,
    pub global_batch: u64,
    pub micro_batch_per_device: u64,
}

/// The full shareable configuration state: the unit of serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Explicit schema version tag
    pub version: u32,
    /// Architecture variant
    pub architecture: Architecture,
    /// Model dimensions
    pub model: SharedModel,
    /// Optimization profile
    pub optimization: OptimizationProfile,
    /// Precision format id
    pub precision: String,
    /// Accelerator id (unknown ids resolve to the default accelerator)
    pub hardware_id: String,
    /// Device count
    pub device_count: u32,
    /// Cost assumptions
    pub cost: CostAssumptions,
}

impl SharedConfig {
    /// Assemble a shareable state from the live configuration pieces.
    pub fn new(
        model: &ModelDescription,
        optimization: &OptimizationProfile,
        precision_id: &str,
        hardware_id: &str,
        device_count: u32,
        cost: &CostAssumptions,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION,
            architecture: model.architecture,
            model: SharedModel {
                hidden_size: model.hidden_size,
                num_layers: model.num_layers,
                num_heads: model.num_heads,
                vocab_size: model.vocab_size,
                sequence_length: model.sequence_length,
                global_batch: model.global_batch,
                micro_batch_per_device: model.micro_batch_per_device,
            },
            optimization: optimization.clone(),
            precision: precision_id.to_string(),
            hardware_id: hardware_id.to_string(),
            device_count,
            cost: *cost,
        }
    }

    /// Reassemble the in-memory model description.
    pub fn to_model(&self) -> ModelDescription {
        ModelDescription {
            architecture: self.architecture,
            hidden_size: self.model.hidden_size,
            num_layers: self.model.num_layers,
            num_heads: self.model.num_heads,
            vocab_size: self.model.vocab_size,
            sequence_length: self.model.sequence_length,
            global_batch: self.model.global_batch,
            micro_batch_per_device: self.model.micro_batch_per_device,
        }
    }

    /// Resolve the referenced accelerator, substituting the default
    /// profile when the id is unknown.
    pub fn resolve_hardware(&self) -> &'static AcceleratorProfile {
        catalog::accelerator(&self.hardware_id).unwrap_or_else(|| {
            catalog::accelerator(catalog::DEFAULT_ACCELERATOR_ID)
                .unwrap_or(&catalog::ACCELERATORS[0])
        })
    }
}

/// Encode a configuration to its URL-shareable string form.
pub fn encode(config: &SharedConfig) -> Result<String, ShareDecodeError> {
    let json = serde_json::to_string(config)
        .map_err(|e| ShareDecodeError::MalformedBody { message: e.to_string() })?;
    Ok(base64::encode(json.as_bytes()))
}

/// Decode and fully validate a share string.
///
/// Validation passes, in order:
/// 1. Text decoding (base64, UTF-8)
/// 2. Schema version gate (before the full parse, so future schemas with
///    different shapes still fail with a version error)
/// 3. Structural parse against the expected shape
/// 4. Per-field domain validation
pub fn decode(text: &str) -> Result<SharedConfig, ShareDecodeError> {
    let bytes = base64::decode(text.trim()).ok_or(ShareDecodeError::MalformedText)?;
    let body = String::from_utf8(bytes).map_err(|_| ShareDecodeError::MalformedText)?;

    #[derive(Deserialize)]
    struct VersionProbe {
        version: u32,
    }
    let probe: VersionProbe = serde_json::from_str(&body)
        .map_err(|e| ShareDecodeError::MalformedBody { message: e.to_string() })?;
    if probe.version != SCHEMA_VERSION {
        return Err(ShareDecodeError::UnsupportedVersion { version: probe.version });
    }

    let config: SharedConfig = serde_json::from_str(&body)
        .map_err(|e| ShareDecodeError::MalformedBody { message: e.to_string() })?;
    validate(&config)?;
    Ok(config)
}

// Upper bounds on decoded dimensions. Generous relative to any real
// model, tight enough that the census arithmetic stays in range.
const MAX_HIDDEN_SIZE: u64 = 1 << 20;
const MAX_LAYERS: u64 = 16_384;
const MAX_HEADS: u64 = 16_384;
const MAX_VOCAB_SIZE: u64 = 1 << 24;
const MAX_SEQUENCE_LENGTH: u64 = 1 << 24;
const MAX_BATCH: u64 = 1 << 24;
const MAX_EXPERTS: u64 = 4096;
const MAX_LORA_RANK: u64 = 65_536;

fn require_positive(field: &'static str, value: u64) -> Result<(), ShareDecodeError> {
    if value == 0 {
        return Err(ShareDecodeError::InvalidRange {
            field,
            value: value.to_string(),
            constraint: ">= 1",
        });
    }
    Ok(())
}

fn require_within(
    field: &'static str,
    value: u64,
    max: u64,
    constraint: &'static str,
) -> Result<(), ShareDecodeError> {
    if value == 0 || value > max {
        return Err(ShareDecodeError::InvalidRange {
            field,
            value: value.to_string(),
            constraint,
        });
    }
    Ok(())
}

fn require_finite_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    constraint: &'static str,
) -> Result<(), ShareDecodeError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ShareDecodeError::InvalidRange {
            field,
            value: value.to_string(),
            constraint,
        });
    }
    Ok(())
}

/// Validate every field against its declared domain.
pub fn validate(config: &SharedConfig) -> Result<(), ShareDecodeError> {
    // 1. Model dimensions, bounded on both ends: a share string is
    //    untrusted input and the census must never overflow from it
    let m = &config.model;
    require_within("model.hidden_size", m.hidden_size, MAX_HIDDEN_SIZE, "1..=2^20")?;
    require_within("model.num_layers", m.num_layers, MAX_LAYERS, "1..=16384")?;
    require_within("model.num_heads", m.num_heads, MAX_HEADS, "1..=16384")?;
    require_within("model.vocab_size", m.vocab_size, MAX_VOCAB_SIZE, "1..=2^24")?;
    require_within(
        "model.sequence_length",
        m.sequence_length,
        MAX_SEQUENCE_LENGTH,
        "1..=2^24",
    )?;
    require_within("model.global_batch", m.global_batch, MAX_BATCH, "1..=2^24")?;
    require_within(
        "model.micro_batch_per_device",
        m.micro_batch_per_device,
        MAX_BATCH,
        "1..=2^24",
    )?;
    if m.micro_batch_per_device > m.global_batch {
        return Err(ShareDecodeError::InvalidRange {
            field: "model.micro_batch_per_device",
            value: m.micro_batch_per_device.to_string(),
            constraint: "<= model.global_batch",
        });
    }

    // 2. Optimization profile
    let opt = &config.optimization;
    require_finite_range(
        "optimization.checkpoint_retention",
        opt.checkpoint_retention,
        0.1,
        1.0,
        "0.1..=1.0",
    )?;
    require_finite_range(
        "optimization.cpu_offload_pct",
        opt.cpu_offload_pct,
        0.0,
        100.0,
        "0..=100",
    )?;
    if let Some(moe) = &opt.moe {
        require_within("optimization.moe.experts", moe.experts, MAX_EXPERTS, "1..=4096")?;
        require_positive("optimization.moe.top_k", moe.top_k)?;
        if moe.top_k > moe.experts {
            return Err(ShareDecodeError::InvalidRange {
                field: "optimization.moe.top_k",
                value: moe.top_k.to_string(),
                constraint: "<= optimization.moe.experts",
            });
        }
    }
    if let Some(lora) = &opt.lora {
        require_within("optimization.lora.rank", lora.rank, MAX_LORA_RANK, "1..=65536")?;
    }

    // 3. Precision must exist in the catalog (unlike hardware, there is
    //    no sensible default substitute: it changes every byte count)
    if catalog::precision(&config.precision).is_none() {
        return Err(ShareDecodeError::InvalidRange {
            field: "precision",
            value: config.precision.clone(),
            constraint: "a known precision format id",
        });
    }

    // 4. Cluster and cost assumptions
    require_positive("device_count", u64::from(config.device_count))?;
    require_finite_range(
        "cost.tokens_per_sec_per_device",
        config.cost.tokens_per_sec_per_device,
        0.0,
        f64::MAX,
        ">= 0, finite",
    )?;
    require_finite_range(
        "cost.grid_carbon_kg_per_kwh",
        config.cost.grid_carbon_kg_per_kwh,
        0.0,
        f64::MAX,
        ">= 0, finite",
    )?;

    Ok(())
}
