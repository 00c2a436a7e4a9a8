//! Static reference tables
//!
//! Immutable catalogs consumed by the estimators: numeric-precision
//! formats, accelerator profiles, managed-cloud instance profiles, and
//! named architecture presets. Pure data, never user-editable, versioned
//! independently of the share codec's schema version.

use crate::model::{Architecture, ModelDescription};
use serde::Serialize;

/// Numeric precision format for model weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionFormat {
    /// Stable identifier used in shared configurations
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Bits per parameter
    pub bits: u8,
    /// Memory multiplier relative to 32-bit
    pub memory_factor: f64,
    /// Integer (quantized) rather than floating-point format
    pub integer: bool,
    /// Expected accuracy/performance impact
    pub note: &'static str,
}

impl PrecisionFormat {
    /// Bytes per parameter at storage precision.
    pub fn storage_bytes_per_param(&self) -> f64 {
        f64::from(self.bits) / 8.0
    }

    /// Bytes per parameter at the derived compute precision.
    ///
    /// 16-bit compute for any format at or below 16 bits that is not
    /// 8-bit integer; 32-bit compute otherwise. Drives activation and
    /// gradient byte widths.
    pub fn compute_bytes_per_param(&self) -> f64 {
        if self.bits <= 16 && !(self.integer && self.bits == 8) {
            2.0
        } else {
            4.0
        }
    }
}

/// Precision format catalog.
pub const PRECISION_FORMATS: &[PrecisionFormat] = &[
    PrecisionFormat {
        id: "fp32",
        name: "FP32",
        bits: 32,
        memory_factor: 1.0,
        integer: false,
        note: "Baseline accuracy & memory.",
    },
    PrecisionFormat {
        id: "fp16",
        name: "FP16",
        bits: 16,
        memory_factor: 0.5,
        integer: false,
        note: "~<0.1% delta. Faster via Tensor Cores.",
    },
    PrecisionFormat {
        id: "bf16",
        name: "BF16",
        bits: 16,
        memory_factor: 0.5,
        integer: false,
        note: "~<0.1% delta. Better stability than FP16.",
    },
    PrecisionFormat {
        id: "fp8-e4m3",
        name: "FP8 (E4M3)",
        bits: 8,
        memory_factor: 0.25,
        integer: false,
        note: "~<0.3% delta with TransformerEngine.",
    },
    PrecisionFormat {
        id: "fp8-e5m2",
        name: "FP8 (E5M2)",
        bits: 8,
        memory_factor: 0.25,
        integer: false,
        note: "Alternative FP8 format, similar impact.",
    },
    PrecisionFormat {
        id: "int8",
        name: "INT8 (W8A8 PTQ)",
        bits: 8,
        memory_factor: 0.25,
        integer: true,
        note: "~0.1-1% delta. Requires calibration (e.g., SmoothQuant).",
    },
    PrecisionFormat {
        id: "awq-4bit",
        name: "AWQ (4-bit)",
        bits: 4,
        memory_factor: 0.125,
        integer: true,
        note: "~<1% delta. Activation-aware PTQ.",
    },
    PrecisionFormat {
        id: "gptq-4bit",
        name: "GPTQ (4-bit)",
        bits: 4,
        memory_factor: 0.125,
        integer: true,
        note: "~<1% delta. Layer-wise PTQ.",
    },
];

/// Look up a precision format by identifier.
pub fn precision(id: &str) -> Option<&'static PrecisionFormat> {
    PRECISION_FORMATS.iter().find(|p| p.id == id)
}

/// Accelerator (GPU) profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceleratorProfile {
    /// Stable identifier used in shared configurations
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// VRAM capacity in GB
    pub vram_gb: f64,
    /// Board power draw in watts
    pub power_watts: f64,
    /// Flat on-demand hourly price per device, when known
    pub hourly_usd: Option<f64>,
}

/// Accelerator catalog.
pub const ACCELERATORS: &[AcceleratorProfile] = &[
    AcceleratorProfile {
        id: "h100-80-sxm",
        name: "NVIDIA H100 (80GB SXM)",
        vram_gb: 80.0,
        power_watts: 700.0,
        hourly_usd: Some(4.00),
    },
    AcceleratorProfile {
        id: "h100-94-sxm",
        name: "NVIDIA H100 (94GB SXM)",
        vram_gb: 94.0,
        power_watts: 700.0,
        hourly_usd: Some(4.50),
    },
    AcceleratorProfile {
        id: "a100-80-sxm",
        name: "NVIDIA A100 (80GB SXM)",
        vram_gb: 80.0,
        power_watts: 400.0,
        hourly_usd: Some(2.50),
    },
    AcceleratorProfile {
        id: "a100-40-sxm",
        name: "NVIDIA A100 (40GB SXM)",
        vram_gb: 40.0,
        power_watts: 400.0,
        hourly_usd: Some(2.00),
    },
    AcceleratorProfile {
        id: "v100-32",
        name: "NVIDIA V100 (32GB)",
        vram_gb: 32.0,
        power_watts: 300.0,
        hourly_usd: Some(1.50),
    },
    AcceleratorProfile {
        id: "rtx4090",
        name: "RTX 4090 (24GB)",
        vram_gb: 24.0,
        power_watts: 450.0,
        hourly_usd: Some(1.20),
    },
];

/// Default accelerator substituted when a shared configuration references
/// an unknown hardware id.
pub const DEFAULT_ACCELERATOR_ID: &str = "h100-80-sxm";

/// Look up an accelerator by identifier.
pub fn accelerator(id: &str) -> Option<&'static AcceleratorProfile> {
    ACCELERATORS.iter().find(|a| a.id == id)
}

/// Managed-cloud instance profile: accelerator type + count at a bundled
/// hourly price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudInstance {
    /// Instance type name
    pub id: &'static str,
    /// Accelerator id bundled in this instance
    pub accelerator_id: &'static str,
    /// Number of accelerators per instance
    pub accelerator_count: u32,
    /// On-demand hourly price in USD
    pub hourly_usd: f64,
    /// Pricing provenance
    pub note: &'static str,
}

/// Cloud instance catalog. Prices are approximate on-demand rates.
pub const CLOUD_INSTANCES: &[CloudInstance] = &[
    CloudInstance {
        id: "p5.48xlarge",
        accelerator_id: "h100-80-sxm",
        accelerator_count: 8,
        hourly_usd: 98.32,
        note: "AWS Pricing (us-east-1, On-Demand, ~2024)",
    },
    CloudInstance {
        id: "p4de.24xlarge",
        accelerator_id: "a100-80-sxm",
        accelerator_count: 8,
        hourly_usd: 40.97,
        note: "AWS Pricing (us-east-1, On-Demand, ~2024)",
    },
    CloudInstance {
        id: "p4d.24xlarge",
        accelerator_id: "a100-40-sxm",
        accelerator_count: 8,
        hourly_usd: 32.77,
        note: "AWS Pricing (us-east-1, On-Demand, ~2024)",
    },
    CloudInstance {
        id: "p3dn.24xlarge",
        accelerator_id: "v100-32",
        accelerator_count: 8,
        hourly_usd: 31.21,
        note: "AWS Pricing (us-east-1, On-Demand, ~2024)",
    },
];

/// Named architecture preset: a complete model description plus a device
/// count suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPreset {
    /// Stable identifier
    pub id: &'static str,
    /// Short description
    pub description: &'static str,
    /// Model shape the preset loads
    pub model: ModelDescription,
    /// Suggested device count
    pub device_count: u32,
}

/// Build the preset catalog.
///
/// Returned by value: `ModelDescription` is not `const`-constructible
/// through its serde derives and the table is tiny.
pub fn presets() -> Vec<ModelPreset> {
    vec![
        ModelPreset {
            id: "llama-3-8b",
            description: "Meta's Llama-3 8B Instruct model",
            model: ModelDescription {
                architecture: Architecture::DecoderOnly,
                hidden_size: 4096,
                num_layers: 32,
                num_heads: 32,
                vocab_size: 128_256,
                sequence_length: 8192,
                global_batch: 32,
                micro_batch_per_device: 2,
            },
            device_count: 8,
        },
        ModelPreset {
            id: "mixtral-8x7b",
            description: "Mistral's Mixtral 8x7B sparse MoE model",
            model: ModelDescription {
                architecture: Architecture::DecoderOnly,
                hidden_size: 4096,
                num_layers: 32,
                num_heads: 32,
                vocab_size: 32_000,
                sequence_length: 32_768,
                global_batch: 16,
                micro_batch_per_device: 1,
            },
            device_count: 16,
        },
        ModelPreset {
            id: "bert-large",
            description: "BERT Large (340M parameters)",
            model: ModelDescription {
                architecture: Architecture::EncoderOnly,
                hidden_size: 1024,
                num_layers: 24,
                num_heads: 16,
                vocab_size: 30_522,
                sequence_length: 512,
                global_batch: 32,
                micro_batch_per_device: 8,
            },
            device_count: 2,
        },
        ModelPreset {
            id: "t5-large",
            description: "T5 Large (770M parameters)",
            model: ModelDescription {
                architecture: Architecture::EncoderDecoder,
                hidden_size: 1024,
                num_layers: 24,
                num_heads: 16,
                vocab_size: 32_128,
                sequence_length: 512,
                global_batch: 32,
                micro_batch_per_device: 4,
            },
            device_count: 4,
        },
        ModelPreset {
            id: "custom",
            description: "Custom configuration",
            model: ModelDescription::default(),
            device_count: 8,
        },
    ]
}

/// Look up a preset by identifier.
pub fn preset(id: &str) -> Option<ModelPreset> {
    presets().into_iter().find(|p| p.id == id)
}
