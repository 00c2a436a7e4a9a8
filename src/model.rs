//! Model architecture description
//!
//! The user-editable shape of the model being estimated: architecture
//! variant plus the scalar dimensions every estimator is a function of.

use serde::{Deserialize, Serialize};

/// Transformer architecture variant.
///
/// Determines which raw-parameter formula the census applies and whether
/// the mixture-of-experts adjustment is available (decoder-only and
/// encoder-decoder only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    /// Decoder-only causal LM (GPT/Llama family)
    #[default]
    DecoderOnly,
    /// Encoder-only bidirectional model (BERT family)
    EncoderOnly,
    /// Encoder-decoder sequence-to-sequence model (T5 family)
    EncoderDecoder,
}

impl Architecture {
    /// Human-readable name for reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::DecoderOnly => "Transformer Decoder",
            Self::EncoderOnly => "Transformer Encoder",
            Self::EncoderDecoder => "Transformer Encoder-Decoder",
        }
    }

    /// Whether the mixture-of-experts adjustment applies to this variant.
    pub fn supports_moe(self) -> bool {
        matches!(self, Self::DecoderOnly | Self::EncoderDecoder)
    }
}

/// User-editable model description.
///
/// Invariant: `micro_batch_per_device <= global_batch`. Enforced by
/// [`crate::batch::reconcile`], which every mutation entry point runs
/// before dependent estimators recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Architecture variant
    pub architecture: Architecture,
    /// Hidden size H
    pub hidden_size: u64,
    /// Layer count L (per stack for encoder-decoder)
    pub num_layers: u64,
    /// Attention head count
    pub num_heads: u64,
    /// Vocabulary size V
    pub vocab_size: u64,
    /// Sequence length S in tokens
    pub sequence_length: u64,
    /// Global batch size across all devices
    pub global_batch: u64,
    /// Micro-batch size per device
    pub micro_batch_per_device: u64,
}

impl Default for ModelDescription {
    /// Llama-3 8B shaped defaults, matching the `custom` preset.
    fn default() -> Self {
        Self {
            architecture: Architecture::DecoderOnly,
            hidden_size: 4096,
            num_layers: 32,
            num_heads: 32,
            vocab_size: 32000,
            sequence_length: 4096,
            global_batch: 32,
            micro_batch_per_device: 2,
        }
    }
}
