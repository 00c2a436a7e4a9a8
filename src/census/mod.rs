//! Parameter census
//!
//! Computes raw, trainable, and active-per-token parameter counts for a
//! model description plus its sparsification settings (mixture-of-experts,
//! low-rank adaptation), without double-counting either adjustment.
//!
//! ## Accounting
//!
//! - MoE replaces each dense MLP term with a router plus E expert-sized
//!   MLPs; *total* counts all experts, *active* counts the router plus the
//!   top-k experts a token actually visits.
//! - LoRA adapter parameters are included in both total and active counts
//!   (adapters run on every token); when LoRA is active the base model is
//!   frozen and *trainable* equals the adapter count alone.

use crate::model::{Architecture, ModelDescription};
use crate::optimize::OptimizationProfile;
use serde::{Deserialize, Serialize};

/// Derived parameter counts, recomputed on every configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCensus {
    /// Total raw parameter count (all experts, adapters included)
    pub total_params: u64,
    /// Parameters updated by the optimizer
    pub trainable_params: u64,
    /// Parameters touched per token (differs from total only under MoE)
    pub active_params: u64,
    /// Low-rank adapter parameter count (zero when LoRA is inactive)
    pub adapter_params: u64,
    /// Mixture-of-experts adjustment in effect
    pub is_moe: bool,
    /// Low-rank adaptation in effect
    pub is_lora: bool,
}

impl ParameterCensus {
    /// Active fraction of total parameters, in (0, 1].
    pub fn active_fraction(&self) -> f64 {
        if self.total_params == 0 {
            1.0
        } else {
            self.active_params as f64 / self.total_params as f64
        }
    }

    /// Chinchilla-optimal training token estimate (~20 tokens/parameter).
    pub fn chinchilla_optimal_tokens(&self) -> u64 {
        self.total_params.saturating_mul(20)
    }
}

/// Architecture-dependent fixed terms plus the count of layers carrying a
/// dense MLP block.
///
/// Counts are accumulated in u128 with saturation so extreme dimensions
/// (which the codec rejects, but direct setters do not) degrade to
/// `u64::MAX` instead of wrapping.
struct ArchShape {
    /// Embedding, attention, norm, and head terms (everything but MLPs)
    fixed_params: u128,
    /// Number of layers whose MLP term MoE may replace
    mlp_layers: u128,
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn arch_shape(model: &ModelDescription) -> ArchShape {
    let h = u128::from(model.hidden_size);
    let l = u128::from(model.num_layers);
    let v = u128::from(model.vocab_size);
    let s = u128::from(model.sequence_length);
    let attention = h.saturating_mul(h).saturating_mul(4);
    let embedding = v.saturating_mul(h);

    match model.architecture {
        Architecture::DecoderOnly => ArchShape {
            // embedding + output projection + per-layer attention/norm + final norm
            fixed_params: embedding
                .saturating_mul(2)
                .saturating_add(l.saturating_mul(attention.saturating_add(4 * h)))
                .saturating_add(2 * h),
            mlp_layers: l,
        },
        Architecture::EncoderOnly => ArchShape {
            // token + position + type embeddings + embedding norm
            // + per-layer attention/norm + pooling head
            fixed_params: embedding
                .saturating_add(s.saturating_mul(h))
                .saturating_add(2 * h)
                .saturating_add(2 * h)
                .saturating_add(l.saturating_mul(attention.saturating_add(4 * h)))
                .saturating_add(h.saturating_mul(h).saturating_add(h)),
            mlp_layers: l,
        },
        Architecture::EncoderDecoder => ArchShape {
            // shared token embedding + output projection
            // + L encoder layers (attention + norm)
            // + L decoder layers (self-attention + cross-attention + norm)
            // + final norm
            fixed_params: embedding
                .saturating_mul(2)
                .saturating_add(l.saturating_mul(attention.saturating_add(4 * h)))
                .saturating_add(
                    l.saturating_mul(attention.saturating_mul(2).saturating_add(6 * h)),
                )
                .saturating_add(2 * h),
            mlp_layers: 2 * l,
        },
    }
}

/// Compute the parameter census for a model and optimization profile.
pub fn census(model: &ModelDescription, profile: &OptimizationProfile) -> ParameterCensus {
    let h = u128::from(model.hidden_size);
    // 2 * h * (4 * h)
    let dense_mlp = h.saturating_mul(h).saturating_mul(8);
    let shape = arch_shape(model);

    let moe = profile
        .moe
        .filter(|m| m.is_effective() && model.architecture.supports_moe());

    let (total_mlp, active_mlp) = match moe {
        Some(m) => {
            let experts = u128::from(m.experts);
            let top_k = u128::from(m.top_k.clamp(1, m.experts));
            let router = h.saturating_mul(experts);
            (
                shape
                    .mlp_layers
                    .saturating_mul(router.saturating_add(experts.saturating_mul(dense_mlp))),
                shape
                    .mlp_layers
                    .saturating_mul(router.saturating_add(top_k.saturating_mul(dense_mlp))),
            )
        }
        None => {
            let mlp = shape.mlp_layers.saturating_mul(dense_mlp);
            (mlp, mlp)
        }
    };

    let adapter = match profile.lora {
        // num_layers * 2 * (h*r + r*h)
        Some(lora) => {
            let hr = h.saturating_mul(u128::from(lora.rank));
            u128::from(model.num_layers).saturating_mul(2).saturating_mul(hr.saturating_add(hr))
        }
        None => 0,
    };

    let adapter_params = saturate(adapter);
    let total_params = saturate(shape.fixed_params.saturating_add(total_mlp).saturating_add(adapter));
    let active_params = saturate(shape.fixed_params.saturating_add(active_mlp).saturating_add(adapter));
    let trainable_params = if profile.lora.is_some() { adapter_params } else { total_params };

    ParameterCensus {
        total_params,
        trainable_params,
        active_params,
        adapter_params,
        is_moe: moe.is_some(),
        is_lora: profile.lora.is_some(),
    }
}
