//! Distributed-training optimization profile
//!
//! Five independent memory-reduction techniques composed by the memory
//! estimator: mixed precision (carried by the precision format), ZeRO-style
//! state sharding, activation checkpointing, fused-attention kernels, and
//! CPU offload — plus two orthogonal sparsification settings (MoE, LoRA)
//! that may both be active at once.

use serde::{Deserialize, Serialize};

/// ZeRO-style state sharding stage.
///
/// Progressive partitioning across devices: optimizer state (stage 1),
/// gradients (stage 2), model weights (stage 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ShardingStage {
    /// No sharding; full replicas on every device
    #[default]
    Stage0,
    /// Optimizer state partitioned
    Stage1,
    /// Optimizer state and gradients partitioned
    Stage2,
    /// Optimizer state, gradients, and weights partitioned
    Stage3,
}

impl ShardingStage {
    /// All stages in ascending order.
    pub const ALL: [Self; 4] = [Self::Stage0, Self::Stage1, Self::Stage2, Self::Stage3];

    /// Whether optimizer state is partitioned at this stage.
    pub fn shards_optimizer(self) -> bool {
        self >= Self::Stage1
    }

    /// Whether gradients are partitioned at this stage.
    pub fn shards_gradients(self) -> bool {
        self >= Self::Stage2
    }

    /// Whether model weights are partitioned at this stage.
    pub fn shards_weights(self) -> bool {
        self == Self::Stage3
    }
}

impl From<ShardingStage> for u8 {
    fn from(stage: ShardingStage) -> u8 {
        match stage {
            ShardingStage::Stage0 => 0,
            ShardingStage::Stage1 => 1,
            ShardingStage::Stage2 => 2,
            ShardingStage::Stage3 => 3,
        }
    }
}

impl TryFrom<u8> for ShardingStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stage0),
            1 => Ok(Self::Stage1),
            2 => Ok(Self::Stage2),
            3 => Ok(Self::Stage3),
            other => Err(format!("invalid sharding stage {other} (expected 0-3)")),
        }
    }
}

/// Mixture-of-experts settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoeSettings {
    /// Number of expert networks per MoE layer
    pub experts: u64,
    /// Number of experts each token is routed to
    pub top_k: u64,
}

impl Default for MoeSettings {
    fn default() -> Self {
        Self { experts: 8, top_k: 2 }
    }
}

impl MoeSettings {
    /// MoE only changes the census when more than one expert exists.
    pub fn is_effective(&self) -> bool {
        self.experts > 1
    }
}

/// Low-rank adaptation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraSettings {
    /// Adapter rank r
    pub rank: u64,
}

impl Default for LoraSettings {
    fn default() -> Self {
        Self { rank: 64 }
    }
}

/// Training optimization profile.
///
/// MoE and LoRA are independent: both may be active simultaneously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProfile {
    /// Fused-attention kernel (FlashAttention-style) enabled
    pub fused_attention: bool,
    /// Activation-checkpointing retention factor in [0.1, 1.0]; 1.0 = disabled
    pub checkpoint_retention: f64,
    /// ZeRO-style sharding stage
    pub sharding_stage: ShardingStage,
    /// CPU offload percentage in [0, 100]; meaningful only at stage >= 1
    pub cpu_offload_pct: f64,
    /// Mixture-of-experts settings, when enabled
    pub moe: Option<MoeSettings>,
    /// Low-rank adaptation settings, when enabled
    pub lora: Option<LoraSettings>,
}

impl Default for OptimizationProfile {
    fn default() -> Self {
        Self {
            fused_attention: true,
            checkpoint_retention: 1.0,
            sharding_stage: ShardingStage::Stage0,
            cpu_offload_pct: 0.0,
            moe: None,
            lora: None,
        }
    }
}

impl OptimizationProfile {
    /// Checkpoint retention clamped to its declared domain [0.1, 1.0].
    pub fn retention_clamped(&self) -> f64 {
        self.checkpoint_retention.clamp(0.1, 1.0)
    }

    /// Offload fraction in [0, 1]; zero unless sharding stage >= 1.
    pub fn offload_fraction(&self) -> f64 {
        if self.sharding_stage.shards_optimizer() {
            (self.cpu_offload_pct / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(ShardingStage::Stage0 < ShardingStage::Stage3);
        assert!(!ShardingStage::Stage0.shards_optimizer());
        assert!(ShardingStage::Stage1.shards_optimizer());
        assert!(!ShardingStage::Stage1.shards_gradients());
        assert!(ShardingStage::Stage2.shards_gradients());
        assert!(ShardingStage::Stage3.shards_weights());
    }

    #[test]
    fn test_stage_serde_as_integer() {
        let json = serde_json::to_string(&ShardingStage::Stage2).unwrap();
        assert_eq!(json, "2");
        let parsed: ShardingStage = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, ShardingStage::Stage3);
        assert!(serde_json::from_str::<ShardingStage>("4").is_err());
    }

    #[test]
    fn test_offload_requires_sharding() {
        let profile = OptimizationProfile {
            cpu_offload_pct: 50.0,
            ..Default::default()
        };
        assert_eq!(profile.offload_fraction(), 0.0);

        let sharded = OptimizationProfile {
            sharding_stage: ShardingStage::Stage1,
            cpu_offload_pct: 50.0,
            ..Default::default()
        };
        assert!((sharded.offload_fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_moe_effective_threshold() {
        assert!(MoeSettings::default().is_effective());
        assert!(!MoeSettings { experts: 1, top_k: 1 }.is_effective());
    }
}
