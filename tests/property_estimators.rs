//! Property tests for the resource estimators
//!
//! Ensures the estimators satisfy their structural invariants:
//! - Parameter counts ordered (active <= total, adapters consistent)
//! - Memory totals finite, positive, and monotone in the sharding stage
//! - Batch reconciliation idempotent and invariant-restoring
//! - Cost projections finite or absent, never division-by-zero artifacts

use estimar::batch::{self, BatchEdit};
use estimar::catalog;
use estimar::census::census;
use estimar::cost::{self, CostAssumptions};
use estimar::memory;
use estimar::{
    Architecture, LoraSettings, ModelDescription, MoeSettings, OptimizationProfile, ShardingStage,
};
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

fn architectures() -> impl Strategy<Value = Architecture> {
    prop_oneof![
        Just(Architecture::DecoderOnly),
        Just(Architecture::EncoderOnly),
        Just(Architecture::EncoderDecoder),
    ]
}

/// Model descriptions in realistic ranges, with `micro <= global` holding.
fn models() -> impl Strategy<Value = ModelDescription> {
    (
        architectures(),
        64u64..8192,
        1u64..80,
        1u64..64,
        1000u64..200_000,
        128u64..32_768,
        1u64..512,
    )
        .prop_flat_map(
            |(architecture, hidden, layers, heads, vocab, seq, global)| {
                (1..=global).prop_map(move |micro| ModelDescription {
                    architecture,
                    hidden_size: hidden,
                    num_layers: layers,
                    num_heads: heads,
                    vocab_size: vocab,
                    sequence_length: seq,
                    global_batch: global,
                    micro_batch_per_device: micro,
                })
            },
        )
}

fn sharding_stages() -> impl Strategy<Value = ShardingStage> {
    prop_oneof![
        Just(ShardingStage::Stage0),
        Just(ShardingStage::Stage1),
        Just(ShardingStage::Stage2),
        Just(ShardingStage::Stage3),
    ]
}

fn profiles() -> impl Strategy<Value = OptimizationProfile> {
    (
        any::<bool>(),
        0.1f64..=1.0,
        sharding_stages(),
        0.0f64..=100.0,
        proptest::option::of((2u64..64).prop_flat_map(|e| {
            (1..=e).prop_map(move |k| MoeSettings { experts: e, top_k: k })
        })),
        proptest::option::of((1u64..256).prop_map(|rank| LoraSettings { rank })),
    )
        .prop_map(
            |(fused_attention, checkpoint_retention, sharding_stage, cpu_offload_pct, moe, lora)| {
                OptimizationProfile {
                    fused_attention,
                    checkpoint_retention,
                    sharding_stage,
                    cpu_offload_pct,
                    moe,
                    lora,
                }
            },
        )
}

fn precisions() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("fp32"),
        Just("fp16"),
        Just("bf16"),
        Just("fp8-e4m3"),
        Just("int8"),
        Just("awq-4bit"),
    ]
}

// =============================================================================
// Parameter Census Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_active_never_exceeds_total(
        model in models(),
        profile in profiles(),
    ) {
        let c = census(&model, &profile);
        prop_assert!(c.active_params <= c.total_params);
        prop_assert!(c.total_params > 0);
    }

    #[test]
    fn prop_trainable_identity(
        model in models(),
        profile in profiles(),
    ) {
        let c = census(&model, &profile);
        if c.is_lora {
            // Adapters are the only trainable weights under LoRA
            prop_assert_eq!(c.trainable_params, c.adapter_params);
            prop_assert!(c.adapter_params > 0);
        } else {
            prop_assert_eq!(c.trainable_params, c.total_params);
            prop_assert_eq!(c.adapter_params, 0);
        }
    }

    #[test]
    fn prop_dense_census_has_full_activation(
        model in models(),
    ) {
        let dense = OptimizationProfile::default();
        let c = census(&model, &dense);
        prop_assert!(!c.is_moe);
        prop_assert_eq!(c.active_params, c.total_params);
    }

    #[test]
    fn prop_moe_inflation_respects_architecture(
        model in models(),
        experts in 2u64..64,
    ) {
        let dense = census(&model, &OptimizationProfile::default());
        let profile = OptimizationProfile {
            moe: Some(MoeSettings { experts, top_k: 1 }),
            ..Default::default()
        };
        let sparse = census(&model, &profile);
        if model.architecture.supports_moe() {
            prop_assert!(sparse.is_moe);
            prop_assert!(sparse.total_params > dense.total_params);
            prop_assert!(sparse.active_params < sparse.total_params);
        } else {
            // Encoder-only models ignore the MoE adjustment
            prop_assert!(!sparse.is_moe);
            prop_assert_eq!(sparse.total_params, dense.total_params);
        }
    }
}

// =============================================================================
// Memory Footprint Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_memory_totals_finite_positive(
        model in models(),
        profile in profiles(),
        precision_id in precisions(),
        devices in 1u32..1024,
    ) {
        let c = census(&model, &profile);
        let p = catalog::precision(precision_id).unwrap();
        let fp = memory::estimate(&c, p, &profile, &model, devices);

        for v in [
            fp.weights_bytes,
            fp.optimizer_bytes,
            fp.gradient_bytes,
            fp.activation_bytes,
            fp.overhead_bytes,
            fp.cpu_swap_bytes,
            fp.training_total_bytes,
            fp.inference_total_bytes,
        ] {
            prop_assert!(v.is_finite());
            prop_assert!(v >= 0.0);
        }
        prop_assert!(fp.training_total_bytes > 0.0);
        prop_assert!(fp.inference_total_bytes > 0.0);
    }

    #[test]
    fn prop_sharding_stage_monotone(
        model in models(),
        precision_id in precisions(),
        devices in 2u32..512,
    ) {
        let p = catalog::precision(precision_id).unwrap();
        let mut previous = f64::INFINITY;
        for stage in ShardingStage::ALL {
            let profile = OptimizationProfile { sharding_stage: stage, ..Default::default() };
            let c = census(&model, &profile);
            let fp = memory::estimate(&c, p, &profile, &model, devices);
            // Raising the stage never costs memory
            prop_assert!(
                fp.training_total_bytes <= previous * (1.0 + 1e-12) + 1.0,
                "stage {:?} raised the training total", stage
            );
            previous = fp.training_total_bytes;
        }
    }

    #[test]
    fn prop_more_devices_never_cost_memory(
        model in models(),
        stage in sharding_stages(),
        devices in 1u32..256,
    ) {
        let profile = OptimizationProfile { sharding_stage: stage, ..Default::default() };
        let c = census(&model, &profile);
        let p = catalog::precision("bf16").unwrap();
        let small = memory::estimate(&c, p, &profile, &model, devices);
        let large = memory::estimate(&c, p, &profile, &model, devices * 2);
        prop_assert!(large.training_total_bytes <= small.training_total_bytes * (1.0 + 1e-12) + 1.0);
    }

    #[test]
    fn prop_inference_never_exceeds_unsharded_training(
        model in models(),
        precision_id in precisions(),
    ) {
        // Without sharding, inference drops the optimizer state and half
        // the activations, so it can never exceed the training total.
        let profile = OptimizationProfile::default();
        let c = census(&model, &profile);
        let p = catalog::precision(precision_id).unwrap();
        let fp = memory::estimate(&c, p, &profile, &model, 1);
        prop_assert!(fp.inference_total_bytes <= fp.training_total_bytes + 1.0);
    }
}

// =============================================================================
// Batch Reconciliation Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_reconcile_restores_invariant(
        global in 0u64..10_000,
        micro in 0u64..10_000,
        edited in prop_oneof![Just(BatchEdit::Global), Just(BatchEdit::Micro)],
    ) {
        let r = batch::reconcile(global, micro, edited);
        prop_assert!(r.micro_batch_per_device >= 1);
        prop_assert!(r.micro_batch_per_device <= r.global_batch);
    }

    #[test]
    fn prop_reconcile_idempotent(
        global in 0u64..10_000,
        micro in 0u64..10_000,
        edited in prop_oneof![Just(BatchEdit::Global), Just(BatchEdit::Micro)],
    ) {
        let once = batch::reconcile(global, micro, edited);
        let twice = batch::reconcile(once.global_batch, once.micro_batch_per_device, edited);
        prop_assert_eq!(once.global_batch, twice.global_batch);
        prop_assert_eq!(once.micro_batch_per_device, twice.micro_batch_per_device);
        prop_assert!(!twice.clamped);
    }

    #[test]
    fn prop_accumulation_steps_cover_global_batch(
        global in 1u64..10_000,
        devices in 1u32..256,
    ) {
        let micro_strategy_max = global;
        for micro in [1, micro_strategy_max / 2 + 1, micro_strategy_max] {
            let steps = batch::accumulation_steps(global, micro, devices);
            prop_assert!(steps >= 1);
            // The accumulated micro-batches cover the global batch
            prop_assert!(steps * micro * u64::from(devices) >= global);
        }
    }
}

// =============================================================================
// Cost Projection Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_cost_finite_or_absent(
        model in models(),
        steps in 0u64..1_000_000,
        tps in 0.0f64..100_000.0,
        devices in 0u32..1024,
    ) {
        let assumptions = CostAssumptions {
            training_steps: steps,
            tokens_per_sec_per_device: tps,
            ..Default::default()
        };
        let gpu = catalog::accelerator("h100-80-sxm").unwrap();
        match cost::project(&assumptions, &model, gpu, devices) {
            None => {
                prop_assert!(steps == 0 || tps <= 0.0 || devices == 0);
            }
            Some(p) => {
                prop_assert!(p.wall_seconds.is_finite() && p.wall_seconds > 0.0);
                prop_assert!(p.energy_kwh.is_finite() && p.energy_kwh > 0.0);
                prop_assert!(p.carbon_kg.is_finite());
                prop_assert!(p.cost_usd.is_finite() && p.cost_usd >= 0.0);
            }
        }
    }
}

// =============================================================================
// Fixed Scenarios
// =============================================================================

#[test]
fn accumulation_steps_for_llama_preset_batches() {
    // global 64, micro 4, 8 devices: 64 / (4 * 8) = 2
    assert_eq!(batch::accumulation_steps(64, 4, 8), 2);
}

#[test]
fn stage3_reduces_per_device_weights() {
    let model = ModelDescription::default();
    let p = catalog::precision("bf16").unwrap();
    let base_profile = OptimizationProfile::default();
    let sharded_profile = OptimizationProfile {
        sharding_stage: ShardingStage::Stage3,
        ..Default::default()
    };
    let c = census(&model, &base_profile);
    let base = memory::estimate(&c, p, &base_profile, &model, 8);
    let sharded = memory::estimate(&c, p, &sharded_profile, &model, 8);
    assert!(sharded.weights_bytes < base.weights_bytes);
    assert!((sharded.weights_bytes - base.weights_bytes / 8.0).abs() < 1.0);
}

#[test]
fn zero_steps_yields_no_projection() {
    let assumptions = CostAssumptions { training_steps: 0, ..Default::default() };
    let gpu = catalog::accelerator("a100-80-sxm").unwrap();
    assert!(cost::project(&assumptions, &ModelDescription::default(), gpu, 8).is_none());
}

#[test]
fn moe_top2_of_8_activates_a_fraction() {
    let model = ModelDescription::default();
    let profile = OptimizationProfile {
        moe: Some(MoeSettings { experts: 8, top_k: 2 }),
        ..Default::default()
    };
    let c = census(&model, &profile);
    assert!(c.is_moe);
    // Top-2 of 8 experts: well under half the parameters active per token
    let fraction = c.active_fraction();
    assert!(fraction > 0.0 && fraction < 0.5, "active fraction {fraction}");
}
