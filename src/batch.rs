//! Batch/accumulation reconciler
//!
//! Keeps the dependent pair (global batch size, per-device micro-batch
//! size) mutually consistent under user edits and derives the gradient
//! accumulation step count. Clamping is a local correction surfaced as a
//! one-shot advisory, never a fatal error.

use serde::{Deserialize, Serialize};

/// Which of the two batch fields the user just edited.
///
/// The reconciler adjusts the *other* field when the invariant
/// `micro <= global` is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchEdit {
    /// Global batch size was edited; clamp the micro-batch down to it
    Global,
    /// Micro-batch size was edited; raise the global batch up to it
    Micro,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReconciliation {
    /// Consistent global batch size
    pub global_batch: u64,
    /// Consistent per-device micro-batch size
    pub micro_batch_per_device: u64,
    /// A clamp occurred; surface a one-shot advisory
    pub clamped: bool,
}

/// Enforce `micro <= global`, adjusting the field that was *not* edited.
pub fn reconcile(global_batch: u64, micro_batch: u64, edited: BatchEdit) -> BatchReconciliation {
    if micro_batch <= global_batch {
        return BatchReconciliation {
            global_batch,
            micro_batch_per_device: micro_batch,
            clamped: false,
        };
    }
    match edited {
        BatchEdit::Global => BatchReconciliation {
            global_batch,
            micro_batch_per_device: global_batch,
            clamped: true,
        },
        BatchEdit::Micro => BatchReconciliation {
            global_batch: micro_batch,
            micro_batch_per_device: micro_batch,
            clamped: true,
        },
    }
}

/// Gradient accumulation steps required to reach the global batch size.
///
/// `ceil(global / (micro * devices))`, minimum 1. A zero denominator is
/// treated as a ratio of 1 rather than a division error.
pub fn accumulation_steps(global_batch: u64, micro_batch: u64, device_count: u32) -> u64 {
    let denominator = micro_batch.saturating_mul(u64::from(device_count));
    if denominator == 0 {
        return 1;
    }
    global_batch.div_ceil(denominator).max(1)
}
