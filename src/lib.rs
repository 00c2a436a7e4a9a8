//! # Estimar
//!
//! Resource estimation for large language models: parameter census,
//! per-device memory footprints, checkpoint disk sizes, and training
//! cost/energy projections, driven by a single shareable configuration.
//!
//! The estimators are deliberate heuristics with explicit formulas, not a
//! profiler. They compose five memory-reduction techniques (mixed
//! precision, ZeRO-style sharding, activation checkpointing, fused
//! attention, CPU offload) and report how a configuration fits the
//! selected accelerator.
//!
//! ## Quick start
//!
//! ```
//! use estimar::session::{MemoryShareStore, Session};
//! use std::time::Instant;
//!
//! let mut session = Session::new(MemoryShareStore::default());
//! session.load_persisted();
//! session.apply_preset("llama-3-8b", Instant::now()).unwrap();
//!
//! let snapshot = session.snapshot();
//! assert!(snapshot.census.total_params > 7_000_000_000);
//! assert!(snapshot.memory.training_total_gb() > 0.0);
//! ```
//!
//! Configurations round-trip through a versioned, URL-safe share string:
//!
//! ```
//! use estimar::session::{MemoryShareStore, Session};
//! use std::time::Instant;
//!
//! let mut a = Session::new(MemoryShareStore::default());
//! a.load_persisted();
//! a.set_hidden_size(2048, Instant::now());
//!
//! let mut b = Session::new(MemoryShareStore::default());
//! b.load_persisted();
//! b.import(&a.share_string().unwrap(), Instant::now()).unwrap();
//! assert_eq!(a.config(), b.config());
//! ```

pub mod batch;
pub mod catalog;
pub mod census;
pub mod cli;
pub mod cost;
pub mod disk;
pub mod error;
pub mod memory;
pub mod model;
pub mod optimize;
pub mod session;
pub mod share;

pub use error::{EstimarError, Result};
pub use model::{Architecture, ModelDescription};
pub use optimize::{LoraSettings, MoeSettings, OptimizationProfile, ShardingStage};
