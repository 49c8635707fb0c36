//! # Coherence Field: A Field-Level Coherence Graph Engine
//!
//! Converts raw per-actor signals into bounded multi-dimensional
//! coherence vectors, tracks per-actor history for trend-based
//! calibration, and maintains a dynamic resonance graph over all active
//! actors.
//!
//! This crate provides:
//! - Signal-to-vector fusion through configurable normalization,
//!   bell-curve, and weighted-average primitives
//! - Capacity-bounded per-actor history with calibration suggestions
//! - A resonance graph with bounded cascade detection
//! - On-demand field snapshots with emergent-pattern tags
//! - A pluggable text-to-dimension scoring capability
//!
//! The engine is an in-memory library with no I/O of its own: snapshots
//! arrive from the embedding application's signal collaborators, results
//! are plain data for the caller to persist or display.
//!
//! # Example
//!
//! ```rust
//! use coherence_field::{
//!     ActorClass, CoherenceEngine, EngineConfig, InteractionMeta, SignalSnapshot, Trend,
//! };
//!
//! let engine = CoherenceEngine::new(EngineConfig::default()).unwrap();
//!
//! let snapshot = SignalSnapshot {
//!     variability: Some(72.0),
//!     heart_rate: Some(64.0),
//!     resting_heart_rate: Some(55.0),
//!     breath_rate: Some(14.0),
//!     sleep_hours: Some(7.5),
//!     deep_sleep_hours: Some(1.6),
//!     variability_variance: Some(130.0),
//!     readiness: Some(82.0),
//!     trend: Trend::Stable,
//! };
//!
//! let reading = engine.observe("alice", ActorClass::Human, &snapshot, InteractionMeta::default());
//! assert!(reading.vector.unified > 0.0 && reading.vector.unified <= 1.0);
//!
//! let field = engine.field_snapshot();
//! assert_eq!(field.node_counts.total, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod score;
pub mod text;
pub mod tracker;
pub mod types;

// Re-exports for convenience
pub use calculator::{
    CoherenceBand, CoherenceCalculator, DominantProfile, PeakWindow, WindowBand,
};
pub use config::{
    CalculatorConfig, EngineConfig, FieldConfig, ProfileConfig, TextConfig, TrackerConfig,
    WindowConfig,
};
pub use engine::CoherenceEngine;
pub use error::{CoherenceError, Result};
pub use field::FieldGraph;
pub use text::{KeywordFeatures, TextFeatures};
pub use tracker::{ActorHistoryTracker, ActorRecord, ClassSummary, HistoryEntry};
pub use types::{
    ActorClass, CalibrationAdjustment, CascadeEvent, CoherenceVector, Dimension, DimensionValues,
    EmergentPattern, FieldSnapshot, GraphNode, InteractionMeta, NodeCounts, ResonanceEdge,
    ResonanceKind, SignalSnapshot, Trend, VectorReading,
};

/// Version of the coherence-field library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
