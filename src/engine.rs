//! Thread-safe engine facade
//!
//! One explicit instance owns the calculator, the text capability, the
//! tracker, and the field graph; consumers receive a reference instead of
//! reaching for process-wide state. Per-actor history writes shard on the
//! actor id, graph mutation serializes behind a single write lock (an
//! edge pass reads every other node, so two upserts must never
//! interleave), and aggregate reads return owned point-in-time copies.

use crate::calculator::{CoherenceCalculator, DominantProfile, PeakWindow};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::field::FieldGraph;
use crate::text::{KeywordFeatures, TextFeatures};
use crate::tracker::{ActorHistoryTracker, ActorRecord, ClassSummary};
use crate::types::{
    ActorClass, CalibrationAdjustment, CascadeEvent, CoherenceVector, FieldSnapshot, GraphNode,
    InteractionMeta, ResonanceEdge, SignalSnapshot, Trend, VectorReading,
};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

/// Field-coherence engine over one population of actors.
///
/// In-memory and synchronous: no I/O, no background work. All methods
/// take `&self`; the engine is safe to share across threads.
pub struct CoherenceEngine {
    calculator: CoherenceCalculator,
    text: Box<dyn TextFeatures>,
    tracker: ActorHistoryTracker,
    graph: RwLock<FieldGraph>,
}

impl CoherenceEngine {
    /// Build an engine from a configuration bundle, with the default
    /// keyword text capability.
    ///
    /// Fails only if the configuration is invalid; nothing after
    /// construction returns an error.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let text = Box::new(KeywordFeatures::new(config.text.clone()));
        Self::with_text_features(config, text)
    }

    /// Build an engine with a caller-supplied text capability.
    pub fn with_text_features(
        config: EngineConfig,
        text: Box<dyn TextFeatures>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator: CoherenceCalculator::new(
                config.calculator.clone(),
                config.window.clone(),
                config.profile,
            ),
            text,
            tracker: ActorHistoryTracker::new(config.tracker.clone()),
            graph: RwLock::new(FieldGraph::new(config.field.clone())),
        })
    }

    /// Process one observed interaction: compute the vector, record it in
    /// the actor's history, and refresh the actor's node in the field.
    pub fn observe(
        &self,
        actor_id: &str,
        class: ActorClass,
        snapshot: &SignalSnapshot,
        mut meta: InteractionMeta,
    ) -> VectorReading {
        let reading = self.calculator.compute(snapshot);
        meta.confidence = reading.confidence;

        self.tracker.record(actor_id, class, &reading, meta);
        self.graph.write().upsert_node(GraphNode {
            id: actor_id.to_string(),
            class,
            vector: reading.vector,
            updated_at: reading.timestamp,
        });

        debug!(actor_id, unified = reading.vector.unified, "interaction observed");
        reading
    }

    /// Process one observed interaction from free text, through the
    /// pluggable text capability. The unified score is derived through
    /// the same configured weights as the signal path.
    pub fn observe_text(
        &self,
        actor_id: &str,
        class: ActorClass,
        text: &str,
        mut meta: InteractionMeta,
    ) -> VectorReading {
        let scores = self.text.dimension_scores(text);
        let vector = self.calculator.from_scores(scores);
        let reading = VectorReading {
            vector,
            confidence: 1.0,
            timestamp: Utc::now(),
        };
        meta.confidence = reading.confidence;

        self.tracker.record(actor_id, class, &reading, meta);
        self.graph.write().upsert_node(GraphNode {
            id: actor_id.to_string(),
            class,
            vector: reading.vector,
            updated_at: reading.timestamp,
        });

        reading
    }

    /// Detect an optimal-moment window from a vector and its trend.
    pub fn peak_window(&self, vector: &CoherenceVector, trend: Trend) -> PeakWindow {
        self.calculator.peak_window(vector, trend)
    }

    /// Leading dimensions and coarse band for one vector.
    pub fn profile(&self, vector: &CoherenceVector) -> DominantProfile {
        self.calculator.profile(vector)
    }

    /// Snapshot of one actor's record.
    pub fn actor(&self, actor_id: &str) -> Option<ActorRecord> {
        self.tracker.actor(actor_id)
    }

    /// Propose a calibration adjustment for a class, or `None` below the
    /// minimum sample count or when the class is in band.
    pub fn suggest_calibration(&self, class: ActorClass) -> Option<CalibrationAdjustment> {
        self.tracker.suggest_calibration(class)
    }

    /// Append-only audit trail of suggestions for a class.
    pub fn calibration_history(&self, class: ActorClass) -> Vec<CalibrationAdjustment> {
        self.tracker.calibration_history(class)
    }

    /// Aggregate view over one class, or `None` when it has no samples.
    pub fn summarize(&self, class: ActorClass) -> Option<ClassSummary> {
        self.tracker.summarize(class)
    }

    /// Point-in-time aggregate over the whole field.
    pub fn field_snapshot(&self) -> FieldSnapshot {
        self.graph.read().field_snapshot()
    }

    /// Owned copies of all current nodes and live edges.
    pub fn resonance_graph(&self) -> (Vec<GraphNode>, Vec<ResonanceEdge>) {
        self.graph.read().resonance_graph()
    }

    /// Most recent cascade events, oldest first, at most `limit`.
    pub fn cascade_history(&self, limit: usize) -> Vec<CascadeEvent> {
        self.graph.read().cascade_history(limit)
    }

    /// Drop an actor from the tracker and the field. Unknown ids are a
    /// no-op. Returns whether anything was removed.
    pub fn remove_actor(&self, actor_id: &str) -> bool {
        let tracked = self.tracker.remove_actor(actor_id);
        let graphed = self.graph.write().remove_node(actor_id);
        tracked || graphed
    }

    /// Number of tracked actors.
    pub fn actor_count(&self) -> usize {
        self.tracker.actor_count()
    }

    /// Clear all state while keeping the configuration. Intended for
    /// tests and embedding-application lifecycle boundaries.
    pub fn reset(&self) {
        self.tracker.clear();
        self.graph.write().clear();
    }
}
