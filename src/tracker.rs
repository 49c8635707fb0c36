//! Per-actor history tracking and calibration suggestion
//!
//! Histories are capacity-bounded and sharded per actor id: recordings
//! for different actors proceed in parallel, recordings for the same id
//! serialize on the shard entry. Calibration suggestions are derived from
//! class-wide rolling trends and only ever appended to an audit trail;
//! nothing here feeds back into calculator configuration.

use crate::config::TrackerConfig;
use crate::score::mean;
use crate::types::{
    ActorClass, CalibrationAdjustment, CoherenceVector, Dimension, DimensionValues,
    InteractionMeta, VectorReading,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

// Fallback when an interaction carried no explicit quality or resonance
// feedback; a neutral midpoint keeps rolling means meaningful.
const NEUTRAL_SIGNAL: f64 = 0.5;

/// One recorded interaction for an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// The computed vector
    pub vector: CoherenceVector,
    /// Auxiliary per-interaction signals
    pub meta: InteractionMeta,
}

/// Bounded history and derived state for one actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Actor id
    pub id: String,
    /// Actor class
    pub class: ActorClass,
    /// Set when recent readings indicate the actor is out of band
    pub calibration_needed: bool,
    history: VecDeque<HistoryEntry>,
}

impl ActorRecord {
    fn new(id: &str, class: ActorClass) -> Self {
        Self {
            id: id.to_string(),
            class,
            calibration_needed: false,
            history: VecDeque::new(),
        }
    }

    /// Recorded entries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.back()
    }

    /// Mean vector over the most recent `window` entries.
    pub fn rolling_mean(&self, window: usize) -> Option<CoherenceVector> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<&HistoryEntry> =
            self.history.iter().rev().take(window).collect();
        let n = recent.len() as f64;

        let mut vector = CoherenceVector::default();
        for dim in Dimension::ALL {
            let total: f64 = recent.iter().map(|e| e.vector.get(dim)).sum();
            match dim {
                Dimension::Clarity => vector.clarity = total / n,
                Dimension::Activation => vector.activation = total / n,
                Dimension::Flow => vector.flow = total / n,
                Dimension::Grounding => vector.grounding = total / n,
                Dimension::Integration => vector.integration = total / n,
            }
        }
        vector.unified = recent.iter().map(|e| e.vector.unified).sum::<f64>() / n;
        Some(vector)
    }

    /// Mean quality feedback over the most recent `window` entries.
    pub fn rolling_quality(&self, window: usize) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let values: Vec<f64> = self
            .history
            .iter()
            .rev()
            .take(window)
            .map(|e| e.meta.quality.unwrap_or(NEUTRAL_SIGNAL))
            .collect();
        Some(mean(&values))
    }
}

/// Aggregate performance view over one actor class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Mean vector over all retained entries of the class
    pub mean_vector: CoherenceVector,
    /// Mean quality feedback
    pub mean_quality: f64,
    /// Mean counterpart resonance
    pub mean_counterpart_resonance: f64,
    /// Retained interaction count
    pub interactions: usize,
    /// Calibration suggestions produced so far
    pub calibrations: usize,
}

/// Tracks bounded per-actor vector histories and proposes per-class
/// calibration adjustments from rolling trends.
pub struct ActorHistoryTracker {
    config: TrackerConfig,
    records: DashMap<String, ActorRecord>,
    calibrations: RwLock<HashMap<ActorClass, Vec<CalibrationAdjustment>>>,
}

impl ActorHistoryTracker {
    /// Create a tracker from validated configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            records: DashMap::new(),
            calibrations: RwLock::new(HashMap::new()),
        }
    }

    /// Record one reading for an actor, evicting the oldest entry past
    /// the capacity and re-evaluating the calibration flag.
    ///
    /// First sight of an id creates the record; a changed class label
    /// rebinds the actor to the new class.
    pub fn record(
        &self,
        actor_id: &str,
        class: ActorClass,
        reading: &VectorReading,
        meta: InteractionMeta,
    ) {
        let mut record = self
            .records
            .entry(actor_id.to_string())
            .or_insert_with(|| ActorRecord::new(actor_id, class));
        record.class = class;

        record.history.push_back(HistoryEntry {
            timestamp: reading.timestamp,
            vector: reading.vector,
            meta,
        });
        while record.history.len() > self.config.history_capacity {
            record.history.pop_front();
        }

        let was_flagged = record.calibration_needed;
        let flagged = self.out_of_band(&record);
        record.calibration_needed = flagged;
        if record.calibration_needed && !was_flagged {
            info!(actor_id, %class, "actor flagged for calibration");
        }
        debug!(
            actor_id,
            entries = record.history.len(),
            unified = reading.vector.unified,
            "reading recorded"
        );
    }

    fn out_of_band(&self, record: &ActorRecord) -> bool {
        let Some(latest) = record.latest() else {
            return false;
        };

        if latest.vector.unified < self.config.low_unified {
            return true;
        }
        let resonance = latest
            .meta
            .counterpart_resonance
            .unwrap_or(NEUTRAL_SIGNAL);
        if resonance < self.config.low_counterpart_resonance {
            return true;
        }
        if record.len() >= self.config.quality_window {
            if let Some(quality) = record.rolling_quality(self.config.quality_window) {
                if quality < self.config.low_quality {
                    return true;
                }
            }
        }
        false
    }

    /// Snapshot of one actor's record.
    pub fn actor(&self, actor_id: &str) -> Option<ActorRecord> {
        self.records.get(actor_id).map(|r| r.value().clone())
    }

    /// Number of tracked actors.
    pub fn actor_count(&self) -> usize {
        self.records.len()
    }

    /// Drop one actor's history. Unknown ids are a no-op.
    pub fn remove_actor(&self, actor_id: &str) -> bool {
        self.records.remove(actor_id).is_some()
    }

    /// Propose a per-dimension adjustment for a class from its most
    /// recent entries.
    ///
    /// Returns `None` below the minimum sample count or when every
    /// dimension mean sits inside the [low, high] band; an explicit
    /// absence, not an error. Every returned suggestion is appended to
    /// the class audit trail; nothing is ever applied automatically.
    pub fn suggest_calibration(&self, class: ActorClass) -> Option<CalibrationAdjustment> {
        let mut entries: Vec<(DateTime<Utc>, CoherenceVector)> = self
            .records
            .iter()
            .filter(|r| r.class == class)
            .flat_map(|r| {
                r.history
                    .iter()
                    .map(|e| (e.timestamp, e.vector))
                    .collect::<Vec<_>>()
            })
            .collect();

        if entries.len() < self.config.min_class_samples {
            return None;
        }

        entries.sort_by_key(|(timestamp, _)| *timestamp);
        let recent: Vec<CoherenceVector> = entries
            .iter()
            .rev()
            .take(self.config.calibration_window)
            .map(|(_, vector)| *vector)
            .collect();
        let n = recent.len() as f64;

        let step = self.config.adjustment_step;
        let mut low = Vec::new();
        let mut high = Vec::new();
        let deltas = DimensionValues::from_fn(|dim| {
            let avg = recent.iter().map(|v| v.get(dim)).sum::<f64>() / n;
            if avg < self.config.low_band {
                low.push(dim);
                step
            } else if avg > self.config.high_band {
                high.push(dim);
                -step
            } else {
                0.0
            }
        });

        if deltas.is_zero() {
            return None;
        }

        let mut parts = Vec::new();
        if !low.is_empty() {
            parts.push(format!("raise {}", join_dimensions(&low)));
        }
        if !high.is_empty() {
            parts.push(format!("lower {}", join_dimensions(&high)));
        }
        let reason = format!("{class} rolling averages out of band: {}", parts.join("; "));

        let adjustment = CalibrationAdjustment {
            class,
            deltas,
            reason,
            suggested_at: Utc::now(),
        };

        info!(%class, reason = %adjustment.reason, "calibration suggested");
        self.calibrations
            .write()
            .entry(class)
            .or_default()
            .push(adjustment.clone());

        Some(adjustment)
    }

    /// Append-only audit trail of suggestions for a class.
    pub fn calibration_history(&self, class: ActorClass) -> Vec<CalibrationAdjustment> {
        self.calibrations
            .read()
            .get(&class)
            .cloned()
            .unwrap_or_default()
    }

    /// Aggregate view over one class, or `None` when it has no samples.
    pub fn summarize(&self, class: ActorClass) -> Option<ClassSummary> {
        let entries: Vec<HistoryEntry> = self
            .records
            .iter()
            .filter(|r| r.class == class)
            .flat_map(|r| r.history.iter().cloned().collect::<Vec<_>>())
            .collect();

        if entries.is_empty() {
            return None;
        }
        let n = entries.len() as f64;

        let mut mean_vector = CoherenceVector {
            clarity: entries.iter().map(|e| e.vector.clarity).sum::<f64>() / n,
            activation: entries.iter().map(|e| e.vector.activation).sum::<f64>() / n,
            flow: entries.iter().map(|e| e.vector.flow).sum::<f64>() / n,
            grounding: entries.iter().map(|e| e.vector.grounding).sum::<f64>() / n,
            integration: entries.iter().map(|e| e.vector.integration).sum::<f64>() / n,
            unified: 0.0,
        };
        mean_vector.unified = entries.iter().map(|e| e.vector.unified).sum::<f64>() / n;

        let qualities: Vec<f64> = entries
            .iter()
            .map(|e| e.meta.quality.unwrap_or(NEUTRAL_SIGNAL))
            .collect();
        let resonances: Vec<f64> = entries
            .iter()
            .map(|e| e.meta.counterpart_resonance.unwrap_or(NEUTRAL_SIGNAL))
            .collect();

        Some(ClassSummary {
            mean_vector,
            mean_quality: mean(&qualities),
            mean_counterpart_resonance: mean(&resonances),
            interactions: entries.len(),
            calibrations: self
                .calibrations
                .read()
                .get(&class)
                .map_or(0, |history| history.len()),
        })
    }

    /// Drop all records and audit trails.
    pub fn clear(&self) {
        self.records.clear();
        self.calibrations.write().clear();
    }
}

fn join_dimensions(dims: &[Dimension]) -> String {
    dims.iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tracker() -> ActorHistoryTracker {
        ActorHistoryTracker::new(TrackerConfig::default())
    }

    fn uniform_vector(value: f64) -> CoherenceVector {
        CoherenceVector {
            clarity: value,
            activation: value,
            flow: value,
            grounding: value,
            integration: value,
            unified: value,
        }
    }

    fn reading_at(vector: CoherenceVector, offset_secs: i64) -> VectorReading {
        VectorReading {
            vector,
            confidence: 1.0,
            timestamp: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    fn record_series(
        tracker: &ActorHistoryTracker,
        actor_id: &str,
        class: ActorClass,
        vector: CoherenceVector,
        count: usize,
    ) {
        for i in 0..count {
            tracker.record(
                actor_id,
                class,
                &reading_at(vector, i as i64),
                InteractionMeta::default(),
            );
        }
    }

    #[test]
    fn test_history_bounded_at_capacity() {
        let config = TrackerConfig {
            history_capacity: 5,
            ..TrackerConfig::default()
        };
        let tracker = ActorHistoryTracker::new(config);

        for i in 0..6 {
            tracker.record(
                "a1",
                ActorClass::Human,
                &reading_at(uniform_vector(0.1 * (i + 1) as f64), i as i64),
                InteractionMeta::default(),
            );
        }

        let record = tracker.actor("a1").unwrap();
        assert_eq!(record.len(), 5);
        // Oldest entry (0.1) was evicted
        let first = record.history().next().unwrap();
        assert!((first.vector.unified - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_low_unified_flags_calibration() {
        let tracker = tracker();
        tracker.record(
            "a1",
            ActorClass::Agent,
            &reading_at(uniform_vector(0.3), 0),
            InteractionMeta::default(),
        );
        assert!(tracker.actor("a1").unwrap().calibration_needed);
    }

    #[test]
    fn test_low_counterpart_resonance_flags_calibration() {
        let tracker = tracker();
        tracker.record(
            "a1",
            ActorClass::Agent,
            &reading_at(uniform_vector(0.7), 0),
            InteractionMeta {
                counterpart_resonance: Some(0.1),
                ..InteractionMeta::default()
            },
        );
        assert!(tracker.actor("a1").unwrap().calibration_needed);
    }

    #[test]
    fn test_low_rolling_quality_flags_calibration() {
        let tracker = tracker();
        for i in 0..5 {
            tracker.record(
                "a1",
                ActorClass::Agent,
                &reading_at(uniform_vector(0.7), i),
                InteractionMeta {
                    quality: Some(0.2),
                    ..InteractionMeta::default()
                },
            );
        }
        assert!(tracker.actor("a1").unwrap().calibration_needed);
    }

    #[test]
    fn test_healthy_actor_not_flagged() {
        let tracker = tracker();
        for i in 0..10 {
            tracker.record(
                "a1",
                ActorClass::Human,
                &reading_at(uniform_vector(0.7), i),
                InteractionMeta {
                    quality: Some(0.8),
                    counterpart_resonance: Some(0.7),
                    ..InteractionMeta::default()
                },
            );
        }
        assert!(!tracker.actor("a1").unwrap().calibration_needed);
    }

    #[test]
    fn test_suggestion_absent_below_min_samples() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.2), 9);
        assert!(tracker.suggest_calibration(ActorClass::Agent).is_none());
    }

    #[test]
    fn test_suggestion_pushes_low_dimension_up() {
        let tracker = tracker();
        let vector = CoherenceVector {
            clarity: 0.2,
            activation: 0.6,
            flow: 0.6,
            grounding: 0.6,
            integration: 0.6,
            unified: 0.53,
        };
        record_series(&tracker, "a1", ActorClass::Agent, vector, 12);

        let adjustment = tracker.suggest_calibration(ActorClass::Agent).unwrap();
        assert!(adjustment.deltas.clarity > 0.0);
        assert_eq!(adjustment.deltas.activation, 0.0);
        assert!(adjustment.reason.contains("clarity"));
    }

    #[test]
    fn test_suggestion_pushes_high_dimension_down() {
        let tracker = tracker();
        let vector = CoherenceVector {
            clarity: 0.6,
            activation: 0.95,
            flow: 0.6,
            grounding: 0.6,
            integration: 0.6,
            unified: 0.67,
        };
        record_series(&tracker, "a1", ActorClass::Agent, vector, 12);

        let adjustment = tracker.suggest_calibration(ActorClass::Agent).unwrap();
        assert!(adjustment.deltas.activation < 0.0);
        assert!(adjustment.reason.contains("lower activation"));
    }

    #[test]
    fn test_suggestion_absent_when_in_band() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.65), 12);
        assert!(tracker.suggest_calibration(ActorClass::Agent).is_none());
        // In-band runs leave no audit entries
        assert!(tracker.calibration_history(ActorClass::Agent).is_empty());
    }

    #[test]
    fn test_audit_trail_appends() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.2), 12);

        tracker.suggest_calibration(ActorClass::Agent).unwrap();
        tracker.suggest_calibration(ActorClass::Agent).unwrap();
        assert_eq!(tracker.calibration_history(ActorClass::Agent).len(), 2);
        // Per-class trails are independent
        assert!(tracker.calibration_history(ActorClass::Human).is_empty());
    }

    #[test]
    fn test_suggestion_uses_most_recent_window() {
        let tracker = tracker();
        // Old low entries followed by a recent in-band run
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.2), 10);
        for i in 0..10 {
            tracker.record(
                "a1",
                ActorClass::Agent,
                &reading_at(uniform_vector(0.65), 100 + i),
                InteractionMeta::default(),
            );
        }
        assert!(tracker.suggest_calibration(ActorClass::Agent).is_none());
    }

    #[test]
    fn test_summarize_absent_for_empty_class() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.6), 3);
        assert!(tracker.summarize(ActorClass::Human).is_none());
    }

    #[test]
    fn test_summarize_aggregates_class() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.4), 5);
        record_series(&tracker, "a2", ActorClass::Agent, uniform_vector(0.8), 5);

        let summary = tracker.summarize(ActorClass::Agent).unwrap();
        assert_eq!(summary.interactions, 10);
        assert!((summary.mean_vector.unified - 0.6).abs() < 1e-12);
        assert!((summary.mean_quality - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_remove_unknown_actor_is_noop() {
        let tracker = tracker();
        assert!(!tracker.remove_actor("ghost"));
    }

    #[test]
    fn test_rolling_mean_window() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Human, uniform_vector(0.2), 3);
        for i in 0..3 {
            tracker.record(
                "a1",
                ActorClass::Human,
                &reading_at(uniform_vector(0.8), 10 + i),
                InteractionMeta::default(),
            );
        }

        let record = tracker.actor("a1").unwrap();
        let recent = record.rolling_mean(3).unwrap();
        assert!((recent.unified - 0.8).abs() < 1e-12);
        let all = record.rolling_mean(100).unwrap();
        assert!((all.unified - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clear_resets_state() {
        let tracker = tracker();
        record_series(&tracker, "a1", ActorClass::Agent, uniform_vector(0.2), 12);
        tracker.suggest_calibration(ActorClass::Agent).unwrap();

        tracker.clear();
        assert_eq!(tracker.actor_count(), 0);
        assert!(tracker.calibration_history(ActorClass::Agent).is_empty());
    }
}
