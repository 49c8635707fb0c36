//! Core types for the coherence engine

use crate::error::CoherenceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The five fused dimensions of a coherence vector.
///
/// The schema is opaque to the math: each dimension is just a named slot
/// combining two to four sub-scores under configured weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Adaptability and signal variability
    Clarity,
    /// Energy and readiness to act
    Activation,
    /// Rhythmic consistency and regulation
    Flow,
    /// Stability and recovery depth
    Grounding,
    /// Cross-dimension balance and integration
    Integration,
}

impl Dimension {
    /// All five dimensions in canonical order (integration last).
    pub const ALL: [Dimension; 5] = [
        Dimension::Clarity,
        Dimension::Activation,
        Dimension::Flow,
        Dimension::Grounding,
        Dimension::Integration,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Clarity => "clarity",
            Dimension::Activation => "activation",
            Dimension::Flow => "flow",
            Dimension::Grounding => "grounding",
            Dimension::Integration => "integration",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = CoherenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clarity" => Ok(Dimension::Clarity),
            "activation" => Ok(Dimension::Activation),
            "flow" => Ok(Dimension::Flow),
            "grounding" => Ok(Dimension::Grounding),
            "integration" => Ok(Dimension::Integration),
            other => Err(CoherenceError::UnknownDimension(other.to_string())),
        }
    }
}

/// One value per dimension, without a unified aggregate.
///
/// Used for text sub-scores, per-dimension resonance breakdowns, rolling
/// dimension means, and signed calibration deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionValues {
    /// Clarity component
    pub clarity: f64,
    /// Activation component
    pub activation: f64,
    /// Flow component
    pub flow: f64,
    /// Grounding component
    pub grounding: f64,
    /// Integration component
    pub integration: f64,
}

impl DimensionValues {
    /// Build from a closure evaluated per dimension.
    pub fn from_fn(mut f: impl FnMut(Dimension) -> f64) -> Self {
        Self {
            clarity: f(Dimension::Clarity),
            activation: f(Dimension::Activation),
            flow: f(Dimension::Flow),
            grounding: f(Dimension::Grounding),
            integration: f(Dimension::Integration),
        }
    }

    /// Value for one dimension.
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Clarity => self.clarity,
            Dimension::Activation => self.activation,
            Dimension::Flow => self.flow,
            Dimension::Grounding => self.grounding,
            Dimension::Integration => self.integration,
        }
    }

    /// Set the value for one dimension.
    pub fn set(&mut self, dim: Dimension, value: f64) {
        match dim {
            Dimension::Clarity => self.clarity = value,
            Dimension::Activation => self.activation = value,
            Dimension::Flow => self.flow = value,
            Dimension::Grounding => self.grounding = value,
            Dimension::Integration => self.integration = value,
        }
    }

    /// Iterate (dimension, value) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.iter().map(move |&d| (d, self.get(d)))
    }

    /// True if every value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0.0)
    }
}

/// A complete coherence vector: five dimension scores plus the unified
/// aggregate. All fields are in [0, 1]; `unified` is always derived from
/// the five dimensions via the configured weighted average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoherenceVector {
    /// Clarity score
    pub clarity: f64,
    /// Activation score
    pub activation: f64,
    /// Flow score
    pub flow: f64,
    /// Grounding score
    pub grounding: f64,
    /// Integration score
    pub integration: f64,
    /// Unified aggregate of the five dimensions
    pub unified: f64,
}

impl CoherenceVector {
    /// Score for one dimension.
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Clarity => self.clarity,
            Dimension::Activation => self.activation,
            Dimension::Flow => self.flow,
            Dimension::Grounding => self.grounding,
            Dimension::Integration => self.integration,
        }
    }

    /// The five dimension scores without the unified aggregate.
    pub fn dimensions(&self) -> DimensionValues {
        DimensionValues::from_fn(|d| self.get(d))
    }
}

/// Direction of the primary signal over recent readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Signal trending upward
    Rising,
    /// Signal holding steady
    #[default]
    Stable,
    /// Signal trending downward
    Falling,
}

/// Class of an observed actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClass {
    /// A human participant
    Human,
    /// An automated agent
    Agent,
}

impl fmt::Display for ActorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorClass::Human => f.write_str("human"),
            ActorClass::Agent => f.write_str("agent"),
        }
    }
}

/// Raw signal fields for one actor at one instant.
///
/// Every field is optional: missing or non-finite values are defaulted
/// from configuration and degrade the reading's confidence instead of
/// failing. Consumed per call, never retained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Beat-to-beat variability (milliseconds, SDNN-like)
    pub variability: Option<f64>,
    /// Current heart rate (BPM)
    pub heart_rate: Option<f64>,
    /// Resting heart rate (BPM)
    pub resting_heart_rate: Option<f64>,
    /// Breathing rate (breaths per minute)
    pub breath_rate: Option<f64>,
    /// Total sleep duration (hours)
    pub sleep_hours: Option<f64>,
    /// Deep-sleep duration (hours)
    pub deep_sleep_hours: Option<f64>,
    /// Statistical variance of the variability signal
    pub variability_variance: Option<f64>,
    /// Readiness/recovery score on a 0-100 scale
    pub readiness: Option<f64>,
    /// Recent trend of the variability signal
    pub trend: Trend,
}

/// A computed coherence vector with its input quality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorReading {
    /// The computed vector
    pub vector: CoherenceVector,
    /// Input confidence in [0, 1]; 1.0 when no snapshot field was defaulted
    pub confidence: f64,
    /// When the reading was computed
    pub timestamp: DateTime<Utc>,
}

/// Auxiliary per-interaction signals attached to a history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionMeta {
    /// External quality feedback in [0, 1]
    pub quality: Option<f64>,
    /// Resonance with the interaction counterpart in [0, 1]
    pub counterpart_resonance: Option<f64>,
    /// Confidence of the underlying reading
    pub confidence: f64,
    /// Free-form session label
    pub session: Option<String>,
    /// Caller-defined extra fields
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for InteractionMeta {
    fn default() -> Self {
        Self {
            quality: None,
            counterpart_resonance: None,
            confidence: 1.0,
            session: None,
            extra: HashMap::new(),
        }
    }
}

/// A suggested per-class calibration, proposed from rolling trends.
///
/// Append-only: suggestions accumulate in a per-class audit trail and are
/// never applied to calculator configuration by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationAdjustment {
    /// Actor class the suggestion applies to
    pub class: ActorClass,
    /// Signed per-dimension deltas in [-1, 1]
    pub deltas: DimensionValues,
    /// Human-readable reason naming the out-of-band dimensions
    pub reason: String,
    /// When the suggestion was produced
    pub suggested_at: DateTime<Utc>,
}

/// Latest state of one active actor in the field graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Actor id (opaque, caller-supplied)
    pub id: String,
    /// Actor class
    pub class: ActorClass,
    /// Latest coherence vector
    pub vector: CoherenceVector,
    /// When the node was last updated
    pub updated_at: DateTime<Utc>,
}

/// Interaction tendency of a resonance edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResonanceKind {
    /// Both endpoints highly coherent; contact reinforces both
    Amplifying,
    /// At least one endpoint in a low state; contact drains
    Damping,
    /// Neither condition holds
    Neutral,
}

/// A derived similarity edge between two actors' current vectors.
///
/// Exists only while its strength clears the materiality threshold; both
/// directions are refreshed whenever either endpoint changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResonanceEdge {
    /// Source node id
    pub from: String,
    /// Target node id
    pub to: String,
    /// Overall strength in [0, 1]
    pub strength: f64,
    /// Interaction tendency
    pub kind: ResonanceKind,
    /// Per-dimension resonance breakdown
    pub breakdown: DimensionValues,
}

/// One recorded cascade propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeEvent {
    /// Node whose change triggered the run
    pub trigger_id: String,
    /// Class of the trigger node
    pub trigger_class: ActorClass,
    /// Ids reached through strong amplifying edges
    pub affected: Vec<String>,
    /// Maximum traversal depth reached
    pub depth: usize,
    /// Unified-score delta that triggered the run
    pub unified_delta: f64,
    /// Trigger node's vector at detection time
    pub signature: CoherenceVector,
    /// When the cascade was detected
    pub detected_at: DateTime<Utc>,
}

/// Emergent field-level pattern detected in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "pattern")]
pub enum EmergentPattern {
    /// Mean unified score above the high-coherence threshold
    HighCollectiveCoherence,
    /// Strong mean resonance across actor classes
    CrossClassResonance,
    /// One dimension mean exceeding another by more than the configured gap
    DimensionImbalance {
        /// Highest-mean dimension
        dominant: Dimension,
        /// Lowest-mean dimension
        deficient: Dimension,
    },
    /// Spread between the most and least coherent actors above the gap
    CoherenceDivide,
    /// Cascade count in the recent window above the activity threshold
    HighCascadeActivity,
}

impl fmt::Display for EmergentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmergentPattern::HighCollectiveCoherence => {
                f.write_str("high collective coherence")
            }
            EmergentPattern::CrossClassResonance => f.write_str("strong cross-class resonance"),
            EmergentPattern::DimensionImbalance {
                dominant,
                deficient,
            } => write!(f, "dimension imbalance: {dominant} dominant, {deficient} deficient"),
            EmergentPattern::CoherenceDivide => f.write_str("coherence divide between actors"),
            EmergentPattern::HighCascadeActivity => f.write_str("high cascade activity"),
        }
    }
}

/// Node counts by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    /// Human nodes
    pub human: usize,
    /// Agent nodes
    pub agent: usize,
    /// All nodes
    pub total: usize,
}

/// Read-only aggregate over the whole field, computed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Mean vector over all nodes
    pub mean_vector: CoherenceVector,
    /// Mean unified score over human nodes (0 when none)
    pub human_coherence: f64,
    /// Mean unified score over agent nodes (0 when none)
    pub agent_coherence: f64,
    /// Node counts by class
    pub node_counts: NodeCounts,
    /// Number of live directed edges
    pub edge_count: usize,
    /// Edges divided by the maximum possible directed edges
    pub edge_density: f64,
    /// Mean strength over live edges (0 when none)
    pub mean_edge_strength: f64,
    /// Mean unified plus a connectivity bonus, capped at the ceiling
    pub collective_intelligence: f64,
    /// Cascades detected within the recent window
    pub recent_cascades: usize,
    /// Matching emergent-pattern tags
    pub emergent_patterns: Vec<EmergentPattern>,
}
