//! Engine configuration
//!
//! Every weight, range, target, and threshold used by the engine lives
//! here; nothing is embedded in the computation code. Defaults carry the
//! production constants. The bundle is deserializable so the embedding
//! application can load it once from its own source of truth.

use crate::error::{CoherenceError, Result};
use serde::{Deserialize, Serialize};

/// Linear normalization range for one raw signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalRange {
    /// Value mapping to 0
    pub min: f64,
    /// Value mapping to 1
    pub max: f64,
}

/// Bell-curve scoring parameters: optimum as a target, not a bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BellTarget {
    /// Value scoring the peak
    pub target: f64,
    /// Falloff width
    pub spread: f64,
    /// Score at the target
    pub peak: f64,
}

/// Fallback values for missing snapshot fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalDefaults {
    /// Default variability (ms)
    pub variability: f64,
    /// Default heart rate (BPM)
    pub heart_rate: f64,
    /// Default resting heart rate (BPM)
    pub resting_heart_rate: f64,
    /// Default breathing rate (breaths/min)
    pub breath_rate: f64,
    /// Default total sleep (hours)
    pub sleep_hours: f64,
    /// Default deep sleep (hours)
    pub deep_sleep_hours: f64,
    /// Default variability variance
    pub variability_variance: f64,
    /// Default readiness (0-100)
    pub readiness: f64,
}

impl Default for SignalDefaults {
    fn default() -> Self {
        Self {
            variability: 50.0,
            heart_rate: 70.0,
            resting_heart_rate: 65.0,
            breath_rate: 15.0,
            sleep_hours: 7.0,
            deep_sleep_hours: 1.0,
            variability_variance: 150.0,
            readiness: 60.0,
        }
    }
}

/// Sub-score weights for the clarity dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClarityWeights {
    /// Weight of the normalized variability score
    pub variability: f64,
    /// Weight of the breath bell-curve score
    pub breathing: f64,
    /// Weight of the normalized variance score
    pub variance: f64,
}

impl Default for ClarityWeights {
    fn default() -> Self {
        Self {
            variability: 0.5,
            breathing: 0.3,
            variance: 0.2,
        }
    }
}

/// Sub-score weights for the flow dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowWeights {
    /// Weight of the inverted-variance rhythm score
    pub rhythm: f64,
    /// Weight of the slow-breath bell-curve score
    pub breathing: f64,
    /// Weight of the trend bonus
    pub trend: f64,
}

impl Default for FlowWeights {
    fn default() -> Self {
        Self {
            rhythm: 0.4,
            breathing: 0.3,
            trend: 0.3,
        }
    }
}

/// Sub-score weights for the grounding dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroundingWeights {
    /// Weight of the inverted resting-heart-rate score
    pub resting_heart_rate: f64,
    /// Weight of the sleep bell-curve score
    pub sleep: f64,
    /// Weight of the normalized deep-sleep score
    pub deep_sleep: f64,
    /// Weight of the inverted-variance stability score
    pub stability: f64,
}

impl Default for GroundingWeights {
    fn default() -> Self {
        Self {
            resting_heart_rate: 0.25,
            sleep: 0.3,
            deep_sleep: 0.25,
            stability: 0.2,
        }
    }
}

/// Sub-score weights for the integration dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegrationWeights {
    /// Weight of the readiness integration score
    pub readiness: f64,
    /// Weight of the cross-dimension balance score
    pub balance: f64,
    /// Weight of the variability peak bonus
    pub peak: f64,
}

impl Default for IntegrationWeights {
    fn default() -> Self {
        Self {
            readiness: 0.4,
            balance: 0.4,
            peak: 0.2,
        }
    }
}

/// Weights fusing the five dimensions into the unified score.
///
/// Integration is weighted highest: cross-dimension balance is the
/// strongest single predictor of a stable overall state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnifiedWeights {
    /// Clarity weight
    pub clarity: f64,
    /// Activation weight
    pub activation: f64,
    /// Flow weight
    pub flow: f64,
    /// Grounding weight
    pub grounding: f64,
    /// Integration weight
    pub integration: f64,
}

impl Default for UnifiedWeights {
    fn default() -> Self {
        Self {
            clarity: 0.175,
            activation: 0.175,
            flow: 0.175,
            grounding: 0.175,
            integration: 0.3,
        }
    }
}

/// Calculator configuration: ranges, targets, bonuses, and weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Variability normalization range (ms)
    pub variability_range: SignalRange,
    /// Variability-variance normalization range
    pub variance_range: SignalRange,
    /// Resting-heart-rate normalization range (BPM)
    pub resting_heart_rate_range: SignalRange,
    /// Deep-sleep normalization range (hours)
    pub deep_sleep_range: SignalRange,
    /// Breath optimum for clarity (coherent breathing)
    pub clarity_breath: BellTarget,
    /// Breath optimum for flow (slower, flowing breath)
    pub flow_breath: BellTarget,
    /// Sleep-duration optimum
    pub sleep_target: BellTarget,
    /// Scale of the readiness signal
    pub readiness_scale: f64,
    /// Heart rate above which the activation bonus applies (BPM)
    pub active_heart_rate: f64,
    /// Activation bonus for an elevated heart rate
    pub activation_bonus: f64,
    /// Activation bonus for a rising trend
    pub rising_activation_bonus: f64,
    /// Flow bonus for a stable trend
    pub stable_flow_bonus: f64,
    /// Flow bonus for a falling trend
    pub falling_flow_bonus: f64,
    /// Variability above this earns the high peak bonus
    pub variability_peak_high: f64,
    /// Variability above this earns the medium peak bonus
    pub variability_peak_medium: f64,
    /// High peak bonus value
    pub peak_bonus_high: f64,
    /// Medium peak bonus value
    pub peak_bonus_medium: f64,
    /// Standard deviation mapping the balance score to 0
    pub max_balance_stddev: f64,
    /// Clarity sub-score weights
    pub clarity_weights: ClarityWeights,
    /// Flow sub-score weights
    pub flow_weights: FlowWeights,
    /// Grounding sub-score weights
    pub grounding_weights: GroundingWeights,
    /// Integration sub-score weights
    pub integration_weights: IntegrationWeights,
    /// Unified-score weights
    pub unified_weights: UnifiedWeights,
    /// Fallbacks for missing snapshot fields
    pub defaults: SignalDefaults,
    /// Confidence lost per defaulted field
    pub confidence_penalty: f64,
    /// Confidence floor
    pub min_confidence: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            variability_range: SignalRange {
                min: 20.0,
                max: 100.0,
            },
            variance_range: SignalRange {
                min: 50.0,
                max: 500.0,
            },
            resting_heart_rate_range: SignalRange {
                min: 50.0,
                max: 85.0,
            },
            deep_sleep_range: SignalRange { min: 0.5, max: 2.5 },
            clarity_breath: BellTarget {
                target: 15.0,
                spread: 3.0,
                peak: 0.8,
            },
            flow_breath: BellTarget {
                target: 12.0,
                spread: 3.0,
                peak: 0.7,
            },
            sleep_target: BellTarget {
                target: 7.5,
                spread: 1.5,
                peak: 0.8,
            },
            readiness_scale: 100.0,
            active_heart_rate: 70.0,
            activation_bonus: 0.2,
            rising_activation_bonus: 0.3,
            stable_flow_bonus: 0.3,
            falling_flow_bonus: 0.2,
            variability_peak_high: 80.0,
            variability_peak_medium: 65.0,
            peak_bonus_high: 0.2,
            peak_bonus_medium: 0.1,
            max_balance_stddev: 0.5,
            clarity_weights: ClarityWeights::default(),
            flow_weights: FlowWeights::default(),
            grounding_weights: GroundingWeights::default(),
            integration_weights: IntegrationWeights::default(),
            unified_weights: UnifiedWeights::default(),
            defaults: SignalDefaults::default(),
            confidence_penalty: 0.1,
            min_confidence: 0.2,
        }
    }
}

/// Peak-window (optimal-moment) detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Minimum unified score for an open window
    pub unified_min: f64,
    /// Minimum integration score for an open window
    pub integration_min: f64,
    /// Every dimension must clear this floor
    pub dimension_floor: f64,
    /// Window estimate for a stable trend (minutes)
    pub minutes_stable: u32,
    /// Window estimate for a rising trend (minutes)
    pub minutes_rising: u32,
    /// Fallback window estimate (minutes)
    pub minutes_default: u32,
    /// Strength above which deep work is indicated
    pub strength_deep_work: f64,
    /// Strength above which focused work is indicated
    pub strength_focused: f64,
    /// Unified score above which a closed window still reads as building
    pub building_min: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            unified_min: 0.75,
            integration_min: 0.8,
            dimension_floor: 0.5,
            minutes_stable: 120,
            minutes_rising: 90,
            minutes_default: 60,
            strength_deep_work: 0.9,
            strength_focused: 0.8,
            building_min: 0.6,
        }
    }
}

/// Unified-score cutoffs for the coarse coherence band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Unified above this reads as peak
    pub peak_min: f64,
    /// Unified above this reads as high
    pub high_min: f64,
    /// Unified above this reads as good
    pub good_min: f64,
    /// Unified above this reads as building; everything below is low
    pub building_min: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            peak_min: 0.85,
            high_min: 0.75,
            good_min: 0.6,
            building_min: 0.4,
        }
    }
}

/// Keyword text-feature extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Marker hits mapping a dimension sub-score to 1.0
    pub marker_scale: f64,
    /// Per-dimension score floors
    pub clarity_floor: f64,
    /// Activation floor
    pub activation_floor: f64,
    /// Flow floor
    pub flow_floor: f64,
    /// Grounding floor
    pub grounding_floor: f64,
    /// Integration floor
    pub integration_floor: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            marker_scale: 10.0,
            clarity_floor: 0.3,
            activation_floor: 0.2,
            flow_floor: 0.2,
            grounding_floor: 0.2,
            integration_floor: 0.2,
        }
    }
}

/// History tracking and calibration-suggestion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum history entries retained per actor
    pub history_capacity: usize,
    /// Unified score below this flags calibration
    pub low_unified: f64,
    /// Counterpart resonance below this flags calibration
    pub low_counterpart_resonance: f64,
    /// Entries averaged for the quality check
    pub quality_window: usize,
    /// Rolling quality mean below this flags calibration
    pub low_quality: f64,
    /// Minimum class-wide samples before suggestions are produced
    pub min_class_samples: usize,
    /// Most recent class-wide entries averaged for a suggestion
    pub calibration_window: usize,
    /// Dimension mean below this band is pushed up
    pub low_band: f64,
    /// Dimension mean above this band is pushed down
    pub high_band: f64,
    /// Magnitude of a suggested per-dimension delta
    pub adjustment_step: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            low_unified: 0.4,
            low_counterpart_resonance: 0.3,
            quality_window: 5,
            low_quality: 0.4,
            min_class_samples: 10,
            calibration_window: 10,
            low_band: 0.5,
            high_band: 0.8,
            adjustment_step: 0.2,
        }
    }
}

/// Field graph, resonance, and cascade parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Minimum strength for an edge to exist at all
    pub materiality_threshold: f64,
    /// Both endpoints above this makes an edge amplifying
    pub amplifying_threshold: f64,
    /// Either endpoint below this makes an edge damping
    pub damping_threshold: f64,
    /// Unified-score change that triggers cascade detection
    pub cascade_delta_threshold: f64,
    /// Minimum edge strength followed during a cascade
    pub cascade_traversal_threshold: f64,
    /// Maximum cascade traversal depth
    pub cascade_max_depth: usize,
    /// Cascade events retained in the ring buffer
    pub cascade_capacity: usize,
    /// Window for the snapshot's recent-cascade count (minutes)
    pub recent_window_minutes: i64,
    /// Window for the cascade-activity pattern (minutes)
    pub activity_window_minutes: i64,
    /// Cascades within the activity window above this raise the pattern
    pub activity_count_threshold: usize,
    /// Maximum nodes held in the graph before eviction
    pub max_nodes: usize,
    /// Factor applied to (density x mean strength) in the intelligence index
    pub intelligence_bonus: f64,
    /// Cap on the collective-intelligence index
    pub intelligence_ceiling: f64,
    /// Mean unified above this raises the high-coherence pattern
    pub high_coherence_threshold: f64,
    /// Mean cross-class edge strength above this raises the pattern
    pub cross_class_threshold: f64,
    /// Dimension-mean spread above this raises the imbalance pattern
    pub dimension_gap: f64,
    /// Actor unified spread above this raises the divide pattern
    pub divide_gap: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: 0.3,
            amplifying_threshold: 0.7,
            damping_threshold: 0.4,
            cascade_delta_threshold: 0.15,
            cascade_traversal_threshold: 0.5,
            cascade_max_depth: 3,
            cascade_capacity: 100,
            recent_window_minutes: 60,
            activity_window_minutes: 10,
            activity_count_threshold: 3,
            max_nodes: 256,
            intelligence_bonus: 0.5,
            intelligence_ceiling: 1.5,
            high_coherence_threshold: 0.8,
            cross_class_threshold: 0.7,
            dimension_gap: 0.4,
            divide_gap: 0.5,
        }
    }
}

/// Complete engine configuration bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Calculator parameters
    pub calculator: CalculatorConfig,
    /// Peak-window parameters
    pub window: WindowConfig,
    /// Coherence-band cutoffs
    pub profile: ProfileConfig,
    /// Text-feature parameters
    pub text: TextConfig,
    /// Tracker parameters
    pub tracker: TrackerConfig,
    /// Field graph parameters
    pub field: FieldConfig,
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CoherenceError::InvalidConfig(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(CoherenceError::InvalidConfig(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn check_range(name: &str, range: SignalRange) -> Result<()> {
    check_finite(name, range.min)?;
    check_finite(name, range.max)?;
    if range.max <= range.min {
        return Err(CoherenceError::InvalidConfig(format!(
            "{name} must satisfy min < max, got [{}, {}]",
            range.min, range.max
        )));
    }
    Ok(())
}

fn check_bell(name: &str, bell: BellTarget) -> Result<()> {
    check_finite(name, bell.target)?;
    check_finite(name, bell.spread)?;
    check_unit(name, bell.peak)?;
    if bell.spread <= 0.0 {
        return Err(CoherenceError::InvalidConfig(format!(
            "{name} spread must be > 0, got {}",
            bell.spread
        )));
    }
    Ok(())
}

fn check_weights(name: &str, weights: &[f64]) -> Result<()> {
    let mut total = 0.0;
    for &w in weights {
        check_finite(name, w)?;
        if w < 0.0 {
            return Err(CoherenceError::InvalidConfig(format!(
                "{name} weights must be non-negative"
            )));
        }
        total += w;
    }
    if total <= 0.0 {
        return Err(CoherenceError::InvalidConfig(format!(
            "{name} weights must not all be zero"
        )));
    }
    Ok(())
}

impl EngineConfig {
    /// Validate the bundle. Called at engine construction; the engine
    /// never re-checks at computation time.
    pub fn validate(&self) -> Result<()> {
        let calc = &self.calculator;
        check_range("calculator.variability_range", calc.variability_range)?;
        check_range("calculator.variance_range", calc.variance_range)?;
        check_range(
            "calculator.resting_heart_rate_range",
            calc.resting_heart_rate_range,
        )?;
        check_range("calculator.deep_sleep_range", calc.deep_sleep_range)?;
        check_bell("calculator.clarity_breath", calc.clarity_breath)?;
        check_bell("calculator.flow_breath", calc.flow_breath)?;
        check_bell("calculator.sleep_target", calc.sleep_target)?;
        if calc.readiness_scale <= 0.0 || !calc.readiness_scale.is_finite() {
            return Err(CoherenceError::InvalidConfig(format!(
                "calculator.readiness_scale must be > 0, got {}",
                calc.readiness_scale
            )));
        }
        if calc.max_balance_stddev <= 0.0 || !calc.max_balance_stddev.is_finite() {
            return Err(CoherenceError::InvalidConfig(format!(
                "calculator.max_balance_stddev must be > 0, got {}",
                calc.max_balance_stddev
            )));
        }
        let cw = calc.clarity_weights;
        check_weights(
            "calculator.clarity_weights",
            &[cw.variability, cw.breathing, cw.variance],
        )?;
        let fw = calc.flow_weights;
        check_weights(
            "calculator.flow_weights",
            &[fw.rhythm, fw.breathing, fw.trend],
        )?;
        let gw = calc.grounding_weights;
        check_weights(
            "calculator.grounding_weights",
            &[gw.resting_heart_rate, gw.sleep, gw.deep_sleep, gw.stability],
        )?;
        let iw = calc.integration_weights;
        check_weights(
            "calculator.integration_weights",
            &[iw.readiness, iw.balance, iw.peak],
        )?;
        let uw = calc.unified_weights;
        check_weights(
            "calculator.unified_weights",
            &[uw.clarity, uw.activation, uw.flow, uw.grounding, uw.integration],
        )?;
        check_unit("calculator.confidence_penalty", calc.confidence_penalty)?;
        check_unit("calculator.min_confidence", calc.min_confidence)?;

        check_unit("window.unified_min", self.window.unified_min)?;
        check_unit("window.integration_min", self.window.integration_min)?;
        check_unit("window.dimension_floor", self.window.dimension_floor)?;

        let profile = self.profile;
        check_unit("profile.peak_min", profile.peak_min)?;
        check_unit("profile.high_min", profile.high_min)?;
        check_unit("profile.good_min", profile.good_min)?;
        check_unit("profile.building_min", profile.building_min)?;
        if profile.peak_min <= profile.high_min
            || profile.high_min <= profile.good_min
            || profile.good_min <= profile.building_min
        {
            return Err(CoherenceError::InvalidConfig(
                "profile cutoffs must be strictly descending".to_string(),
            ));
        }

        if self.text.marker_scale <= 0.0 || !self.text.marker_scale.is_finite() {
            return Err(CoherenceError::InvalidConfig(format!(
                "text.marker_scale must be > 0, got {}",
                self.text.marker_scale
            )));
        }
        for (name, floor) in [
            ("text.clarity_floor", self.text.clarity_floor),
            ("text.activation_floor", self.text.activation_floor),
            ("text.flow_floor", self.text.flow_floor),
            ("text.grounding_floor", self.text.grounding_floor),
            ("text.integration_floor", self.text.integration_floor),
        ] {
            check_unit(name, floor)?;
        }

        let tracker = &self.tracker;
        if tracker.history_capacity == 0 {
            return Err(CoherenceError::InvalidConfig(
                "tracker.history_capacity must be > 0".to_string(),
            ));
        }
        if tracker.quality_window == 0 || tracker.calibration_window == 0 {
            return Err(CoherenceError::InvalidConfig(
                "tracker windows must be > 0".to_string(),
            ));
        }
        check_unit("tracker.low_unified", tracker.low_unified)?;
        check_unit(
            "tracker.low_counterpart_resonance",
            tracker.low_counterpart_resonance,
        )?;
        check_unit("tracker.low_quality", tracker.low_quality)?;
        check_unit("tracker.low_band", tracker.low_band)?;
        check_unit("tracker.high_band", tracker.high_band)?;
        if tracker.high_band <= tracker.low_band {
            return Err(CoherenceError::InvalidConfig(
                "tracker.high_band must be above tracker.low_band".to_string(),
            ));
        }
        check_unit("tracker.adjustment_step", tracker.adjustment_step)?;

        let field = &self.field;
        check_unit("field.materiality_threshold", field.materiality_threshold)?;
        check_unit("field.amplifying_threshold", field.amplifying_threshold)?;
        check_unit("field.damping_threshold", field.damping_threshold)?;
        check_unit(
            "field.cascade_delta_threshold",
            field.cascade_delta_threshold,
        )?;
        check_unit(
            "field.cascade_traversal_threshold",
            field.cascade_traversal_threshold,
        )?;
        if field.cascade_max_depth == 0 {
            return Err(CoherenceError::InvalidConfig(
                "field.cascade_max_depth must be > 0".to_string(),
            ));
        }
        if field.cascade_capacity == 0 {
            return Err(CoherenceError::InvalidConfig(
                "field.cascade_capacity must be > 0".to_string(),
            ));
        }
        if field.max_nodes < 2 {
            return Err(CoherenceError::InvalidConfig(
                "field.max_nodes must be at least 2".to_string(),
            ));
        }
        check_finite("field.intelligence_bonus", field.intelligence_bonus)?;
        check_finite("field.intelligence_ceiling", field.intelligence_ceiling)?;
        check_unit(
            "field.high_coherence_threshold",
            field.high_coherence_threshold,
        )?;
        check_unit("field.cross_class_threshold", field.cross_class_threshold)?;
        check_unit("field.dimension_gap", field.dimension_gap)?;
        check_unit("field.divide_gap", field.divide_gap)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_degenerate_range() {
        let mut config = EngineConfig::default();
        config.calculator.variability_range = SignalRange {
            min: 100.0,
            max: 20.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_weight() {
        let mut config = EngineConfig::default();
        config.calculator.unified_weights.integration = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let mut config = EngineConfig::default();
        config.tracker.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_bands() {
        let mut config = EngineConfig::default();
        config.tracker.low_band = 0.9;
        config.tracker.high_band = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unordered_profile_cutoffs() {
        let mut config = EngineConfig::default();
        config.profile.good_min = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserializes_partial_bundle() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"field": {"materiality_threshold": 0.25, "amplifying_threshold": 0.7,
                "damping_threshold": 0.4, "cascade_delta_threshold": 0.15,
                "cascade_traversal_threshold": 0.5, "cascade_max_depth": 4,
                "cascade_capacity": 50, "recent_window_minutes": 60,
                "activity_window_minutes": 10, "activity_count_threshold": 3,
                "max_nodes": 64, "intelligence_bonus": 0.5,
                "intelligence_ceiling": 1.5, "high_coherence_threshold": 0.8,
                "cross_class_threshold": 0.7, "dimension_gap": 0.4,
                "divide_gap": 0.5}}"#,
        )
        .unwrap();

        assert_eq!(config.field.cascade_max_depth, 4);
        assert_eq!(config.field.materiality_threshold, 0.25);
        // Omitted sections fall back to defaults
        assert_eq!(config.tracker.history_capacity, 100);
        config.validate().unwrap();
    }
}
