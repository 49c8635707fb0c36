//! Coherence calculator: one signal snapshot in, one bounded vector out
//!
//! Each dimension fuses two to four sub-scores through the configured
//! normalization, bell-curve, and weighted-average primitives. Malformed
//! or missing inputs are defaulted and clamped; the calculator never
//! fails, it degrades the reading's confidence instead.

use crate::config::{CalculatorConfig, ProfileConfig, WindowConfig};
use crate::score::{bell_curve, clamp01, normalize, std_dev, weighted_average};
use crate::types::{
    CoherenceVector, Dimension, DimensionValues, SignalSnapshot, Trend, VectorReading,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Coarse recommendation attached to a peak window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBand {
    /// Exceptional state: hold for the most demanding work
    DeepWork,
    /// Strong state: focused or creative work
    Focused,
    /// Open but moderate: contemplative work
    Contemplative,
    /// Closed but climbing: keep building
    Building,
    /// Closed and low: rest and restoration
    Rest,
}

/// An optimal-moment window derived from a vector and its trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakWindow {
    /// Whether the window is currently open
    pub open: bool,
    /// Window strength in [0, 1]; 0 when closed
    pub strength: f64,
    /// Estimated minutes remaining; 0 when closed
    pub expected_minutes: u32,
    /// Coarse recommendation band
    pub band: WindowBand,
}

/// Coarse unified-score band, cut at the configured profile thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoherenceBand {
    /// Unified above the peak cutoff
    Peak,
    /// Unified above the high cutoff
    High,
    /// Unified above the good cutoff
    Good,
    /// Unified above the building cutoff
    Building,
    /// Everything below
    Low,
}

/// Leading dimensions and overall band for one vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominantProfile {
    /// Strongest non-integrative dimension
    pub primary: Dimension,
    /// Second-strongest non-integrative dimension
    pub secondary: Dimension,
    /// Overall coherence band
    pub band: CoherenceBand,
}

/// Snapshot fields after defaulting and finiteness guards.
struct ResolvedSignals {
    variability: f64,
    heart_rate: f64,
    resting_heart_rate: f64,
    breath_rate: f64,
    sleep_hours: f64,
    deep_sleep_hours: f64,
    variability_variance: f64,
    readiness: f64,
    trend: Trend,
}

/// Maps signal snapshots to coherence vectors under a fixed configuration.
#[derive(Debug, Clone)]
pub struct CoherenceCalculator {
    config: CalculatorConfig,
    window: WindowConfig,
    bands: ProfileConfig,
}

impl CoherenceCalculator {
    /// Create a calculator from validated configuration.
    pub fn new(config: CalculatorConfig, window: WindowConfig, bands: ProfileConfig) -> Self {
        Self {
            config,
            window,
            bands,
        }
    }

    /// Compute a full vector reading from one snapshot.
    ///
    /// Never fails: missing or non-finite fields fall back to configured
    /// defaults, and each fallback lowers the reading's confidence.
    pub fn compute(&self, snapshot: &SignalSnapshot) -> VectorReading {
        let (signals, defaulted) = self.resolve(snapshot);

        let clarity = self.clarity(&signals);
        let activation = self.activation(&signals);
        let flow = self.flow(&signals);
        let grounding = self.grounding(&signals);
        // Integration folds in the balance across the other four
        let integration = self.integration(&signals, [clarity, activation, flow, grounding]);

        let vector = self.assemble(DimensionValues {
            clarity,
            activation,
            flow,
            grounding,
            integration,
        });

        let confidence = self.confidence(defaulted);
        if defaulted > 0 {
            warn!(defaulted, confidence, "snapshot fields defaulted");
        }
        debug!(
            unified = vector.unified,
            confidence, "coherence vector computed"
        );

        VectorReading {
            vector,
            confidence,
            timestamp: Utc::now(),
        }
    }

    /// Build a complete vector from externally produced dimension
    /// sub-scores (e.g. the text capability), deriving the unified score
    /// through the same configured weights as [`compute`](Self::compute).
    pub fn from_scores(&self, scores: DimensionValues) -> CoherenceVector {
        self.assemble(DimensionValues::from_fn(|d| clamp01(scores.get(d))))
    }

    fn assemble(&self, dims: DimensionValues) -> CoherenceVector {
        let weights = self.config.unified_weights;
        let unified = weighted_average(&[
            (dims.integration, weights.integration),
            (dims.clarity, weights.clarity),
            (dims.activation, weights.activation),
            (dims.flow, weights.flow),
            (dims.grounding, weights.grounding),
        ]);

        CoherenceVector {
            clarity: dims.clarity,
            activation: dims.activation,
            flow: dims.flow,
            grounding: dims.grounding,
            integration: dims.integration,
            unified,
        }
    }

    fn resolve(&self, snapshot: &SignalSnapshot) -> (ResolvedSignals, u32) {
        let defaults = self.config.defaults;
        let mut defaulted = 0u32;
        let mut field = |value: Option<f64>, fallback: f64| match value {
            Some(v) if v.is_finite() => v,
            _ => {
                defaulted += 1;
                fallback
            }
        };

        let signals = ResolvedSignals {
            variability: field(snapshot.variability, defaults.variability),
            heart_rate: field(snapshot.heart_rate, defaults.heart_rate),
            resting_heart_rate: field(snapshot.resting_heart_rate, defaults.resting_heart_rate),
            breath_rate: field(snapshot.breath_rate, defaults.breath_rate),
            sleep_hours: field(snapshot.sleep_hours, defaults.sleep_hours),
            deep_sleep_hours: field(snapshot.deep_sleep_hours, defaults.deep_sleep_hours),
            variability_variance: field(
                snapshot.variability_variance,
                defaults.variability_variance,
            ),
            readiness: field(snapshot.readiness, defaults.readiness),
            trend: snapshot.trend,
        };

        (signals, defaulted)
    }

    fn confidence(&self, defaulted: u32) -> f64 {
        let penalty = self.config.confidence_penalty * defaulted as f64;
        (1.0 - penalty).max(self.config.min_confidence)
    }

    /// Clarity: adaptability. Higher variability and variance mean a more
    /// flexible signal; breathing scores by closeness to the optimum.
    fn clarity(&self, signals: &ResolvedSignals) -> f64 {
        let config = &self.config;
        let range = config.variability_range;
        let variability_score = normalize(signals.variability, range.min, range.max);

        let bell = config.clarity_breath;
        let breath_score = bell_curve(signals.breath_rate, bell.target, bell.spread, bell.peak);

        let variance = config.variance_range;
        let variance_score = normalize(signals.variability_variance, variance.min, variance.max);

        let weights = config.clarity_weights;
        weighted_average(&[
            (variability_score, weights.variability),
            (breath_score, weights.breathing),
            (variance_score, weights.variance),
        ])
    }

    /// Activation: readiness baseline plus elevated-heart-rate and
    /// rising-trend bonuses.
    fn activation(&self, signals: &ResolvedSignals) -> f64 {
        let config = &self.config;
        let mut score = signals.readiness / config.readiness_scale;

        if signals.heart_rate > config.active_heart_rate {
            score += config.activation_bonus;
        }
        if signals.trend == Trend::Rising {
            score += config.rising_activation_bonus;
        }

        clamp01(score)
    }

    /// Flow: steady rhythm. Low variance reads as flow, slow breathing
    /// scores by closeness to its own optimum, and a stable or gently
    /// falling trend earns a bonus.
    fn flow(&self, signals: &ResolvedSignals) -> f64 {
        let config = &self.config;
        let trend_bonus = match signals.trend {
            Trend::Stable => config.stable_flow_bonus,
            Trend::Falling => config.falling_flow_bonus,
            Trend::Rising => 0.0,
        };

        let variance = config.variance_range;
        let rhythm_score =
            1.0 - normalize(signals.variability_variance, variance.min, variance.max);

        let bell = config.flow_breath;
        let breath_score = bell_curve(signals.breath_rate, bell.target, bell.spread, bell.peak);

        let weights = config.flow_weights;
        weighted_average(&[
            (rhythm_score, weights.rhythm),
            (breath_score, weights.breathing),
            (trend_bonus, weights.trend),
        ])
    }

    /// Grounding: stability and recovery. Lower resting heart rate and
    /// variance score higher; sleep scores by closeness to the optimum.
    fn grounding(&self, signals: &ResolvedSignals) -> f64 {
        let config = &self.config;
        let rhr = config.resting_heart_rate_range;
        let rhr_score = 1.0 - normalize(signals.resting_heart_rate, rhr.min, rhr.max);

        let bell = config.sleep_target;
        let sleep_score = bell_curve(signals.sleep_hours, bell.target, bell.spread, bell.peak);

        let deep = config.deep_sleep_range;
        let deep_sleep_score = normalize(signals.deep_sleep_hours, deep.min, deep.max);

        let variance = config.variance_range;
        let stability_score =
            1.0 - normalize(signals.variability_variance, variance.min, variance.max);

        let weights = config.grounding_weights;
        weighted_average(&[
            (rhr_score, weights.resting_heart_rate),
            (sleep_score, weights.sleep),
            (deep_sleep_score, weights.deep_sleep),
            (stability_score, weights.stability),
        ])
    }

    /// Integration: readiness, cross-dimension balance, and a stepped
    /// variability peak bonus. An actor whose four dimensions sit close
    /// together scores higher than one with the same mean but high spread.
    fn integration(&self, signals: &ResolvedSignals, others: [f64; 4]) -> f64 {
        let config = &self.config;
        let integration_score = clamp01(signals.readiness / config.readiness_scale);

        let spread = std_dev(&others);
        let balance_score = (1.0 - spread / config.max_balance_stddev).max(0.0);

        let peak_bonus = if signals.variability > config.variability_peak_high {
            config.peak_bonus_high
        } else if signals.variability > config.variability_peak_medium {
            config.peak_bonus_medium
        } else {
            0.0
        };

        let weights = config.integration_weights;
        weighted_average(&[
            (integration_score, weights.readiness),
            (balance_score, weights.balance),
            (peak_bonus, weights.peak),
        ])
    }

    /// Detect an optimal-moment window from a vector and its trend.
    ///
    /// Open when unified and integration clear their thresholds, every
    /// dimension clears the floor, and the trend is not falling.
    pub fn peak_window(&self, vector: &CoherenceVector, trend: Trend) -> PeakWindow {
        let window = &self.window;
        let dimensions_clear = Dimension::ALL
            .iter()
            .all(|&d| vector.get(d) > window.dimension_floor);

        let open = vector.unified > window.unified_min
            && vector.integration > window.integration_min
            && dimensions_clear
            && trend != Trend::Falling;

        if !open {
            let band = if vector.unified > window.building_min {
                WindowBand::Building
            } else {
                WindowBand::Rest
            };
            return PeakWindow {
                open: false,
                strength: 0.0,
                expected_minutes: 0,
                band,
            };
        }

        let strength = (vector.unified * vector.integration).min(1.0);
        let base_minutes = match trend {
            Trend::Stable => window.minutes_stable,
            Trend::Rising => window.minutes_rising,
            Trend::Falling => window.minutes_default,
        };
        let expected_minutes = (base_minutes as f64 * strength).round() as u32;

        let band = if strength > window.strength_deep_work {
            WindowBand::DeepWork
        } else if strength > window.strength_focused {
            WindowBand::Focused
        } else {
            WindowBand::Contemplative
        };

        PeakWindow {
            open: true,
            strength,
            expected_minutes,
            band,
        }
    }

    /// Leading non-integrative dimensions and coarse band for one vector.
    pub fn profile(&self, vector: &CoherenceVector) -> DominantProfile {
        let mut ranked = [
            (Dimension::Clarity, vector.clarity),
            (Dimension::Activation, vector.activation),
            (Dimension::Flow, vector.flow),
            (Dimension::Grounding, vector.grounding),
        ];
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let bands = &self.bands;
        let band = if vector.unified > bands.peak_min {
            CoherenceBand::Peak
        } else if vector.unified > bands.high_min {
            CoherenceBand::High
        } else if vector.unified > bands.good_min {
            CoherenceBand::Good
        } else if vector.unified > bands.building_min {
            CoherenceBand::Building
        } else {
            CoherenceBand::Low
        };

        DominantProfile {
            primary: ranked[0].0,
            secondary: ranked[1].0,
            band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalculatorConfig, ProfileConfig, WindowConfig};

    fn calculator() -> CoherenceCalculator {
        CoherenceCalculator::new(
            CalculatorConfig::default(),
            WindowConfig::default(),
            ProfileConfig::default(),
        )
    }

    fn strong_snapshot() -> SignalSnapshot {
        SignalSnapshot {
            variability: Some(85.0),
            heart_rate: Some(62.0),
            resting_heart_rate: Some(52.0),
            breath_rate: Some(14.0),
            sleep_hours: Some(7.5),
            deep_sleep_hours: Some(1.8),
            variability_variance: Some(120.0),
            readiness: Some(88.0),
            trend: Trend::Stable,
        }
    }

    fn assert_bounded(vector: &CoherenceVector) {
        for dim in Dimension::ALL {
            let v = vector.get(dim);
            assert!((0.0..=1.0).contains(&v), "{dim} = {v} out of bounds");
        }
        assert!((0.0..=1.0).contains(&vector.unified));
    }

    #[test]
    fn test_all_fields_bounded() {
        let reading = calculator().compute(&strong_snapshot());
        assert_bounded(&reading.vector);
        assert_eq!(reading.confidence, 1.0);
    }

    #[test]
    fn test_bounded_on_extreme_inputs() {
        let snapshot = SignalSnapshot {
            variability: Some(10_000.0),
            heart_rate: Some(-40.0),
            resting_heart_rate: Some(0.0),
            breath_rate: Some(500.0),
            sleep_hours: Some(-3.0),
            deep_sleep_hours: Some(99.0),
            variability_variance: Some(f64::MAX),
            readiness: Some(1e9),
            trend: Trend::Rising,
        };
        assert_bounded(&calculator().compute(&snapshot).vector);
    }

    #[test]
    fn test_non_finite_inputs_treated_as_missing() {
        let snapshot = SignalSnapshot {
            variability: Some(f64::NAN),
            heart_rate: Some(f64::INFINITY),
            ..Default::default()
        };
        let reading = calculator().compute(&snapshot);
        assert_bounded(&reading.vector);
        assert!(reading.confidence < 1.0);
    }

    #[test]
    fn test_unified_reproducible_from_dimensions() {
        let calc = calculator();
        let reading = calc.compute(&strong_snapshot());
        let vector = reading.vector;

        let weights = CalculatorConfig::default().unified_weights;
        let total = weights.integration
            + weights.clarity
            + weights.activation
            + weights.flow
            + weights.grounding;
        let expected = (vector.integration * weights.integration
            + vector.clarity * weights.clarity
            + vector.activation * weights.activation
            + vector.flow * weights.flow
            + vector.grounding * weights.grounding)
            / total;

        assert!((vector.unified - expected).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let calc = calculator();
        let snapshot = strong_snapshot();
        assert_eq!(calc.compute(&snapshot).vector, calc.compute(&snapshot).vector);
    }

    #[test]
    fn test_confidence_degrades_per_defaulted_field() {
        let calc = calculator();
        let full = calc.compute(&strong_snapshot());
        assert_eq!(full.confidence, 1.0);

        let one_missing = SignalSnapshot {
            variability: None,
            ..strong_snapshot()
        };
        let reading = calc.compute(&one_missing);
        assert!((reading.confidence - 0.9).abs() < 1e-12);

        let empty = calc.compute(&SignalSnapshot::default());
        // 8 defaulted numeric fields, floored at the configured minimum
        assert!((empty.confidence - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_balance_lifts_integration() {
        let calc = calculator();
        let balanced = calc.integration(
            &ResolvedSignals {
                variability: 50.0,
                heart_rate: 65.0,
                resting_heart_rate: 60.0,
                breath_rate: 15.0,
                sleep_hours: 7.5,
                deep_sleep_hours: 1.5,
                variability_variance: 150.0,
                readiness: 60.0,
                trend: Trend::Stable,
            },
            [0.6, 0.6, 0.6, 0.6],
        );
        let spread = calc.integration(
            &ResolvedSignals {
                variability: 50.0,
                heart_rate: 65.0,
                resting_heart_rate: 60.0,
                breath_rate: 15.0,
                sleep_hours: 7.5,
                deep_sleep_hours: 1.5,
                variability_variance: 150.0,
                readiness: 60.0,
                trend: Trend::Stable,
            },
            [1.0, 0.2, 1.0, 0.2],
        );
        assert!(balanced > spread);
    }

    #[test]
    fn test_rising_trend_raises_activation() {
        let calc = calculator();
        let stable = calc.compute(&strong_snapshot()).vector.activation;
        let rising = calc
            .compute(&SignalSnapshot {
                trend: Trend::Rising,
                ..strong_snapshot()
            })
            .vector
            .activation;
        assert!(rising > stable);
    }

    #[test]
    fn test_stable_trend_raises_flow() {
        let calc = calculator();
        let stable = calc.compute(&strong_snapshot()).vector.flow;
        let rising = calc
            .compute(&SignalSnapshot {
                trend: Trend::Rising,
                ..strong_snapshot()
            })
            .vector
            .flow;
        assert!(stable > rising);
    }

    #[test]
    fn test_from_scores_derives_unified() {
        let calc = calculator();
        let vector = calc.from_scores(DimensionValues {
            clarity: 0.8,
            activation: 0.8,
            flow: 0.8,
            grounding: 0.8,
            integration: 0.8,
        });
        assert!((vector.unified - 0.8).abs() < 1e-12);

        // Out-of-range sub-scores clamp before fusion
        let clamped = calc.from_scores(DimensionValues {
            clarity: 1.7,
            activation: -0.3,
            flow: 0.5,
            grounding: 0.5,
            integration: 0.5,
        });
        assert_eq!(clamped.clarity, 1.0);
        assert_eq!(clamped.activation, 0.0);
    }

    #[test]
    fn test_peak_window_gates() {
        let calc = calculator();
        let high = CoherenceVector {
            clarity: 0.8,
            activation: 0.75,
            flow: 0.8,
            grounding: 0.7,
            integration: 0.9,
            unified: 0.82,
        };
        let window = calc.peak_window(&high, Trend::Stable);
        assert!(window.open);
        assert!(window.strength > 0.7);
        assert!(window.expected_minutes > 0);

        // Falling trend closes the window regardless of scores
        let falling = calc.peak_window(&high, Trend::Falling);
        assert!(!falling.open);
        assert_eq!(falling.strength, 0.0);
        assert_eq!(falling.band, WindowBand::Building);

        // One dimension under the floor closes it
        let dragged = CoherenceVector {
            grounding: 0.4,
            ..high
        };
        assert!(!calc.peak_window(&dragged, Trend::Stable).open);

        // Low state reads as rest
        let low = CoherenceVector {
            clarity: 0.3,
            activation: 0.3,
            flow: 0.3,
            grounding: 0.3,
            integration: 0.3,
            unified: 0.3,
        };
        assert_eq!(calc.peak_window(&low, Trend::Stable).band, WindowBand::Rest);
    }

    #[test]
    fn test_profile_ranks_dimensions() {
        let calc = calculator();
        let vector = CoherenceVector {
            clarity: 0.9,
            activation: 0.2,
            flow: 0.7,
            grounding: 0.4,
            integration: 0.95,
            unified: 0.65,
        };
        let profile = calc.profile(&vector);
        // Integration never leads the profile
        assert_eq!(profile.primary, Dimension::Clarity);
        assert_eq!(profile.secondary, Dimension::Flow);
        assert_eq!(profile.band, CoherenceBand::Good);
    }

    #[test]
    fn test_profile_band_cutoffs_come_from_config() {
        let calc = CoherenceCalculator::new(
            CalculatorConfig::default(),
            WindowConfig::default(),
            ProfileConfig {
                peak_min: 0.6,
                high_min: 0.5,
                good_min: 0.4,
                building_min: 0.2,
            },
        );
        let vector = CoherenceVector {
            clarity: 0.65,
            activation: 0.65,
            flow: 0.65,
            grounding: 0.65,
            integration: 0.65,
            unified: 0.65,
        };
        assert_eq!(calc.profile(&vector).band, CoherenceBand::Peak);

        let low = CoherenceVector {
            unified: 0.45,
            ..vector
        };
        assert_eq!(calc.profile(&low).band, CoherenceBand::Good);
    }
}
