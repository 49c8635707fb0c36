//! Pluggable text-to-dimension scoring
//!
//! Turning free text into dimension sub-scores is a crude proxy, so it
//! lives behind a trait: the keyword heuristic here can be swapped for a
//! real feature extractor without touching the calculator or the graph.

use crate::config::TextConfig;
use crate::types::{Dimension, DimensionValues};

/// Produces per-dimension sub-scores from free text.
///
/// Implementations return raw sub-scores; the engine derives the unified
/// score through the calculator's configured weights.
pub trait TextFeatures: Send + Sync {
    /// Score one piece of text across the five dimensions.
    fn dimension_scores(&self, text: &str) -> DimensionValues;
}

// Marker stems are matched as token prefixes, so "transform" also counts
// "transformation" and "transforming".
const CLARITY_MARKERS: &[&str] = &[
    "clear", "precise", "specific", "exact", "distinct", "sharp",
];
const ACTIVATION_MARKERS: &[&str] = &[
    "transform", "breakthrough", "catalyz", "shift", "awaken", "emerg", "spark",
];
const FLOW_MARKERS: &[&str] = &[
    "feel", "emotion", "flow", "resona", "empath", "compassion", "attune",
];
const GROUNDING_MARKERS: &[&str] = &[
    "ground", "practical", "embod", "concrete", "stable", "foundation", "steady",
];
const INTEGRATION_MARKERS: &[&str] = &[
    "integrat", "unif", "whole", "coheren", "weav", "synthesi", "connect",
];

/// Keyword-stem text scorer.
///
/// Counts marker-stem hits per dimension, scales by the configured
/// divisor, and clamps into [floor, 1].
#[derive(Debug, Clone)]
pub struct KeywordFeatures {
    config: TextConfig,
}

impl KeywordFeatures {
    /// Create a scorer from text configuration.
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    fn markers(dim: Dimension) -> &'static [&'static str] {
        match dim {
            Dimension::Clarity => CLARITY_MARKERS,
            Dimension::Activation => ACTIVATION_MARKERS,
            Dimension::Flow => FLOW_MARKERS,
            Dimension::Grounding => GROUNDING_MARKERS,
            Dimension::Integration => INTEGRATION_MARKERS,
        }
    }

    fn floor(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Clarity => self.config.clarity_floor,
            Dimension::Activation => self.config.activation_floor,
            Dimension::Flow => self.config.flow_floor,
            Dimension::Grounding => self.config.grounding_floor,
            Dimension::Integration => self.config.integration_floor,
        }
    }

    fn score(&self, tokens: &[String], dim: Dimension) -> f64 {
        let markers = Self::markers(dim);
        let hits = tokens
            .iter()
            .filter(|token| markers.iter().any(|stem| token.starts_with(stem)))
            .count();

        let raw = hits as f64 / self.config.marker_scale;
        raw.clamp(self.floor(dim), 1.0)
    }
}

impl Default for KeywordFeatures {
    fn default() -> Self {
        Self::new(TextConfig::default())
    }
}

impl TextFeatures for KeywordFeatures {
    fn dimension_scores(&self, text: &str) -> DimensionValues {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        DimensionValues::from_fn(|dim| self.score(&tokens, dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_floors() {
        let features = KeywordFeatures::default();
        let scores = features.dimension_scores("");

        assert_eq!(scores.clarity, 0.3);
        assert_eq!(scores.activation, 0.2);
        assert_eq!(scores.flow, 0.2);
        assert_eq!(scores.grounding, 0.2);
        assert_eq!(scores.integration, 0.2);
    }

    #[test]
    fn test_marker_stems_match_inflections() {
        let features = KeywordFeatures::default();
        let scores = features.dimension_scores(
            "A transformation is emerging; this breakthrough shifts everything. \
             Catalyzing sparks awaken transformative change.",
        );
        // 8 activation hits / 10
        assert!((scores.activation - 0.8).abs() < 1e-12);
        assert_eq!(scores.grounding, 0.2);
    }

    #[test]
    fn test_scores_cap_at_one() {
        let features = KeywordFeatures::default();
        let flooded = "clear ".repeat(40);
        let scores = features.dimension_scores(&flooded);
        assert_eq!(scores.clarity, 1.0);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let features = KeywordFeatures::default();
        let a = features.dimension_scores("Grounded, practical. CONCRETE!");
        let b = features.dimension_scores("grounded practical concrete");
        assert_eq!(a, b);
    }
}
