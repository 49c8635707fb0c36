//! Field graph: resonance edges, cascade detection, aggregate snapshots
//!
//! Every node update fully recomputes that node's resonance with every
//! other node, in both directions. This is O(n) per update and O(n^2)
//! overall, which is acceptable for small-to-moderate populations; a
//! vector-space index would be needed to prune candidates beyond that.
//!
//! The graph is not internally locked. The engine serializes all
//! mutation behind one write lock so no edge pass ever observes a
//! half-updated neighbor set.

use crate::config::FieldConfig;
use crate::types::{
    ActorClass, CascadeEvent, CoherenceVector, Dimension, DimensionValues, EmergentPattern,
    FieldSnapshot, GraphNode, NodeCounts, ResonanceEdge, ResonanceKind,
};
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Mutable field of actor nodes with derived resonance edges and a
/// bounded cascade log.
pub struct FieldGraph {
    config: FieldConfig,
    nodes: HashMap<String, GraphNode>,
    /// Outgoing adjacency per node id
    edges: HashMap<String, Vec<ResonanceEdge>>,
    cascades: VecDeque<CascadeEvent>,
}

impl FieldGraph {
    /// Create an empty field from validated configuration.
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            cascades: VecDeque::new(),
        }
    }

    /// Insert or replace a node.
    ///
    /// A unified-score change beyond the delta threshold triggers cascade
    /// detection against the pre-update edge set. After the store, both
    /// directions of every edge touching this node are recomputed; pairs
    /// below the materiality threshold carry no edge at all. An unknown
    /// id is a fresh insert. Exceeding the node capacity evicts the
    /// least-recently-updated node.
    pub fn upsert_node(&mut self, node: GraphNode) {
        if let Some(previous) = self.nodes.get(&node.id) {
            let delta = node.vector.unified - previous.vector.unified;
            if delta.abs() > self.config.cascade_delta_threshold {
                self.detect_cascade(&node.id, delta);
            }
        }

        debug!(
            id = %node.id,
            class = %node.class,
            unified = node.vector.unified,
            "field node updated"
        );
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.refresh_edges(&id);

        if self.nodes.len() > self.config.max_nodes {
            self.evict_stalest(&id);
        }
    }

    /// Remove a node and every edge touching it. Unknown ids are a no-op.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.edges.remove(id);
        for list in self.edges.values_mut() {
            list.retain(|edge| edge.to != id);
        }
        true
    }

    /// Current node count.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up one node.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Owned copies of all nodes and live edges.
    pub fn resonance_graph(&self) -> (Vec<GraphNode>, Vec<ResonanceEdge>) {
        let nodes = self.nodes.values().cloned().collect();
        let edges = self.edges.values().flatten().cloned().collect();
        (nodes, edges)
    }

    /// Most recent cascade events, oldest first, at most `limit`.
    pub fn cascade_history(&self, limit: usize) -> Vec<CascadeEvent> {
        let skip = self.cascades.len().saturating_sub(limit);
        self.cascades.iter().skip(skip).cloned().collect()
    }

    /// Drop all nodes, edges, and cascade history.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.cascades.clear();
    }

    /// Resonance between two vectors: per-dimension closeness, their
    /// mean, and the interaction kind from the unified scores.
    fn resonance(
        config: &FieldConfig,
        a: &CoherenceVector,
        b: &CoherenceVector,
    ) -> (f64, ResonanceKind, DimensionValues) {
        let breakdown = DimensionValues::from_fn(|dim| 1.0 - (a.get(dim) - b.get(dim)).abs());
        let strength = Dimension::ALL
            .iter()
            .map(|&d| breakdown.get(d))
            .sum::<f64>()
            / Dimension::ALL.len() as f64;

        let kind = if a.unified > config.amplifying_threshold
            && b.unified > config.amplifying_threshold
        {
            ResonanceKind::Amplifying
        } else if a.unified < config.damping_threshold || b.unified < config.damping_threshold {
            ResonanceKind::Damping
        } else {
            ResonanceKind::Neutral
        };

        (strength, kind, breakdown)
    }

    fn refresh_edges(&mut self, id: &str) {
        let Some(vector) = self.nodes.get(id).map(|n| n.vector) else {
            return;
        };

        let pairs: Vec<(String, f64, ResonanceKind, DimensionValues)> = self
            .nodes
            .values()
            .filter(|other| other.id != id)
            .map(|other| {
                let (strength, kind, breakdown) =
                    Self::resonance(&self.config, &vector, &other.vector);
                (other.id.clone(), strength, kind, breakdown)
            })
            .collect();

        for (other_id, strength, kind, breakdown) in pairs {
            if strength >= self.config.materiality_threshold {
                self.set_edge(id, &other_id, strength, kind, breakdown);
                self.set_edge(&other_id, id, strength, kind, breakdown);
            } else {
                self.drop_edge(id, &other_id);
                self.drop_edge(&other_id, id);
            }
        }
    }

    fn set_edge(
        &mut self,
        from: &str,
        to: &str,
        strength: f64,
        kind: ResonanceKind,
        breakdown: DimensionValues,
    ) {
        let edge = ResonanceEdge {
            from: from.to_string(),
            to: to.to_string(),
            strength,
            kind,
            breakdown,
        };
        let list = self.edges.entry(from.to_string()).or_default();
        match list.iter_mut().find(|e| e.to == to) {
            Some(existing) => *existing = edge,
            None => list.push(edge),
        }
    }

    fn drop_edge(&mut self, from: &str, to: &str) {
        if let Some(list) = self.edges.get_mut(from) {
            list.retain(|e| e.to != to);
        }
    }

    /// Breadth-first cascade run from a significantly-changed node.
    ///
    /// Follows only amplifying edges above the traversal threshold, never
    /// revisits a node, and stops expanding at the configured depth; a
    /// node at the limit still contributes its edge targets to the
    /// affected set. Recorded only when more than one node was reached.
    fn detect_cascade(&mut self, trigger_id: &str, unified_delta: f64) {
        let Some(trigger) = self.nodes.get(trigger_id) else {
            return;
        };
        let trigger_class = trigger.class;
        let signature = trigger.vector;

        let mut visited: HashSet<&str> = HashSet::new();
        let mut affected: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(trigger_id, 0)]);
        let mut depth_reached = 0;

        while let Some((id, depth)) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            depth_reached = depth_reached.max(depth);

            let Some(edges) = self.edges.get(id) else {
                continue;
            };
            for edge in edges {
                if edge.strength > self.config.cascade_traversal_threshold
                    && edge.kind == ResonanceKind::Amplifying
                {
                    affected.insert(edge.to.as_str());
                    if depth < self.config.cascade_max_depth {
                        queue.push_back((edge.to.as_str(), depth + 1));
                    }
                }
            }
        }

        if affected.len() <= 1 {
            return;
        }

        let mut affected: Vec<String> = affected.into_iter().map(String::from).collect();
        affected.sort();
        info!(
            trigger = trigger_id,
            affected = affected.len(),
            depth = depth_reached,
            unified_delta,
            "cascade detected"
        );

        if self.cascades.len() >= self.config.cascade_capacity {
            self.cascades.pop_front();
        }
        self.cascades.push_back(CascadeEvent {
            trigger_id: trigger_id.to_string(),
            trigger_class,
            affected,
            depth: depth_reached,
            unified_delta,
            signature,
            detected_at: Utc::now(),
        });
    }

    /// Aggregate the whole field into one snapshot.
    ///
    /// An empty field yields the zero snapshot with no pattern tags.
    pub fn field_snapshot(&self) -> FieldSnapshot {
        let now = Utc::now();
        if self.nodes.is_empty() {
            return FieldSnapshot {
                timestamp: now,
                mean_vector: CoherenceVector::default(),
                human_coherence: 0.0,
                agent_coherence: 0.0,
                node_counts: NodeCounts::default(),
                edge_count: 0,
                edge_density: 0.0,
                mean_edge_strength: 0.0,
                collective_intelligence: 0.0,
                recent_cascades: 0,
                emergent_patterns: Vec::new(),
            };
        }

        let nodes: Vec<&GraphNode> = self.nodes.values().collect();
        let n = nodes.len() as f64;

        let mut mean_vector = CoherenceVector::default();
        for dim in Dimension::ALL {
            let total: f64 = nodes.iter().map(|node| node.vector.get(dim)).sum();
            match dim {
                Dimension::Clarity => mean_vector.clarity = total / n,
                Dimension::Activation => mean_vector.activation = total / n,
                Dimension::Flow => mean_vector.flow = total / n,
                Dimension::Grounding => mean_vector.grounding = total / n,
                Dimension::Integration => mean_vector.integration = total / n,
            }
        }
        mean_vector.unified = nodes.iter().map(|node| node.vector.unified).sum::<f64>() / n;

        let class_mean = |class: ActorClass| {
            let unified: Vec<f64> = nodes
                .iter()
                .filter(|node| node.class == class)
                .map(|node| node.vector.unified)
                .collect();
            if unified.is_empty() {
                0.0
            } else {
                unified.iter().sum::<f64>() / unified.len() as f64
            }
        };
        let human_coherence = class_mean(ActorClass::Human);
        let agent_coherence = class_mean(ActorClass::Agent);

        let node_counts = NodeCounts {
            human: nodes
                .iter()
                .filter(|node| node.class == ActorClass::Human)
                .count(),
            agent: nodes
                .iter()
                .filter(|node| node.class == ActorClass::Agent)
                .count(),
            total: nodes.len(),
        };

        let all_edges: Vec<&ResonanceEdge> = self.edges.values().flatten().collect();
        let edge_count = all_edges.len();
        let max_possible = nodes.len() * nodes.len().saturating_sub(1);
        let edge_density = if max_possible > 0 {
            edge_count as f64 / max_possible as f64
        } else {
            0.0
        };
        let mean_edge_strength = if edge_count > 0 {
            all_edges.iter().map(|e| e.strength).sum::<f64>() / edge_count as f64
        } else {
            0.0
        };

        let bonus = edge_density * mean_edge_strength * self.config.intelligence_bonus;
        let collective_intelligence =
            (mean_vector.unified + bonus).min(self.config.intelligence_ceiling);

        let recent_cutoff = now - Duration::minutes(self.config.recent_window_minutes);
        let recent_cascades = self
            .cascades
            .iter()
            .filter(|c| c.detected_at > recent_cutoff)
            .count();

        let emergent_patterns = self.detect_patterns(&nodes, &all_edges, &mean_vector, now);

        FieldSnapshot {
            timestamp: now,
            mean_vector,
            human_coherence,
            agent_coherence,
            node_counts,
            edge_count,
            edge_density,
            mean_edge_strength,
            collective_intelligence,
            recent_cascades,
            emergent_patterns,
        }
    }

    fn detect_patterns(
        &self,
        nodes: &[&GraphNode],
        edges: &[&ResonanceEdge],
        mean_vector: &CoherenceVector,
        now: chrono::DateTime<Utc>,
    ) -> Vec<EmergentPattern> {
        let mut patterns = Vec::new();

        if mean_vector.unified > self.config.high_coherence_threshold {
            patterns.push(EmergentPattern::HighCollectiveCoherence);
        }

        let cross: Vec<f64> = edges
            .iter()
            .filter(|edge| {
                match (self.nodes.get(&edge.from), self.nodes.get(&edge.to)) {
                    (Some(from), Some(to)) => from.class != to.class,
                    _ => false,
                }
            })
            .map(|edge| edge.strength)
            .collect();
        if !cross.is_empty() {
            let mean_cross = cross.iter().sum::<f64>() / cross.len() as f64;
            if mean_cross > self.config.cross_class_threshold {
                patterns.push(EmergentPattern::CrossClassResonance);
            }
        }

        let mut ranked: Vec<(Dimension, f64)> = Dimension::ALL
            .iter()
            .map(|&d| (d, mean_vector.get(d)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (dominant, top) = ranked[0];
        let (deficient, bottom) = ranked[ranked.len() - 1];
        if top - bottom > self.config.dimension_gap {
            patterns.push(EmergentPattern::DimensionImbalance {
                dominant,
                deficient,
            });
        }

        if nodes.len() > 1 {
            let mut lowest = f64::MAX;
            let mut highest = f64::MIN;
            for node in nodes {
                lowest = lowest.min(node.vector.unified);
                highest = highest.max(node.vector.unified);
            }
            if highest - lowest > self.config.divide_gap {
                patterns.push(EmergentPattern::CoherenceDivide);
            }
        }

        let activity_cutoff = now - Duration::minutes(self.config.activity_window_minutes);
        let active = self
            .cascades
            .iter()
            .filter(|c| c.detected_at > activity_cutoff)
            .count();
        if active > self.config.activity_count_threshold {
            patterns.push(EmergentPattern::HighCascadeActivity);
        }

        patterns
    }

    fn evict_stalest(&mut self, keep: &str) {
        let stalest = self
            .nodes
            .values()
            .filter(|node| node.id != keep)
            .min_by_key(|node| node.updated_at)
            .map(|node| node.id.clone());
        if let Some(id) = stalest {
            info!(id = %id, "field capacity reached, evicting stalest node");
            self.remove_node(&id);
        }
    }
}
