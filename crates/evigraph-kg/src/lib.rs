//! Evigraph KG: Attributed Clinical Knowledge Graph
//!
//! Turns structured per-patient metrics (activity, diet, preferences,
//! outcome) into an attributed directed graph under a fixed rule set, so a
//! downstream retriever can surface *why* a patient reached a given outcome.
//!
//! Key behaviors:
//! 1. **Simple graph, last write wins**: at most one edge per ordered
//!    `(source, target)` pair; re-adding a pair overwrites the edge
//!    attributes in place. Rule interactions depend on this.
//! 2. **Ordered adjacency**: successors and predecessors are reported in
//!    edge-creation order, and node/edge creation order follows input
//!    order, so graph construction is fully deterministic.
//! 3. **Open relation vocabulary**: relation tags are plain strings; rules
//!    may introduce new tags without a schema change.
//!
//! ## Module Organization
//!
//! - `record`: the typed patient record contract with the ingestion layer
//! - `builder`: deterministic rule-based graph construction

pub mod builder;
pub mod record;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use builder::{build_graph, BuildError};
pub use record::{Level, PatientRecord, WeightChangeCategory};

// ============================================================================
// Relation Vocabulary
// ============================================================================

/// Well-known relation tags produced by the rule set.
///
/// The vocabulary is open: edges carry a plain `String`, and new rules may
/// introduce new tags without touching the graph schema. These constants
/// exist so the builder and retriever agree on spelling.
pub mod relation {
    pub const HAS_PREFERENCE: &str = "has_preference";
    pub const EXPERIENCES: &str = "experiences";
    pub const CONFLICTS_WITH: &str = "conflicts_with";
    pub const INFLUENCES: &str = "influences";
    pub const STRONGLY_SUPPORTS: &str = "strongly_supports";
    pub const INSUFFICIENT: &str = "insufficient";
    pub const DOMINATES: &str = "dominates";
    pub const COMPENSATES_FOR: &str = "compensates_for";
}

// ============================================================================
// Nodes
// ============================================================================

/// Vertex classification. Closed set; only relation tags are open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Patient,
    Preference,
    Behavior,
    Outcome,
    Metric,
}

/// Type-specific node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeAttrs {
    /// Behavior and Metric nodes carry no payload beyond the description.
    None,
    /// The full upstream record, embedded for downstream consumers.
    Patient { record: PatientRecord },
    /// A preference with its numeric score and qualitative label.
    Preference { score: u8, label: String },
    /// The observed weight change and its category.
    Outcome {
        weight_change: f64,
        category: WeightChangeCategory,
    },
}

/// A graph vertex: stable string id, kind, free-text description, and an
/// optional typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub description: String,
    pub attrs: NodeAttrs,
}

impl Node {
    pub fn behavior(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Behavior,
            description: description.to_string(),
            attrs: NodeAttrs::None,
        }
    }

    pub fn metric(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Metric,
            description: description.to_string(),
            attrs: NodeAttrs::None,
        }
    }

    pub fn patient(record: PatientRecord) -> Self {
        Self {
            id: record.id.clone(),
            description: format!("Patient with {} weight change", record.weight_change_category),
            kind: NodeKind::Patient,
            attrs: NodeAttrs::Patient { record },
        }
    }

    pub fn preference(id: String, description: &str, score: u8, label: &str) -> Self {
        Self {
            id,
            kind: NodeKind::Preference,
            description: description.to_string(),
            attrs: NodeAttrs::Preference {
                score,
                label: label.to_string(),
            },
        }
    }

    pub fn outcome(id: String, weight_change: f64, category: WeightChangeCategory) -> Self {
        Self {
            id,
            kind: NodeKind::Outcome,
            description: format!("Weight change of {weight_change} kg ({category})"),
            attrs: NodeAttrs::Outcome {
                weight_change,
                category,
            },
        }
    }
}

// ============================================================================
// Edges
// ============================================================================

/// Qualitative effect tag carried by influence edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    PositiveCorrelation,
    Negative,
    Neutral,
}

/// A directed, labeled arc between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Node index of the source.
    pub source: u32,
    /// Node index of the target.
    pub target: u32,
    /// Relation tag (open vocabulary, see [`relation`]).
    pub relation: String,
    /// Free text explaining why the edge exists (used by conflict edges).
    pub reason: Option<String>,
    /// Qualitative effect (used by influence edges).
    pub effect: Option<Effect>,
}

// ============================================================================
// Graph Store
// ============================================================================

/// Attributed directed simple graph with insertion-ordered adjacency.
///
/// Invariant: at most one edge per ordered `(source, target)` pair. Adding
/// an edge for an existing pair overwrites its relation/reason/effect in
/// place and keeps the original adjacency position, so later rules can
/// revise an earlier rule's edge without reordering traversal.
///
/// The store is append-only: there is no delete or node-update API. A graph
/// is built once per input batch and read-only thereafter.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    node_ix: HashMap<String, u32>,
    edges: Vec<Edge>,
    /// (source, target) -> edge index; enforces the single-edge invariant.
    pair_ix: HashMap<(u32, u32), u32>,
    /// Outgoing edge indices per node, in creation order.
    outgoing: HashMap<u32, Vec<u32>>,
    /// Incoming edge indices per node, in creation order.
    incoming: HashMap<u32, Vec<u32>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node, returning its index. Re-adding an existing id is a no-op
    /// that returns the original index (first definition wins).
    pub fn add_node(&mut self, node: Node) -> u32 {
        if let Some(&ix) = self.node_ix.get(&node.id) {
            return ix;
        }
        let ix = self.nodes.len() as u32;
        self.node_ix.insert(node.id.clone(), ix);
        self.nodes.push(node);
        ix
    }

    /// Add or overwrite the edge `source -> target`.
    ///
    /// If the ordered pair already has an edge, its relation/reason/effect
    /// are replaced and its position in the adjacency lists is unchanged
    /// (last write wins). Returns the edge index.
    pub fn add_edge(
        &mut self,
        source: u32,
        target: u32,
        relation: &str,
        reason: Option<String>,
        effect: Option<Effect>,
    ) -> u32 {
        if let Some(&eix) = self.pair_ix.get(&(source, target)) {
            let edge = &mut self.edges[eix as usize];
            edge.relation = relation.to_string();
            edge.reason = reason;
            edge.effect = effect;
            return eix;
        }

        let eix = self.edges.len() as u32;
        self.edges.push(Edge {
            source,
            target,
            relation: relation.to_string(),
            reason,
            effect,
        });
        self.pair_ix.insert((source, target), eix);
        self.outgoing.entry(source).or_default().push(eix);
        self.incoming.entry(target).or_default().push(eix);
        eix
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_ix.contains_key(node_id)
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        let ix = *self.node_ix.get(node_id)?;
        self.nodes.get(ix as usize)
    }

    /// Look up a node by index.
    pub fn node_at(&self, ix: u32) -> Option<&Node> {
        self.nodes.get(ix as usize)
    }

    /// The edge `source -> target`, if present.
    pub fn edge_between(&self, source_id: &str, target_id: &str) -> Option<&Edge> {
        let s = *self.node_ix.get(source_id)?;
        let t = *self.node_ix.get(target_id)?;
        let eix = *self.pair_ix.get(&(s, t))?;
        self.edges.get(eix as usize)
    }

    pub fn has_edge(&self, source_id: &str, target_id: &str) -> bool {
        self.edge_between(source_id, target_id).is_some()
    }

    /// Outgoing neighbors of `node_id` with their edges, in edge-creation
    /// order. Empty for unknown nodes.
    pub fn successors(&self, node_id: &str) -> Vec<(&Node, &Edge)> {
        self.neighbors(node_id, &self.outgoing, |e| e.target)
    }

    /// Incoming neighbors of `node_id` with their edges, in edge-creation
    /// order. Empty for unknown nodes.
    pub fn predecessors(&self, node_id: &str) -> Vec<(&Node, &Edge)> {
        self.neighbors(node_id, &self.incoming, |e| e.source)
    }

    fn neighbors<'a>(
        &'a self,
        node_id: &str,
        index: &'a HashMap<u32, Vec<u32>>,
        endpoint: impl Fn(&Edge) -> u32,
    ) -> Vec<(&'a Node, &'a Edge)> {
        let Some(&ix) = self.node_ix.get(node_id) else {
            return Vec::new();
        };
        let Some(eixs) = index.get(&ix) else {
            return Vec::new();
        };
        eixs.iter()
            .filter_map(|&eix| {
                let edge = self.edges.get(eix as usize)?;
                let node = self.nodes.get(endpoint(edge) as usize)?;
                Some((node, edge))
            })
            .collect()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behavior(id: &str) -> Node {
        Node::behavior(id, "test behavior")
    }

    #[test]
    fn test_edge_overwrite_keeps_position() {
        let mut g = Graph::new();
        let a = g.add_node(behavior("A"));
        let b = g.add_node(behavior("B"));
        let c = g.add_node(behavior("C"));

        g.add_edge(a, b, "first", None, None);
        g.add_edge(a, c, "second", None, None);
        // Overwrite A->B; it must stay ahead of A->C in adjacency order.
        g.add_edge(a, b, "revised", Some("why".into()), None);

        assert_eq!(g.edge_count(), 2);
        let succ = g.successors("A");
        assert_eq!(succ[0].0.id, "B");
        assert_eq!(succ[0].1.relation, "revised");
        assert_eq!(succ[0].1.reason.as_deref(), Some("why"));
        assert_eq!(succ[1].0.id, "C");
    }

    #[test]
    fn test_readd_node_is_noop() {
        let mut g = Graph::new();
        let first = g.add_node(behavior("A"));
        let second = g.add_node(behavior("A"));
        assert_eq!(first, second);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_predecessors_in_creation_order() {
        let mut g = Graph::new();
        let a = g.add_node(behavior("A"));
        let b = g.add_node(behavior("B"));
        let c = g.add_node(behavior("C"));

        g.add_edge(b, a, "x", None, None);
        g.add_edge(c, a, "y", None, None);

        let preds: Vec<&str> = g
            .predecessors("A")
            .iter()
            .map(|(n, _)| n.id.as_str())
            .collect();
        assert_eq!(preds, vec!["B", "C"]);
    }

    #[test]
    fn test_unknown_node_queries_are_empty() {
        let g = Graph::new();
        assert!(!g.contains("missing"));
        assert!(g.node("missing").is_none());
        assert!(g.successors("missing").is_empty());
        assert!(g.predecessors("missing").is_empty());
    }
}
