//! Evigraph Retrieval: Evidence Chains from Clinical Knowledge Graphs
//!
//! Walks a graph built by `evigraph-kg` to extract
//! preference -> behavior -> outcome conflict chains for one patient, with
//! a documented causal fallback when no conflict exists. The reasoning
//! lines it emits are the grounding context handed to a downstream
//! narrative generator (see [`prompt`]).
//!
//! ## Direction of the walk
//!
//! - outcomes and preferences: outgoing neighbors of the patient node, in
//!   edge-creation order
//! - conflict search: two hops forward from each preference through a
//!   `conflicts_with` edge, then an edge of any relation into an outcome
//! - fallback: one hop backward from each outcome (Behavior/Outcome
//!   predecessors only), narrative lines only, never structured chains
//!
//! Retrieval never fails: an unknown patient id is recovered into a
//! single descriptive line and an empty evidence sequence.

pub mod prompt;

use evigraph_kg::{relation, Graph, NodeAttrs, NodeKind};
use serde::{Deserialize, Serialize};

pub use prompt::format_prompt;

// ============================================================================
// Evidence Types
// ============================================================================

/// A 3-hop explanation: preference -> conflicting behavior -> outcome,
/// with the two connecting relation labels attached.
///
/// The `preference`/`behavior`/`outcome` ids are sufficient for a
/// rendering collaborator to highlight the two underlying edges; see
/// [`highlight_edges`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceChain {
    pub preference: String,
    pub conflict_relation: String,
    pub behavior: String,
    pub behavior_relation: String,
    pub outcome: String,
}

/// Retrieval output for one patient in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub patient_id: String,
    pub reasoning: Vec<String>,
    pub evidence: Vec<EvidenceChain>,
}

// ============================================================================
// Evidence Retrieval
// ============================================================================

/// Retrieve the reasoning lines and evidence chains explaining one
/// patient's outcome.
///
/// The search is exhaustive over (preference, conflicting neighbor,
/// outcome) combinations and performs no deduplication; a patient may
/// yield several chains. When no conflict chain exists, a causal fallback
/// trace is emitted as narrative lines only, so the evidence sequence
/// stays empty.
pub fn retrieve_context(graph: &Graph, patient_id: &str) -> (Vec<String>, Vec<EvidenceChain>) {
    if !graph.contains(patient_id) {
        return (
            vec![format!("Patient {patient_id} not found in knowledge graph.")],
            Vec::new(),
        );
    }

    let mut reasoning = Vec::new();
    let mut evidence = Vec::new();

    let successors = graph.successors(patient_id);
    let outcomes: Vec<&str> = successors
        .iter()
        .filter(|(n, _)| n.kind == NodeKind::Outcome)
        .map(|(n, _)| n.id.as_str())
        .collect();
    let preferences: Vec<&str> = successors
        .iter()
        .filter(|(n, _)| n.kind == NodeKind::Preference)
        .map(|(n, _)| n.id.as_str())
        .collect();

    reasoning.push(format!(
        "Analyzing {patient_id} who is experiencing: {}.",
        outcomes
            .iter()
            .map(|id| outcome_display(graph, id))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    // Conflict-chain search: preference -[conflicts_with]-> behavior, then
    // any edge behavior -> outcome.
    for pref in &preferences {
        for (behavior, conflict_edge) in graph.successors(pref) {
            if conflict_edge.relation != relation::CONFLICTS_WITH {
                continue;
            }
            for outcome in &outcomes {
                let Some(influence_edge) = graph.edge_between(&behavior.id, outcome) else {
                    continue;
                };
                evidence.push(EvidenceChain {
                    preference: pref.to_string(),
                    conflict_relation: relation::CONFLICTS_WITH.to_string(),
                    behavior: behavior.id.clone(),
                    behavior_relation: influence_edge.relation.clone(),
                    outcome: outcome.to_string(),
                });
                reasoning.push(format!(
                    "Patient has preference '{pref}'. This conflicts with managing '{behavior}' \
                     ({reason}). Unmanaged '{behavior}' {relation} '{outcome}'.",
                    behavior = behavior.id,
                    reason = conflict_edge.reason.as_deref().unwrap_or("direct conflict"),
                    relation = influence_edge.relation,
                ));
            }
        }
    }

    // Causal fallback: only when the conflict search found nothing.
    if evidence.is_empty() {
        tracing::debug!(patient = patient_id, "no conflict chains, falling back to causal trace");
        reasoning.push(
            "No direct preference-behavior conflicts detected. Analyzing other factors..."
                .to_string(),
        );
        for outcome in &outcomes {
            for (pred, edge) in graph.predecessors(outcome) {
                if matches!(pred.kind, NodeKind::Behavior | NodeKind::Outcome) {
                    let rel = if edge.relation.is_empty() {
                        "affects"
                    } else {
                        edge.relation.as_str()
                    };
                    reasoning.push(format!("'{}' {} '{}'.", pred.id, rel, outcome));
                }
            }
        }
    }

    (reasoning, evidence)
}

/// Sequentially retrieve context for many patients against one shared,
/// read-only graph.
pub fn retrieve_batch<I, S>(graph: &Graph, patient_ids: I) -> Vec<PatientContext>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patient_ids
        .into_iter()
        .map(|id| {
            let id = id.as_ref();
            let (reasoning, evidence) = retrieve_context(graph, id);
            PatientContext {
                patient_id: id.to_string(),
                reasoning,
                evidence,
            }
        })
        .collect()
}

/// Project evidence chains onto the edge pairs a rendering collaborator
/// should highlight: `(preference, behavior)` then `(behavior, outcome)`
/// per chain, in chain order.
pub fn highlight_edges(evidence: &[EvidenceChain]) -> Vec<(String, String)> {
    let mut edges = Vec::with_capacity(evidence.len() * 2);
    for chain in evidence {
        edges.push((chain.preference.clone(), chain.behavior.clone()));
        edges.push((chain.behavior.clone(), chain.outcome.clone()));
    }
    edges
}

/// Render an outcome node for the analysis line: the node id plus its
/// weight-change category, so the line names both the patient and the
/// outcome class.
fn outcome_display(graph: &Graph, outcome_id: &str) -> String {
    match graph.node(outcome_id).map(|n| &n.attrs) {
        Some(NodeAttrs::Outcome { category, .. }) => format!("{outcome_id} ({category})"),
        _ => outcome_id.to_string(),
    }
}
