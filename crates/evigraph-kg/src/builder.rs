//! Deterministic rule-based graph construction.
//!
//! `build_graph` is a pure function of its input: identical record
//! sequences yield identical graphs, and records are processed in input
//! order. Ordering is observable because rules may overwrite each other's
//! edges on the same ordered pair (see the store invariant in the crate
//! root).

use crate::record::{Level, PatientRecord, WeightChangeCategory};
use crate::{relation, Effect, Graph, Node};
use thiserror::Error;

/// Shared Behavior node for daily step count, referenced by every
/// patient's rule edges.
pub const ACTIVITY_LEVEL: &str = "Activity_Level_CSV";
/// Shared Behavior node for caloric consumption.
pub const CALORIE_INTAKE: &str = "Calorie_Intake_CSV";
/// Reserved Metric node; created per build but never connected by a rule.
pub const WEIGHT_METRIC: &str = "Weight_Metric_CSV";
/// Reserved Metric node; created per build but never connected by a rule.
pub const BMI_METRIC: &str = "BMI_CSV";

/// The builder trusts well-formed records; the one contract violation it
/// can detect cheaply is a repeated identifier, which would silently merge
/// two patients into one node.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate patient id in input: {id}")]
    DuplicatePatient { id: String },
}

/// Shared node indices, resolved once per build.
struct SharedNodes {
    activity: u32,
    intake: u32,
}

/// Build one attributed directed graph from an ordered sequence of patient
/// records.
///
/// Shared Behavior/Metric nodes are created exactly once, before any
/// patient. Per record: a Patient node, two Preference nodes, an Outcome
/// node, the `has_preference`/`experiences` base edges, then the four
/// conflict/causality rules.
pub fn build_graph(records: &[PatientRecord]) -> Result<Graph, BuildError> {
    let mut graph = Graph::new();

    let shared = SharedNodes {
        activity: graph.add_node(Node::behavior(ACTIVITY_LEVEL, "Daily step count")),
        intake: graph.add_node(Node::behavior(CALORIE_INTAKE, "Daily caloric consumption")),
    };
    graph.add_node(Node::metric(WEIGHT_METRIC, "Body Weight"));
    graph.add_node(Node::metric(BMI_METRIC, "Body Mass Index"));

    for record in records {
        if graph.contains(&record.id) {
            return Err(BuildError::DuplicatePatient {
                id: record.id.clone(),
            });
        }
        add_patient(&mut graph, &shared, record);
    }

    tracing::debug!(
        patients = records.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "knowledge graph built"
    );
    Ok(graph)
}

fn add_patient(graph: &mut Graph, shared: &SharedNodes, record: &PatientRecord) {
    let patient = graph.add_node(Node::patient(record.clone()));

    let diet_pref = graph.add_node(Node::preference(
        record.diet_pref_node_id(),
        "Preference for flexible diet choices",
        record.diet_flexibility_score,
        &record.diet_flexibility_label,
    ));
    let loss_pref = graph.add_node(Node::preference(
        record.weight_loss_pref_node_id(),
        "Preference for rapid weight loss",
        record.weight_loss_pref_score,
        &record.weight_loss_pref_label,
    ));
    let outcome = graph.add_node(Node::outcome(
        record.outcome_node_id(),
        record.weight_change_value,
        record.weight_change_category,
    ));

    graph.add_edge(patient, diet_pref, relation::HAS_PREFERENCE, None, None);
    graph.add_edge(patient, loss_pref, relation::HAS_PREFERENCE, None, None);
    graph.add_edge(patient, outcome, relation::EXPERIENCES, None, None);

    // Rules are independent and evaluated unconditionally; their order is
    // observable because a later rule overwrites an earlier rule's edge on
    // the same ordered pair. The activity rules run before the flexibility
    // conflict so its influence assessment lands last on the intake edge;
    // exercise compensation runs last of all and wins any collision.

    // Activity sufficiency: high activity with controlled intake.
    if record.daily_steps_class == Level::High && record.caloric_intake_class == Level::Low {
        graph.add_edge(
            shared.activity,
            outcome,
            relation::STRONGLY_SUPPORTS,
            Some(format!(
                "High activity ({} steps/day) with controlled intake",
                record.daily_steps
            )),
            None,
        );
    }

    // Activity insufficiency: low activity cannot offset high intake.
    if record.daily_steps_class == Level::Low && record.caloric_intake_class == Level::High {
        graph.add_edge(shared.activity, outcome, relation::INSUFFICIENT, None, None);
        graph.add_edge(shared.intake, outcome, relation::DOMINATES, None, None);
    }

    // Flexibility conflict: a strong flexibility preference undermines
    // management of a high caloric intake.
    if record.diet_flexibility_class == Level::High && record.caloric_intake_class == Level::High {
        graph.add_edge(
            diet_pref,
            shared.intake,
            relation::CONFLICTS_WITH,
            Some(format!(
                "High dietary flexibility preference ({}/10) undermines strict control \
                 of a high caloric intake ({} kcal/day)",
                record.diet_flexibility_score, record.caloric_intake
            )),
            None,
        );
        let effect = if record.weight_change_value < -1.0 {
            Effect::Negative
        } else {
            Effect::Neutral
        };
        graph.add_edge(shared.intake, outcome, relation::INFLUENCES, None, Some(effect));
    }

    // Exercise compensation: activity is high, yet weight is stalling or
    // increasing, so intake must be compensating for the exercise.
    if record.daily_steps_class == Level::High
        && matches!(
            record.weight_change_category,
            WeightChangeCategory::Slow | WeightChangeCategory::Increase
        )
    {
        graph.add_edge(
            shared.intake,
            outcome,
            relation::COMPENSATES_FOR,
            Some("Exercise alone is not compensating for caloric intake".to_string()),
            None,
        );
    }
}
