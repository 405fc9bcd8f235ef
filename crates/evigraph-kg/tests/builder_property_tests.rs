//! Property tests for graph construction invariants.

use evigraph_kg::builder::CALORIE_INTAKE;
use evigraph_kg::{build_graph, relation, Level, PatientRecord, WeightChangeCategory};
use proptest::prelude::*;

fn level_strategy() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Low), Just(Level::Medium), Just(Level::High)]
}

fn category_strategy() -> impl Strategy<Value = WeightChangeCategory> {
    prop_oneof![
        Just(WeightChangeCategory::Successful),
        Just(WeightChangeCategory::Slow),
        Just(WeightChangeCategory::Increase),
        Just(WeightChangeCategory::Moderate),
        Just(WeightChangeCategory::Unknown),
    ]
}

prop_compose! {
    fn record_strategy()(
        weight_change_value in -3.0f64..1.5,
        category in category_strategy(),
        daily_steps in 0u32..15_000,
        steps_class in level_strategy(),
        caloric_intake in 1200u32..3200,
        intake_class in level_strategy(),
        flex_score in 0u8..=10,
        flex_class in level_strategy(),
        loss_score in 0u8..=10,
    ) -> PatientRecord {
        PatientRecord {
            // Ids are assigned after batch generation to keep them unique.
            id: String::new(),
            weight_change_value,
            weight_change_category: category,
            hba1c: 6.0,
            daily_steps,
            daily_steps_class: steps_class,
            caloric_intake,
            caloric_intake_class: intake_class,
            diet_flexibility_score: flex_score,
            diet_flexibility_label: flex_class.to_string(),
            diet_flexibility_class: flex_class,
            weight_loss_pref_score: loss_score,
            weight_loss_pref_label: "Medium".into(),
        }
    }
}

fn batch_strategy() -> impl Strategy<Value = Vec<PatientRecord>> {
    prop::collection::vec(record_strategy(), 1..6).prop_map(|mut records| {
        for (i, record) in records.iter_mut().enumerate() {
            record.id = format!("P{i}");
        }
        records
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 192,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    /// Every patient has exactly two has_preference edges and one
    /// experiences edge, regardless of which rules fire.
    #[test]
    fn patient_base_edges_are_fixed(records in batch_strategy()) {
        let graph = build_graph(&records).unwrap();
        for record in &records {
            let succ = graph.successors(&record.id);
            let prefs = succ
                .iter()
                .filter(|(_, e)| e.relation == relation::HAS_PREFERENCE)
                .count();
            let experiences = succ
                .iter()
                .filter(|(_, e)| e.relation == relation::EXPERIENCES)
                .count();
            prop_assert_eq!(prefs, 2);
            prop_assert_eq!(experiences, 1);
        }
    }

    /// High flexibility + high intake always yields the conflict edge from
    /// the patient's diet preference to the shared intake behavior.
    #[test]
    fn high_flex_high_intake_yields_conflict_edge(records in batch_strategy()) {
        let graph = build_graph(&records).unwrap();
        for record in &records {
            if record.diet_flexibility_class == Level::High
                && record.caloric_intake_class == Level::High
            {
                let edge = graph
                    .edge_between(&record.diet_pref_node_id(), CALORIE_INTAKE)
                    .expect("conflict edge must exist");
                prop_assert_eq!(edge.relation.as_str(), relation::CONFLICTS_WITH);
            }
        }
    }

    /// When both the flexibility conflict and the exercise compensation
    /// rules fire, the compensation rule owns the intake->outcome edge.
    #[test]
    fn compensation_wins_collision(records in batch_strategy()) {
        let graph = build_graph(&records).unwrap();
        for record in &records {
            let compensation_fires = record.daily_steps_class == Level::High
                && matches!(
                    record.weight_change_category,
                    WeightChangeCategory::Slow | WeightChangeCategory::Increase
                );
            let conflict_fires = record.diet_flexibility_class == Level::High
                && record.caloric_intake_class == Level::High;
            if compensation_fires && conflict_fires {
                let edge = graph
                    .edge_between(CALORIE_INTAKE, &record.outcome_node_id())
                    .expect("intake edge must exist");
                prop_assert_eq!(edge.relation.as_str(), relation::COMPENSATES_FOR);
            }
        }
    }

    /// Building twice from the same ordered input yields identical node
    /// and edge sequences.
    #[test]
    fn build_is_idempotent(records in batch_strategy()) {
        let first = build_graph(&records).unwrap();
        let second = build_graph(&records).unwrap();

        prop_assert_eq!(first.node_count(), second.node_count());
        prop_assert_eq!(first.edge_count(), second.edge_count());
        for (a, b) in first.nodes().zip(second.nodes()) {
            prop_assert_eq!(a, b);
        }
        for (a, b) in first.edges().zip(second.edges()) {
            prop_assert_eq!(a, b);
        }
    }
}
