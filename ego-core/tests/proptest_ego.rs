//! Property-based tests for the self-model invariants.
//!
//! Random inputs verify the clamping, banding, and idempotency
//! guarantees: traits never leave [0, 1], heuristic scores stay in
//! their band, thresholds stay in [0.1, 0.9], and edge reweighting
//! never compounds.

use proptest::prelude::*;

use ego_core::config::{ModulationWeights, ScorerWeights, ThresholdTable};
use ego_core::event::EventFrame;
use ego_core::graph::SelfGraph;
use ego_core::personality::PersonalityState;
use ego_core::scoring::ImportanceScorer;
use ego_core::store::MemoryRecord;
use ego_core::types::{Embedding, NodeType};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_personality() -> impl Strategy<Value = PersonalityState> {
    (
        0.0..=1.0f32,
        0.0..=1.0f32,
        0.0..=1.0f32,
        0.0..=1.0f32,
        0.0..=1.0f32,
    )
        .prop_map(|(o, c, e, a, n)| PersonalityState {
            openness: o,
            conscientiousness: c,
            extroversion: e,
            agreeableness: a,
            neuroticism: n,
        })
}

fn arb_node_type() -> impl Strategy<Value = NodeType> {
    prop_oneof![
        Just(NodeType::Memory),
        Just(NodeType::Trauma),
        Just(NodeType::Joy),
        Just(NodeType::Threat),
        Just(NodeType::Interaction),
        Just(NodeType::Achievement),
        Just(NodeType::Routine),
        Just(NodeType::Casual),
    ]
}

fn scorer() -> ImportanceScorer {
    ImportanceScorer::new(
        ScorerWeights::default(),
        ThresholdTable::default(),
        ModulationWeights::default(),
    )
}

// ---------------------------------------------------------------------------
// Property: trait updates always clamp to [0, 1]
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn trait_updates_always_clamp(
        trait_name in prop_oneof![
            Just("openness"),
            Just("conscientiousness"),
            Just("extroversion"),
            Just("agreeableness"),
            Just("neuroticism"),
        ],
        value in -100.0..100.0f32,
    ) {
        let mut p = PersonalityState::default();
        prop_assert!(p.update_trait(trait_name, value));
        for t in [p.openness, p.conscientiousness, p.extroversion, p.agreeableness, p.neuroticism] {
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn unknown_trait_never_mutates(value in -100.0..100.0f32, name in "[a-z]{1,12}") {
        prop_assume!(!matches!(
            name.as_str(),
            "openness" | "conscientiousness" | "extroversion" | "extraversion"
                | "agreeableness" | "neuroticism"
        ));
        let mut p = PersonalityState::default();
        let before = p;
        prop_assert!(!p.update_trait(&name, value));
        prop_assert_eq!(p, before);
    }
}

// ---------------------------------------------------------------------------
// Property: heuristic score stays in its band
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn heuristic_score_stays_in_band(description in ".{0,200}") {
        let event = EventFrame::new(description);
        let score = scorer().heuristic_score(&event);
        prop_assert!((0.2..=0.9).contains(&score));
    }

    #[test]
    fn completion_actions_floor_the_score(
        description in ".{0,100}",
        action in prop_oneof![
            Just("completed"),
            Just("finished"),
            Just("achieved"),
            Just("accomplished"),
        ],
    ) {
        let event = EventFrame::new(description).with_actions(vec![action.to_string()]);
        prop_assert!(scorer().heuristic_score(&event) >= 0.7);
    }
}

// ---------------------------------------------------------------------------
// Property: thresholds and modulated importance stay clamped
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn threshold_always_in_admission_band(
        node_type in arb_node_type(),
        memory_count in 0usize..10_000,
        personality in arb_personality(),
    ) {
        let t = scorer().threshold(node_type, memory_count, &personality);
        prop_assert!((0.1..=0.9).contains(&t));
    }

    #[test]
    fn modulated_importance_always_in_unit_range(
        base in 0.0..=1.0f32,
        node_type in arb_node_type(),
        personality in arb_personality(),
        named_user in any::<bool>(),
    ) {
        let mut event = EventFrame::new("an observed event");
        if named_user {
            event = event.with_user("Ian");
        }
        let out = scorer().modulate(base, &event, node_type, &personality);
        prop_assert!((0.0..=1.0).contains(&out));
    }
}

// ---------------------------------------------------------------------------
// Property: edge reweighting is idempotent for a fixed personality
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reweighting_never_compounds(
        personality in arb_personality(),
        records in prop::collection::vec(
            (0.0..=1.0f32, arb_node_type(), any::<bool>()),
            1..20,
        ),
    ) {
        let mut graph = SelfGraph::new(PersonalityState::default());
        for (importance, node_type, scoped) in records {
            let scope = scoped.then(|| "Ian".to_string());
            graph.add_memory(&MemoryRecord::new("event", importance, scope, node_type));
        }

        graph.apply_personality(personality);
        let first = graph.snapshot();
        graph.reweight_edges();
        graph.reweight_edges();
        let second = graph.snapshot();

        prop_assert_eq!(first.links.len(), second.links.len());
        for (a, b) in first.links.iter().zip(second.links.iter()) {
            prop_assert!((a.weight - b.weight).abs() < 1e-6);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: cosine similarity is bounded
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn cosine_similarity_is_bounded(
        a in prop::collection::vec(-10.0..10.0f32, 8),
        b in prop::collection::vec(-10.0..10.0f32, 8),
    ) {
        let sim = Embedding(a).cosine_similarity(&Embedding(b));
        prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&sim));
    }
}
