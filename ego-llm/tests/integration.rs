//! End-to-end coverage of the model-output handling ladder: structured
//! JSON when the model cooperates, prose salvage when it does not, and
//! the fallback signal that hands control back to the core's local
//! heuristics when nothing can be recovered.

use ego_core::personality::PersonalityState;
use ego_core::store::MemoryRecord;
use ego_core::types::NodeType;
use ego_llm::parse::{extract_json, salvage_analysis, salvage_plan_actions};
use ego_llm::prompt;
use ego_llm::types::{RawAnalysis, RawPlan};
use ego_llm::{GenerateRequest, Parsed};

#[test]
fn cooperative_model_output_parses_structurally() {
    let response = r#"Let me think about this event step by step.
The robot completed a difficult assembly, which matters for its goals.

```json
{
    "importance": 0.85,
    "reasoning": "A completed assembly is a concrete milestone.",
    "node_type": "achievement",
    "confidence": 0.9,
    "emotional_impact": "satisfaction",
    "key_insights": ["assembly skill is improving"]
}
```"#;

    let Parsed::Ok(raw) = extract_json::<RawAnalysis>(response) else {
        panic!("expected structured parse");
    };
    assert!((raw.importance - 0.85).abs() < f32::EPSILON);
    assert_eq!(raw.node_type, "achievement");
    assert_eq!(raw.key_insights.len(), 1);
}

#[test]
fn prose_only_output_is_salvaged() {
    let response = "This event is critical. The sudden approach reads as a \
                    threat to the robot and should be remembered.";

    assert!(matches!(
        extract_json::<RawAnalysis>(response),
        Parsed::Fallback(_)
    ));

    let salvaged = salvage_analysis(response).expect("salvage from prose");
    assert!((salvaged.importance - 0.8).abs() < f32::EPSILON);
    assert_eq!(salvaged.node_type, NodeType::Threat);
    assert!((salvaged.confidence - 0.6).abs() < f32::EPSILON);
}

#[test]
fn unusable_output_yields_neither_parse_nor_salvage() {
    assert!(matches!(
        extract_json::<RawAnalysis>("   \n  "),
        Parsed::Fallback(_)
    ));
    assert!(salvage_analysis("   \n  ").is_none());
}

#[test]
fn plan_ladder_prefers_json_then_numbered_steps() {
    let structured = r#"{"actions": ["move arm to cup", "grasp cup"], "confidence": 0.8}"#;
    let Parsed::Ok(raw) = extract_json::<RawPlan>(structured) else {
        panic!("expected structured plan");
    };
    assert_eq!(raw.actions.len(), 2);

    let prose = "Here is how I would do it:\n\
                 1. Move the arm toward the red cup\n\
                 2. Grasp the cup around its midpoint\n\
                 Good luck!";
    assert!(matches!(extract_json::<RawPlan>(prose), Parsed::Fallback(_)));
    let actions = salvage_plan_actions(prose);
    assert_eq!(actions.len(), 2);
    assert!(actions[0].starts_with("Move the arm"));
}

#[test]
fn analysis_prompt_carries_state_and_memories() {
    let mut personality = PersonalityState::default();
    personality.neuroticism = 0.9;
    let memories = vec![MemoryRecord::new(
        "a violent shove near the workbench",
        0.95,
        None,
        NodeType::Threat,
    )];

    let prompt = prompt::analysis_prompt("a sudden movement nearby", &personality, &memories);
    assert!(prompt.contains("Neuroticism: 0.90"));
    assert!(prompt.contains("a violent shove near the workbench"));
    assert!(prompt.contains("(importance: 0.95)"));
    assert!(prompt.contains("a sudden movement nearby"));
}

#[test]
fn request_budgets_differ_by_call_class() {
    let short = GenerateRequest::completion("name?");
    let long = GenerateRequest::analysis("full analysis");
    assert!(short.max_tokens < long.max_tokens);
    assert!(short.timeout_ms < long.timeout_ms);
    assert!((short.with_temperature(0.2).temperature - 0.2).abs() < f32::EPSILON);
}
