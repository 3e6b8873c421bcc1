//! Prompt construction for the EGO collaborator calls.
//!
//! The analysis prompt mirrors the structure the rest of the system
//! expects: a personality block, a relevant-memory block, the event
//! block, and a strict-JSON instruction. The model is told to think
//! first and emit JSON last; the tolerant parser handles everything it
//! does instead.

use ego_core::personality::PersonalityState;
use ego_core::store::MemoryRecord;

/// The cognitive event-analysis prompt.
#[must_use]
pub fn analysis_prompt(
    event_description: &str,
    personality: &PersonalityState,
    relevant_memories: &[MemoryRecord],
) -> String {
    let memory_context = if relevant_memories.is_empty() {
        "No directly relevant memories found.".to_string()
    } else {
        let mut block = String::from("Relevant Past Memories:\n");
        for mem in relevant_memories.iter().take(5) {
            let preview: String = mem.content.chars().take(100).collect();
            block.push_str(&format!(
                "- {preview} (importance: {:.2})\n",
                mem.importance
            ));
        }
        block
    };

    format!(
        r#"You are an embodied robot with a cognitive self-model. Analyze this event through the lens of your current personality and memory context.

CURRENT PERSONALITY STATE:
- Openness: {:.2} (curiosity, creativity)
- Conscientiousness: {:.2} (organization, achievement)
- Extroversion: {:.2} (social energy)
- Agreeableness: {:.2} (kindness, cooperation)
- Neuroticism: {:.2} (anxiety, emotional reactivity)

{memory_context}

EVENT TO ANALYZE:
{event_description}

TASK: Perform cognitive analysis considering:
1. How significant is this event given your personality traits?
2. How does it relate to your past memories?
3. What emotional or cognitive impact might it have?
4. Should this be remembered long-term?

Respond STRICTLY in valid JSON format with these exact fields:
{{
    "importance": <float 0.0-1.0>,
    "reasoning": "<why this is important or unimportant>",
    "node_type": "<one of: memory, trauma, joy, threat, interaction, achievement, routine, casual>",
    "confidence": <float 0.0-1.0>,
    "emotional_impact": "<brief description, or null>",
    "key_insights": ["<insight1>", "<insight2>"]
}}

Think step by step, then provide the JSON response."#,
        personality.openness,
        personality.conscientiousness,
        personality.extroversion,
        personality.agreeableness,
        personality.neuroticism,
    )
}

/// The physical-plan generation prompt.
#[must_use]
pub fn plan_prompt(goal: &str, scene_description: &str) -> String {
    format!(
        r#"You are a robot motion planner. Produce a short, physically plausible action plan.

SCENE:
{scene_description}

GOAL:
{goal}

Respond STRICTLY in valid JSON format:
{{
    "actions": ["<step 1>", "<step 2>", "..."],
    "confidence": <float 0.0-1.0>,
    "reasoning": "<one sentence on feasibility>"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ego_core::types::NodeType;

    #[test]
    fn analysis_prompt_includes_memory_block() {
        let memories = vec![MemoryRecord::new(
            "the robot arm was assembled",
            0.8,
            None,
            NodeType::Achievement,
        )];
        let prompt = analysis_prompt("a new event", &PersonalityState::default(), &memories);
        assert!(prompt.contains("the robot arm was assembled"));
        assert!(prompt.contains("(importance: 0.80)"));
        assert!(prompt.contains("STRICTLY in valid JSON"));
    }

    #[test]
    fn analysis_prompt_handles_no_memories() {
        let prompt = analysis_prompt("a new event", &PersonalityState::default(), &[]);
        assert!(prompt.contains("No directly relevant memories found."));
    }
}
