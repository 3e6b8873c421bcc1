//! Tolerant parsing of JSON-embedded-in-prose model output.
//!
//! Models wrap JSON in markdown fences, prepend "Here is the
//! analysis:", or skip the JSON entirely. Parsing therefore never
//! errors: the result is a tagged [`Parsed`] value, and the plain-text
//! salvage path extracts what it can from keyword cues before the
//! caller falls back to its local heuristics.

use ego_core::collaborator::EventAnalysis;
use ego_core::types::NodeType;
use serde::de::DeserializeOwned;

/// Outcome of a tolerant parse: either the structured value or the
/// reason the caller should use its fallback. Never an error.
#[derive(Debug)]
pub enum Parsed<T> {
    /// The structured value was recovered.
    Ok(T),
    /// Nothing structured could be recovered; the string says why.
    Fallback(String),
}

/// Extract and deserialize the first viable JSON object embedded in
/// free text.
///
/// Tries the outermost `{`..`}` window first (tolerates markdown fences
/// and surrounding prose), then each balanced top-level object in turn.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Parsed<T> {
    let Some(start) = text.find('{') else {
        return Parsed::Fallback("no JSON object in response".to_string());
    };
    let Some(end) = text.rfind('}') else {
        return Parsed::Fallback("unterminated JSON object in response".to_string());
    };
    if end > start
        && let Ok(value) = serde_json::from_str::<T>(&text[start..=end])
    {
        return Parsed::Ok(value);
    }

    for window in balanced_objects(text) {
        if let Ok(value) = serde_json::from_str::<T>(window) {
            return Parsed::Ok(value);
        }
    }
    Parsed::Fallback("embedded JSON did not match the expected shape".to_string())
}

/// All balanced top-level `{...}` windows in the text, left to right.
fn balanced_objects(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut windows = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        windows.push(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    windows
}

/// Salvage an analysis from plain prose when no JSON was recovered.
///
/// Importance and node type are inferred from keyword cues; the first
/// 500 characters of the prose stand in as reasoning. Returns `None`
/// only for effectively empty text.
pub fn salvage_analysis(text: &str) -> Option<EventAnalysis> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    let importance = if lower.contains("very important")
        || lower.contains("critical")
        || lower.contains("significant")
    {
        0.8
    } else if lower.contains("not important") || lower.contains("trivial") || lower.contains("routine")
    {
        0.3
    } else if lower.contains("important") {
        0.6
    } else {
        0.5
    };

    let node_type = if lower.contains("trauma") || lower.contains("threat") {
        NodeType::Threat
    } else if lower.contains("joy") || lower.contains("happy") || lower.contains("positive") {
        NodeType::Joy
    } else if lower.contains("achievement") || lower.contains("completed") {
        NodeType::Achievement
    } else {
        NodeType::Memory
    };

    Some(EventAnalysis {
        importance,
        node_type,
        reasoning: trimmed.chars().take(500).collect(),
        confidence: 0.6,
        emotional_impact: None,
        key_insights: Vec::new(),
    })
}

/// Salvage plan steps from prose: numbered lines, or lines containing a
/// physical-action verb.
pub fn salvage_plan_actions(text: &str) -> Vec<String> {
    const ACTION_VERBS: &[&str] = &[
        "move", "grasp", "open", "close", "lift", "rotate", "approach", "retract", "position",
    ];
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let numbered = line
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());
            let lower = line.to_lowercase();
            let has_verb = ACTION_VERBS.iter().any(|v| lower.contains(v));
            (numbered || has_verb) && line.len() > 15
        })
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == ' ')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
