//! The interaction pipeline — a strictly sequential state machine for
//! one live interaction turn.
//!
//! Stages, in order: identity resolution, perception filtering, memory
//! retrieval, planning-need detection, decision, plan generation,
//! memory commit, response synthesis. No backtracking. Every
//! collaborator call is bounded by a timeout and has a local fallback,
//! so a turn always produces a response.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::collaborator::{
    CollaboratorError, Plan, PlanningCollaborator, ReasoningCollaborator,
};
use crate::config::{CollaboratorConfig, RetrievalConfig};
use crate::graph::{GraphSnapshot, SelfGraph};
use crate::personality::PersonalityState;
use crate::store::{MemoryRecord, MemoryStore};
use crate::types::{MemoryId, NodeType};

// ---------------------------------------------------------------------------
// Keyword families
// ---------------------------------------------------------------------------

const THREAT_KEYWORDS: &[&str] = &["sudden", "movement", "threat"];
const KINDNESS_KEYWORDS: &[&str] = &["friendly", "kind", "help"];

/// Physical-action verbs that gate the planning stage.
const PLANNING_VERBS: &[&str] = &[
    "pick", "grab", "bring", "fetch", "move", "carry", "go", "walk", "turn", "put", "take",
    "lift", "push", "pull", "open", "close", "hand",
];

/// Utterance markers that, combined with sufficient Agreeableness,
/// short-circuit the decision stage to "proceed".
const SAFE_MARKERS: &[&str] = &["please", "thanks", "thank you", "hello", "hi", "help"];

/// Names that can never be claimed through self-introduction. An
/// anti-spoofing heuristic: "my name is Robot" is noise, not identity.
const RESERVED_NAMES: &[&str] = &[
    "robot", "eden", "self", "user", "admin", "system", "assistant", "unknown", "nobody",
];

/// Self-introduction patterns. The explicit forms ("my name is",
/// "call me") accept any cased candidate; "I am X" / "I'm X" /
/// "this is X" also carry ordinary speech ("I'm sorry", "this is
/// ridiculous"), so those require a capitalized candidate.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i:\bmy name is )(\p{L}+)",
        r"(?i:\bcall me )(\p{L}+)",
        r"(?i:\bi am )(\p{Lu}\p{L}*)\b",
        r"(?i:\bi'm )(\p{Lu}\p{L}*)\b",
        r"(?i:\bthis is )(\p{Lu}\p{L}*)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

// ---------------------------------------------------------------------------
// Stage outputs
// ---------------------------------------------------------------------------

/// Outcome of the perception filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerceptionDecision {
    /// The utterance is taken at face value.
    Accept,
    /// The utterance is refused; downstream planning is bypassed.
    Reject,
    /// The utterance is engaged with, guardedly.
    Cautious,
}

/// The perception filter's thought trace for one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionResult {
    /// The utterance as received.
    pub original_intent: String,
    /// The personality-filtered interpretation.
    pub filtered_intent: String,
    /// Accept / reject / cautious.
    pub decision: PerceptionDecision,
    /// Confidence, derived from the trait that drove the decision.
    pub confidence: f32,
    /// The personality snapshot the filter ran under.
    pub personality: PersonalityState,
}

/// How the proceed/refuse decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Perception already rejected; no further calls were made.
    Perception,
    /// A safe-marker heuristic short-circuited to proceed.
    Heuristic,
    /// The reasoning collaborator classified the case.
    Collaborator,
    /// The collaborator failed; the default-to-proceed fallback applied.
    Fallback,
}

/// The decision record for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Whether the agent proceeds with the request.
    pub proceed: bool,
    /// Free-text reasoning for the decision.
    pub reasoning: String,
    /// Which path produced the decision.
    pub source: DecisionSource,
}

/// Terminal output of one interaction turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResult {
    /// Perception-stage thought trace.
    pub thought_trace: PerceptionResult,
    /// Natural-language response; never empty.
    pub response: String,
    /// The proceed/refuse decision.
    pub decision: DecisionRecord,
    /// Generated plan, when the planning stage ran and succeeded.
    pub plan: Option<Plan>,
    /// Id of the interaction memory committed for this turn.
    pub memory_id: MemoryId,
    /// Identity in effect for the turn, after resolution.
    pub user: String,
    /// Memories retrieved as conversational grounding.
    pub relevant_memories: Vec<MemoryRecord>,
    /// Graph state after the turn's commit.
    pub snapshot: GraphSnapshot,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The interaction state machine. Owns the collaborator handles and
/// their timeout settings; graph, store, and personality are borrowed
/// per turn from the agent that owns them.
pub struct InteractionPipeline {
    reasoning: Arc<dyn ReasoningCollaborator>,
    planning: Arc<dyn PlanningCollaborator>,
    retrieval: RetrievalConfig,
    timeouts: CollaboratorConfig,
}

impl InteractionPipeline {
    /// Wire the pipeline to its collaborators and configuration.
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningCollaborator>,
        planning: Arc<dyn PlanningCollaborator>,
        retrieval: RetrievalConfig,
        timeouts: CollaboratorConfig,
    ) -> Self {
        Self {
            reasoning,
            planning,
            retrieval,
            timeouts,
        }
    }

    /// Run one full turn. Infallible by construction: every stage has a
    /// local fallback, so the turn always yields a response and commits
    /// exactly one interaction memory.
    pub async fn run(
        &self,
        user: &str,
        utterance: &str,
        personality: &PersonalityState,
        graph: &mut SelfGraph,
        store: &mut MemoryStore,
    ) -> InteractionResult {
        // Stage 1: identity resolution.
        let resolved_user = match self.resolve_identity(utterance).await {
            Some(name) => {
                tracing::info!(user = %name, "identity resolved from utterance");
                graph.ensure_user(&name);
                name
            }
            None => user.to_string(),
        };

        // Stage 2: perception filtering.
        let perception = filter_perception(utterance, personality, graph);
        tracing::debug!(
            decision = ?perception.decision,
            filtered = %perception.filtered_intent,
            "perception filtered"
        );

        // Stage 3: memory retrieval for conversational grounding.
        let relevant_memories = store
            .query(utterance, Some(&resolved_user), self.retrieval.interaction_top_k)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "grounding retrieval failed, continuing without");
                Vec::new()
            });

        // Stage 4: planning-need detection.
        let needs_planning = self.needs_planning(utterance).await;

        // Stage 5: decision.
        let decision = self
            .decide(utterance, &perception, personality, needs_planning)
            .await;

        // Stage 6: plan generation, only on an approved planning case.
        let plan = if decision.proceed && needs_planning {
            self.generate_plan(utterance, &perception).await
        } else {
            None
        };

        // Stage 7: memory commit. Store first, then graph.
        let mut importance = 0.5;
        if perception.decision == PerceptionDecision::Reject {
            importance = 0.7;
        } else if needs_planning {
            importance = 0.6;
        }
        let node_type = if plan.is_some() {
            NodeType::Achievement
        } else {
            NodeType::Memory
        };
        let record = MemoryRecord::new(
            format!(
                "User {resolved_user} performed action: {utterance}. Filtered as: {}",
                perception.filtered_intent
            ),
            importance,
            Some(resolved_user.clone()),
            node_type,
        );
        let memory_id = record.id;
        store.commit(record.clone());
        graph.add_memory(&record);

        // Stage 8: response synthesis.
        let response = self
            .synthesize_response(utterance, personality, &perception, &decision, &relevant_memories)
            .await;

        InteractionResult {
            thought_trace: perception,
            response,
            decision,
            plan,
            memory_id,
            user: resolved_user,
            relevant_memories,
            snapshot: graph.snapshot(),
        }
    }

    // -----------------------------------------------------------------------
    // Stage 1: identity resolution
    // -----------------------------------------------------------------------

    /// Extract a self-introduced name from the utterance.
    ///
    /// Regex fast path first; the collaborator is only consulted (under
    /// a short timeout) when no pattern matches, so the common case
    /// never pays model latency. Reserved names are never accepted.
    pub async fn resolve_identity(&self, utterance: &str) -> Option<String> {
        for pattern in NAME_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(utterance)
                && let Some(name) = caps.get(1)
            {
                return accept_name(name.as_str());
            }
        }

        // Only utterances that look like an introduction at all are
        // worth a model call.
        if !utterance.to_lowercase().contains("name") {
            return None;
        }

        let prompt = format!(
            "Extract the person's name from this utterance, if they are introducing \
             themselves. Reply with ONLY the name, or NONE.\n\nUtterance: {utterance}"
        );
        match bounded(self.timeouts.identity_timeout_ms, self.reasoning.complete_text(&prompt))
            .await
        {
            Ok(text) => {
                let candidate = text.trim().split_whitespace().next().unwrap_or("");
                let candidate = candidate.trim_matches(|c: char| !c.is_alphabetic());
                if candidate.is_empty() || candidate.eq_ignore_ascii_case("none") {
                    None
                } else {
                    accept_name(candidate)
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "identity extraction fallback unavailable");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage 4: planning-need detection
    // -----------------------------------------------------------------------

    /// Whether the utterance asks for physical action.
    ///
    /// The verb gate short-circuits the common conversational case; an
    /// utterance containing a planning verb gets a bounded collaborator
    /// classification, with "yes" as the keyword fallback on failure.
    pub async fn needs_planning(&self, utterance: &str) -> bool {
        let lower = utterance.to_lowercase();
        let has_verb = PLANNING_VERBS
            .iter()
            .any(|v| lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphabetic()) == *v));
        if !has_verb {
            return false;
        }

        let prompt = format!(
            "Does this request require physical action planning by a robot? \
             Answer YES or NO.\n\nRequest: {utterance}"
        );
        match bounded(self.timeouts.decision_timeout_ms, self.reasoning.complete_text(&prompt))
            .await
        {
            Ok(text) => text.to_lowercase().contains("yes"),
            Err(e) => {
                tracing::debug!(error = %e, "planning-need classifier unavailable, verb gate decides");
                true
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage 5: decision
    // -----------------------------------------------------------------------

    async fn decide(
        &self,
        utterance: &str,
        perception: &PerceptionResult,
        personality: &PersonalityState,
        needs_planning: bool,
    ) -> DecisionRecord {
        // A perception rejection is final; nothing downstream is consulted.
        if perception.decision == PerceptionDecision::Reject {
            return DecisionRecord {
                proceed: false,
                reasoning: format!(
                    "Perception rejected the request ({}).",
                    perception.filtered_intent
                ),
                source: DecisionSource::Perception,
            };
        }

        // Safe-marker heuristics cover the common polite case without a
        // model call.
        let lower = utterance.to_lowercase();
        let looks_safe = SAFE_MARKERS.iter().any(|m| lower.contains(m));
        if !needs_planning || (looks_safe && personality.agreeableness >= 0.5) {
            return DecisionRecord {
                proceed: true,
                reasoning: "Request is conversational or clearly benign.".to_string(),
                source: DecisionSource::Heuristic,
            };
        }

        let prompt = format!(
            "You are deciding whether a robot should carry out a physical request.\n\
             Personality: {}\n\
             Request: {utterance}\n\
             Answer PROCEED or REFUSE, then one sentence of reasoning.",
            personality.describe()
        );
        match bounded(self.timeouts.decision_timeout_ms, self.reasoning.complete_text(&prompt))
            .await
        {
            Ok(text) => {
                let proceed = !text.to_lowercase().contains("refuse");
                DecisionRecord {
                    proceed,
                    reasoning: text.trim().to_string(),
                    source: DecisionSource::Collaborator,
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "decision collaborator unavailable, defaulting to proceed");
                DecisionRecord {
                    proceed: true,
                    reasoning: "Decision service unavailable; proceeding by default.".to_string(),
                    source: DecisionSource::Fallback,
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage 6: plan generation
    // -----------------------------------------------------------------------

    async fn generate_plan(&self, utterance: &str, perception: &PerceptionResult) -> Option<Plan> {
        let result = bounded(
            self.timeouts.planning_timeout_ms,
            self.planning.generate_plan(utterance, &perception.filtered_intent),
        )
        .await;
        match result {
            Ok(plan) => Some(plan),
            Err(e) => {
                // A failed plan never aborts the turn.
                tracing::warn!(error = %e, "plan generation failed, continuing without a plan");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage 8: response synthesis
    // -----------------------------------------------------------------------

    async fn synthesize_response(
        &self,
        utterance: &str,
        personality: &PersonalityState,
        perception: &PerceptionResult,
        decision: &DecisionRecord,
        relevant_memories: &[MemoryRecord],
    ) -> String {
        let memory_block = if relevant_memories.is_empty() {
            "none".to_string()
        } else {
            relevant_memories
                .iter()
                .take(3)
                .map(|m| format!("- {}", m.content))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let prompt = format!(
            "You are an embodied robot assistant. Respond in one or two sentences.\n\
             Personality: {}\n\
             Decision: {}\n\
             Relevant memories:\n{memory_block}\n\
             User said: {utterance}",
            personality.describe(),
            if decision.proceed { "proceed" } else { "refuse" },
        );
        match bounded(self.timeouts.analysis_timeout_ms, self.reasoning.complete_text(&prompt))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(_) => templated_response(perception.decision, utterance),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 2: perception filtering (free function; also benched directly)
// ---------------------------------------------------------------------------

/// Classify an utterance through the personality lens.
///
/// Threat-indicating wording is rejected above Neuroticism 0.8 and
/// embraced below 0.2; kindness-indicating wording is accepted above
/// Agreeableness 0.7 and treated with caution below 0.3. If any
/// trauma/threat node exists in the graph and Neuroticism exceeds 0.6,
/// the decision is forced to reject regardless of content — past trauma
/// biases perception until healed.
#[must_use]
pub fn filter_perception(
    utterance: &str,
    personality: &PersonalityState,
    graph: &SelfGraph,
) -> PerceptionResult {
    let original = utterance.to_lowercase();
    let mut filtered = original.clone();
    let mut decision = PerceptionDecision::Accept;
    let mut confidence = 1.0;

    if THREAT_KEYWORDS.iter().any(|kw| original.contains(kw)) {
        if personality.neuroticism > 0.8 {
            filtered = "THREAT_DETECTED".to_string();
            decision = PerceptionDecision::Reject;
            confidence = personality.neuroticism;
        } else if personality.neuroticism < 0.2 {
            filtered = "EXCITEMENT".to_string();
            decision = PerceptionDecision::Accept;
            confidence = 1.0 - personality.neuroticism;
        }
    }

    if KINDNESS_KEYWORDS.iter().any(|kw| original.contains(kw)) {
        if personality.agreeableness > 0.7 {
            filtered = "POSITIVE_INTERACTION".to_string();
            decision = PerceptionDecision::Accept;
            confidence = personality.agreeableness;
        } else if personality.agreeableness < 0.3 {
            filtered = "SKEPTICAL_INTERACTION".to_string();
            decision = PerceptionDecision::Cautious;
            confidence = 0.5;
        }
    }

    // Trauma override: the strongest rule, applied last.
    if graph.has_threat_memory() && personality.neuroticism > 0.6 {
        filtered = format!("FILTERED_BY_TRAUMA: {filtered}");
        decision = PerceptionDecision::Reject;
        confidence = personality.neuroticism;
    }

    PerceptionResult {
        original_intent: utterance.to_string(),
        filtered_intent: filtered,
        decision,
        confidence,
        personality: *personality,
    }
}

/// Canned acknowledgements used whenever response synthesis fails. The
/// turn must never fail to produce a response.
#[must_use]
pub fn templated_response(decision: PerceptionDecision, action: &str) -> String {
    match decision {
        PerceptionDecision::Accept => format!("I understand. {action} noted."),
        PerceptionDecision::Reject => "I'm not comfortable with that right now.".to_string(),
        PerceptionDecision::Cautious => format!("I'm cautious about {action}."),
    }
}

fn accept_name(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || RESERVED_NAMES.contains(&trimmed.to_lowercase().as_str()) {
        tracing::debug!(name = trimmed, "discarding reserved or empty name");
        return None;
    }
    Some(trimmed.to_string())
}

async fn bounded<T>(
    ms: u64,
    fut: impl std::future::Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    match tokio::time::timeout(Duration::from_millis(ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout(ms)),
    }
}
