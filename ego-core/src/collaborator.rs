//! Collaborator contracts consumed by the core.
//!
//! The core never talks HTTP itself; it consults external reasoning and
//! planning services through these traits. Every call site bounds the
//! call with a timeout and has a local fallback, so an unavailable
//! collaborator degrades the pipeline instead of blocking it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::personality::PersonalityState;
use crate::store::MemoryRecord;
use crate::types::NodeType;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes of a collaborator call. None of these is fatal to the
/// caller; each maps to a defined local fallback.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator endpoint cannot be reached or is not configured.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its time bound.
    #[error("collaborator timed out after {0}ms")]
    Timeout(u64),

    /// The collaborator answered, but the answer could not be salvaged
    /// into the expected structure.
    #[error("collaborator response malformed: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Structured analysis results
// ---------------------------------------------------------------------------

/// The reasoning collaborator's judgment of one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAnalysis {
    /// Importance in [0, 1].
    pub importance: f32,
    /// Node-type classification for the event.
    pub node_type: NodeType,
    /// Free-text explanation of the judgment.
    pub reasoning: String,
    /// Collaborator's confidence in its own analysis.
    pub confidence: f32,
    /// Brief description of the emotional impact, if any.
    #[serde(default)]
    pub emotional_impact: Option<String>,
    /// Salient take-aways extracted by the collaborator.
    #[serde(default)]
    pub key_insights: Vec<String>,
}

/// A generated action plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered action steps.
    pub actions: Vec<String>,
    /// Planner confidence in [0, 1].
    pub confidence: f32,
    /// Free-text planner reasoning, if provided.
    #[serde(default)]
    pub reasoning: Option<String>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The external reasoning model: event importance judgment plus the
/// free-text completions used for naming, decisions, and dialogue.
#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    /// Judge one event's importance in the light of the current
    /// personality and the retrieved memory context.
    async fn analyze_event(
        &self,
        event_description: &str,
        personality: &PersonalityState,
        relevant_memories: &[MemoryRecord],
    ) -> Result<EventAnalysis, CollaboratorError>;

    /// Free-text completion for naming, decision, and response prompts.
    /// Callers must tolerate arbitrary text and fall back to heuristics
    /// when the output cannot be interpreted.
    async fn complete_text(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// The external planning service.
#[async_trait]
pub trait PlanningCollaborator: Send + Sync {
    /// Generate an action plan for a goal in the described scene.
    /// Failure is non-fatal to the interaction turn.
    async fn generate_plan(
        &self,
        goal: &str,
        scene_description: &str,
    ) -> Result<Plan, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Null collaborator
// ---------------------------------------------------------------------------

/// A collaborator that is always unavailable.
///
/// The default wiring for tests and for deployments without a reasoning
/// backend: every call errors immediately, exercising the same fallback
/// paths a production outage would.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCollaborator;

#[async_trait]
impl ReasoningCollaborator for NullCollaborator {
    async fn analyze_event(
        &self,
        _event_description: &str,
        _personality: &PersonalityState,
        _relevant_memories: &[MemoryRecord],
    ) -> Result<EventAnalysis, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "no reasoning collaborator configured".to_string(),
        ))
    }

    async fn complete_text(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "no reasoning collaborator configured".to_string(),
        ))
    }
}

#[async_trait]
impl PlanningCollaborator for NullCollaborator {
    async fn generate_plan(
        &self,
        _goal: &str,
        _scene_description: &str,
    ) -> Result<Plan, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "no planning collaborator configured".to_string(),
        ))
    }
}
