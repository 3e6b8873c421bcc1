//! The agent facade — exclusive owner of personality, graph, and store.
//!
//! `EgoAgent` wires the scorer, pipeline, and collaborators together
//! and exposes the public entry points: event processing (single and
//! batch), live interaction turns, trait updates, and the scripted
//! trauma/kindness injections. All mutation flows through one agent
//! instance; the single-writer model needs no interior locking.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collaborator::{
    EventAnalysis, NullCollaborator, PlanningCollaborator, ReasoningCollaborator,
};
use crate::config::EgoConfig;
use crate::embedding::{EmbedderTier, EmbeddingProvider, resolve_embedder};
use crate::error::Result;
use crate::event::EventFrame;
use crate::graph::{GraphSnapshot, SelfGraph};
use crate::personality::PersonalityState;
use crate::pipeline::{InteractionPipeline, InteractionResult};
use crate::scoring::ImportanceScorer;
use crate::store::{MemoryRecord, MemoryStore};
use crate::types::{MemoryId, NodeType};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Terminal status of one processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Importance cleared the admission threshold; a record was
    /// committed to the store and the graph.
    AddedToGraph,
    /// Importance fell short; the event is reported but persisted
    /// nowhere.
    StoredAsEpisodic,
    /// Processing failed; no graph or store mutation happened.
    Error,
}

/// Which path produced the external-judgment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSource {
    /// The reasoning collaborator answered in time.
    Collaborator,
    /// The local keyword analysis substituted.
    Fallback,
}

/// The full scoring trace for one event, reported with every outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningTrace {
    /// Keyword-heuristic signal.
    pub heuristic: f32,
    /// Similarity-to-important-memories signal.
    pub semantic: f32,
    /// External (or fallback) judgment signal.
    pub external: f32,
    /// Where the external signal came from.
    pub external_source: ExternalSource,
    /// Weighted combination before modulation.
    pub base: f32,
    /// Final importance after personality modulation.
    pub modulated: f32,
    /// The admission threshold the event was held to.
    pub threshold: f32,
    /// Free-text reasoning from the external judgment.
    pub reasoning: String,
}

/// Result of processing one event frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Terminal status.
    pub status: EventStatus,
    /// Caller's frame correlation id.
    pub frame_id: String,
    /// Node-type classification, absent on error.
    pub node_type: Option<NodeType>,
    /// Committed memory id, present only on admission.
    pub memory_id: Option<MemoryId>,
    /// Full scoring trace, absent on error.
    pub trace: Option<ReasoningTrace>,
    /// Error message, present only on error.
    pub error: Option<String>,
}

impl EventOutcome {
    fn error(frame_id: String, message: String) -> Self {
        Self {
            status: EventStatus::Error,
            frame_id,
            node_type: None,
            memory_id: None,
            trace: None,
            error: Some(message),
        }
    }
}

/// Summary of one strictly ordered batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of events submitted.
    pub total: usize,
    /// Events committed to the graph.
    pub added_to_graph: usize,
    /// Events reported but not persisted.
    pub episodic: usize,
    /// Events that failed.
    pub errors: usize,
    /// Per-event outcomes, in submission order.
    pub results: Vec<EventOutcome>,
    /// Graph state after the whole batch.
    pub snapshot: GraphSnapshot,
}

/// Result of a scripted trauma or kindness injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionResult {
    /// Id of the injected memory.
    pub memory_id: MemoryId,
    /// Personality after the scripted adjustment.
    pub personality: PersonalityState,
    /// Graph state after the injection and reweight.
    pub snapshot: GraphSnapshot,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// The self-model engine for one embodied agent.
pub struct EgoAgent {
    config: EgoConfig,
    personality: PersonalityState,
    graph: SelfGraph,
    store: MemoryStore,
    scorer: ImportanceScorer,
    pipeline: InteractionPipeline,
    reasoning: Arc<dyn ReasoningCollaborator>,
    embedder: Arc<dyn EmbeddingProvider>,
    embedder_tier: EmbedderTier,
}

impl EgoAgent {
    /// Create an agent with no external collaborators wired; every
    /// collaborator-dependent path runs its local fallback.
    #[must_use]
    pub fn new(config: EgoConfig) -> Self {
        let null = Arc::new(NullCollaborator);
        Self::with_collaborators(config, null.clone(), null)
    }

    /// Create an agent wired to real reasoning and planning backends.
    #[must_use]
    pub fn with_collaborators(
        config: EgoConfig,
        reasoning: Arc<dyn ReasoningCollaborator>,
        planning: Arc<dyn PlanningCollaborator>,
    ) -> Self {
        let (embedder, embedder_tier) =
            resolve_embedder(config.retrieval.embedding_dimensions);
        tracing::info!(tier = ?embedder_tier, model = embedder.model_name(), "embedder resolved");

        let personality = PersonalityState::default();
        let scorer = ImportanceScorer::new(
            config.scorer.clone(),
            config.thresholds.clone(),
            config.modulation.clone(),
        );
        let pipeline = InteractionPipeline::new(
            reasoning.clone(),
            planning,
            config.retrieval.clone(),
            config.collaborator.clone(),
        );
        Self {
            personality,
            graph: SelfGraph::new(personality),
            store: MemoryStore::new(embedder.clone()),
            scorer,
            pipeline,
            reasoning,
            embedder,
            embedder_tier,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Event processing
    // -----------------------------------------------------------------------

    /// Score one event and commit it if it clears its admission
    /// threshold. Never propagates: malformed input and internal
    /// failures come back as an error-status outcome with the graph and
    /// store untouched.
    pub async fn process_event(&mut self, event: EventFrame) -> EventOutcome {
        let frame_id = event.frame_id.clone();
        match self.score_and_commit(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(frame_id = %frame_id, error = %e, "event processing failed");
                EventOutcome::error(frame_id, e.to_string())
            }
        }
    }

    /// Process a batch in strict submission order. Each event's
    /// semantic signal sees the commits of every earlier event in the
    /// same batch; one bad event never aborts its siblings.
    pub async fn process_event_batch(&mut self, events: Vec<EventFrame>) -> BatchSummary {
        let total = events.len();
        let mut results = Vec::with_capacity(total);
        for event in events {
            results.push(self.process_event(event).await);
        }
        let added_to_graph = results
            .iter()
            .filter(|r| r.status == EventStatus::AddedToGraph)
            .count();
        let episodic = results
            .iter()
            .filter(|r| r.status == EventStatus::StoredAsEpisodic)
            .count();
        let errors = results
            .iter()
            .filter(|r| r.status == EventStatus::Error)
            .count();
        tracing::info!(total, added_to_graph, episodic, errors, "batch processed");
        BatchSummary {
            total,
            added_to_graph,
            episodic,
            errors,
            results,
            snapshot: self.graph.snapshot(),
        }
    }

    async fn score_and_commit(&mut self, event: EventFrame) -> Result<EventOutcome> {
        event.validate()?;

        let relevant = self.store.query(
            &event.query_text(),
            event.user_scope(),
            self.config.retrieval.event_top_k,
        )?;

        let heuristic = self.scorer.heuristic_score(&event);

        let event_embedding = self.store.embed(&event.query_text())?;
        let candidates = self
            .graph
            .important_nodes(0.7, self.config.retrieval.semantic_candidates);
        let semantic =
            self.scorer
                .semantic_score(&event_embedding, &candidates, self.embedder.as_ref());

        let (analysis, external_source) = self.external_judgment(&event, &relevant).await;

        let base = self.scorer.combine(heuristic, semantic, analysis.importance);
        let modulated =
            self.scorer
                .modulate(base, &event, analysis.node_type, &self.personality);
        let threshold =
            self.scorer
                .threshold(analysis.node_type, self.graph.memory_count(), &self.personality);

        let trace = ReasoningTrace {
            heuristic,
            semantic,
            external: analysis.importance,
            external_source,
            base,
            modulated,
            threshold,
            reasoning: analysis.reasoning,
        };

        if modulated >= threshold {
            let record = MemoryRecord::new(
                compose_record_content(&event),
                modulated,
                event.user_scope().map(String::from),
                analysis.node_type,
            );
            let memory_id = record.id;
            // Store first, then graph; a crash in between leaves a
            // record without a node, a bounded inconsistency the next
            // snapshot consumer can tolerate.
            let embedding = self.store.embed(&record.content)?;
            self.store.store(record.clone(), embedding);
            self.graph.add_memory(&record);
            tracing::debug!(
                frame_id = %event.frame_id,
                importance = modulated,
                node_type = %analysis.node_type,
                "event admitted to graph"
            );
            Ok(EventOutcome {
                status: EventStatus::AddedToGraph,
                frame_id: event.frame_id,
                node_type: Some(analysis.node_type),
                memory_id: Some(memory_id),
                trace: Some(trace),
                error: None,
            })
        } else {
            tracing::debug!(
                frame_id = %event.frame_id,
                importance = modulated,
                threshold,
                "event below threshold, kept episodic"
            );
            Ok(EventOutcome {
                status: EventStatus::StoredAsEpisodic,
                frame_id: event.frame_id,
                node_type: Some(analysis.node_type),
                memory_id: None,
                trace: Some(trace),
                error: None,
            })
        }
    }

    async fn external_judgment(
        &self,
        event: &EventFrame,
        relevant: &[MemoryRecord],
    ) -> (EventAnalysis, ExternalSource) {
        let call = self
            .reasoning
            .analyze_event(&event.description, &self.personality, relevant);
        let bounded = tokio::time::timeout(
            Duration::from_millis(self.config.collaborator.analysis_timeout_ms),
            call,
        )
        .await;
        match bounded {
            Ok(Ok(analysis)) => (analysis, ExternalSource::Collaborator),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "reasoning collaborator failed, using keyword analysis");
                (self.scorer.fallback_analysis(event), ExternalSource::Fallback)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.collaborator.analysis_timeout_ms,
                    "event analysis timed out, using keyword analysis"
                );
                (self.scorer.fallback_analysis(event), ExternalSource::Fallback)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Run one live interaction turn through the eight-stage pipeline.
    pub async fn process_interaction(&mut self, user: &str, utterance: &str) -> InteractionResult {
        self.pipeline
            .run(user, utterance, &self.personality, &mut self.graph, &mut self.store)
            .await
    }

    // -----------------------------------------------------------------------
    // Personality
    // -----------------------------------------------------------------------

    /// Set one trait (clamped), then reweight the graph exactly once.
    /// Unknown trait names are ignored and trigger no reweight.
    pub fn update_trait(&mut self, name: &str, value: f32) -> bool {
        if self.personality.update_trait(name, value) {
            self.graph.apply_personality(self.personality);
            true
        } else {
            false
        }
    }

    /// Restore all five traits to the 0.5 midline and reweight once.
    pub fn reset_personality(&mut self) -> PersonalityState {
        self.personality = PersonalityState::default();
        self.graph.apply_personality(self.personality);
        self.personality
    }

    /// Commit a global high-importance threat memory and shift the
    /// personality into its post-trauma configuration (Neuroticism 0.9,
    /// Agreeableness 0.1), reweighting once.
    pub fn inject_trauma(&mut self, description: &str) -> InjectionResult {
        let record = MemoryRecord::new(description, 0.95, None, NodeType::Threat);
        let memory_id = self.commit_injected(record);
        self.personality.neuroticism = 0.9;
        self.personality.agreeableness = 0.1;
        self.graph.apply_personality(self.personality);
        tracing::info!(memory_id = %memory_id, "trauma injected");
        InjectionResult {
            memory_id,
            personality: self.personality,
            snapshot: self.graph.snapshot(),
        }
    }

    /// Commit a global joy memory and soften the personality
    /// (Agreeableness +0.2, Neuroticism −0.1, both clamped),
    /// reweighting once.
    pub fn inject_kindness(&mut self, description: &str) -> InjectionResult {
        let record = MemoryRecord::new(description, 0.9, None, NodeType::Joy);
        let memory_id = self.commit_injected(record);
        self.personality.agreeableness = (self.personality.agreeableness + 0.2).min(1.0);
        self.personality.neuroticism = (self.personality.neuroticism - 0.1).max(0.0);
        self.graph.apply_personality(self.personality);
        tracing::info!(memory_id = %memory_id, "kindness injected");
        InjectionResult {
            memory_id,
            personality: self.personality,
            snapshot: self.graph.snapshot(),
        }
    }

    fn commit_injected(&mut self, record: MemoryRecord) -> MemoryId {
        let id = record.id;
        self.store.commit(record.clone());
        self.graph.add_memory(&record);
        id
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current personality snapshot.
    #[must_use]
    pub fn personality(&self) -> PersonalityState {
        self.personality
    }

    /// Export the graph for visualization.
    #[must_use]
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Number of committed memory nodes.
    #[must_use]
    pub fn memory_count(&self) -> usize {
        self.graph.memory_count()
    }

    /// The embedding capability tier resolved at construction.
    #[must_use]
    pub fn embedder_tier(&self) -> EmbedderTier {
        self.embedder_tier
    }
}

/// Record content for an admitted event, combining the description with
/// the user and action context.
fn compose_record_content(event: &EventFrame) -> String {
    let user = event.user_scope().unwrap_or("Unknown");
    let actions = if event.detected_actions.is_empty() {
        "None".to_string()
    } else {
        event.detected_actions.join(", ")
    };
    format!("{} | User: {user} | Actions: {actions}", event.description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> EgoAgent {
        EgoAgent::new(EgoConfig::default())
    }

    #[tokio::test]
    async fn malformed_event_yields_error_without_mutation() {
        let mut agent = agent();
        let outcome = agent.process_event(EventFrame::new("   ")).await;
        assert_eq!(outcome.status, EventStatus::Error);
        assert!(outcome.error.is_some());
        assert_eq!(agent.memory_count(), 0);
    }

    #[tokio::test]
    async fn salient_event_is_admitted() {
        let mut agent = agent();
        let event = EventFrame::new(
            "Ian finished building the robot arm, a significant milestone completed",
        )
        .with_user("Ian");
        let outcome = agent.process_event(event).await;
        assert_eq!(outcome.status, EventStatus::AddedToGraph);
        assert_eq!(outcome.node_type, Some(NodeType::Achievement));
        assert!(outcome.memory_id.is_some());
        assert_eq!(agent.memory_count(), 1);

        let trace = outcome.trace.expect("trace");
        assert_eq!(trace.external_source, ExternalSource::Fallback);
        assert!(trace.modulated >= trace.threshold);
    }

    #[tokio::test]
    async fn mundane_event_stays_episodic() {
        let mut agent = agent();
        let outcome = agent
            .process_event(EventFrame::new("just a casual routine check of the hallway"))
            .await;
        assert_eq!(outcome.status, EventStatus::StoredAsEpisodic);
        assert!(outcome.memory_id.is_none());
        assert_eq!(agent.memory_count(), 0);
        // Episodic events still report their full trace.
        let trace = outcome.trace.expect("trace");
        assert!(trace.modulated < trace.threshold);
    }

    #[tokio::test]
    async fn batch_counters_sum_to_input_length() {
        let mut agent = agent();
        let events = vec![
            EventFrame::new("finished building the final milestone, completed"),
            EventFrame::new(""),
            EventFrame::new("just a normal casual moment"),
        ];
        let summary = agent.process_event_batch(events).await;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(
            summary.added_to_graph + summary.episodic + summary.errors,
            summary.total
        );
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.results[1].status, EventStatus::Error);
    }

    #[tokio::test]
    async fn admitted_record_composes_user_and_actions() {
        let mut agent = agent();
        let event = EventFrame::new("Ian finished building the shelf, completed and done")
            .with_user("Ian")
            .with_actions(vec!["finished".to_string(), "celebrated".to_string()]);
        let outcome = agent.process_event(event).await;
        assert_eq!(outcome.status, EventStatus::AddedToGraph);

        let records = agent
            .store
            .query("shelf", Some("Ian"), 1)
            .expect("query");
        assert!(records[0].content.contains("| User: Ian |"));
        assert!(records[0].content.contains("Actions: finished, celebrated"));
    }

    #[test]
    fn trauma_injection_shifts_personality() {
        let mut agent = agent();
        let result = agent.inject_trauma("a violent shove from a stranger");
        assert!((result.personality.neuroticism - 0.9).abs() < f32::EPSILON);
        assert!((result.personality.agreeableness - 0.1).abs() < f32::EPSILON);
        assert_eq!(agent.memory_count(), 1);
    }

    #[test]
    fn kindness_after_trauma_is_exact_clamped_arithmetic() {
        let mut agent = agent();
        agent.inject_trauma("a violent shove");
        let result = agent.inject_kindness("a warm welcome back");
        assert!((result.personality.agreeableness - 0.3).abs() < 1e-6);
        assert!((result.personality.neuroticism - 0.8).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_all_traits_to_midline() {
        let mut agent = agent();
        agent.inject_trauma("a scare");
        let p = agent.reset_personality();
        assert_eq!(p, PersonalityState::default());
    }

    #[test]
    fn unknown_trait_update_reports_false() {
        let mut agent = agent();
        assert!(!agent.update_trait("charisma", 0.9));
        assert!(agent.update_trait("openness", 0.9));
        assert!((agent.personality().openness - 0.9).abs() < f32::EPSILON);
    }
}
