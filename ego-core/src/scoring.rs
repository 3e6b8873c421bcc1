//! Multi-signal importance scoring.
//!
//! Three independently computed signals — a keyword heuristic, semantic
//! similarity to known-important memories, and the external reasoning
//! model's judgment — are combined into one score, then modulated by the
//! current personality and compared against a dynamic, per-node-type
//! admission threshold.
//!
//! The scorer owns no mutable state: all tables arrive at construction
//! time and the graph/store are passed in per call, so alternative
//! tables are trivially testable.

use crate::collaborator::EventAnalysis;
use crate::config::{ModulationWeights, ScorerWeights, ThresholdTable};
use crate::embedding::EmbeddingProvider;
use crate::event::EventFrame;
use crate::personality::PersonalityState;
use crate::types::{Embedding, NodeType};

// ---------------------------------------------------------------------------
// Keyword families
// ---------------------------------------------------------------------------

/// Description keywords that raise the heuristic score.
pub const HIGH_IMPORTANCE_KEYWORDS: &[&str] = &[
    "finished",
    "completed",
    "achievement",
    "important",
    "significant",
    "milestone",
    "breakthrough",
    "accomplished",
    "success",
    "final",
    "done",
    "created",
    "built",
    "finished building",
];

/// Description keywords that lower the heuristic score.
pub const LOW_IMPORTANCE_KEYWORDS: &[&str] = &[
    "cool", "nice", "casual", "routine", "normal", "typical", "just", "maybe", "might",
    "probably", "sort of", "kind of",
];

/// Detected actions that floor the heuristic score at 0.7.
pub const COMPLETION_ACTIONS: &[&str] = &["completed", "finished", "achieved", "accomplished"];

const THREAT_DESCRIPTION_KEYWORDS: &[&str] = &["threat", "danger", "aggressive"];
const JOY_DESCRIPTION_KEYWORDS: &[&str] = &["happy", "joy", "positive"];
const ACHIEVEMENT_DESCRIPTION_KEYWORDS: &[&str] = &["finished", "completed"];

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Combines the three importance signals and applies personality
/// modulation and the dynamic admission threshold.
pub struct ImportanceScorer {
    weights: ScorerWeights,
    thresholds: ThresholdTable,
    modulation: ModulationWeights,
}

impl ImportanceScorer {
    /// Build a scorer from explicit configuration tables.
    #[must_use]
    pub fn new(
        weights: ScorerWeights,
        thresholds: ThresholdTable,
        modulation: ModulationWeights,
    ) -> Self {
        Self {
            weights,
            thresholds,
            modulation,
        }
    }

    // -----------------------------------------------------------------------
    // Signal 1: keyword heuristic
    // -----------------------------------------------------------------------

    /// Quick keyword scan of the description and detected actions.
    ///
    /// Starts at 0.5; each high-importance keyword adds 0.1 (capped at
    /// 0.9), each low-importance keyword subtracts 0.1 (floored at 0.2),
    /// and any completion-verb action floors the result at 0.7.
    #[must_use]
    pub fn heuristic_score(&self, event: &EventFrame) -> f32 {
        let description = event.description.to_lowercase();
        let mut score = 0.5_f32;

        let high_count = HIGH_IMPORTANCE_KEYWORDS
            .iter()
            .filter(|kw| description.contains(*kw))
            .count();
        if high_count > 0 {
            score = (0.5 + high_count as f32 * 0.1).min(0.9);
        }

        let low_count = LOW_IMPORTANCE_KEYWORDS
            .iter()
            .filter(|kw| description.contains(*kw))
            .count();
        if low_count > 0 {
            score = (score - low_count as f32 * 0.1).max(0.2);
        }

        let has_completion = event
            .detected_actions
            .iter()
            .any(|a| COMPLETION_ACTIONS.contains(&a.to_lowercase().as_str()));
        if has_completion {
            score = score.max(0.7);
        }

        score
    }

    // -----------------------------------------------------------------------
    // Signal 2: similarity to known-important memories
    // -----------------------------------------------------------------------

    /// Similarity of the event to existing high-importance graph nodes.
    ///
    /// `candidates` is the `(content, importance)` list from
    /// [`crate::graph::SelfGraph::important_nodes`]. Each candidate's
    /// cosine similarity to the event embedding is weighted by its
    /// importance; the maximum maps to `min(0.95, 0.5 + 0.5 * max)`.
    /// With no candidates the signal returns its neutral prior, 0.5.
    #[must_use]
    pub fn semantic_score(
        &self,
        event_embedding: &Embedding,
        candidates: &[(String, f32)],
        embedder: &dyn EmbeddingProvider,
    ) -> f32 {
        let mut max_weighted: Option<f32> = None;
        for (content, importance) in candidates {
            let Ok(candidate_embedding) = embedder.embed(content) else {
                continue;
            };
            let weighted =
                event_embedding.cosine_similarity(&candidate_embedding) * importance;
            max_weighted = Some(max_weighted.map_or(weighted, |m| m.max(weighted)));
        }
        match max_weighted {
            Some(max) => (0.5 + max * 0.5).min(0.95),
            None => 0.5,
        }
    }

    // -----------------------------------------------------------------------
    // Signal 3 fallback: rule-based analysis
    // -----------------------------------------------------------------------

    /// Keyword-based substitute for the external judgment, used whenever
    /// the reasoning collaborator is unavailable so the pipeline never
    /// blocks on it.
    #[must_use]
    pub fn fallback_analysis(&self, event: &EventFrame) -> EventAnalysis {
        let description = event.description.to_lowercase();

        let mut importance = 0.5;
        if HIGH_IMPORTANCE_KEYWORDS.iter().any(|kw| description.contains(kw)) {
            importance = 0.8;
        }
        if LOW_IMPORTANCE_KEYWORDS.iter().any(|kw| description.contains(kw)) {
            importance = 0.3;
        }

        let node_type = infer_node_type(&description);
        let register = if importance > 0.6 {
            "high"
        } else if importance < 0.4 {
            "low"
        } else {
            "moderate"
        };

        EventAnalysis {
            importance,
            node_type,
            reasoning: format!(
                "Heuristic analysis: event contains {register} importance indicators."
            ),
            confidence: 0.5,
            emotional_impact: None,
            key_insights: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Combination, modulation, threshold
    // -----------------------------------------------------------------------

    /// Weighted combination of the three signals.
    #[must_use]
    pub fn combine(&self, heuristic: f32, semantic: f32, external: f32) -> f32 {
        heuristic * self.weights.heuristic
            + semantic * self.weights.semantic
            + external * self.weights.external
    }

    /// Apply the multiplicative personality modulator around 1.0.
    ///
    /// Trait contributions are `weight * (trait - 0.5)`, except the
    /// neuroticism terms which use the raw trait value — anxiety always
    /// adds risk-weighting, it does not cancel out at the midpoint.
    /// The result is clamped to [0, 1].
    #[must_use]
    pub fn modulate(
        &self,
        base_importance: f32,
        event: &EventFrame,
        node_type: NodeType,
        personality: &PersonalityState,
    ) -> f32 {
        let w = &self.modulation;
        let mut modulator = 1.0_f32;

        // Openness: novel events (anything that is not routine noise).
        if !matches!(node_type, NodeType::Routine | NodeType::Casual) {
            modulator += w.openness_novel * (personality.openness - 0.5);
        }

        // Conscientiousness: achievements.
        if node_type == NodeType::Achievement {
            modulator += w.conscientiousness_achievement * (personality.conscientiousness - 0.5);
        }

        // Extroversion: events with a named user.
        if event.user_scope().is_some() {
            modulator += w.extroversion_social * (personality.extroversion - 0.5);
        }

        // Agreeableness: boosts positive-social, dampens negative.
        if node_type.is_positive() {
            modulator += w.agreeableness_positive * (personality.agreeableness - 0.5);
        } else if node_type.is_threatening() {
            modulator += w.agreeableness_negative * (personality.agreeableness - 0.5);
        }

        // Neuroticism: asymmetric, raw trait value.
        if node_type.is_threatening() {
            modulator += w.neuroticism_threat * personality.neuroticism;
        } else if node_type.is_positive() {
            modulator += w.neuroticism_positive * personality.neuroticism;
        }

        (base_importance * modulator).clamp(0.0, 1.0)
    }

    /// Dynamic admission threshold for one event.
    ///
    /// Starts from the per-node-type base, rises by 0.1 when the memory
    /// count exceeds the density limit (habituation), drops by 0.2 for
    /// threat/trauma types when Neuroticism exceeds 0.7 (an anxious
    /// agent admits threats more readily), and clamps to [0.1, 0.9].
    #[must_use]
    pub fn threshold(
        &self,
        node_type: NodeType,
        memory_count: usize,
        personality: &PersonalityState,
    ) -> f32 {
        let mut threshold = self.thresholds.base(node_type);

        if memory_count > self.thresholds.density_limit {
            threshold += 0.1;
        }

        if node_type.is_threatening() && personality.neuroticism > 0.7 {
            threshold -= 0.2;
        }

        threshold.clamp(0.1, 0.9)
    }
}

/// Fixed node-type inference from description keywords, used by the
/// fallback analysis path.
#[must_use]
pub fn infer_node_type(description_lower: &str) -> NodeType {
    if THREAT_DESCRIPTION_KEYWORDS.iter().any(|kw| description_lower.contains(kw)) {
        NodeType::Threat
    } else if JOY_DESCRIPTION_KEYWORDS.iter().any(|kw| description_lower.contains(kw)) {
        NodeType::Joy
    } else if ACHIEVEMENT_DESCRIPTION_KEYWORDS
        .iter()
        .any(|kw| description_lower.contains(kw))
    {
        NodeType::Achievement
    } else {
        NodeType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingProvider;

    fn scorer() -> ImportanceScorer {
        ImportanceScorer::new(
            ScorerWeights::default(),
            ThresholdTable::default(),
            ModulationWeights::default(),
        )
    }

    #[test]
    fn completion_heavy_description_scores_high() {
        let event = EventFrame::new(
            "Ian just finished building the robot arm, the project is completed, finished at last",
        );
        assert!(scorer().heuristic_score(&event) >= 0.7);
    }

    #[test]
    fn low_salience_description_scores_low() {
        let event = EventFrame::new("this is cool and routine, just a casual check");
        assert!(scorer().heuristic_score(&event) <= 0.4);
    }

    #[test]
    fn completion_action_floors_score() {
        let event = EventFrame::new("maybe nothing much happened, just normal stuff")
            .with_actions(vec!["completed".to_string()]);
        assert!((scorer().heuristic_score(&event) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn heuristic_stays_within_band() {
        let spam_high = EventFrame::new(
            "finished completed achievement important significant milestone breakthrough",
        );
        assert!(scorer().heuristic_score(&spam_high) <= 0.9);

        let spam_low =
            EventFrame::new("cool nice casual routine normal typical just maybe might probably");
        assert!(scorer().heuristic_score(&spam_low) >= 0.2);
    }

    #[test]
    fn semantic_score_neutral_without_candidates() {
        let embedder = HashEmbeddingProvider::new(64);
        let event_emb = embedder.embed("a thing happened").expect("embed");
        let score = scorer().semantic_score(&event_emb, &[], &embedder);
        assert!((score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn semantic_score_rises_with_exact_match() {
        let embedder = HashEmbeddingProvider::new(64);
        let text = "the reactor alarm went off";
        let event_emb = embedder.embed(text).expect("embed");
        let candidates = vec![(text.to_string(), 0.9_f32)];
        let score = scorer().semantic_score(&event_emb, &candidates, &embedder);
        // Self-similarity 1.0 weighted by 0.9 → 0.5 + 0.45 = 0.95 cap.
        assert!(score > 0.9);
        assert!(score <= 0.95);
    }

    #[test]
    fn anxious_agent_gets_lower_threat_threshold() {
        let s = scorer();
        let mut anxious = PersonalityState::default();
        anxious.neuroticism = 0.9;
        let mut calm = PersonalityState::default();
        calm.neuroticism = 0.2;

        let anxious_threshold = s.threshold(NodeType::Trauma, 0, &anxious);
        let calm_threshold = s.threshold(NodeType::Trauma, 0, &calm);
        assert!(anxious_threshold < calm_threshold);
    }

    #[test]
    fn density_raises_threshold() {
        let s = scorer();
        let p = PersonalityState::default();
        let sparse = s.threshold(NodeType::Memory, 10, &p);
        let dense = s.threshold(NodeType::Memory, 500, &p);
        assert!((dense - sparse - 0.1).abs() < 1e-6);
    }

    #[test]
    fn threshold_clamped_to_band() {
        let s = scorer();
        let mut anxious = PersonalityState::default();
        anxious.neuroticism = 1.0;
        let t = s.threshold(NodeType::Trauma, 0, &anxious);
        assert!(t >= 0.1);

        let dense = s.threshold(NodeType::Casual, 10_000, &PersonalityState::default());
        assert!(dense <= 0.9);
    }

    #[test]
    fn neuroticism_amplifies_threats_asymmetrically() {
        let s = scorer();
        let event = EventFrame::new("a looming shape");
        let mut midline = PersonalityState::default();
        midline.neuroticism = 0.5;

        // At midline, (trait - 0.5) terms vanish but the raw-value
        // neuroticism term does not.
        let modulated = s.modulate(0.5, &event, NodeType::Threat, &midline);
        assert!(modulated > 0.5);
    }

    #[test]
    fn modulated_importance_stays_clamped() {
        let s = scorer();
        let event = EventFrame::new("x").with_user("Ian");
        let mut extreme = PersonalityState::default();
        extreme.neuroticism = 1.0;
        extreme.openness = 1.0;
        extreme.extroversion = 1.0;
        let out = s.modulate(0.95, &event, NodeType::Threat, &extreme);
        assert!(out <= 1.0);
    }

    #[test]
    fn fallback_infers_node_types_from_keywords() {
        assert_eq!(infer_node_type("a dangerous intruder"), NodeType::Threat);
        assert_eq!(infer_node_type("everyone was happy"), NodeType::Joy);
        assert_eq!(infer_node_type("the task was completed"), NodeType::Achievement);
        assert_eq!(infer_node_type("a grey wall"), NodeType::Memory);
    }

    #[test]
    fn fallback_low_keywords_override_high() {
        let s = scorer();
        let event = EventFrame::new("finished the routine sweep, just the usual");
        let analysis = s.fallback_analysis(&event);
        assert!((analysis.importance - 0.3).abs() < f32::EPSILON);
    }
}
