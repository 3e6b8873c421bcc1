//! Configuration for the EGO self-model engine.
//!
//! The threshold and modulation tables are explicit configuration
//! objects handed to the scorer at construction time rather than
//! ambient globals, so alternative tables are trivially testable.

use serde::{Deserialize, Serialize};

use crate::types::NodeType;

/// Top-level EGO configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EgoConfig {
    /// Combination weights for the three importance signals.
    #[serde(default)]
    pub scorer: ScorerWeights,
    /// Per-node-type admission thresholds.
    #[serde(default)]
    pub thresholds: ThresholdTable,
    /// Per-trait, per-event-type modulation weights.
    #[serde(default)]
    pub modulation: ModulationWeights,
    /// Memory retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Reasoning/planning collaborator settings.
    #[serde(default)]
    pub collaborator: CollaboratorConfig,
}

impl EgoConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EgoError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::EgoError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Scorer combination weights
// ---------------------------------------------------------------------------

/// Weights for combining the three importance signals — must sum to ~1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerWeights {
    /// Weight of the keyword-heuristic signal.
    #[serde(default = "default_0_2")]
    pub heuristic: f32,
    /// Weight of the similarity-to-important-memories signal.
    #[serde(default = "default_0_3")]
    pub semantic: f32,
    /// Weight of the external reasoning-model judgment.
    #[serde(default = "default_0_5")]
    pub external: f32,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            heuristic: 0.2,
            semantic: 0.3,
            external: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Admission thresholds
// ---------------------------------------------------------------------------

/// Base admission threshold per node type, before contextual adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdTable {
    /// Threshold for trauma-typed events.
    #[serde(default = "default_0_3")]
    pub trauma: f32,
    /// Threshold for threat-typed events.
    #[serde(default = "default_0_3")]
    pub threat: f32,
    /// Threshold for joy-typed events.
    #[serde(default = "default_0_6")]
    pub joy: f32,
    /// Threshold for achievement-typed events.
    #[serde(default = "default_0_5")]
    pub achievement: f32,
    /// Threshold for interaction-typed events.
    #[serde(default = "default_0_5")]
    pub interaction: f32,
    /// Threshold for plain memory events.
    #[serde(default = "default_0_5")]
    pub memory: f32,
    /// Threshold for routine events.
    #[serde(default = "default_0_7")]
    pub routine: f32,
    /// Threshold for casual events.
    #[serde(default = "default_0_8")]
    pub casual: f32,
    /// Fallback threshold for anything else.
    #[serde(default = "default_0_5")]
    pub default: f32,
    /// Memory-node count above which all thresholds rise by 0.1
    /// (habituation: a crowded memory space demands more salience).
    #[serde(default = "default_100")]
    pub density_limit: usize,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            trauma: 0.3,
            threat: 0.3,
            joy: 0.6,
            achievement: 0.5,
            interaction: 0.5,
            memory: 0.5,
            routine: 0.7,
            casual: 0.8,
            default: 0.5,
            density_limit: 100,
        }
    }
}

impl ThresholdTable {
    /// Base threshold for a node type.
    #[must_use]
    pub fn base(&self, node_type: NodeType) -> f32 {
        match node_type {
            NodeType::Trauma => self.trauma,
            NodeType::Threat => self.threat,
            NodeType::Joy => self.joy,
            NodeType::Achievement => self.achievement,
            NodeType::Interaction => self.interaction,
            NodeType::Memory => self.memory,
            NodeType::Routine => self.routine,
            NodeType::Casual => self.casual,
        }
    }
}

// ---------------------------------------------------------------------------
// Personality modulation weights
// ---------------------------------------------------------------------------

/// Per-trait adjustment weights applied around a 1.0 multiplier.
///
/// All contributions are `weight * (trait - 0.5)` except the neuroticism
/// terms, which use the raw trait value: anxiety always adds
/// risk-weighting, it does not cancel out at the midpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulationWeights {
    /// Openness boost for non-routine, non-casual events.
    #[serde(default = "default_0_3")]
    pub openness_novel: f32,
    /// Conscientiousness boost for achievement events.
    #[serde(default = "default_0_4")]
    pub conscientiousness_achievement: f32,
    /// Extroversion boost for events with a named user.
    #[serde(default = "default_0_3")]
    pub extroversion_social: f32,
    /// Agreeableness boost for positive-social event types.
    #[serde(default = "default_0_4")]
    pub agreeableness_positive: f32,
    /// Agreeableness reduction for threat/trauma event types.
    #[serde(default = "default_neg_0_2")]
    pub agreeableness_negative: f32,
    /// Neuroticism amplification of threat/trauma events (raw trait).
    #[serde(default = "default_0_5")]
    pub neuroticism_threat: f32,
    /// Neuroticism dampening of joy/achievement events (raw trait).
    #[serde(default = "default_neg_0_1")]
    pub neuroticism_positive: f32,
}

impl Default for ModulationWeights {
    fn default() -> Self {
        Self {
            openness_novel: 0.3,
            conscientiousness_achievement: 0.4,
            extroversion_social: 0.3,
            agreeableness_positive: 0.4,
            agreeableness_negative: -0.2,
            neuroticism_threat: 0.5,
            neuroticism_positive: -0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Memory retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Records retrieved per scope while scoring an event.
    #[serde(default = "default_5")]
    pub event_top_k: usize,
    /// Records retrieved as conversational grounding per interaction turn.
    #[serde(default = "default_10")]
    pub interaction_top_k: usize,
    /// Candidate cap for the semantic importance signal.
    #[serde(default = "default_5")]
    pub semantic_candidates: usize,
    /// Embedding vector dimensions.
    #[serde(default = "default_384")]
    pub embedding_dimensions: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            event_top_k: 5,
            interaction_top_k: 10,
            semantic_candidates: 5,
            embedding_dimensions: 384,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Reasoning/planning collaborator settings.
///
/// Every collaborator call is bounded by one of these timeouts; a call
/// that exceeds its bound is treated as unavailable, never as fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Base URL of the local reasoning endpoint.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model used for event analysis and dialogue.
    #[serde(default = "default_model")]
    pub model: String,
    /// Hard timeout for an event-analysis call, in milliseconds.
    #[serde(default = "default_30000")]
    pub analysis_timeout_ms: u64,
    /// Hard timeout for identity extraction, in milliseconds. Kept short:
    /// the regex fast path handles the common case, the model only sees
    /// ambiguous utterances.
    #[serde(default = "default_1500")]
    pub identity_timeout_ms: u64,
    /// Hard timeout for planning-need and decision classification calls.
    #[serde(default = "default_2000")]
    pub decision_timeout_ms: u64,
    /// Hard timeout for plan generation, in milliseconds.
    #[serde(default = "default_10000")]
    pub planning_timeout_ms: u64,
    /// Total attempts per call before falling back to rule-based
    /// analysis. A zero is treated as one attempt.
    #[serde(default = "default_3")]
    pub max_retries: u32,
    /// Sampling temperature for analysis calls.
    #[serde(default = "default_0_7")]
    pub temperature: f32,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            analysis_timeout_ms: 30_000,
            identity_timeout_ms: 1_500,
            decision_timeout_ms: 2_000,
            planning_timeout_ms: 10_000,
            max_retries: 3,
            temperature: 0.7,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "llama3".to_string() }
fn default_0_2() -> f32 { 0.2 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_4() -> f32 { 0.4 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_6() -> f32 { 0.6 }
fn default_0_7() -> f32 { 0.7 }
fn default_0_8() -> f32 { 0.8 }
fn default_neg_0_1() -> f32 { -0.1 }
fn default_neg_0_2() -> f32 { -0.2 }
fn default_3() -> u32 { 3 }
fn default_5() -> usize { 5 }
fn default_10() -> usize { 10 }
fn default_100() -> usize { 100 }
fn default_384() -> usize { 384 }
fn default_1500() -> u64 { 1_500 }
fn default_2000() -> u64 { 2_000 }
fn default_10000() -> u64 { 10_000 }
fn default_30000() -> u64 { 30_000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_tables() {
        let cfg = EgoConfig::default();
        assert!((cfg.thresholds.base(NodeType::Trauma) - 0.3).abs() < f32::EPSILON);
        assert!((cfg.thresholds.base(NodeType::Casual) - 0.8).abs() < f32::EPSILON);
        assert!((cfg.scorer.heuristic + cfg.scorer.semantic + cfg.scorer.external - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = EgoConfig::from_toml(
            r#"
            [thresholds]
            routine = 0.9

            [collaborator]
            model = "mistral"
            "#,
        )
        .expect("parse");
        assert!((cfg.thresholds.routine - 0.9).abs() < f32::EPSILON);
        assert!((cfg.thresholds.joy - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.collaborator.model, "mistral");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(EgoConfig::from_toml("thresholds = !").is_err());
    }
}
