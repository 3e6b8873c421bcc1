//! Request/response types for the Ollama backend, plus the wire shapes
//! the model is asked to emit.

use serde::{Deserialize, Serialize};

/// One generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate (`num_predict`).
    pub max_tokens: u32,
    /// Per-request HTTP timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GenerateRequest {
    /// A short free-text completion (naming, decisions, dialogue).
    #[must_use]
    pub fn completion(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 200,
            timeout_ms: 5_000,
        }
    }

    /// A long structured-analysis request.
    #[must_use]
    pub fn analysis(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 1_000,
            timeout_ms: 30_000,
        }
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// One generation response.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text.
    pub text: String,
    /// Tokens generated, when the backend reports it.
    pub tokens_generated: u32,
    /// Wall-clock latency of the call.
    pub latency_ms: u64,
    /// Model that served the request.
    pub model: String,
}

/// The JSON object the analysis prompt instructs the model to emit.
/// Every field has a lenient default; the model rarely obeys exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnalysis {
    /// Importance in [0, 1].
    #[serde(default = "default_importance")]
    pub importance: f32,
    /// Free-text reasoning.
    #[serde(default = "default_reasoning")]
    pub reasoning: String,
    /// Node-type name; parsed leniently downstream.
    #[serde(default = "default_node_type")]
    pub node_type: String,
    /// Model's self-reported confidence.
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// Brief emotional-impact description.
    #[serde(default)]
    pub emotional_impact: Option<String>,
    /// Salient take-aways.
    #[serde(default)]
    pub key_insights: Vec<String>,
}

/// The JSON object the plan prompt instructs the model to emit.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlan {
    /// Ordered action steps.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Planner confidence.
    #[serde(default = "default_confidence_mid")]
    pub confidence: f32,
    /// Free-text reasoning, if the model includes it.
    #[serde(default)]
    pub reasoning: Option<String>,
}

fn default_importance() -> f32 {
    0.5
}

fn default_reasoning() -> String {
    "No reasoning provided".to_string()
}

fn default_node_type() -> String {
    "memory".to_string()
}

fn default_confidence() -> f32 {
    0.8
}

fn default_confidence_mid() -> f32 {
    0.5
}
