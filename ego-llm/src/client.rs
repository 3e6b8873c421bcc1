//! The Ollama client and its collaborator-trait implementations.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ego_core::collaborator::{
    CollaboratorError, EventAnalysis, Plan, PlanningCollaborator, ReasoningCollaborator,
};
use ego_core::config::CollaboratorConfig;
use ego_core::personality::PersonalityState;
use ego_core::store::MemoryRecord;
use ego_core::types::NodeType;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::parse::{Parsed, extract_json, salvage_analysis, salvage_plan_actions};
use crate::prompt;
use crate::types::{GenerateRequest, GenerateResponse, RawAnalysis, RawPlan};

/// Client for a local Ollama endpoint.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    max_retries: u32,
    temperature: f32,
    analysis_timeout_ms: u64,
}

impl OllamaClient {
    /// Create a client against an explicit endpoint and model.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            max_retries: 3,
            temperature: 0.7,
            analysis_timeout_ms: 30_000,
        }
    }

    /// Create a client from the core's collaborator configuration.
    #[must_use]
    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            temperature: config.temperature,
            analysis_timeout_ms: config.analysis_timeout_ms,
        }
    }

    /// The model this client targets.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe `/api/tags` with a short timeout.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .http
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "ollama availability probe failed");
                false
            }
        }
    }

    /// Generate a completion via `/api/generate` (non-streaming),
    /// making exactly `max_retries` attempts (minimum one).
    ///
    /// # Errors
    /// Returns [`LlmError::RetriesExhausted`] once every attempt has
    /// failed or timed out.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });

        let attempts = self.max_retries.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                debug!(attempt = attempt + 1, total = attempts, "retrying LLM call");
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .json(&body)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let payload: serde_json::Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::Parse(e.to_string()))?;
                    let text = payload["response"].as_str().unwrap_or("").to_string();
                    let tokens = u32::try_from(payload["eval_count"].as_u64().unwrap_or(0))
                        .unwrap_or(u32::MAX);
                    return Ok(GenerateResponse {
                        text,
                        tokens_generated: tokens,
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    last_error = format!(
                        "HTTP {}: {}",
                        resp.status(),
                        resp.text().await.unwrap_or_default()
                    );
                    warn!(error = %last_error, "ollama returned an error status");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!(timeout_ms = request.timeout_ms, "ollama request timed out");
                    } else {
                        warn!(error = %last_error, "ollama request failed");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts,
            last_error,
        })
    }
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl ReasoningCollaborator for OllamaClient {
    async fn analyze_event(
        &self,
        event_description: &str,
        personality: &PersonalityState,
        relevant_memories: &[MemoryRecord],
    ) -> Result<EventAnalysis, CollaboratorError> {
        let prompt = prompt::analysis_prompt(event_description, personality, relevant_memories);
        let request = GenerateRequest::analysis(prompt)
            .with_temperature(self.temperature)
            .with_timeout(self.analysis_timeout_ms);
        let response = self.generate(&request).await.map_err(CollaboratorError::from)?;

        match extract_json::<RawAnalysis>(&response.text) {
            Parsed::Ok(raw) => Ok(EventAnalysis {
                importance: raw.importance.clamp(0.0, 1.0),
                node_type: NodeType::parse_lenient(&raw.node_type),
                reasoning: raw.reasoning,
                confidence: raw.confidence.clamp(0.0, 1.0),
                emotional_impact: raw.emotional_impact,
                key_insights: raw.key_insights,
            }),
            Parsed::Fallback(reason) => {
                debug!(reason = %reason, "structured analysis parse failed, salvaging from prose");
                salvage_analysis(&response.text)
                    .ok_or_else(|| CollaboratorError::Malformed(reason))
            }
        }
    }

    async fn complete_text(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let request =
            GenerateRequest::completion(prompt).with_temperature(self.temperature);
        let response = self.generate(&request).await.map_err(CollaboratorError::from)?;
        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(CollaboratorError::Malformed("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl PlanningCollaborator for OllamaClient {
    async fn generate_plan(
        &self,
        goal: &str,
        scene_description: &str,
    ) -> Result<Plan, CollaboratorError> {
        let request = GenerateRequest::analysis(prompt::plan_prompt(goal, scene_description))
            .with_temperature(self.temperature);
        let response = self.generate(&request).await.map_err(CollaboratorError::from)?;

        match extract_json::<RawPlan>(&response.text) {
            Parsed::Ok(raw) if !raw.actions.is_empty() => Ok(Plan {
                actions: raw.actions,
                confidence: raw.confidence.clamp(0.0, 1.0),
                reasoning: raw.reasoning,
            }),
            Parsed::Ok(_) | Parsed::Fallback(_) => {
                // Numbered-step or action-verb lines in the prose still
                // make a usable plan.
                let actions = salvage_plan_actions(&response.text);
                if actions.is_empty() {
                    return Err(CollaboratorError::Malformed(
                        "no plan steps in response".to_string(),
                    ));
                }
                let confidence = (0.3 + 0.1 * actions.len().min(4) as f32).min(0.7);
                Ok(Plan {
                    actions,
                    confidence,
                    reasoning: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> OllamaClient {
        let mut config = CollaboratorConfig::default();
        config.base_url = "http://127.0.0.1:9".to_string();
        config.max_retries = 0;
        OllamaClient::from_config(&config)
    }

    #[test]
    fn from_config_copies_endpoint_settings() {
        let mut config = CollaboratorConfig::default();
        config.model = "mistral".to_string();
        let client = OllamaClient::from_config(&config);
        assert_eq!(client.model(), "mistral");
        assert_eq!(client.base_url, config.base_url);
    }

    #[tokio::test]
    async fn retry_budget_is_exactly_max_retries() {
        let mut config = CollaboratorConfig::default();
        config.base_url = "http://127.0.0.1:9".to_string();
        config.max_retries = 2;
        let client = OllamaClient::from_config(&config);
        let err = client
            .generate(&GenerateRequest::completion("hi"))
            .await
            .expect_err("endpoint is unreachable");
        match err {
            LlmError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_reports_unavailable() {
        let client = unreachable_client();
        assert!(!client.is_available().await);
        let result = client.complete_text("hello").await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Unavailable(_) | CollaboratorError::Timeout(_))
        ));
    }
}
