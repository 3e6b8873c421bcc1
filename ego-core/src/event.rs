//! Event frames — the ingestion-time value consumed by the scorer.
//!
//! An [`EventFrame`] is transient: it is scored and (if admitted)
//! converted into a durable memory record, but never persisted as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{EgoError, Result};

/// One observed event, typically a described camera frame or a system
/// notification. Built by the perception front-end; consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    /// Opaque identifier for correlating results with the caller.
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
    /// When the event was observed.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Natural-language description of the event (required).
    pub description: String,
    /// Stable user identifier, if the event involves a known user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Display name of the involved user, if known.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Objects detected in the frame.
    #[serde(default)]
    pub detected_objects: Vec<String>,
    /// Actions detected in the frame.
    #[serde(default)]
    pub detected_actions: Vec<String>,
    /// Coarse emotional tone tag from the perception front-end.
    #[serde(default)]
    pub emotional_tone: Option<String>,
    /// Broader scene description, appended to retrieval queries.
    #[serde(default)]
    pub scene_context: Option<String>,
    /// Free-form metadata passed through untouched.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Origin of the event.
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_frame_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_source() -> String {
    "camera_frame".to_string()
}

impl EventFrame {
    /// Create a minimal event frame from a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            frame_id: default_frame_id(),
            timestamp: Utc::now(),
            description: description.into(),
            user_id: None,
            user_name: None,
            detected_objects: Vec::new(),
            detected_actions: Vec::new(),
            emotional_tone: None,
            scene_context: None,
            metadata: HashMap::new(),
            source: default_source(),
        }
    }

    /// Attach a user identity.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self
    }

    /// Attach detected actions.
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.detected_actions = actions;
        self
    }

    /// Attach scene context.
    #[must_use]
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene_context = Some(scene.into());
        self
    }

    /// The user scope this event belongs to, preferring the stable id.
    #[must_use]
    pub fn user_scope(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.user_name.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Retrieval query text: description plus scene context.
    #[must_use]
    pub fn query_text(&self) -> String {
        match &self.scene_context {
            Some(scene) if !scene.is_empty() => format!("{} {scene}", self.description),
            _ => self.description.clone(),
        }
    }

    /// Validate required fields.
    ///
    /// # Errors
    /// Returns [`EgoError::MalformedEvent`] if the description is empty —
    /// malformed input is rejected before any graph or store mutation.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(EgoError::MalformedEvent(
                "event frame has an empty description".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_description_is_malformed() {
        let event = EventFrame::new("   ");
        assert!(event.validate().is_err());
    }

    #[test]
    fn user_scope_prefers_stable_id() {
        let mut event = EventFrame::new("x").with_user("Ian");
        assert_eq!(event.user_scope(), Some("Ian"));
        event.user_id = Some("user-42".to_string());
        assert_eq!(event.user_scope(), Some("user-42"));
    }

    #[test]
    fn query_text_appends_scene_context() {
        let event = EventFrame::new("a wave").with_scene("lab doorway");
        assert_eq!(event.query_text(), "a wave lab doorway");
    }

    #[test]
    fn deserializes_with_defaults() {
        let event: EventFrame =
            serde_json::from_str(r#"{"description": "hello"}"#).expect("parse");
        assert_eq!(event.description, "hello");
        assert_eq!(event.source, "camera_frame");
        assert!(event.detected_actions.is_empty());
    }
}
