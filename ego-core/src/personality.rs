//! Personality state — five clamped Big-Five traits.
//!
//! The personality vector is the agent's mood-independent disposition.
//! It modulates importance scoring, admission thresholds, perception
//! filtering, and the Hebbian edge reweighting rule. It is owned by the
//! agent instance and mutated only through the clamp-on-write update.

use serde::{Deserialize, Serialize};

/// The Big-Five personality vector. Each trait ranges 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityState {
    /// Curiosity, receptiveness to novel experience.
    pub openness: f32,
    /// Organization, achievement orientation.
    pub conscientiousness: f32,
    /// Social energy.
    pub extroversion: f32,
    /// Kindness, cooperation.
    pub agreeableness: f32,
    /// Anxiety, emotional reactivity.
    pub neuroticism: f32,
}

impl Default for PersonalityState {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extroversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

impl PersonalityState {
    /// Set one trait by name, clamping the value to [0, 1].
    ///
    /// Unknown trait names are silently ignored. This lenient-ignore
    /// policy keeps interactive "personality slider" clients from
    /// crashing a session over a typo; it is a contract, not an
    /// oversight.
    ///
    /// Returns `true` if a recognized trait was updated.
    pub fn update_trait(&mut self, name: &str, value: f32) -> bool {
        let clamped = value.clamp(0.0, 1.0);
        match name.trim().to_lowercase().as_str() {
            "openness" => self.openness = clamped,
            "conscientiousness" => self.conscientiousness = clamped,
            "extroversion" | "extraversion" => self.extroversion = clamped,
            "agreeableness" => self.agreeableness = clamped,
            "neuroticism" => self.neuroticism = clamped,
            other => {
                tracing::debug!(trait_name = other, "ignoring unknown personality trait");
                return false;
            }
        }
        true
    }

    /// An immutable copy for embedding into graph node attributes or
    /// downstream prompts.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        *self
    }

    /// Re-clamp every trait. Used after deserializing external config.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            openness: self.openness.clamp(0.0, 1.0),
            conscientiousness: self.conscientiousness.clamp(0.0, 1.0),
            extroversion: self.extroversion.clamp(0.0, 1.0),
            agreeableness: self.agreeableness.clamp(0.0, 1.0),
            neuroticism: self.neuroticism.clamp(0.0, 1.0),
        }
    }

    /// Short human-readable summary for prompt interpolation.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Openness: {:.2}, Conscientiousness: {:.2}, Extroversion: {:.2}, \
             Agreeableness: {:.2}, Neuroticism: {:.2}",
            self.openness,
            self.conscientiousness,
            self.extroversion,
            self.agreeableness,
            self.neuroticism
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_clamps_high_and_low() {
        let mut p = PersonalityState::default();
        assert!(p.update_trait("neuroticism", 1.5));
        assert!((p.neuroticism - 1.0).abs() < f32::EPSILON);
        assert!(p.update_trait("openness", -0.3));
        assert!(p.openness.abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_trait_is_a_noop() {
        let mut p = PersonalityState::default();
        let before = p;
        assert!(!p.update_trait("charisma", 0.9));
        assert_eq!(p, before);
    }

    #[test]
    fn trait_names_are_case_insensitive() {
        let mut p = PersonalityState::default();
        assert!(p.update_trait("Agreeableness", 0.8));
        assert!((p.agreeableness - 0.8).abs() < f32::EPSILON);
    }
}
