//! Core type definitions for the EGO self-model engine.
//!
//! All types are serializable; identifiers are stable for the lifetime
//! of the append-only graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a committed memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node Type Vocabulary
// ---------------------------------------------------------------------------

/// Classification of a committed memory, drawn from a fixed vocabulary.
///
/// The admission threshold and the Hebbian reweighting rule both key off
/// this tag: threats are admitted readily by anxious agents, routine
/// events need a lot of salience to get in at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A plain remembered experience.
    Memory,
    /// A deeply negative, formative experience.
    Trauma,
    /// A strongly positive experience.
    Joy,
    /// A perceived danger.
    Threat,
    /// A conversational turn with a user.
    Interaction,
    /// A completed goal or milestone.
    Achievement,
    /// An unremarkable recurring event.
    Routine,
    /// Small talk, background noise.
    Casual,
}

impl NodeType {
    /// Whether this type represents a negative, fear-associated memory.
    #[must_use]
    pub fn is_threatening(self) -> bool {
        matches!(self, Self::Threat | Self::Trauma)
    }

    /// Whether this type represents a positive memory.
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Joy | Self::Achievement)
    }

    /// Wire name of the type, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Trauma => "trauma",
            Self::Joy => "joy",
            Self::Threat => "threat",
            Self::Interaction => "interaction",
            Self::Achievement => "achievement",
            Self::Routine => "routine",
            Self::Casual => "casual",
        }
    }

    /// Parse a wire name leniently; unknown names map to [`NodeType::Memory`].
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "trauma" => Self::Trauma,
            "joy" => Self::Joy,
            "threat" => Self::Threat,
            "interaction" => Self::Interaction,
            "achievement" => Self::Achievement,
            "routine" => Self::Routine,
            "casual" => Self::Casual,
            _ => Self::Memory,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Embedding Vector
// ---------------------------------------------------------------------------

/// A dense vector embedding for semantic similarity search.
/// 384 dimensions in the default configuration (all-MiniLM-L6-v2 shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    /// Cosine similarity between two embeddings.
    /// Returns 0.0 for mismatched dimensions or zero-magnitude vectors.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom < f32::EPSILON { 0.0 } else { dot / denom }
    }

    /// Dimensionality of the embedding.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_round_trips_through_lenient_parse() {
        for ty in [
            NodeType::Memory,
            NodeType::Trauma,
            NodeType::Joy,
            NodeType::Threat,
            NodeType::Interaction,
            NodeType::Achievement,
            NodeType::Routine,
            NodeType::Casual,
        ] {
            assert_eq!(NodeType::parse_lenient(ty.as_str()), ty);
        }
        assert_eq!(NodeType::parse_lenient("??"), NodeType::Memory);
    }

    #[test]
    fn cosine_handles_mismatched_dimensions() {
        let a = Embedding(vec![1.0, 0.0]);
        let b = Embedding(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn cosine_identical_vectors() {
        let a = Embedding(vec![0.5, 0.5, 0.1]);
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-6);
    }
}
