//! Vector embedding abstraction layer.
//!
//! A trait-based interface for generating text embeddings used by the
//! memory store and the semantic importance signal. The production path
//! is an ONNX sentence-transformer behind the `onnx` feature; the
//! default tier is a deterministic hash-based provider so the pipeline
//! keeps working when no model is installed.
//!
//! Capability is resolved exactly once at startup, not re-probed per
//! call.

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::Embedding;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Generate vector embeddings from text.
///
/// Implementations must be `Send + Sync` for use from async contexts,
/// and deterministic: identical input must yield identical output.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EgoError::Embedding`] if the provider fails to
    /// produce a vector.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A human-readable name for the model.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Capability tier
// ---------------------------------------------------------------------------

/// Which embedding capability the process resolved at startup.
///
/// The hash tier needs no model or I/O to construct, so resolution
/// always succeeds; there is no "no embedder" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderTier {
    /// A real sentence-transformer model is loaded.
    Primary,
    /// Deterministic hash-based embeddings; retrieval is keyword-blind
    /// but the pipeline stays fully functional.
    DegradedFallback,
}

/// Resolve the embedding capability once at startup.
///
/// With the `onnx` feature enabled this tries the real model first and
/// degrades on failure; otherwise it goes straight to the hash tier.
#[must_use]
pub fn resolve_embedder(dimensions: usize) -> (std::sync::Arc<dyn EmbeddingProvider>, EmbedderTier) {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbeddingProvider::new() {
            Ok(provider) => {
                return (std::sync::Arc::new(provider), EmbedderTier::Primary);
            }
            Err(e) => {
                tracing::warn!(error = %e, "ONNX embedder failed to load, using hash fallback");
            }
        }
    }
    (
        std::sync::Arc::new(HashEmbeddingProvider::new(dimensions)),
        EmbedderTier::DegradedFallback,
    )
}

// ---------------------------------------------------------------------------
// Hash-based fallback provider
// ---------------------------------------------------------------------------

/// Deterministic hash-based embedding provider.
///
/// Expands a SHA-256 digest chain over the input into an n-dimensional
/// vector with each component in [0, 1]. Semantically blind, but
/// deterministic and collision-resistant enough for the degraded tier,
/// where exact-duplicate text still retrieves itself.
pub struct HashEmbeddingProvider {
    dims: usize,
}

impl HashEmbeddingProvider {
    /// Create a new hash provider with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dims: dimensions }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut values = Vec::with_capacity(self.dims);
        let mut counter: u32 = 0;
        while values.len() < self.dims {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();
            for byte in digest {
                if values.len() == self.dims {
                    break;
                }
                values.push(f32::from(byte) / 255.0);
            }
            counter += 1;
        }
        Ok(Embedding(values))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "sha256-hash-fallback"
    }
}

// ---------------------------------------------------------------------------
// Stub provider (tests)
// ---------------------------------------------------------------------------

/// A stub embedding provider that returns zero-vectors.
///
/// Used by unit tests that don't care about similarity values.
pub struct StubEmbeddingProvider {
    dims: usize,
}

impl StubEmbeddingProvider {
    /// Create a new stub provider with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dims: dimensions }
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for StubEmbeddingProvider {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Ok(Embedding(vec![0.0; self.dims]))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "stub-zero-vector"
    }
}

// ---------------------------------------------------------------------------
// ONNX provider (feature-gated)
// ---------------------------------------------------------------------------

/// Sentence-transformer embedding provider over ONNX Runtime.
#[cfg(feature = "onnx")]
pub struct OnnxEmbeddingProvider {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
    dims: usize,
}

#[cfg(feature = "onnx")]
impl OnnxEmbeddingProvider {
    /// Load the default `all-MiniLM-L6-v2` model (384 dimensions).
    ///
    /// # Errors
    /// Returns [`crate::EgoError::Embedding`] if the model cannot be
    /// downloaded or initialized.
    pub fn new() -> Result<Self> {
        let model = fastembed::TextEmbedding::try_new(Default::default())
            .map_err(|e| crate::EgoError::Embedding(e.to_string()))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
            dims: 384,
        })
    }
}

#[cfg(feature = "onnx")]
impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| crate::EgoError::Embedding("embedder lock poisoned".to_string()))?;
        let mut vectors = model
            .embed(vec![text.to_string()], None)
            .map_err(|e| crate::EgoError::Embedding(e.to_string()))?;
        vectors
            .pop()
            .map(Embedding)
            .ok_or_else(|| crate::EgoError::Embedding("model returned no vectors".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embeddings_are_deterministic() {
        let provider = HashEmbeddingProvider::new(384);
        let a = provider.embed("the robot finished the build").expect("embed");
        let b = provider.embed("the robot finished the build").expect("embed");
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), 384);
    }

    #[test]
    fn hash_embeddings_differ_for_different_text() {
        let provider = HashEmbeddingProvider::new(64);
        let a = provider.embed("alpha").expect("embed");
        let b = provider.embed("beta").expect("embed");
        assert_ne!(a, b);
    }

    #[test]
    fn identical_text_has_unit_self_similarity() {
        let provider = HashEmbeddingProvider::new(128);
        let a = provider.embed("same text").expect("embed");
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resolve_defaults_to_degraded_tier() {
        let (provider, tier) = resolve_embedder(384);
        #[cfg(not(feature = "onnx"))]
        assert_eq!(tier, EmbedderTier::DegradedFallback);
        let _ = tier;
        assert_eq!(provider.dimensions(), 384);
    }
}
