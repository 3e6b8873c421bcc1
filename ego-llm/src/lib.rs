//! # ego-llm — Ollama-backed collaborators for the EGO self-model
//!
//! Implements the `ego-core` collaborator traits over a local Ollama
//! endpoint:
//!
//! - [`OllamaClient`] speaks `/api/generate` (non-streaming) with
//!   per-request timeouts and bounded retries, and probes `/api/tags`
//!   for availability.
//! - The [`parse`] module tolerates the full range of model output —
//!   JSON wrapped in prose or markdown fences, prose with no JSON at
//!   all — and salvages what it can before the core's heuristic
//!   fallbacks take over.
//!
//! Nothing in this crate is load-bearing for correctness: every failure
//! surfaces as a `CollaboratorError` the core maps to a local fallback.

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod types;

pub use client::OllamaClient;
pub use error::LlmError;
pub use parse::Parsed;
pub use types::{GenerateRequest, GenerateResponse};
