//! # EGO Core Library
//!
//! The self-model engine for an embodied agent: a clamped Big-Five
//! personality state, a growing knowledge graph of experiences, and the
//! decision pipeline that turns raw events and interaction turns into
//! durable memories.
//!
//! The moving parts, leaves first:
//!
//! - [`PersonalityState`] — five clamped traits, clamp-on-write updates
//! - [`MemoryStore`] — user-scoped/global similarity store adapter
//! - [`ImportanceScorer`] — three importance signals combined, then
//!   personality-modulated against a dynamic admission threshold
//! - [`SelfGraph`] — SELF/USER/MEMORY nodes with Hebbian edge reweighting
//! - [`InteractionPipeline`] — the eight-stage state machine for a turn
//! - [`EgoAgent`] — the facade owning all of the above
//!
//! External reasoning and planning backends are consumed through the
//! [`collaborator`] traits; every call site is timeout-bounded with a
//! local fallback, so the engine degrades to heuristic scoring and
//! templated responses rather than ever refusing to produce output.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod agent;
pub mod collaborator;
pub mod config;
pub mod embedding;
pub mod error;
pub mod event;
pub mod graph;
pub mod personality;
pub mod pipeline;
pub mod scoring;
pub mod store;
pub mod types;

pub use agent::{BatchSummary, EgoAgent, EventOutcome, EventStatus, InjectionResult};
pub use collaborator::{
    CollaboratorError, EventAnalysis, Plan, PlanningCollaborator, ReasoningCollaborator,
};
pub use config::EgoConfig;
pub use embedding::{EmbedderTier, EmbeddingProvider};
pub use error::{EgoError, Result};
pub use event::EventFrame;
pub use graph::{GraphSnapshot, SelfGraph};
pub use personality::PersonalityState;
pub use pipeline::{InteractionPipeline, InteractionResult, PerceptionDecision};
pub use scoring::ImportanceScorer;
pub use store::{MemoryRecord, MemoryStore};
pub use types::{Embedding, MemoryId, NodeType};
