//! The self graph — nodes, weighted edges, and the personality-driven
//! reweighting rule.
//!
//! The graph is an append-only arena: exactly one SELF node created at
//! initialization, USER nodes created lazily on first reference, and one
//! MEMORY node per committed record. No deletion operation exists in the
//! core; a future compaction pass would operate on a snapshot, never on
//! live state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::personality::PersonalityState;
use crate::store::MemoryRecord;
use crate::types::{MemoryId, NodeType};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// The single root node representing the agent itself.
    SelfNode,
    /// A per-user subgraph root, keyed by user scope.
    User(String),
    /// A committed memory.
    Memory(MemoryId),
}

impl NodeId {
    /// Export string form, matching the visualization frontend contract.
    #[must_use]
    pub fn export(&self) -> String {
        match self {
            Self::SelfNode => "SELF".to_string(),
            Self::User(scope) => format!("USER_{scope}"),
            Self::Memory(id) => id.to_string(),
        }
    }
}

/// What kind of node this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The agent's own identity node.
    SelfNode,
    /// A user subgraph root.
    User,
    /// A committed memory, tagged with its node type.
    Memory(NodeType),
}

impl NodeKind {
    fn export(self) -> String {
        match self {
            Self::SelfNode => "self".to_string(),
            Self::User => "user".to_string(),
            Self::Memory(ty) => ty.as_str().to_string(),
        }
    }
}

/// Edge classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// SELF→MEMORY link for globally salient memories (importance > 0.9).
    GlobalMemory,
    /// SELF→USER link created on first encounter.
    UserLink,
    /// USER→MEMORY link for user-scoped memories.
    UserMemory,
}

impl EdgeKind {
    fn export(self) -> &'static str {
        match self {
            Self::GlobalMemory => "global_memory",
            Self::UserLink => "user_link",
            Self::UserMemory => "user_memory",
        }
    }
}

// ---------------------------------------------------------------------------
// Internal storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Node {
    id: NodeId,
    kind: NodeKind,
    content: String,
    importance: f32,
    // Presentation-only value for the visualization frontend. Derived
    // from importance at insert time and never read back into scoring.
    size: f32,
}

#[derive(Debug, Clone)]
struct Edge {
    source: NodeId,
    target: NodeId,
    // The stable weight assigned at edge creation. Reweighting always
    // recomputes from this, never from the already-scaled value.
    base_weight: f32,
    weight: f32,
    kind: EdgeKind,
}

// ---------------------------------------------------------------------------
// Snapshot export
// ---------------------------------------------------------------------------

/// A node as exported for visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    /// Node id string ("SELF", "USER_<scope>", or the memory uuid).
    pub id: String,
    /// Node type string ("self", "user", or the memory node type).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Visualization size.
    pub size: f32,
    /// Personality blob; present only on the SELF node.
    pub personality: Option<PersonalityState>,
    /// Truncated content preview (first 50 characters).
    pub content: String,
    /// Importance score.
    pub importance: f32,
}

/// An edge as exported for visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    /// Source node id string.
    pub source: String,
    /// Target node id string.
    pub target: String,
    /// Current (personality-scaled) weight.
    pub weight: f32,
    /// Edge type string.
    #[serde(rename = "type")]
    pub edge_type: String,
}

/// Full graph export: a pure read, no mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All nodes.
    pub nodes: Vec<NodeExport>,
    /// All edges.
    pub links: Vec<EdgeExport>,
    /// The personality carried by the SELF node at snapshot time.
    pub personality: PersonalityState,
}

// ---------------------------------------------------------------------------
// SelfGraph
// ---------------------------------------------------------------------------

/// The self-modulating knowledge graph.
pub struct SelfGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    personality: PersonalityState,
}

impl SelfGraph {
    /// Create the graph with its single SELF node. This initialization
    /// is terminal: the SELF node is never recreated or removed.
    #[must_use]
    pub fn new(personality: PersonalityState) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            personality,
        };
        graph.insert_node(Node {
            id: NodeId::SelfNode,
            kind: NodeKind::SelfNode,
            content: String::new(),
            importance: 0.5,
            size: 50.0,
        });
        graph
    }

    fn insert_node(&mut self, node: Node) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Update the SELF node's personality attribute and re-run the
    /// Hebbian reweighting exactly once. Callers invoke this after any
    /// personality change, scripted or direct; the graph is not
    /// considered consistent until they do.
    pub fn apply_personality(&mut self, personality: PersonalityState) {
        self.personality = personality;
        self.reweight_edges();
    }

    /// Recompute the weight of every edge touching SELF from its stable
    /// base weight and the current personality snapshot.
    ///
    /// Edges into threat-typed memories scale by `1 + Neuroticism`;
    /// edges into joy-typed memories by `1 + Agreeableness`; everything
    /// else keeps its base weight. Idempotent for a fixed snapshot: the
    /// scale is always applied to the base, so re-running never
    /// compounds.
    pub fn reweight_edges(&mut self) {
        for edge in &mut self.edges {
            if edge.source != NodeId::SelfNode && edge.target != NodeId::SelfNode {
                continue;
            }
            let target_kind = self
                .index
                .get(&edge.target)
                .map(|&i| self.nodes[i].kind);
            edge.weight = match target_kind {
                Some(NodeKind::Memory(NodeType::Threat)) => {
                    edge.base_weight * (1.0 + self.personality.neuroticism)
                }
                Some(NodeKind::Memory(NodeType::Joy)) => {
                    edge.base_weight * (1.0 + self.personality.agreeableness)
                }
                _ => edge.base_weight,
            };
        }
    }

    /// Create (idempotently) the USER node and its SELF→USER edge.
    pub fn ensure_user(&mut self, scope: &str) {
        let id = NodeId::User(scope.to_string());
        if self.index.contains_key(&id) {
            return;
        }
        tracing::debug!(user = scope, "creating user node");
        self.insert_node(Node {
            id: id.clone(),
            kind: NodeKind::User,
            content: String::new(),
            importance: 0.5,
            size: 15.0,
        });
        self.edges.push(Edge {
            source: NodeId::SelfNode,
            target: id,
            base_weight: 0.5,
            weight: 0.5,
            kind: EdgeKind::UserLink,
        });
    }

    /// Insert a MEMORY node for a committed record and wire its edges.
    ///
    /// - Importance above 0.9 earns a SELF→MEMORY "global_memory" edge
    ///   weighted by importance.
    /// - A user scope lazily creates the USER node and SELF→USER edge,
    ///   then always adds a USER→MEMORY edge weighted by importance.
    ///
    /// Re-inserting an id that is already present is a logged no-op —
    /// the graph never holds two MEMORY nodes for one record.
    pub fn add_memory(&mut self, record: &MemoryRecord) -> MemoryId {
        let id = NodeId::Memory(record.id);
        if self.index.contains_key(&id) {
            tracing::warn!(id = %record.id, "memory node already present, skipping");
            return record.id;
        }

        self.insert_node(Node {
            id: id.clone(),
            kind: NodeKind::Memory(record.node_type),
            content: record.content.clone(),
            importance: record.importance,
            size: 10.0 + record.importance * 20.0,
        });

        if record.importance > 0.9 {
            self.edges.push(Edge {
                source: NodeId::SelfNode,
                target: id.clone(),
                base_weight: record.importance,
                weight: record.importance,
                kind: EdgeKind::GlobalMemory,
            });
        }

        if let Some(scope) = &record.user_scope {
            self.ensure_user(scope);
            self.edges.push(Edge {
                source: NodeId::User(scope.clone()),
                target: id,
                base_weight: record.importance,
                weight: record.importance,
                kind: EdgeKind::UserMemory,
            });
        }

        // Keep SELF-adjacent weights consistent with the current
        // personality without waiting for the next trait update.
        self.reweight_edges();
        record.id
    }

    /// Number of MEMORY nodes (excludes SELF and USER nodes).
    #[must_use]
    pub fn memory_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Memory(_)))
            .count()
    }

    /// Whether any trauma- or threat-typed memory exists. Past trauma
    /// permanently biases perception until healed.
    #[must_use]
    pub fn has_threat_memory(&self) -> bool {
        self.nodes.iter().any(|n| {
            matches!(n.kind, NodeKind::Memory(ty) if ty.is_threatening())
        })
    }

    /// Content and importance of up to `limit` memory nodes whose
    /// importance strictly exceeds `min_importance`. Feeds the semantic
    /// importance signal.
    #[must_use]
    pub fn important_nodes(&self, min_importance: f32, limit: usize) -> Vec<(String, f32)> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Memory(_)) && n.importance > min_importance)
            .take(limit)
            .map(|n| (n.content.clone(), n.importance))
            .collect()
    }

    /// Current weight of the edge between two nodes, if present.
    #[must_use]
    pub fn edge_weight(&self, source: &NodeId, target: &NodeId) -> Option<f32> {
        self.edges
            .iter()
            .find(|e| &e.source == source && &e.target == target)
            .map(|e| e.weight)
    }

    /// Number of edges of a given kind originating at SELF.
    #[must_use]
    pub fn self_edge_count(&self, kind: EdgeKind) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == NodeId::SelfNode && e.kind == kind)
            .count()
    }

    /// Export all nodes and edges for external visualization.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|n| NodeExport {
                id: n.id.export(),
                node_type: n.kind.export(),
                size: n.size,
                personality: (n.kind == NodeKind::SelfNode).then_some(self.personality),
                content: n.content.chars().take(50).collect(),
                importance: n.importance,
            })
            .collect();
        let links = self
            .edges
            .iter()
            .map(|e| EdgeExport {
                source: e.source.export(),
                target: e.target.export(),
                weight: e.weight,
                edge_type: e.kind.export().to_string(),
            })
            .collect();
        GraphSnapshot {
            nodes,
            links,
            personality: self.personality,
        }
    }
}
