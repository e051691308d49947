//! Arena-indexed knowledge graph
//!
//! Vertices are stored in a flat arena addressed by `u32`; adjacency is a
//! per-vertex list of `(neighbor, weight)`. There are no owning references
//! between passages and entities — only indices — so the structure
//! serializes flat and the PageRank inner loop walks contiguous memory.
//!
//! Invariants enforced at construction:
//! - no self-loops
//! - edge weights in `(0, 1]`
//! - undirected: every edge appears in both endpoint lists

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use bhorti_core::ids::NodeKind;

use crate::GraphError;

/// Vertex attributes, mirroring the persisted shape
/// `{name, hash_id, content?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// Human-readable name: the entity phrase, or the passage id for chunks.
    pub name: String,
    /// Content-hashed id with a kind prefix (`chunk-…` / `entity-…`).
    pub hash_id: String,
    /// Passage text for chunk nodes; entities carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEdge {
    source: u32,
    target: u32,
    weight: f32,
}

#[derive(Serialize, Deserialize)]
struct PersistedGraph {
    vertices: Vec<Vertex>,
    edges: Vec<PersistedEdge>,
}

/// The passage–entity graph.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    vertices: Vec<Vertex>,
    /// Per-vertex `(neighbor, weight)` lists; symmetric.
    adjacency: Vec<Vec<(u32, f32)>>,
    /// hash_id → vertex index.
    index: HashMap<String, u32>,
    /// Vertex indices of passage nodes, in insertion order.
    passage_nodes: Vec<u32>,
    /// Vertex indices of entity nodes, in insertion order.
    entity_nodes: Vec<u32>,
}

/// Node/edge counts for `/graph-stats`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub entity_nodes: usize,
    pub chunk_nodes: usize,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, or return the existing index for its hash id.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<u32, GraphError> {
        if let Some(&idx) = self.index.get(&vertex.hash_id) {
            return Ok(idx);
        }
        let kind = NodeKind::of(&vertex.hash_id)
            .ok_or_else(|| GraphError::UnknownNode(vertex.hash_id.clone()))?;
        let idx = self.vertices.len() as u32;
        self.index.insert(vertex.hash_id.clone(), idx);
        match kind {
            NodeKind::Passage => self.passage_nodes.push(idx),
            NodeKind::Entity => self.entity_nodes.push(idx),
        }
        self.vertices.push(vertex);
        self.adjacency.push(Vec::new());
        Ok(idx)
    }

    /// Add an undirected edge. Re-adding an edge keeps the larger weight.
    pub fn add_edge(&mut self, a: u32, b: u32, weight: f32) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(
                self.vertices
                    .get(a as usize)
                    .map(|v| v.hash_id.clone())
                    .unwrap_or_else(|| a.to_string()),
            ));
        }
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(GraphError::BadWeight(weight));
        }
        let n = self.vertices.len() as u32;
        if a >= n || b >= n {
            return Err(GraphError::UnknownNode(format!("index {}/{}", a, b)));
        }

        match self.adjacency[a as usize].iter_mut().find(|(t, _)| *t == b) {
            Some((_, w)) => *w = w.max(weight),
            None => self.adjacency[a as usize].push((b, weight)),
        }
        match self.adjacency[b as usize].iter_mut().find(|(t, _)| *t == a) {
            Some((_, w)) => *w = w.max(weight),
            None => self.adjacency[b as usize].push((a, weight)),
        }
        Ok(())
    }

    pub fn vertex(&self, idx: u32) -> Option<&Vertex> {
        self.vertices.get(idx as usize)
    }

    pub fn vertex_index(&self, hash_id: &str) -> Option<u32> {
        self.index.get(hash_id).copied()
    }

    pub fn neighbors(&self, idx: u32) -> &[(u32, f32)] {
        &self.adjacency[idx as usize]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn passage_nodes(&self) -> &[u32] {
        &self.passage_nodes
    }

    pub fn entity_nodes(&self) -> &[u32] {
        &self.entity_nodes
    }

    /// How many passage nodes an entity touches; the inverse scales its
    /// seed weight so ubiquitous entities do not dominate the walk.
    pub fn passage_neighbor_count(&self, entity_idx: u32) -> usize {
        self.adjacency[entity_idx as usize]
            .iter()
            .filter(|(n, _)| {
                self.vertices
                    .get(*n as usize)
                    .and_then(|v| NodeKind::of(&v.hash_id))
                    == Some(NodeKind::Passage)
            })
            .count()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.vertex_count(),
            total_edges: self.edge_count(),
            entity_nodes: self.entity_nodes.len(),
            chunk_nodes: self.passage_nodes.len(),
        }
    }

    /// Every passage node must be reachable: degree ≥ 1. Run after indexing.
    pub fn validate(&self) -> Result<(), GraphError> {
        for &idx in &self.passage_nodes {
            if self.adjacency[idx as usize].is_empty() {
                return Err(GraphError::UnknownNode(format!(
                    "passage node {} has degree 0",
                    self.vertices[idx as usize].hash_id
                )));
            }
        }
        Ok(())
    }

    // --- persistence ---

    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (source, neighbors) in self.adjacency.iter().enumerate() {
            for &(target, weight) in neighbors {
                // Emit each undirected edge once.
                if (source as u32) < target {
                    edges.push(PersistedEdge {
                        source: source as u32,
                        target,
                        weight,
                    });
                }
            }
        }
        let persisted = PersistedGraph {
            vertices: self.vertices.clone(),
            edges,
        };
        let json = serde_json::to_string(&persisted)
            .map_err(|e| GraphError::Storage(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| GraphError::Storage(e.to_string()))?;
        tracing::info!(
            nodes = self.vertex_count(),
            edges = self.edge_count(),
            path = %path.display(),
            "graph saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| GraphError::Storage(e.to_string()))?;
        let persisted: PersistedGraph =
            serde_json::from_str(&json).map_err(|e| GraphError::Storage(e.to_string()))?;

        let mut graph = KnowledgeGraph::new();
        for vertex in persisted.vertices {
            graph.add_vertex(vertex)?;
        }
        for edge in persisted.edges {
            graph.add_edge(edge.source, edge.target, edge.weight)?;
        }
        tracing::info!(
            nodes = graph.vertex_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhorti_core::ids;
    use tempfile::TempDir;

    fn passage(text: &str) -> Vertex {
        Vertex {
            name: ids::passage_id(text),
            hash_id: ids::passage_id(text),
            content: Some(text.to_string()),
        }
    }

    fn entity(phrase: &str) -> Vertex {
        Vertex {
            name: phrase.to_string(),
            hash_id: ids::entity_id(phrase),
            content: None,
        }
    }

    fn sample() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        let p0 = g.add_vertex(passage("[KUET] কুয়েট ভর্তি")).unwrap();
        let e0 = g.add_vertex(entity("কুয়েট")).unwrap();
        let e1 = g.add_vertex(entity("ভর্তি পরীক্ষা")).unwrap();
        g.add_edge(p0, e0, 1.0).unwrap();
        g.add_edge(p0, e1, 1.0).unwrap();
        g.add_edge(e0, e1, 0.5).unwrap();
        g
    }

    #[test]
    fn test_vertex_dedup_by_hash_id() {
        let mut g = KnowledgeGraph::new();
        let a = g.add_vertex(entity("buet")).unwrap();
        let b = g.add_vertex(entity("buet")).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.vertex_count(), 1);
    }

    #[test]
    fn test_no_self_loops() {
        let mut g = KnowledgeGraph::new();
        let e = g.add_vertex(entity("x")).unwrap();
        assert!(matches!(g.add_edge(e, e, 0.5), Err(GraphError::SelfLoop(_))));
    }

    #[test]
    fn test_weight_bounds() {
        let mut g = KnowledgeGraph::new();
        let a = g.add_vertex(entity("a")).unwrap();
        let b = g.add_vertex(entity("b")).unwrap();
        assert!(matches!(g.add_edge(a, b, 0.0), Err(GraphError::BadWeight(_))));
        assert!(matches!(g.add_edge(a, b, 1.5), Err(GraphError::BadWeight(_))));
        assert!(g.add_edge(a, b, 1.0).is_ok());
    }

    #[test]
    fn test_undirected_adjacency() {
        let g = sample();
        let p0 = g.passage_nodes()[0];
        let e0 = g.entity_nodes()[0];
        assert!(g.neighbors(p0).iter().any(|(n, _)| *n == e0));
        assert!(g.neighbors(e0).iter().any(|(n, _)| *n == p0));
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_passage_neighbor_count() {
        let g = sample();
        let e0 = g.entity_nodes()[0];
        assert_eq!(g.passage_neighbor_count(e0), 1);
    }

    #[test]
    fn test_validate_rejects_isolated_passage() {
        let mut g = KnowledgeGraph::new();
        g.add_vertex(passage("lonely")).unwrap();
        assert!(g.validate().is_err());
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        let g = sample();
        g.save(&path).unwrap();
        let loaded = KnowledgeGraph::load(&path).unwrap();

        assert_eq!(loaded.vertex_count(), g.vertex_count());
        assert_eq!(loaded.edge_count(), g.edge_count());
        assert_eq!(loaded.stats().chunk_nodes, 1);
        assert_eq!(loaded.stats().entity_nodes, 2);
        // Same hash_id set.
        for idx in 0..g.vertex_count() as u32 {
            let hash_id = &g.vertex(idx).unwrap().hash_id;
            assert!(loaded.vertex_index(hash_id).is_some());
        }
    }

    #[test]
    fn test_duplicate_edge_keeps_max_weight() {
        let mut g = KnowledgeGraph::new();
        let a = g.add_vertex(entity("a")).unwrap();
        let b = g.add_vertex(entity("b")).unwrap();
        g.add_edge(a, b, 0.3).unwrap();
        g.add_edge(a, b, 0.8).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert!((g.neighbors(a)[0].1 - 0.8).abs() < f32::EPSILON);
    }
}
