//! Personalized PageRank
//!
//! Power iteration over the undirected, edge-weighted passage–entity graph
//! with the teleport distribution proportional to the seed vector:
//!
//! ```text
//! p'(v) = (1-d) * teleport(v)
//!       + d * ( Σ_{u ~ v} p(u) * w(u,v) / W(u)  +  dangling_mass * teleport(v) )
//! ```
//!
//! `W(u)` is the total edge weight at `u`; isolated vertices redistribute
//! their mass through the teleport distribution, so total mass stays 1 up to
//! numerical noise.

use crate::graph::KnowledgeGraph;
use crate::GraphError;

#[derive(Debug, Clone)]
pub struct PprSettings {
    /// Damping factor: probability of following an edge vs. teleporting.
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 convergence tolerance.
    pub tolerance: f64,
}

impl Default for PprSettings {
    fn default() -> Self {
        Self {
            damping: 0.5,
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

pub struct PprEngine {
    settings: PprSettings,
}

impl PprEngine {
    pub fn new(settings: PprSettings) -> Self {
        Self { settings }
    }

    /// Run PPR with the given seed over all vertices.
    ///
    /// NaN and negative seed entries are clamped to zero first; an all-zero
    /// seed is an error — the caller decides between PPR and DPR-only before
    /// getting here.
    pub fn run(&self, graph: &KnowledgeGraph, seed: &[f64]) -> Result<Vec<f64>, GraphError> {
        let n = graph.vertex_count();
        if seed.len() != n {
            return Err(GraphError::DimensionMismatch(format!(
                "seed len {} != vertex count {}",
                seed.len(),
                n
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let clamped: Vec<f64> = seed
            .iter()
            .map(|&w| if w.is_nan() || w < 0.0 { 0.0 } else { w })
            .collect();
        let total: f64 = clamped.iter().sum();
        if total <= 0.0 {
            return Err(GraphError::EmptySeed);
        }
        let teleport: Vec<f64> = clamped.iter().map(|w| w / total).collect();

        // Total edge weight per vertex, for transition normalization.
        let strengths: Vec<f64> = (0..n as u32)
            .map(|idx| {
                graph
                    .neighbors(idx)
                    .iter()
                    .map(|&(_, w)| w as f64)
                    .sum::<f64>()
            })
            .collect();

        let damping = self.settings.damping;
        let mut scores = teleport.clone();

        for iteration in 0..self.settings.max_iterations {
            let mut next = vec![0.0f64; n];
            let mut dangling_mass = 0.0f64;

            for u in 0..n {
                let p = scores[u];
                if strengths[u] <= 0.0 {
                    dangling_mass += p;
                    continue;
                }
                let inv_strength = 1.0 / strengths[u];
                for &(v, w) in graph.neighbors(u as u32) {
                    next[v as usize] += p * (w as f64) * inv_strength;
                }
            }

            let mut delta = 0.0f64;
            for v in 0..n {
                let value =
                    (1.0 - damping) * teleport[v] + damping * (next[v] + dangling_mass * teleport[v]);
                delta += (value - scores[v]).abs();
                next[v] = value;
            }
            scores = next;

            if delta < self.settings.tolerance {
                tracing::debug!(iterations = iteration + 1, "PPR converged");
                break;
            }
        }

        Ok(scores)
    }
}
