use rayon::prelude::*;

use super::mean;
use crate::error::{AnalysisError, Result};
use crate::graph::InteractionGraph;

/// Mean local clustering of the undirected projection, over all nodes.
/// Nodes with fewer than two neighbors contribute zero.
pub fn average_clustering(graph: &InteractionGraph) -> Result<f64> {
    let adj = graph.undirected_adjacency();
    let local: Vec<f64> = (0..adj.len())
        .into_par_iter()
        .map(|v| local_clustering(&adj, v))
        .collect();
    mean(&local).ok_or(AnalysisError::EmptyGraph {
        metric: "clustering",
    })
}

fn local_clustering(adj: &[Vec<usize>], v: usize) -> f64 {
    let neighbors = &adj[v];
    let d = neighbors.len();
    if d < 2 {
        return 0.0;
    }
    // each closed triangle is seen from both of its other endpoints
    let links: usize = neighbors
        .iter()
        .map(|&u| sorted_intersection_len(neighbors, &adj[u]))
        .sum();
    links as f64 / (d * (d - 1)) as f64
}

fn sorted_intersection_len(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}
