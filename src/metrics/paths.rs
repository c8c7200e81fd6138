use std::collections::VecDeque;

use rayon::prelude::*;

use super::{Components, Measurement};
use crate::error::{AnalysisError, Result};
use crate::graph::InteractionGraph;

/// Average shortest path length and the node set it was measured on.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLength {
    pub value: f64,
    pub nodes_used: usize,
    pub component_size: usize,
}

impl PathLength {
    pub fn is_sampled(&self) -> bool {
        self.nodes_used < self.component_size
    }

    pub fn into_measurement(self) -> Measurement {
        if self.is_sampled() {
            Measurement::Estimated {
                value: self.value,
                basis: format!(
                    "undirected hops, estimated from a sample of {} of {} nodes",
                    self.nodes_used, self.component_size
                ),
            }
        } else {
            Measurement::Exact(self.value)
        }
    }
}

/// Mean hop distance over ordered node pairs of the largest weak component,
/// measured on the undirected projection of the induced subgraph.
///
/// Components above `exact_limit` nodes are cut down to their first
/// `sample_size` nodes by insertion order, which can leave the induced
/// subgraph disconnected; that case is reported as
/// [`AnalysisError::DisconnectedSample`].
pub fn average_path_length(
    graph: &InteractionGraph,
    components: &Components,
    exact_limit: usize,
    sample_size: usize,
) -> Result<PathLength> {
    let largest = components.largest().ok_or(AnalysisError::EmptyGraph {
        metric: "avg_path_length",
    })?;
    let component_size = largest.len();
    let selected = if component_size > exact_limit {
        &largest[..sample_size.min(component_size)]
    } else {
        largest
    };
    let k = selected.len();
    if k < 2 {
        return Err(AnalysisError::DisconnectedSample {
            reason: format!("only {k} node(s) to measure"),
        });
    }

    // relabel the selection to 0..k and keep only edges inside it
    let n = graph.node_count();
    let mut local = vec![usize::MAX; n];
    for (i, &v) in selected.iter().enumerate() {
        local[v] = i;
    }
    let adj: Vec<Vec<usize>> = graph
        .undirected_adjacency()
        .into_iter()
        .enumerate()
        .filter(|(v, _)| local[*v] != usize::MAX)
        .map(|(_, neighbors)| {
            neighbors
                .into_iter()
                .filter_map(|u| (local[u] != usize::MAX).then_some(local[u]))
                .collect()
        })
        .collect();

    let per_source: Vec<Option<u64>> = (0..k)
        .into_par_iter()
        .map(|s| distance_sum(&adj, s))
        .collect();

    let mut total = 0u64;
    for (s, sum) in per_source.into_iter().enumerate() {
        total += sum.ok_or_else(|| AnalysisError::DisconnectedSample {
            reason: format!(
                "sampled subgraph of {k} nodes is disconnected (node {} cannot reach all others)",
                graph.user(petgraph::graph::NodeIndex::new(selected[s]))
            ),
        })?;
    }

    Ok(PathLength {
        value: total as f64 / (k as f64 * (k as f64 - 1.0)),
        nodes_used: k,
        component_size,
    })
}

/// Sum of BFS distances from `s`, or `None` if some node is unreachable.
fn distance_sum(adj: &[Vec<usize>], s: usize) -> Option<u64> {
    let mut dist = vec![u32::MAX; adj.len()];
    let mut queue = VecDeque::new();
    dist[s] = 0;
    queue.push_back(s);
    let (mut reached, mut sum) = (1usize, 0u64);
    while let Some(v) = queue.pop_front() {
        for &w in &adj[v] {
            if dist[w] == u32::MAX {
                dist[w] = dist[v] + 1;
                sum += dist[w] as u64;
                reached += 1;
                queue.push_back(w);
            }
        }
    }
    (reached == adj.len()).then_some(sum)
}
