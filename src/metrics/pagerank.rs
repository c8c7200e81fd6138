use petgraph::Direction;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::NodeScores;
use crate::error::{AnalysisError, Result};
use crate::graph::InteractionGraph;

/// PageRank scores plus convergence bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRank {
    pub scores: NodeScores,
    pub iterations: usize,
    pub converged: bool,
}

/// Power-method PageRank with uniform teleport and uniform redistribution of
/// dangling mass. Stops once the L1 change drops below `n * tolerance` or after
/// `max_iter` rounds, whichever comes first.
pub fn pagerank(
    graph: &InteractionGraph,
    damping: f64,
    max_iter: usize,
    tolerance: f64,
) -> Result<PageRank> {
    let inner = graph.inner();
    let n = inner.node_count();
    if n == 0 {
        return Err(AnalysisError::EmptyGraph { metric: "pagerank" });
    }
    let nf = n as f64;

    let out_degree: Vec<usize> = inner
        .node_indices()
        .map(|i| inner.edges_directed(i, Direction::Outgoing).count())
        .collect();
    let incoming: Vec<Vec<usize>> = inner
        .node_indices()
        .map(|i| {
            inner
                .neighbors_directed(i, Direction::Incoming)
                .map(|j| j.index())
                .collect()
        })
        .collect();
    let dangling: Vec<usize> = (0..n).filter(|&i| out_degree[i] == 0).collect();

    let mut rank = vec![1.0 / nf; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iter {
        iterations += 1;
        let dangling_mass: f64 = dangling.iter().map(|&i| rank[i]).sum();
        let base = (1.0 - damping) / nf + damping * dangling_mass / nf;

        // pull-style update; each node sums its own in-edges in a fixed order
        let next: Vec<f64> = incoming
            .par_iter()
            .map(|sources| {
                let inflow: f64 = sources
                    .iter()
                    .map(|&j| rank[j] / out_degree[j] as f64)
                    .sum();
                base + damping * inflow
            })
            .collect();

        let residual: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if residual < nf * tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(iterations, "pagerank converged");
    } else {
        warn!(max_iter, "pagerank hit the iteration cap before converging");
    }

    let total: f64 = rank.iter().sum();
    if total > 0.0 {
        rank.iter_mut().for_each(|r| *r /= total);
    }

    Ok(PageRank {
        scores: NodeScores::new(rank),
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::graph_of;

    fn run(g: &InteractionGraph) -> PageRank {
        pagerank(g, 0.85, 100, 1e-6).unwrap()
    }

    #[test]
    fn empty_graph_is_an_error() {
        let err = pagerank(&InteractionGraph::new(), 0.85, 100, 1e-6).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyGraph { metric: "pagerank" }));
    }

    #[test]
    fn symmetric_cycle_is_uniform() {
        let g = graph_of(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let pr = run(&g);
        assert!(pr.converged);
        for v in pr.scores.values() {
            assert!((v - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn replied_to_user_ranks_highest() {
        let g = graph_of(&[("a", "hub"), ("b", "hub"), ("c", "hub"), ("hub", "a")]);
        let pr = run(&g);
        let top = pr.scores.top(&g, 1);
        assert_eq!(top[0].0, "hub");
        assert!((pr.scores.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn dangling_nodes_keep_distribution_normalised() {
        // b and c never reply
        let g = graph_of(&[("a", "b"), ("a", "c")]);
        let pr = run(&g);
        assert!((pr.scores.sum() - 1.0).abs() < 1e-9);
        assert!(pr.scores.values().iter().all(|v| *v > 0.0));
        let b = pr.scores.of_user(&g, "b");
        let c = pr.scores.of_user(&g, "c");
        assert!((b - c).abs() < 1e-12);
    }

    #[test]
    fn single_node_gets_all_mass() {
        let edges = vec![crate::model::InteractionEdge::new(
            "solo",
            "solo",
            "s",
            crate::model::Category::Factual,
            "0",
        )];
        let g = InteractionGraph::from_edges(&edges, true).unwrap();
        let pr = run(&g);
        assert!((pr.scores.values()[0] - 1.0).abs() < 1e-12);
    }
}
