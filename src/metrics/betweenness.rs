use std::collections::VecDeque;

use petgraph::Direction;
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use super::{Measurement, NodeScores};
use crate::error::{AnalysisError, Result};
use crate::graph::InteractionGraph;

/// Pivots accumulated per rayon task. Fixed so the summation order, and with it
/// every bit of the result, does not depend on the thread count.
const PIVOTS_PER_CHUNK: usize = 16;

/// Normalized betweenness, exact or estimated from a pivot sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Betweenness {
    pub scores: NodeScores,
    /// Number of source pivots used; equals the node count when exact.
    pub pivots: usize,
    pub sampled: bool,
}

impl Betweenness {
    /// Wrap a value derived from these scores with the right label.
    pub fn measurement(&self, value: Option<f64>) -> Measurement {
        match value {
            None => Measurement::Unavailable {
                reason: AnalysisError::EmptyGraph {
                    metric: "betweenness",
                }
                .to_string(),
            },
            Some(v) if self.sampled => Measurement::Estimated {
                value: v,
                basis: format!(
                    "sampled {} of {} nodes as pivots",
                    self.pivots,
                    self.scores.values().len()
                ),
            },
            Some(v) => Measurement::Exact(v),
        }
    }
}

/// Brandes betweenness over the directed graph. Graphs larger than `sample_size`
/// use `sample_size` pivots drawn uniformly without replacement with `seed`, and
/// the sums are scaled up by `n / sample_size`.
pub fn betweenness(graph: &InteractionGraph, sample_size: usize, seed: u64) -> Result<Betweenness> {
    let inner = graph.inner();
    let n = inner.node_count();
    if n == 0 {
        return Err(AnalysisError::EmptyGraph {
            metric: "betweenness",
        });
    }

    let successors: Vec<Vec<usize>> = inner
        .node_indices()
        .map(|i| {
            let mut out: Vec<usize> = inner
                .neighbors_directed(i, Direction::Outgoing)
                .map(|j| j.index())
                .filter(|&j| j != i.index())
                .collect();
            out.sort_unstable();
            out
        })
        .collect();

    let sampled = sample_size > 0 && sample_size < n;
    let pivots: Vec<usize> = if sampled {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        index::sample(&mut rng, n, sample_size).into_vec()
    } else {
        (0..n).collect()
    };
    debug!(nodes = n, pivots = pivots.len(), sampled, "accumulating betweenness");

    let partials: Vec<Vec<f64>> = pivots
        .par_chunks(PIVOTS_PER_CHUNK)
        .map(|chunk| {
            let mut acc = vec![0.0; n];
            let mut scratch = Scratch::new(n);
            for &s in chunk {
                scratch.accumulate_from(s, &successors, &mut acc);
            }
            acc
        })
        .collect();

    let mut bc = vec![0.0; n];
    for partial in &partials {
        for (total, v) in bc.iter_mut().zip(partial) {
            *total += v;
        }
    }

    if n > 2 {
        let mut scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        if sampled {
            scale *= n as f64 / pivots.len() as f64;
        }
        bc.iter_mut().for_each(|v| *v *= scale);
    }

    Ok(Betweenness {
        scores: NodeScores::new(bc),
        pivots: pivots.len(),
        sampled,
    })
}

/// Per-source BFS state reused across pivots.
struct Scratch {
    order: Vec<usize>,
    preds: Vec<Vec<usize>>,
    sigma: Vec<f64>,
    dist: Vec<i64>,
    delta: Vec<f64>,
    queue: VecDeque<usize>,
}

impl Scratch {
    fn new(n: usize) -> Self {
        Self {
            order: Vec::with_capacity(n),
            preds: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![-1; n],
            delta: vec![0.0; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    fn accumulate_from(&mut self, s: usize, successors: &[Vec<usize>], acc: &mut [f64]) {
        for &v in &self.order {
            self.preds[v].clear();
            self.sigma[v] = 0.0;
            self.dist[v] = -1;
            self.delta[v] = 0.0;
        }
        self.order.clear();

        self.sigma[s] = 1.0;
        self.dist[s] = 0;
        self.queue.push_back(s);
        while let Some(v) = self.queue.pop_front() {
            self.order.push(v);
            for &w in &successors[v] {
                if self.dist[w] < 0 {
                    self.dist[w] = self.dist[v] + 1;
                    self.queue.push_back(w);
                }
                if self.dist[w] == self.dist[v] + 1 {
                    self.sigma[w] += self.sigma[v];
                    self.preds[w].push(v);
                }
            }
        }

        for &w in self.order.iter().rev() {
            let coeff = (1.0 + self.delta[w]) / self.sigma[w];
            for &v in &self.preds[w] {
                self.delta[v] += self.sigma[v] * coeff;
            }
            if w != s {
                acc[w] += self.delta[w];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::graph_of;

    #[test]
    fn middle_of_a_directed_path_carries_all_paths() {
        let g = graph_of(&[("a", "b"), ("b", "c")]);
        let b = betweenness(&g, 500, 1).unwrap();
        assert!(!b.sampled);
        // one pair (a, c) routes through b out of (n-1)(n-2) = 2 ordered pairs
        assert!((b.scores.of_user(&g, "b") - 0.5).abs() < 1e-12);
        assert_eq!(b.scores.of_user(&g, "a"), 0.0);
        assert_eq!(b.scores.of_user(&g, "c"), 0.0);
    }

    #[test]
    fn star_center_is_the_only_bridge() {
        let g = graph_of(&[
            ("a", "hub"),
            ("hub", "a"),
            ("b", "hub"),
            ("hub", "b"),
            ("c", "hub"),
            ("hub", "c"),
        ]);
        let b = betweenness(&g, 500, 1).unwrap();
        assert!((b.scores.of_user(&g, "hub") - 1.0).abs() < 1e-12);
        assert_eq!(b.measurement(b.scores.max()), Measurement::Exact(1.0));
    }

    #[test]
    fn sampling_is_seeded_and_labelled() {
        let pairs: Vec<(String, String)> = (0..60)
            .map(|i| (format!("n{i}"), format!("n{}", (i * 7 + 3) % 60)))
            .collect();
        let refs: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let g = graph_of(&refs);

        let first = betweenness(&g, 20, 9).unwrap();
        let second = betweenness(&g, 20, 9).unwrap();
        assert!(first.sampled);
        assert_eq!(first.pivots, 20);
        assert_eq!(first, second);
        assert!(first.measurement(first.scores.max()).is_estimated());
    }

    #[test]
    fn empty_graph_is_an_error() {
        assert!(matches!(
            betweenness(&InteractionGraph::new(), 500, 0),
            Err(AnalysisError::EmptyGraph { .. })
        ));
    }
}
