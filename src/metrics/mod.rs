//! Structural statistics for one interaction graph.
//!
//! [`analyze`] runs every metric and never fails: a metric that is undefined on
//! the given graph is reported as [`Measurement::Unavailable`] and the run moves
//! on. The per-metric functions are public and return the underlying error.

mod betweenness;
mod clustering;
mod components;
mod pagerank;
mod paths;

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::graph::InteractionGraph;

pub use betweenness::{Betweenness, betweenness};
pub use clustering::average_clustering;
pub use components::{Components, Distribution, weak_components};
pub use pagerank::{PageRank, pagerank};
pub use paths::{PathLength, average_path_length};

/// A metric value together with how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Exact(f64),
    /// Computed on a sample; `basis` says which.
    Estimated { value: f64, basis: String },
    /// Not computed for this graph.
    Unavailable { reason: String },
}

impl Measurement {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Exact(v) | Measurement::Estimated { value: v, .. } => Some(*v),
            Measurement::Unavailable { .. } => None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Measurement::Estimated { .. })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Measurement::Unavailable { .. })
    }

    /// Free-text note for exporters: sampling basis or why it is missing.
    pub fn note(&self) -> Option<&str> {
        match self {
            Measurement::Exact(_) => None,
            Measurement::Estimated { basis, .. } => Some(basis),
            Measurement::Unavailable { reason } => Some(reason),
        }
    }

    fn unavailable(metric: &str, err: &AnalysisError) -> Self {
        warn!(metric, error = %err, "metric not computed");
        Measurement::Unavailable {
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Exact(v) => write!(f, "{v:.6}"),
            Measurement::Estimated { value, .. } => write!(f, "{value:.6} (estimated)"),
            Measurement::Unavailable { .. } => f.write_str("not computed"),
        }
    }
}

/// Per-node values, indexed by node index of the graph they were computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeScores {
    values: Vec<f64>,
}

impl NodeScores {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, idx: NodeIndex) -> f64 {
        self.values.get(idx.index()).copied().unwrap_or(0.0)
    }

    /// Score of `user`, or 0 when the user is not in `graph`.
    pub fn of_user(&self, graph: &InteractionGraph, user: &str) -> f64 {
        graph.node_index(user).map_or(0.0, |i| self.get(i))
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        mean(&self.values)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Highest `n` users, descending; equal scores ordered by username.
    pub fn top(&self, graph: &InteractionGraph, n: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = graph
            .inner()
            .node_indices()
            .map(|i| (graph.user(i).to_string(), self.get(i)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `|E| / (|V| (|V| - 1))`; zero for graphs with at most one node.
pub fn density(graph: &InteractionGraph) -> f64 {
    let n = graph.node_count();
    if n <= 1 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n as f64 * (n as f64 - 1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeStats {
    pub mean: f64,
    pub mean_in: f64,
    pub mean_out: f64,
    pub median: f64,
    pub max: usize,
}

pub fn degree_stats(graph: &InteractionGraph) -> Result<DegreeStats> {
    let n = graph.node_count();
    if n == 0 {
        return Err(AnalysisError::EmptyGraph { metric: "degree" });
    }
    let mut total = Vec::with_capacity(n);
    let (mut sum_in, mut sum_out) = (0usize, 0usize);
    for idx in graph.inner().node_indices() {
        let (i, o) = (graph.in_degree(idx), graph.out_degree(idx));
        sum_in += i;
        sum_out += o;
        total.push(i + o);
    }
    total.sort_unstable();
    let median = if n % 2 == 1 {
        total[n / 2] as f64
    } else {
        (total[n / 2 - 1] + total[n / 2]) as f64 / 2.0
    };
    Ok(DegreeStats {
        mean: (sum_in + sum_out) as f64 / n as f64,
        mean_in: sum_in as f64 / n as f64,
        mean_out: sum_out as f64 / n as f64,
        median,
        max: total[n - 1],
    })
}

/// The comparison table row set for one graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub avg_degree: Measurement,
    pub avg_in_degree: Measurement,
    pub avg_out_degree: Measurement,
    pub median_degree: Measurement,
    pub max_degree: Measurement,
    pub max_pagerank: Measurement,
    pub avg_pagerank: Measurement,
    pub max_betweenness: Measurement,
    pub avg_betweenness: Measurement,
    pub clustering_coefficient: Measurement,
    pub component_count: usize,
    pub largest_component_size: usize,
    pub largest_component_percentage: Measurement,
    pub component_sizes: Option<Distribution>,
    /// Over the largest weak component with edge direction ignored.
    pub avg_path_length: Measurement,
}

impl MetricsReport {
    pub fn entries(&self) -> Vec<(&'static str, Measurement)> {
        vec![
            ("nodes", Measurement::Exact(self.nodes as f64)),
            ("edges", Measurement::Exact(self.edges as f64)),
            ("density", Measurement::Exact(self.density)),
            ("avg_degree", self.avg_degree.clone()),
            ("avg_in_degree", self.avg_in_degree.clone()),
            ("avg_out_degree", self.avg_out_degree.clone()),
            ("median_degree", self.median_degree.clone()),
            ("max_degree", self.max_degree.clone()),
            ("max_pagerank", self.max_pagerank.clone()),
            ("avg_pagerank", self.avg_pagerank.clone()),
            ("max_betweenness", self.max_betweenness.clone()),
            ("avg_betweenness", self.avg_betweenness.clone()),
            ("clustering_coefficient", self.clustering_coefficient.clone()),
            ("component_count", Measurement::Exact(self.component_count as f64)),
            (
                "largest_component_size",
                Measurement::Exact(self.largest_component_size as f64),
            ),
            (
                "largest_component_percentage",
                self.largest_component_percentage.clone(),
            ),
            ("avg_path_length", self.avg_path_length.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct GraphAnalysis {
    pub report: MetricsReport,
    pub pagerank: Option<PageRank>,
    pub betweenness: Option<Betweenness>,
}

impl GraphAnalysis {
    /// Top users by PageRank; empty when PageRank was not computed.
    pub fn top_pagerank(&self, graph: &InteractionGraph, n: usize) -> Vec<(String, f64)> {
        self.pagerank
            .as_ref()
            .map(|pr| pr.scores.top(graph, n))
            .unwrap_or_default()
    }

    pub fn top_betweenness(&self, graph: &InteractionGraph, n: usize) -> Vec<(String, f64)> {
        self.betweenness
            .as_ref()
            .map(|b| b.scores.top(graph, n))
            .unwrap_or_default()
    }
}

fn exact_or(metric: &str, result: Result<f64>) -> Measurement {
    match result {
        Ok(v) => Measurement::Exact(v),
        Err(err) => Measurement::unavailable(metric, &err),
    }
}

pub fn analyze(graph: &InteractionGraph, config: &AnalysisConfig) -> GraphAnalysis {
    let nodes = graph.node_count();
    let edges = graph.edge_count();
    info!(nodes, edges, "computing network metrics");

    let degrees = degree_stats(graph);
    let degree_metric = |f: fn(&DegreeStats) -> f64| match &degrees {
        Ok(d) => Measurement::Exact(f(d)),
        Err(err) => Measurement::unavailable("degree", err),
    };
    let avg_degree = degree_metric(|d| d.mean);
    let avg_in_degree = degree_metric(|d| d.mean_in);
    let avg_out_degree = degree_metric(|d| d.mean_out);
    let median_degree = degree_metric(|d| d.median);
    let max_degree = degree_metric(|d| d.max as f64);

    let pagerank = match pagerank(
        graph,
        config.pagerank_damping,
        config.pagerank_max_iter,
        config.pagerank_tolerance,
    ) {
        Ok(pr) => Some(pr),
        Err(err) => {
            warn!(error = %err, "pagerank not computed");
            None
        }
    };
    let (max_pagerank, avg_pagerank) = match &pagerank {
        Some(pr) => (
            exact_or("max_pagerank", pr.scores.max().ok_or(empty("max_pagerank"))),
            exact_or("avg_pagerank", pr.scores.mean().ok_or(empty("avg_pagerank"))),
        ),
        None => (unavailable_empty("pagerank"), unavailable_empty("pagerank")),
    };

    let betweenness = match betweenness(graph, config.betweenness_sample_size, config.seed) {
        Ok(b) => Some(b),
        Err(err) => {
            warn!(error = %err, "betweenness not computed");
            None
        }
    };
    let (max_betweenness, avg_betweenness) = match &betweenness {
        Some(b) => (
            b.measurement(b.scores.max()),
            b.measurement(b.scores.mean()),
        ),
        None => (
            unavailable_empty("betweenness"),
            unavailable_empty("betweenness"),
        ),
    };

    let clustering_coefficient = exact_or("clustering", average_clustering(graph));

    let components = weak_components(graph);
    let largest = components.largest().map_or(0, |c| c.len());
    let largest_component_percentage = if nodes == 0 {
        unavailable_empty("largest_component_percentage")
    } else {
        Measurement::Exact(largest as f64 / nodes as f64)
    };

    let avg_path_length = match average_path_length(
        graph,
        &components,
        config.path_length_exact_limit,
        config.path_length_sample_size,
    ) {
        Ok(p) => p.into_measurement(),
        Err(err) => Measurement::unavailable("avg_path_length", &err),
    };
    debug!(components = components.count(), largest, "component structure");

    GraphAnalysis {
        report: MetricsReport {
            nodes,
            edges,
            density: density(graph),
            avg_degree,
            avg_in_degree,
            avg_out_degree,
            median_degree,
            max_degree,
            max_pagerank,
            avg_pagerank,
            max_betweenness,
            avg_betweenness,
            clustering_coefficient,
            component_count: components.count(),
            largest_component_size: largest,
            largest_component_percentage,
            component_sizes: components.size_distribution(),
            avg_path_length,
        },
        pagerank,
        betweenness,
    }
}

/// [`analyze`] without the per-node score tables.
pub fn compute_metrics(graph: &InteractionGraph, config: &AnalysisConfig) -> MetricsReport {
    analyze(graph, config).report
}

fn empty(metric: &'static str) -> AnalysisError {
    AnalysisError::EmptyGraph { metric }
}

fn unavailable_empty(metric: &'static str) -> Measurement {
    Measurement::Unavailable {
        reason: empty(metric).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, InteractionEdge};

    pub(crate) fn graph_of(pairs: &[(&str, &str)]) -> InteractionGraph {
        let edges: Vec<_> = pairs
            .iter()
            .map(|(s, t)| InteractionEdge::new(*s, *t, "sub", Category::Misinfo, "0"))
            .collect();
        InteractionGraph::from_edges(&edges, false).unwrap()
    }

    #[test]
    fn density_of_tiny_graphs_is_zero() {
        assert_eq!(density(&InteractionGraph::new()), 0.0);
    }

    #[test]
    fn density_of_complete_digraph_is_one() {
        let g = graph_of(&[
            ("a", "b"),
            ("b", "a"),
            ("a", "c"),
            ("c", "a"),
            ("b", "c"),
            ("c", "b"),
        ]);
        assert!((density(&g) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degree_stats_on_a_star() {
        let g = graph_of(&[("a", "hub"), ("b", "hub"), ("c", "hub")]);
        let d = degree_stats(&g).unwrap();
        assert_eq!(d.max, 3);
        assert!((d.mean - 1.5).abs() < 1e-12);
        assert!((d.mean_in - 0.75).abs() < 1e-12);
        assert!((d.median - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_graph_reports_defined_values_and_marks_the_rest() {
        let report = compute_metrics(&InteractionGraph::new(), &AnalysisConfig::default());
        assert_eq!(report.nodes, 0);
        assert_eq!(report.edges, 0);
        assert_eq!(report.density, 0.0);
        assert!(!report.max_pagerank.is_available());
        assert!(!report.max_betweenness.is_available());
        assert!(!report.avg_degree.is_available());
        assert!(!report.avg_path_length.is_available());
        assert_eq!(report.component_count, 0);
    }

    #[test]
    fn sampled_betweenness_is_labelled_estimated() {
        let pairs: Vec<(String, String)> = (0..30)
            .map(|i| (format!("u{i}"), format!("u{}", (i + 1) % 30)))
            .collect();
        let refs: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let g = graph_of(&refs);
        let config = AnalysisConfig {
            betweenness_sample_size: 10,
            ..AnalysisConfig::default()
        };
        let report = compute_metrics(&g, &config);
        assert!(report.max_betweenness.is_estimated());
        assert!(matches!(report.max_pagerank, Measurement::Exact(_)));
    }

    #[test]
    fn analysis_is_repeatable() {
        let g = graph_of(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("d", "e")]);
        let config = AnalysisConfig::default();
        assert_eq!(compute_metrics(&g, &config), compute_metrics(&g, &config));
    }

    #[test]
    fn top_scores_break_ties_by_username() {
        let g = graph_of(&[("b", "a"), ("c", "d")]);
        let scores = NodeScores::new(vec![1.0, 2.0, 1.0, 2.0]);
        let top = scores.top(&g, 3);
        assert_eq!(top[0].0, "a");
        assert_eq!(top[1].0, "d");
        assert_eq!(top[2].0, "b");
    }
}
