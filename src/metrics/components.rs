use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::graph::InteractionGraph;

/// Weakly connected components, each a sorted list of node indices.
/// Components appear in order of their lowest node index.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    groups: Vec<Vec<usize>>,
}

/// Five-number summary with linearly interpolated quartiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            p25: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            p75: percentile(&sorted, 75.0),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl Components {
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// The biggest component; the earliest one wins a tie.
    pub fn largest(&self) -> Option<&[usize]> {
        let mut best: Option<&Vec<usize>> = None;
        for group in &self.groups {
            if best.is_none_or(|b| group.len() > b.len()) {
                best = Some(group);
            }
        }
        best.map(Vec::as_slice)
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Vec::len).collect()
    }

    pub fn size_distribution(&self) -> Option<Distribution> {
        let sizes: Vec<f64> = self.groups.iter().map(|g| g.len() as f64).collect();
        Distribution::from_values(&sizes)
    }
}

pub fn weak_components(graph: &InteractionGraph) -> Components {
    let inner = graph.inner();
    let mut sets = UnionFind::<usize>::new(inner.node_count());
    for edge in inner.raw_edges() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for v in 0..inner.node_count() {
        let root = sets.find(v);
        let i = *slot.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[i].push(v);
    }
    Components { groups }
}
