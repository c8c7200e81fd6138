//! Louvain community detection on the undirected projection of a graph.
//!
//! Each level moves single nodes to the neighboring community with the best
//! modularity gain until no move helps, then collapses every community into one
//! node and repeats. Visit order is shuffled with a seeded RNG, so a given seed
//! always yields the same partition.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::graph::InteractionGraph;

/// Smallest modularity improvement worth another pass or level.
const MIN_GAIN: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommunitySize {
    pub community: usize,
    pub size: usize,
}

/// A partition of a graph's nodes. Ids are dense, starting at 0, and carry no
/// meaning beyond grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityAssignment {
    labels: Vec<usize>,
    sizes: Vec<CommunitySize>,
    modularity: f64,
    levels: usize,
}

impl CommunityAssignment {
    pub fn community_of(&self, graph: &InteractionGraph, user: &str) -> Option<usize> {
        graph.node_index(user).and_then(|i| self.labels.get(i.index()).copied())
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Sizes, largest first; equal sizes by ascending id.
    pub fn sizes(&self) -> &[CommunitySize] {
        &self.sizes
    }

    pub fn modularity(&self) -> f64 {
        self.modularity
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// `(user, community)` rows in node insertion order.
    pub fn assignments<'g>(&self, graph: &'g InteractionGraph) -> Vec<(&'g str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, &c)| (graph.user(NodeIndex::new(i)), c))
            .collect()
    }

    pub fn members(&self, graph: &InteractionGraph) -> BTreeMap<usize, Vec<String>> {
        let mut communities: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (user, community) in self.assignments(graph) {
            communities
                .entry(community)
                .or_default()
                .push(user.to_string());
        }
        communities
    }
}

#[derive(Debug, Clone)]
pub struct CommunityDetector {
    seed: u64,
}

impl CommunityDetector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn detect(&self, graph: &InteractionGraph) -> CommunityAssignment {
        let base = Level::from_graph(graph);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // node of the original graph -> node of the current level
        let mut membership: Vec<usize> = (0..base.len()).collect();
        let mut level = base.clone();
        let mut current = level.modularity(&(0..level.len()).collect::<Vec<_>>());
        let mut levels = 0;

        while level.total_weight() > 0.0 {
            let labels = level.local_moving(&mut rng);
            let communities = labels.iter().copied().max().map_or(0, |m| m + 1);
            if communities == level.len() {
                break;
            }
            let score = level.modularity(&labels);
            levels += 1;
            for m in membership.iter_mut() {
                *m = labels[*m];
            }
            debug!(level = levels, communities, modularity = score, "louvain level done");
            level = level.aggregate(&labels, communities);
            if score - current < MIN_GAIN {
                break;
            }
            current = score;
        }

        let labels = renumber(&membership);
        let modularity = base.modularity(&labels);
        let sizes = size_table(&labels);
        info!(
            nodes = labels.len(),
            communities = sizes.len(),
            modularity,
            "community detection finished"
        );
        CommunityAssignment {
            labels,
            sizes,
            modularity,
            levels,
        }
    }
}

pub fn detect_communities(graph: &InteractionGraph, seed: u64) -> CommunityAssignment {
    CommunityDetector::new(seed).detect(graph)
}

/// Weighted undirected graph for one Louvain level. Non-loop edges are stored
/// in both endpoint lists; `loops[i]` is the self-loop weight of `i`.
#[derive(Debug, Clone)]
struct Level {
    adj: Vec<Vec<(usize, f64)>>,
    loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &InteractionGraph) -> Self {
        let adj: Vec<Vec<(usize, f64)>> = graph
            .undirected_adjacency()
            .into_iter()
            .map(|neighbors| neighbors.into_iter().map(|u| (u, 1.0)).collect())
            .collect();
        let loops = vec![0.0; adj.len()];
        Self { adj, loops }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    fn strength(&self, i: usize) -> f64 {
        self.adj[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.loops[i]
    }

    /// Sum of strengths, i.e. twice the total edge weight.
    fn total_weight(&self) -> f64 {
        (0..self.len()).map(|i| self.strength(i)).sum()
    }

    fn modularity(&self, labels: &[usize]) -> f64 {
        let m2 = self.total_weight();
        if m2 == 0.0 {
            return 0.0;
        }
        let k = labels.iter().copied().max().map_or(0, |m| m + 1);
        let mut internal = vec![0.0; k];
        let mut tot = vec![0.0; k];
        for i in 0..self.len() {
            let c = labels[i];
            tot[c] += self.strength(i);
            internal[c] += 2.0 * self.loops[i];
            for &(j, w) in &self.adj[i] {
                if labels[j] == c {
                    internal[c] += w;
                }
            }
        }
        internal
            .iter()
            .zip(&tot)
            .map(|(inside, t)| inside / m2 - (t / m2).powi(2))
            .sum()
    }

    /// Move nodes greedily until a full pass changes nothing. Returns dense labels.
    fn local_moving(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let n = self.len();
        let m2 = self.total_weight();
        let strength: Vec<f64> = (0..n).map(|i| self.strength(i)).collect();
        let mut comm: Vec<usize> = (0..n).collect();
        let mut tot = strength.clone();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut link = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut current = self.modularity(&comm);

        loop {
            let mut moved = false;
            for &i in &order {
                let home = comm[i];
                let ki = strength[i];

                for &(j, w) in &self.adj[i] {
                    let c = comm[j];
                    if link[c] == 0.0 {
                        touched.push(c);
                    }
                    link[c] += w;
                }

                tot[home] -= ki;
                let mut best = home;
                let mut best_gain = link[home] - tot[home] * ki / m2;
                for &c in &touched {
                    let gain = link[c] - tot[c] * ki / m2;
                    if gain > best_gain {
                        best = c;
                        best_gain = gain;
                    }
                }
                tot[best] += ki;
                comm[i] = best;
                if best != home {
                    moved = true;
                }

                for &c in &touched {
                    link[c] = 0.0;
                }
                touched.clear();
            }

            if !moved {
                break;
            }
            let score = self.modularity(&comm);
            if score - current < MIN_GAIN {
                break;
            }
            current = score;
        }

        renumber(&comm)
    }

    /// Collapse each community into a single node.
    fn aggregate(&self, labels: &[usize], communities: usize) -> Level {
        let mut weights: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); communities];
        let mut loops = vec![0.0; communities];
        for i in 0..self.len() {
            let ci = labels[i];
            loops[ci] += self.loops[i];
            for &(j, w) in &self.adj[i] {
                let cj = labels[j];
                if ci == cj {
                    // internal edges are visited from both ends
                    loops[ci] += w / 2.0;
                } else {
                    *weights[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }
        Level {
            adj: weights.into_iter().map(|m| m.into_iter().collect()).collect(),
            loops,
        }
    }
}

/// Relabel so ids are dense and ordered by first appearance.
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut fresh: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = fresh.len();
            *fresh.entry(l).or_insert(next)
        })
        .collect()
}

fn size_table(labels: &[usize]) -> Vec<CommunitySize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &c in labels {
        *counts.entry(c).or_insert(0) += 1;
    }
    let mut sizes: Vec<CommunitySize> = counts
        .into_iter()
        .map(|(community, size)| CommunitySize { community, size })
        .collect();
    sizes.sort_by(|a, b| b.size.cmp(&a.size).then(a.community.cmp(&b.community)));
    sizes
}
