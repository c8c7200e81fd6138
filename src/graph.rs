//! Graph builder: reply edges into directed interaction graphs.
//!
//! Repeated `(source, target)` pairs collapse into one edge. The edge keeps the
//! attributes of the most recently seen record and counts how many records were
//! folded into it.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};
use crate::model::{Category, InteractionEdge, UserId};

/// Attributes carried by a collapsed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeAttrs {
    pub subreddit: String,
    pub category: Category,
    pub created_utc: String,
    /// Number of raw interactions folded into this edge.
    pub interactions: u32,
}

impl EdgeAttrs {
    fn from_edge(edge: &InteractionEdge) -> Self {
        Self {
            subreddit: edge.subreddit.clone(),
            category: edge.category,
            created_utc: edge.created_utc.clone(),
            interactions: 1,
        }
    }
}

/// A simple directed graph over users.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: DiGraph<UserId, EdgeAttrs>,
    index: HashMap<UserId, NodeIndex>,
    dropped_self_loops: usize,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<'a, I>(edges: I, keep_self_loops: bool) -> Result<Self>
    where
        I: IntoIterator<Item = &'a InteractionEdge>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_interaction(edge, keep_self_loops)?;
        }
        Ok(graph)
    }

    /// Fold one interaction into the graph.
    pub fn add_interaction(&mut self, edge: &InteractionEdge, keep_self_loops: bool) -> Result<()> {
        if edge.source.is_empty() || edge.target.is_empty() {
            return Err(AnalysisError::Data(format!(
                "interaction in r/{} has a null endpoint",
                edge.subreddit
            )));
        }
        if edge.is_self_loop() && !keep_self_loops {
            self.dropped_self_loops += 1;
            return Ok(());
        }

        let source = self.intern(&edge.source);
        let target = self.intern(&edge.target);

        if let Some(existing) = self.graph.find_edge(source, target) {
            let attrs = &mut self.graph[existing];
            let interactions = attrs.interactions + 1;
            *attrs = EdgeAttrs::from_edge(edge);
            attrs.interactions = interactions;
        } else {
            self.graph.add_edge(source, target, EdgeAttrs::from_edge(edge));
        }
        Ok(())
    }

    fn intern(&mut self, user: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(user) {
            return idx;
        }
        let idx = self.graph.add_node(user.to_string());
        self.index.insert(user.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn dropped_self_loops(&self) -> usize {
        self.dropped_self_loops
    }

    pub fn contains(&self, user: &str) -> bool {
        self.index.contains_key(user)
    }

    pub fn node_index(&self, user: &str) -> Option<NodeIndex> {
        self.index.get(user).copied()
    }

    pub fn user(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn users(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(move |i| self.graph[i].as_str())
    }

    pub fn inner(&self) -> &DiGraph<UserId, EdgeAttrs> {
        &self.graph
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeAttrs> {
        let s = self.node_index(source)?;
        let t = self.node_index(target)?;
        self.graph.find_edge(s, t).map(|e| &self.graph[e])
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// In plus out degree. A self-loop counts twice.
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.in_degree(idx) + self.out_degree(idx)
    }

    /// Neighbor lists of the undirected projection, indexed by node index.
    /// Sorted, deduplicated, and without self-loops.
    pub fn undirected_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.graph.node_count()];
        for edge in self.graph.raw_edges() {
            let (u, v) = (edge.source().index(), edge.target().index());
            if u != v {
                adj[u].push(v);
                adj[v].push(u);
            }
        }
        for neighbors in &mut adj {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        adj
    }

    pub fn subreddit_interactions(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for edge in self.graph.raw_edges() {
            *counts.entry(edge.weight.subreddit.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone)]
pub struct Networks {
    pub misinfo: InteractionGraph,
    pub factual: InteractionGraph,
    /// Union of both edge tables, misinfo rows first.
    pub combined: InteractionGraph,
}

impl Networks {
    pub fn build(
        misinfo_edges: &[InteractionEdge],
        factual_edges: &[InteractionEdge],
        keep_self_loops: bool,
    ) -> Result<Self> {
        let misinfo = InteractionGraph::from_edges(misinfo_edges, keep_self_loops)?;
        let factual = InteractionGraph::from_edges(factual_edges, keep_self_loops)?;
        let combined = InteractionGraph::from_edges(
            misinfo_edges.iter().chain(factual_edges),
            keep_self_loops,
        )?;

        for (name, g) in [("misinfo", &misinfo), ("factual", &factual), ("combined", &combined)] {
            info!(
                graph = name,
                nodes = g.node_count(),
                edges = g.edge_count(),
                "built network"
            );
            if g.dropped_self_loops() > 0 {
                warn!(graph = name, dropped = g.dropped_self_loops(), "dropped self-replies");
            }
        }

        Ok(Self {
            misinfo,
            factual,
            combined,
        })
    }
}
