use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs for the metrics engine, community detector and crossposter ranking.
///
/// Every field has a default, so a JSON file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pagerank_damping: f64,
    pub pagerank_max_iter: usize,
    /// Per-node L1 residual tolerance for PageRank convergence.
    pub pagerank_tolerance: f64,
    /// Number of pivots for approximate betweenness. Graphs with at most this
    /// many nodes get exact betweenness.
    pub betweenness_sample_size: usize,
    /// Largest component size for which path length is computed exactly.
    pub path_length_exact_limit: usize,
    /// Number of nodes kept when the largest component is subsampled.
    pub path_length_sample_size: usize,
    pub seed: u64,
    pub top_n: usize,
    pub top_n_visual: usize,
    /// Keep `source == target` replies as self-loop edges.
    pub keep_self_loops: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_max_iter: 100,
            pagerank_tolerance: 1e-6,
            betweenness_sample_size: 500,
            path_length_exact_limit: 1000,
            path_length_sample_size: 500,
            seed: 42,
            top_n: 20,
            top_n_visual: 10,
            keep_self_loops: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub misinfo_edges: PathBuf,
    pub factual_edges: PathBuf,
    pub misinfo_content: PathBuf,
    pub factual_content: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"seed": 7, "betweenness_sample_size": 50}"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.betweenness_sample_size, 50);
        assert_eq!(cfg.pagerank_max_iter, 100);
        assert!(!cfg.keep_self_loops);
    }
}
