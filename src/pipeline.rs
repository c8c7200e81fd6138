//! End-to-end run: tables -> graphs -> metrics -> communities -> crossposters.

use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use tracing::info;

use crate::community::{CommunityAssignment, detect_communities};
use crate::config::{AnalysisConfig, InputPaths};
use crate::crossposters::{CommunityView, CrossposterAnalysis, find_crossposters};
use crate::error::{AnalysisError, Result};
use crate::graph::{InteractionGraph, Networks};
use crate::loader;
use crate::metrics::{self, GraphAnalysis};
use crate::model::{Category, ContentItem, InteractionEdge};

#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub misinfo_edges: Vec<InteractionEdge>,
    pub factual_edges: Vec<InteractionEdge>,
    pub misinfo_content: Vec<ContentItem>,
    pub factual_content: Vec<ContentItem>,
}

impl AnalysisInput {
    pub fn load(paths: &InputPaths) -> Result<Self> {
        info!("loading edge and content tables");
        Ok(Self {
            misinfo_edges: loader::load_edges(&paths.misinfo_edges, Category::Misinfo)?,
            factual_edges: loader::load_edges(&paths.factual_edges, Category::Factual)?,
            misinfo_content: loader::load_content(&paths.misinfo_content, Category::Misinfo)?,
            factual_content: loader::load_content(&paths.factual_content, Category::Factual)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSummary {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
}

#[derive(Debug, Clone)]
pub struct SideOutcome {
    pub analysis: GraphAnalysis,
    pub communities: CommunityAssignment,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub networks: Networks,
    pub misinfo: SideOutcome,
    pub factual: SideOutcome,
    pub combined: CombinedSummary,
    pub crossposters: CrossposterAnalysis,
    pub elapsed: Duration,
}

/// Analyze both graphs on the rayon pool. Each side is independent and
/// deterministic, so the result matches a sequential run exactly.
fn analyze_sides(networks: &Networks, config: &AnalysisConfig) -> Result<(SideOutcome, SideOutcome)> {
    let (tx, rx) = unbounded();
    rayon::scope(|s| {
        for (category, graph) in [
            (Category::Misinfo, &networks.misinfo),
            (Category::Factual, &networks.factual),
        ] {
            let tx = tx.clone();
            s.spawn(move |_| {
                let outcome = analyze_side(graph, config);
                // receiver outlives the scope
                let _ = tx.send((category, outcome));
            });
        }
    });
    drop(tx);

    let (mut misinfo, mut factual) = (None, None);
    for (category, outcome) in rx {
        match category {
            Category::Misinfo => misinfo = Some(outcome),
            Category::Factual => factual = Some(outcome),
        }
    }
    match (misinfo, factual) {
        (Some(m), Some(f)) => Ok((m, f)),
        _ => Err(AnalysisError::Worker(
            "a per-graph analysis finished without a result".into(),
        )),
    }
}

fn analyze_side(graph: &InteractionGraph, config: &AnalysisConfig) -> SideOutcome {
    let analysis = metrics::analyze(graph, config);
    let communities = detect_communities(graph, config.seed);
    SideOutcome {
        analysis,
        communities,
    }
}

/// Run the whole analysis on tables already in memory.
pub fn run(input: &AnalysisInput, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let started = Instant::now();

    let networks = Networks::build(
        &input.misinfo_edges,
        &input.factual_edges,
        config.keep_self_loops,
    )?;

    let (misinfo, factual) = analyze_sides(&networks, config)?;

    let crossposters = find_crossposters(
        CommunityView {
            graph: &networks.misinfo,
            pagerank: misinfo.analysis.pagerank.as_ref().map(|pr| &pr.scores),
            content: &input.misinfo_content,
        },
        CommunityView {
            graph: &networks.factual,
            pagerank: factual.analysis.pagerank.as_ref().map(|pr| &pr.scores),
            content: &input.factual_content,
        },
    );

    let combined = CombinedSummary {
        nodes: networks.combined.node_count(),
        edges: networks.combined.edge_count(),
        density: metrics::density(&networks.combined),
    };

    let elapsed = started.elapsed();
    info!(elapsed_secs = elapsed.as_secs_f64(), "analysis complete");

    Ok(AnalysisOutcome {
        networks,
        misinfo,
        factual,
        combined,
        crossposters,
        elapsed,
    })
}

pub fn run_from_paths(paths: &InputPaths, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let input = AnalysisInput::load(paths)?;
    run(&input, config)
}
