//! # community-bridges
//!
//! Structural comparison of two Reddit reply networks, one gathered from
//! misinformation communities and one from factual ones, and identification of
//! the users who bridge them.
//!
//! - [`graph`] builds directed interaction graphs from reply edges
//! - [`metrics`] computes density, degree, PageRank, betweenness, clustering,
//!   components and path length
//! - [`community`] runs seeded Louvain community detection
//! - [`crossposters`] finds bridge users and the subreddit pairs they connect
//! - [`pipeline`] runs all of the above, [`report`] exports the results

pub mod community;
pub mod config;
pub mod crossposters;
pub mod error;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod synth;

pub use community::{CommunityAssignment, CommunityDetector, detect_communities};
pub use config::{AnalysisConfig, InputPaths};
pub use crossposters::{CommunityView, CrossposterAnalysis, CrossposterRecord, find_crossposters};
pub use error::{AnalysisError, Result};
pub use graph::{InteractionGraph, Networks};
pub use metrics::{GraphAnalysis, Measurement, MetricsReport, compute_metrics};
pub use model::{Category, ContentItem, InteractionEdge, UserId};
pub use pipeline::{AnalysisInput, AnalysisOutcome, run};
