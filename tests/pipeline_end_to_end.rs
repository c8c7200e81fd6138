use std::fs;
use std::path::Path;

use community_bridges::{
    AnalysisConfig, AnalysisError, InputPaths, pipeline, report,
    synth::{self, SynthSpec},
};

fn write(path: &Path, body: &str) {
    fs::write(path, body).expect("failed to write fixture");
}

fn fixture(dir: &Path) -> InputPaths {
    let paths = InputPaths {
        misinfo_edges: dir.join("misinfo_edges.csv"),
        factual_edges: dir.join("factual_edges.csv"),
        misinfo_content: dir.join("misinfo_content.csv"),
        factual_content: dir.join("factual_content.csv"),
    };
    write(
        &paths.misinfo_edges,
        "source,target,subreddit,created_utc\n\
         u1,u2,sub_m,t1\n\
         u2,u1,sub_m,t2\n",
    );
    write(
        &paths.factual_edges,
        "source,target,subreddit,created_utc\n\
         u2,u3,sub_f,t3\n",
    );
    write(
        &paths.misinfo_content,
        "id,author,subreddit,created_utc,category\n\
         a,u1,sub_m,t1,misinformation\n\
         b,u2,sub_m,t2,misinformation\n\
         c,u2,other_m,t4,misinformation\n\
         d,u2,other_m,t5,misinformation\n",
    );
    write(
        &paths.factual_content,
        "id,author,subreddit,created_utc,category\n\
         e,u2,sub_f,t3,factual\n\
         f,u3,sub_f,t6,factual\n",
    );
    paths
}

#[test]
fn reply_scenario_finds_single_bridge_user() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fixture(dir.path());
    let outcome = pipeline::run_from_paths(&paths, &AnalysisConfig::default()).unwrap();

    let cross = &outcome.crossposters;
    assert_eq!(cross.crossposters.len(), 1);
    assert!(cross.crossposters.contains("u2"));
    assert!(!cross.crossposters.contains("u1"));
    assert!(!cross.crossposters.contains("u3"));

    assert_eq!(cross.subreddit_pairs.get("sub_m", "sub_f"), 1);
    assert_eq!(cross.subreddit_pairs.get("other_m", "sub_f"), 1);
    assert_eq!(cross.subreddit_pairs.len(), 2);

    let m = &outcome.misinfo.analysis.report;
    assert_eq!(m.nodes, 2);
    assert_eq!(m.edges, 2);
    assert!((m.density - 1.0).abs() < 1e-12);
    assert_eq!(outcome.combined.nodes, 3);
    assert_eq!(outcome.combined.edges, 3);
}

#[test]
fn exports_land_in_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fixture(dir.path());
    let config = AnalysisConfig::default();
    let outcome = pipeline::run_from_paths(&paths, &config).unwrap();

    let out = dir.path().join("results");
    let written = report::export_all(&outcome, &config, &out).unwrap();
    for name in [
        "network_metrics_comparison.csv",
        "top_influential_users.csv",
        "misinfo_communities.csv",
        "factual_community_sizes.csv",
        "crossposters_analysis.csv",
        "subreddit_pairs.csv",
        "network_metrics_report.txt",
        "combined_network.dot",
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    assert!(written.iter().all(|p| p.exists()));

    let comparison = fs::read_to_string(out.join("network_metrics_comparison.csv")).unwrap();
    assert!(comparison.starts_with("Metric,Misinformation,Factual"));
    assert!(comparison.contains("\nnodes,2,2,"));

    let pairs = fs::read_to_string(out.join("subreddit_pairs.csv")).unwrap();
    assert!(pairs.contains("other_m,sub_f,1"));

    let text = fs::read_to_string(out.join("network_metrics_report.txt")).unwrap();
    assert!(text.contains("Number of cross-posting users: 1"));

    let dot = fs::read_to_string(out.join("combined_network.dot")).unwrap();
    assert!(dot.contains("purple"));
}

#[test]
fn empty_misinfo_table_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fixture(dir.path());
    write(&paths.misinfo_edges, "source,target,subreddit,created_utc\n");

    let outcome = pipeline::run_from_paths(&paths, &AnalysisConfig::default()).unwrap();
    let m = &outcome.misinfo.analysis.report;
    assert_eq!((m.nodes, m.edges, m.density), (0, 0, 0.0));
    assert!(!m.max_pagerank.is_available());
    assert!(!m.max_betweenness.is_available());
    assert!(outcome.factual.analysis.report.max_pagerank.is_available());
    assert!(outcome.crossposters.is_empty());

    let out = dir.path().join("results");
    report::export_all(&outcome, &AnalysisConfig::default(), &out).unwrap();
    assert!(!out.join("crossposters_analysis.csv").exists());
}

#[test]
fn missing_column_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = fixture(dir.path());
    write(&paths.factual_edges, "source,subreddit,created_utc\nu2,sub_f,t3\n");

    let err = pipeline::run_from_paths(&paths, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Data(_)));
}

#[test]
fn synthetic_run_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let spec = SynthSpec {
        users: 60,
        interactions: 240,
        bridge_share: 0.2,
        seed: 11,
    };
    let paths = synth::write_dataset(&synth::generate(&spec), dir.path()).unwrap();
    let config = AnalysisConfig {
        betweenness_sample_size: 40,
        ..AnalysisConfig::default()
    };

    let first = pipeline::run_from_paths(&paths, &config).unwrap();
    let second = pipeline::run_from_paths(&paths, &config).unwrap();

    assert_eq!(first.misinfo.analysis.report, second.misinfo.analysis.report);
    assert_eq!(first.factual.analysis.report, second.factual.analysis.report);
    assert_eq!(first.crossposters, second.crossposters);
    assert_eq!(first.misinfo.communities, second.misinfo.communities);
    assert!(first.misinfo.analysis.report.max_betweenness.is_estimated());
    assert!(!first.crossposters.is_empty());
}
