//! Exporters: comparison CSVs, the plain-text metrics report and DOT graphs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::Writer;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use tracing::info;

use crate::community::CommunityAssignment;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::graph::InteractionGraph;
use crate::metrics::Measurement;
use crate::pipeline::{AnalysisOutcome, SideOutcome};

/// Write every export into `out_dir`, creating it if needed.
pub fn export_all(
    outcome: &AnalysisOutcome,
    config: &AnalysisConfig,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    let mut target = |name: &str| {
        let path = out_dir.join(name);
        written.push(path.clone());
        path
    };

    write_metrics_comparison(outcome, target("network_metrics_comparison.csv"))?;
    write_top_users(
        outcome,
        "PageRank",
        |side, g| side.analysis.top_pagerank(g, config.top_n_visual),
        target("top_influential_users.csv"),
    )?;
    write_top_users(
        outcome,
        "Betweenness",
        |side, g| side.analysis.top_betweenness(g, config.top_n_visual),
        target("top_bridge_users.csv"),
    )?;

    let nets = &outcome.networks;
    for (name, graph, side) in [
        ("misinfo", &nets.misinfo, &outcome.misinfo),
        ("factual", &nets.factual, &outcome.factual),
    ] {
        write_communities(graph, &side.communities, target(&format!("{name}_communities.csv")))?;
        write_community_sizes(&side.communities, target(&format!("{name}_community_sizes.csv")))?;
        save_community_dot(graph, &side.communities, target(&format!("{name}_communities.dot")))?;
    }

    let cross = &outcome.crossposters;
    if !cross.is_empty() {
        write_records(&cross.records, target("crossposters_analysis.csv"))?;
        write_records(cross.top(config.top_n), target("top_crossposters.csv"))?;
        if !cross.subreddit_pairs.is_empty() {
            let mut wtr = Writer::from_path(target("subreddit_pairs.csv"))?;
            wtr.write_record(["misinfo_subreddit", "factual_subreddit", "count"])?;
            for (m, f, count) in cross.subreddit_pairs.most_common() {
                wtr.write_record([m, f, count.to_string().as_str()])?;
            }
            wtr.flush()?;
        }
    }

    let mut report = io::BufWriter::new(fs::File::create(target("network_metrics_report.txt"))?);
    write_text_report(outcome, config, &mut report)?;
    report.flush()?;

    save_membership_dot(outcome, target("combined_network.dot"))?;

    for path in &written {
        info!(path = %path.display(), "wrote export");
    }
    Ok(written)
}

fn cell(m: &Measurement) -> String {
    m.value().map(|v| v.to_string()).unwrap_or_default()
}

fn write_metrics_comparison(outcome: &AnalysisOutcome, path: PathBuf) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([
        "Metric",
        "Misinformation",
        "Factual",
        "Misinformation_Note",
        "Factual_Note",
    ])?;
    let misinfo = outcome.misinfo.analysis.report.entries();
    let factual = outcome.factual.analysis.report.entries();
    for ((name, m), (_, f)) in misinfo.iter().zip(&factual) {
        let (mv, fv) = (cell(m), cell(f));
        wtr.write_record([
            *name,
            mv.as_str(),
            fv.as_str(),
            m.note().unwrap_or(""),
            f.note().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_top_users<F>(outcome: &AnalysisOutcome, score: &str, top: F, path: PathBuf) -> Result<()>
where
    F: Fn(&SideOutcome, &InteractionGraph) -> Vec<(String, f64)>,
{
    let misinfo = top(&outcome.misinfo, &outcome.networks.misinfo);
    let factual = top(&outcome.factual, &outcome.networks.factual);

    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([
        "Rank".to_string(),
        "Misinfo_User".to_string(),
        format!("Misinfo_{score}"),
        "Factual_User".to_string(),
        format!("Factual_{score}"),
    ])?;
    let split = |row: Option<&(String, f64)>| {
        row.map_or((String::new(), String::new()), |(u, v)| (u.clone(), v.to_string()))
    };
    for rank in 0..misinfo.len().max(factual.len()) {
        let (mu, mv) = split(misinfo.get(rank));
        let (fu, fv) = split(factual.get(rank));
        wtr.write_record([(rank + 1).to_string(), mu, mv, fu, fv])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_communities(
    graph: &InteractionGraph,
    communities: &CommunityAssignment,
    path: PathBuf,
) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["User", "Community_ID"])?;
    for (user, id) in communities.assignments(graph) {
        wtr.write_record([user, id.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_community_sizes(communities: &CommunityAssignment, path: PathBuf) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["Community_ID", "Size"])?;
    for size in communities.sizes() {
        wtr.write_record([size.community.to_string(), size.size.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_records<T: serde::Serialize>(rows: &[T], path: PathBuf) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Human-readable summary of a run.
pub fn write_text_report<W: Write>(
    outcome: &AnalysisOutcome,
    config: &AnalysisConfig,
    w: &mut W,
) -> io::Result<()> {
    let nets = &outcome.networks;
    let sides = [
        ("Misinformation Network", &nets.misinfo, &outcome.misinfo),
        ("Factual Information Network", &nets.factual, &outcome.factual),
    ];

    writeln!(w, "=====================================================")?;
    writeln!(w, "MISINFORMATION vs FACTUAL NETWORK ANALYSIS - METRICS REPORT")?;
    writeln!(w, "=====================================================\n")?;

    writeln!(w, "1. BASIC NETWORK STATISTICS")?;
    writeln!(w, "---------------------------\n")?;
    for (title, _, side) in &sides {
        let r = &side.analysis.report;
        writeln!(w, "{title}:")?;
        writeln!(w, "  - Nodes: {}", r.nodes)?;
        writeln!(w, "  - Edges: {}", r.edges)?;
        writeln!(w, "  - Density: {:.6}", r.density)?;
        writeln!(w, "  - Average Degree: {}", r.avg_degree)?;
        writeln!(w, "  - Median Degree: {}", r.median_degree)?;
        writeln!(w, "  - Max Degree: {}", r.max_degree)?;
        writeln!(w, "  - Average In-Degree: {}", r.avg_in_degree)?;
        writeln!(w, "  - Average Out-Degree: {}\n", r.avg_out_degree)?;
    }
    writeln!(w, "Combined Network:")?;
    writeln!(w, "  - Nodes: {}", outcome.combined.nodes)?;
    writeln!(w, "  - Edges: {}", outcome.combined.edges)?;
    writeln!(w, "  - Density: {:.6}\n", outcome.combined.density)?;

    writeln!(w, "2. CENTRALIZATION METRICS")?;
    writeln!(w, "-------------------------\n")?;
    for (title, graph, side) in &sides {
        let r = &side.analysis.report;
        writeln!(w, "{title}:")?;
        writeln!(w, "  - Max PageRank: {}", r.max_pagerank)?;
        writeln!(w, "  - Average PageRank: {}", r.avg_pagerank)?;
        write_ranking(w, "PageRank", &side.analysis.top_pagerank(graph, config.top_n_visual))?;
        writeln!(w, "  - Max Betweenness: {}", r.max_betweenness)?;
        writeln!(w, "  - Average Betweenness: {}", r.avg_betweenness)?;
        if let Some(note) = r.max_betweenness.note() {
            writeln!(w, "    ({note})")?;
        }
        write_ranking(
            w,
            "Betweenness",
            &side.analysis.top_betweenness(graph, config.top_n_visual),
        )?;
        writeln!(w)?;
    }

    writeln!(w, "3. CONNECTED COMPONENTS")?;
    writeln!(w, "-----------------------\n")?;
    for (title, _, side) in &sides {
        let r = &side.analysis.report;
        writeln!(w, "{title}:")?;
        writeln!(w, "  - Number of weakly connected components: {}", r.component_count)?;
        writeln!(w, "  - Size of largest component: {}", r.largest_component_size)?;
        match r.largest_component_percentage.value() {
            Some(p) => writeln!(w, "  - Percentage of nodes in largest component: {:.2}%", p * 100.0)?,
            None => writeln!(w, "  - Percentage of nodes in largest component: not computed")?,
        }
        if let Some(d) = &r.component_sizes {
            writeln!(w, "  - Component size distribution:")?;
            writeln!(w, "    * Min: {}", d.min)?;
            writeln!(w, "    * 25th percentile: {:.1}", d.p25)?;
            writeln!(w, "    * Median: {:.1}", d.median)?;
            writeln!(w, "    * 75th percentile: {:.1}", d.p75)?;
            writeln!(w, "    * Max: {}", d.max)?;
        }
        writeln!(w)?;
    }

    writeln!(w, "4. CLUSTERING AND COMMUNITIES")?;
    writeln!(w, "-----------------------------\n")?;
    for (title, _, side) in &sides {
        let r = &side.analysis.report;
        writeln!(w, "{title}:")?;
        writeln!(w, "  - Average clustering coefficient: {}", r.clustering_coefficient)?;
        writeln!(w, "  - Communities: {}", side.communities.count())?;
        writeln!(w, "  - Modularity: {:.6}", side.communities.modularity())?;
        if let Some(biggest) = side.communities.sizes().first() {
            writeln!(w, "  - Largest community: {} members", biggest.size)?;
        }
        writeln!(w)?;
    }

    writeln!(w, "5. PATH LENGTH ANALYSIS")?;
    writeln!(w, "----------------------\n")?;
    writeln!(w, "Average shortest path length in the largest component (undirected hops):")?;
    for (title, _, side) in &sides {
        let p = &side.analysis.report.avg_path_length;
        match p.note() {
            Some(note) => writeln!(w, "{title}: {p} [{note}]")?,
            None => writeln!(w, "{title}: {p}")?,
        }
    }
    writeln!(w)?;

    let cross = &outcome.crossposters;
    writeln!(w, "6. CROSS-POSTING ANALYSIS")?;
    writeln!(w, "-------------------------\n")?;
    writeln!(w, "Number of cross-posting users: {}", cross.crossposters.len())?;
    writeln!(w, "Percentage of all users: {:.2}%\n", cross.share_of_users * 100.0)?;
    if cross.is_empty() {
        writeln!(w, "No crossposters found for analysis\n")?;
    } else {
        writeln!(w, "Top {} cross-posters by combined influence (PageRank):", config.top_n_visual)?;
        for (i, rec) in cross.top(config.top_n_visual).iter().enumerate() {
            writeln!(w, "  {}. {}:", i + 1, rec.user)?;
            writeln!(w, "     - Misinformation PageRank: {:.6}", rec.misinfo_pagerank)?;
            writeln!(w, "     - Factual PageRank: {:.6}", rec.factual_pagerank)?;
            writeln!(w, "     - Total PageRank: {:.6}", rec.total_pagerank)?;
            writeln!(
                w,
                "     - Proportion of influence in misinformation network: {:.2}%\n",
                rec.misinfo_share() * 100.0
            )?;
        }
        writeln!(w, "Top subreddit pairs:")?;
        for (m, f, count) in cross.subreddit_pairs.most_common().into_iter().take(config.top_n_visual) {
            writeln!(w, "  - r/{m} -> r/{f}: {count} users")?;
        }
        writeln!(w)?;
    }

    writeln!(w, "7. SUBREDDIT PARTICIPATION ANALYSIS")?;
    writeln!(w, "----------------------------------\n")?;
    for (title, graph, _) in &sides {
        writeln!(w, "{title} Subreddits Participation:")?;
        let mut counts: Vec<(String, usize)> = graph.subreddit_interactions().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (subreddit, count) in counts {
            writeln!(w, "  - r/{subreddit}: {count} interactions")?;
        }
        writeln!(w)?;
    }

    writeln!(
        w,
        "Analysis completed in {:.2} seconds.",
        outcome.elapsed.as_secs_f64()
    )?;
    Ok(())
}

fn write_ranking<W: Write>(w: &mut W, label: &str, rows: &[(String, f64)]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(w, "  - Top {} Users by {label}:", rows.len())?;
    for (i, (user, score)) in rows.iter().enumerate() {
        writeln!(w, "      {}. {user}: {score:.6}", i + 1)?;
    }
    Ok(())
}

/// DOT export of the combined graph; misinformation-only users red,
/// factual-only blue, crossposters purple.
pub fn save_membership_dot(outcome: &AnalysisOutcome, path: impl AsRef<Path>) -> Result<()> {
    let combined = outcome.networks.combined.inner();
    let nets = &outcome.networks;

    let node_attrs = |_, (_, username): (NodeIndex, &String)| {
        let color = match (nets.misinfo.contains(username), nets.factual.contains(username)) {
            (true, true) => "purple",
            (true, false) => "red",
            _ => "blue",
        };
        format!("label=\"{username}\", style=filled, fillcolor=\"{color}\"")
    };
    let dot = Dot::with_attr_getters(
        combined,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, edge| format!("label=\"{}\"", edge.weight().interactions),
        &node_attrs,
    );

    fs::write(path, format!("{:?}", dot))?;
    Ok(())
}

/// DOT export of one graph with nodes shaded by community.
pub fn save_community_dot(
    graph: &InteractionGraph,
    communities: &CommunityAssignment,
    path: impl AsRef<Path>,
) -> Result<()> {
    let labels = communities.labels();
    let node_attrs = |_, (idx, username): (NodeIndex, &String)| {
        let comm_id = labels.get(idx.index()).copied().unwrap_or(0);
        let hue = ((comm_id * 60) % 360) as f32 / 360.0;
        format!("label=\"{username}\", style=filled, fillcolor=\"{hue:.3} 0.5 0.7\"")
    };
    let dot = Dot::with_attr_getters(
        graph.inner(),
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, edge| format!("label=\"{}\"", edge.weight().subreddit),
        &node_attrs,
    );

    fs::write(path, format!("{:?}", dot))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, InteractionEdge};
    use crate::pipeline::{AnalysisInput, run};

    fn outcome() -> AnalysisOutcome {
        let input = AnalysisInput {
            misinfo_edges: vec![
                InteractionEdge::new("u1", "u2", "sub_m", Category::Misinfo, "t1"),
                InteractionEdge::new("u2", "u1", "sub_m", Category::Misinfo, "t2"),
            ],
            factual_edges: vec![InteractionEdge::new("u2", "u3", "sub_f", Category::Factual, "t3")],
            ..AnalysisInput::default()
        };
        run(&input, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn text_report_has_every_section() {
        let mut buf = Vec::new();
        write_text_report(&outcome(), &AnalysisConfig::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for heading in [
            "1. BASIC NETWORK STATISTICS",
            "2. CENTRALIZATION METRICS",
            "3. CONNECTED COMPONENTS",
            "4. CLUSTERING AND COMMUNITIES",
            "5. PATH LENGTH ANALYSIS",
            "6. CROSS-POSTING ANALYSIS",
            "7. SUBREDDIT PARTICIPATION ANALYSIS",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("largest component (undirected hops)"));
        assert!(text.contains("r/sub_m: 2 interactions"));
        assert!(text.contains("1. u2:"));
    }

    #[test]
    fn membership_dot_colours_bridge_users() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.dot");
        save_membership_dot(&outcome(), &path).unwrap();
        let dot = fs::read_to_string(path).unwrap();
        assert!(dot.contains("label=\"u2\", style=filled, fillcolor=\"purple\""));
        assert!(dot.contains("fillcolor=\"red\""));
        assert!(dot.contains("fillcolor=\"blue\""));
    }

    #[test]
    fn community_dot_shades_nodes_by_community() {
        let outcome = outcome();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misinfo.dot");
        save_community_dot(&outcome.networks.misinfo, &outcome.misinfo.communities, &path).unwrap();
        let dot = fs::read_to_string(path).unwrap();
        assert!(dot.contains("label=\"u1\", style=filled, fillcolor=\"0.000 0.5 0.7\""));
        assert!(dot.contains("label=\"sub_m\""));
    }
}
