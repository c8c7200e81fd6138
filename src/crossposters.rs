//! Users active in both communities, their influence on each side, and which
//! subreddit pairs they connect.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::info;

use crate::graph::InteractionGraph;
use crate::metrics::NodeScores;
use crate::model::{ContentItem, UserId};

#[derive(Debug, Clone, Copy)]
pub struct CommunityView<'a> {
    pub graph: &'a InteractionGraph,
    /// PageRank already computed for `graph`; `None` when it could not be.
    pub pagerank: Option<&'a NodeScores>,
    pub content: &'a [ContentItem],
}

impl CommunityView<'_> {
    fn pagerank_of(&self, user: &str) -> f64 {
        self.pagerank.map_or(0.0, |pr| pr.of_user(self.graph, user))
    }

    fn degree_of(&self, user: &str) -> usize {
        self.graph.node_index(user).map_or(0, |i| self.graph.degree(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossposterRecord {
    pub user: UserId,
    pub misinfo_pagerank: f64,
    pub factual_pagerank: f64,
    pub misinfo_degree: usize,
    pub factual_degree: usize,
    pub total_pagerank: f64,
    pub total_degree: usize,
}

impl CrossposterRecord {
    /// Fraction of this user's PageRank that comes from the misinformation graph.
    pub fn misinfo_share(&self) -> f64 {
        if self.total_pagerank > 0.0 {
            self.misinfo_pagerank / self.total_pagerank
        } else {
            0.0
        }
    }
}

/// `(misinfo subreddit, factual subreddit)` -> number of crossposters active in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubredditPairs {
    counts: BTreeMap<(String, String), usize>,
}

impl SubredditPairs {
    pub fn get(&self, misinfo: &str, factual: &str) -> usize {
        self.counts
            .get(&(misinfo.to_string(), factual.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<(String, String), usize> {
        &self.counts
    }

    /// Pairs by descending count, then by pair.
    pub fn most_common(&self) -> Vec<(&str, &str, usize)> {
        let mut pairs: Vec<(&str, &str, usize)> = self
            .counts
            .iter()
            .map(|((m, f), &c)| (m.as_str(), f.as_str(), c))
            .collect();
        pairs.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
        pairs
    }
}

/// Result of [`find_crossposters`]. Empty, not an error, when no user bridges
/// the two graphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossposterAnalysis {
    pub crossposters: BTreeSet<UserId>,
    /// Ranked by descending `total_pagerank`; ties by username.
    pub records: Vec<CrossposterRecord>,
    pub subreddit_pairs: SubredditPairs,
    /// Content rows per subreddit written by crossposters, misinformation side.
    pub misinfo_subreddits: BTreeMap<String, usize>,
    pub factual_subreddits: BTreeMap<String, usize>,
    /// Crossposters as a fraction of all users in either graph.
    pub share_of_users: f64,
}

impl CrossposterAnalysis {
    pub fn is_empty(&self) -> bool {
        self.crossposters.is_empty()
    }

    pub fn top(&self, n: usize) -> &[CrossposterRecord] {
        &self.records[..n.min(self.records.len())]
    }
}

/// Intersect the two node sets, join per-graph influence, and cross-tabulate
/// subreddit pairs.
pub fn find_crossposters(misinfo: CommunityView<'_>, factual: CommunityView<'_>) -> CrossposterAnalysis {
    let crossposters: BTreeSet<UserId> = misinfo
        .graph
        .users()
        .filter(|u| factual.graph.contains(u))
        .map(str::to_string)
        .collect();

    let union = misinfo.graph.node_count() + factual.graph.node_count() - crossposters.len();
    let share_of_users = if union == 0 {
        0.0
    } else {
        crossposters.len() as f64 / union as f64
    };
    info!(
        crossposters = crossposters.len(),
        share = share_of_users,
        "found users active in both communities"
    );

    if crossposters.is_empty() {
        return CrossposterAnalysis::default();
    }

    let mut records: Vec<CrossposterRecord> = crossposters
        .iter()
        .map(|user| {
            let misinfo_pagerank = misinfo.pagerank_of(user);
            let factual_pagerank = factual.pagerank_of(user);
            let misinfo_degree = misinfo.degree_of(user);
            let factual_degree = factual.degree_of(user);
            CrossposterRecord {
                user: user.clone(),
                misinfo_pagerank,
                factual_pagerank,
                misinfo_degree,
                factual_degree,
                total_pagerank: misinfo_pagerank + factual_pagerank,
                total_degree: misinfo_degree + factual_degree,
            }
        })
        .collect();
    records.sort_by(|a, b| {
        b.total_pagerank
            .total_cmp(&a.total_pagerank)
            .then_with(|| a.user.cmp(&b.user))
    });

    let misinfo_by_author = subreddits_by_author(misinfo.content, &crossposters);
    let factual_by_author = subreddits_by_author(factual.content, &crossposters);

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for (author, m_subs) in &misinfo_by_author {
        let Some(f_subs) = factual_by_author.get(author) else {
            continue;
        };
        for m in m_subs {
            for f in f_subs {
                *counts.entry((m.to_string(), f.to_string())).or_insert(0) += 1;
            }
        }
    }

    CrossposterAnalysis {
        misinfo_subreddits: participation(misinfo.content, &crossposters),
        factual_subreddits: participation(factual.content, &crossposters),
        crossposters,
        records,
        subreddit_pairs: SubredditPairs { counts },
        share_of_users,
    }
}

/// Distinct subreddits each crossposter wrote in.
fn subreddits_by_author<'c>(
    content: &'c [ContentItem],
    crossposters: &BTreeSet<UserId>,
) -> HashMap<&'c str, BTreeSet<&'c str>> {
    let mut by_author: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for item in content {
        if crossposters.contains(&item.author) {
            by_author
                .entry(item.author.as_str())
                .or_default()
                .insert(item.subreddit.as_str());
        }
    }
    by_author
}

/// Raw content rows per subreddit, restricted to `authors`.
fn participation(content: &[ContentItem], authors: &BTreeSet<UserId>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in content {
        if authors.contains(&item.author) {
            *counts.entry(item.subreddit.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::pagerank;
    use crate::model::{Category, InteractionEdge};

    fn build(edges: &[(&str, &str, &str)], category: Category) -> InteractionGraph {
        let edges: Vec<_> = edges
            .iter()
            .map(|(s, t, sub)| InteractionEdge::new(*s, *t, *sub, category, "0"))
            .collect();
        InteractionGraph::from_edges(&edges, false).unwrap()
    }

    fn post(author: &str, sub: &str, category: Category) -> ContentItem {
        ContentItem::new(author, sub, category)
    }

    #[test]
    fn reply_chain_scenario() {
        let m = build(&[("u1", "u2", "sub_m"), ("u2", "u1", "sub_m")], Category::Misinfo);
        let f = build(&[("u2", "u3", "sub_f")], Category::Factual);
        let m_pr = pagerank(&m, 0.85, 100, 1e-6).unwrap();
        let f_pr = pagerank(&f, 0.85, 100, 1e-6).unwrap();

        let result = find_crossposters(
            CommunityView { graph: &m, pagerank: Some(&m_pr.scores), content: &[] },
            CommunityView { graph: &f, pagerank: Some(&f_pr.scores), content: &[] },
        );
        assert_eq!(result.crossposters.len(), 1);
        assert!(result.crossposters.contains("u2"));
        assert_eq!(result.records.len(), 1);

        let rec = &result.records[0];
        assert_eq!(rec.misinfo_degree, 2);
        assert_eq!(rec.factual_degree, 1);
        assert_eq!(rec.total_degree, 3);
        let expected = m_pr.scores.of_user(&m, "u2") + f_pr.scores.of_user(&f, "u2");
        assert_eq!(rec.total_pagerank, expected);
        assert!((result.share_of_users - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn pairs_count_distinct_subreddits_once_per_user() {
        let m = build(&[("x", "y", "A")], Category::Misinfo);
        let f = build(&[("x", "z", "C")], Category::Factual);
        let misinfo_posts = vec![
            post("x", "A", Category::Misinfo),
            post("x", "A", Category::Misinfo),
            post("x", "A", Category::Misinfo),
            post("x", "B", Category::Misinfo),
            post("y", "B", Category::Misinfo),
        ];
        let factual_posts = vec![post("x", "C", Category::Factual), post("x", "C", Category::Factual)];

        let result = find_crossposters(
            CommunityView { graph: &m, pagerank: None, content: &misinfo_posts },
            CommunityView { graph: &f, pagerank: None, content: &factual_posts },
        );
        assert_eq!(result.subreddit_pairs.get("A", "C"), 1);
        assert_eq!(result.subreddit_pairs.get("B", "C"), 1);
        assert_eq!(result.subreddit_pairs.len(), 2);
        // raw rows by crossposters only: y is not one
        assert_eq!(result.misinfo_subreddits.get("A"), Some(&3));
        assert_eq!(result.misinfo_subreddits.get("B"), Some(&1));
        assert_eq!(result.factual_subreddits.get("C"), Some(&2));
    }

    #[test]
    fn no_overlap_is_an_empty_result() {
        let m = build(&[("a", "b", "A")], Category::Misinfo);
        let f = build(&[("c", "d", "C")], Category::Factual);
        let result = find_crossposters(
            CommunityView { graph: &m, pagerank: None, content: &[] },
            CommunityView { graph: &f, pagerank: None, content: &[] },
        );
        assert!(result.is_empty());
        assert!(result.records.is_empty());
        assert!(result.subreddit_pairs.is_empty());
    }

    #[test]
    fn ranking_ties_fall_back_to_username() {
        let m = build(&[("b", "a", "A")], Category::Misinfo);
        let f = build(&[("a", "b", "C")], Category::Factual);
        let m_pr = pagerank(&m, 0.85, 100, 1e-6).unwrap();
        let f_pr = pagerank(&f, 0.85, 100, 1e-6).unwrap();
        let result = find_crossposters(
            CommunityView { graph: &m, pagerank: Some(&m_pr.scores), content: &[] },
            CommunityView { graph: &f, pagerank: Some(&f_pr.scores), content: &[] },
        );
        let users: Vec<&str> = result.records.iter().map(|r| r.user.as_str()).collect();
        assert_eq!(users, vec!["a", "b"]);
        assert_eq!(result.top(1).len(), 1);
        assert_eq!(result.top(50).len(), 2);
    }

    #[test]
    fn most_common_orders_by_count_then_pair() {
        let mut counts = BTreeMap::new();
        counts.insert(("b".to_string(), "x".to_string()), 2);
        counts.insert(("a".to_string(), "y".to_string()), 2);
        counts.insert(("a".to_string(), "x".to_string()), 5);
        let pairs = SubredditPairs { counts };
        assert_eq!(
            pairs.most_common(),
            vec![("a", "x", 5), ("a", "y", 2), ("b", "x", 2)]
        );
    }
}
