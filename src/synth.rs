use std::collections::HashSet;
use std::fs;
use std::path::Path;

use csv::Writer;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::info;

use crate::config::InputPaths;
use crate::error::Result;
use crate::model::{Category, ContentItem, InteractionEdge, UserId};
use crate::pipeline::AnalysisInput;

const MISINFO_SUBREDDITS: [&str; 3] = ["conspiracy", "debatevaccines", "lockdownskepticism"];
const FACTUAL_SUBREDDITS: [&str; 4] = ["coronavirus", "science", "medicine", "askscience"];

/// Deterministic rng for item `i` of a batch: same seed, one stream per item.
fn item_rng(seed: u64, i: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(i as u64);
    rng
}

pub struct UsernameGenerator {
    prefixes: Vec<&'static str>,
    suffixes: Vec<&'static str>,
    seed: u64,
}

impl UsernameGenerator {
    pub fn new(seed: u64) -> Self {
        UsernameGenerator {
            prefixes: vec![
                "dark", "shadow", "light", "blue", "red", "green", "gold", "silver",
                "phantom", "ninja", "stealth", "epic", "legend", "super", "mega",
            ],
            suffixes: vec![
                "warrior", "hunter", "mage", "slayer", "knight", "rogue", "wizard",
                "assassin", "lord", "king", "queen", "master", "pro", "noob", "gamer",
            ],
            seed,
        }
    }

    /// Up to `count` distinct usernames. Drawn in parallel, deduplicated in
    /// draw order, so the batch only depends on the seed.
    pub fn generate_unique_batch(&self, count: usize) -> Vec<UserId> {
        let drawn: Vec<UserId> = (0..count)
            .into_par_iter()
            .map(|i| {
                let mut rng = item_rng(self.seed, i);
                let prefix = self.prefixes.choose(&mut rng).copied().unwrap_or("user");
                let suffix = self.suffixes.choose(&mut rng).copied().unwrap_or("");
                let num = rng.gen_range(1..10_000);
                format!("{prefix}{suffix}{num}")
            })
            .collect();

        let mut used = HashSet::new();
        drawn.into_iter().filter(|name| used.insert(name.clone())).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SynthSpec {
    /// Users per community before bridging.
    pub users: usize,
    pub interactions: usize,
    /// Fraction of factual users replaced by misinformation users.
    pub bridge_share: f64,
    pub seed: u64,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            users: 140,
            interactions: 500,
            bridge_share: 0.1,
            seed: 42,
        }
    }
}

fn interactions(
    users: &[UserId],
    subreddits: &[&str],
    category: Category,
    count: usize,
    seed: u64,
) -> (Vec<InteractionEdge>, Vec<ContentItem>) {
    if users.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    let rows: Vec<(InteractionEdge, ContentItem)> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = item_rng(seed, i);
            let source = rng.gen_range(0..users.len());
            // never a self-reply
            let target = (source + rng.gen_range(1..users.len())) % users.len();
            let subreddit = subreddits[rng.gen_range(0..subreddits.len())];
            let created = 1_700_000_000u64 + rng.gen_range(0..31_536_000u64);
            let edge = InteractionEdge::new(
                users[source].clone(),
                users[target].clone(),
                subreddit,
                category,
                created.to_string(),
            );
            let comment = ContentItem {
                id: format!("{}_{i}", &category.as_str()[..1]),
                author: users[source].clone(),
                subreddit: subreddit.to_string(),
                category,
                created_utc: created.to_string(),
            };
            (edge, comment)
        })
        .collect();
    rows.into_iter().unzip()
}

/// Two communities of `spec.users` users each, sharing roughly
/// `spec.bridge_share` of the factual side with the misinformation side.
pub fn generate(spec: &SynthSpec) -> AnalysisInput {
    let names = UsernameGenerator::new(spec.seed).generate_unique_batch(spec.users * 3);
    let split = names.len() / 2;
    let misinfo_users: Vec<UserId> = names[..split.min(spec.users)].to_vec();
    let mut factual_users: Vec<UserId> = names[split..].iter().take(spec.users).cloned().collect();

    let bridges = ((factual_users.len() as f64) * spec.bridge_share.clamp(0.0, 1.0)).round() as usize;
    for (slot, user) in factual_users.iter_mut().zip(&misinfo_users).take(bridges) {
        *slot = user.clone();
    }

    let (misinfo_edges, misinfo_content) = interactions(
        &misinfo_users,
        &MISINFO_SUBREDDITS,
        Category::Misinfo,
        spec.interactions,
        spec.seed ^ 0x6d69,
    );
    let (factual_edges, factual_content) = interactions(
        &factual_users,
        &FACTUAL_SUBREDDITS,
        Category::Factual,
        spec.interactions,
        spec.seed ^ 0x6661,
    );
    info!(
        misinfo_users = misinfo_users.len(),
        factual_users = factual_users.len(),
        bridges,
        "generated synthetic communities"
    );

    AnalysisInput {
        misinfo_edges,
        factual_edges,
        misinfo_content,
        factual_content,
    }
}

fn write_edges(path: &Path, edges: &[InteractionEdge]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["source", "target", "interaction_type", "subreddit", "category", "created_utc"])?;
    for e in edges {
        wtr.write_record([
            e.source.as_str(),
            e.target.as_str(),
            "comment_reply",
            e.subreddit.as_str(),
            e.category.as_str(),
            e.created_utc.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_content(path: &Path, items: &[ContentItem]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["id", "type", "author", "subreddit", "created_utc", "category"])?;
    for c in items {
        wtr.write_record([
            c.id.as_str(),
            "comment",
            c.author.as_str(),
            c.subreddit.as_str(),
            c.created_utc.as_str(),
            c.category.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_dataset(input: &AnalysisInput, dir: impl AsRef<Path>) -> Result<InputPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let paths = InputPaths {
        misinfo_edges: dir.join("network_edges_misinformation.csv"),
        factual_edges: dir.join("network_edges_factual.csv"),
        misinfo_content: dir.join("all_content_misinformation.csv"),
        factual_content: dir.join("all_content_factual.csv"),
    };
    write_edges(&paths.misinfo_edges, &input.misinfo_edges)?;
    write_edges(&paths.factual_edges, &input.factual_edges)?;
    write_content(&paths.misinfo_content, &input.misinfo_content)?;
    write_content(&paths.factual_content, &input.factual_content)?;
    info!(dir = %dir.display(), "wrote synthetic dataset");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_unique_and_seeded() {
        let a = UsernameGenerator::new(5).generate_unique_batch(200);
        let b = UsernameGenerator::new(5).generate_unique_batch(200);
        assert_eq!(a, b);
        let distinct: HashSet<_> = a.iter().collect();
        assert_eq!(distinct.len(), a.len());
    }

    #[test]
    fn generated_edges_have_no_self_replies() {
        let input = generate(&SynthSpec::default());
        assert_eq!(input.misinfo_edges.len(), 500);
        assert!(input.misinfo_edges.iter().all(|e| !e.is_self_loop()));
        assert!(input.factual_edges.iter().all(|e| e.category == Category::Factual));
        assert_eq!(input.factual_content.len(), input.factual_edges.len());
    }

    #[test]
    fn same_seed_same_dataset() {
        let spec = SynthSpec {
            users: 30,
            interactions: 80,
            ..SynthSpec::default()
        };
        let a = generate(&spec);
        let b = generate(&spec);
        assert_eq!(a.misinfo_edges, b.misinfo_edges);
        assert_eq!(a.factual_content, b.factual_content);
    }
}
