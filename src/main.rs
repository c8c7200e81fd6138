use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use community_bridges::{AnalysisConfig, InputPaths, pipeline, report, synth};

#[derive(Parser, Debug)]
#[command(
    name = "community-bridges",
    about = "Compare misinformation and factual reply networks and find bridge users"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full analysis on four CSV tables.
    Analyze {
        #[arg(long)]
        misinfo_edges: PathBuf,
        #[arg(long)]
        factual_edges: PathBuf,
        #[arg(long)]
        misinfo_content: PathBuf,
        #[arg(long)]
        factual_content: PathBuf,
        /// Directory for CSV, text and DOT exports
        #[arg(long, default_value = "results")]
        out: PathBuf,
        /// Path to config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a synthetic two-community dataset.
    Generate {
        #[arg(long, default_value = "synthetic_data")]
        out: PathBuf,
        /// Users per community
        #[arg(long, default_value_t = 140)]
        users: usize,
        /// Reply edges per community
        #[arg(long, default_value_t = 500)]
        interactions: usize,
        /// Fraction of factual users that also appear on the misinformation side
        #[arg(long, default_value_t = 0.1)]
        bridge_share: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            misinfo_edges,
            factual_edges,
            misinfo_content,
            factual_content,
            out,
            config,
        } => {
            let config = match config {
                Some(path) => AnalysisConfig::from_json_file(path)?,
                None => AnalysisConfig::default(),
            };
            let paths = InputPaths {
                misinfo_edges,
                factual_edges,
                misinfo_content,
                factual_content,
            };
            let outcome = pipeline::run_from_paths(&paths, &config)?;
            let written = report::export_all(&outcome, &config, &out)?;

            println!(
                "Misinformation: {} nodes, {} edges, {} communities",
                outcome.misinfo.analysis.report.nodes,
                outcome.misinfo.analysis.report.edges,
                outcome.misinfo.communities.count()
            );
            println!(
                "Factual: {} nodes, {} edges, {} communities",
                outcome.factual.analysis.report.nodes,
                outcome.factual.analysis.report.edges,
                outcome.factual.communities.count()
            );
            println!("Crossposters: {}", outcome.crossposters.crossposters.len());
            println!("Wrote {} files to {}", written.len(), out.display());
        }
        Commands::Generate {
            out,
            users,
            interactions,
            bridge_share,
            seed,
        } => {
            let spec = synth::SynthSpec {
                users,
                interactions,
                bridge_share,
                seed,
            };
            let input = synth::generate(&spec);
            let paths = synth::write_dataset(&input, &out)?;
            println!("Wrote synthetic tables:");
            for path in [
                &paths.misinfo_edges,
                &paths.factual_edges,
                &paths.misinfo_content,
                &paths.factual_content,
            ] {
                println!("  {}", path.display());
            }
        }
    }

    Ok(())
}
