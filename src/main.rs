//! qualmix CLI - Synthetic qualitative coding and mixed-methods reporting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qualmix::{Codebook, Config, Pipeline};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "qualmix")]
#[command(version)]
#[command(about = "Synthetic qualitative survey coding with mixed-methods reporting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline
    Run {
        /// Number of synthetic responses
        #[arg(short, long)]
        responses: Option<usize>,

        /// Number of survey waves (1-3)
        #[arg(short, long)]
        waves: Option<u8>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Base directory for data/, docs/ and reports/
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,

    /// Print the codebook as Markdown
    Codebook,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {path:?}")),
        None => Ok(Config::default()),
    }
}

fn print_example_config() {
    let example = r#"# qualmix configuration file

[generation]
responses = 2000
waves = 3       # 1-3 (January through March 2024)
seed = 42

[coding]
exemplars_per_theme = 5

[reliability]
# Probability that the simulated second coder flips a label
base_flip = 0.05
ambiguous_flip = 0.08
ambiguous_themes = ["AFFORDABILITY", "FOOD_INSECURITY"]

[output]
base_dir = "."
figures = true
factsheet = true
"#;
    println!("{example}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Example => print_example_config(),

        Commands::Codebook => print!("{}", Codebook::standard().to_markdown()),

        Commands::Validate => {
            let config = load_config(cli.config.as_deref())?;
            config.validate().context("Invalid configuration")?;
            config
                .validate_themes(&Codebook::standard())
                .context("Invalid reliability themes")?;

            info!("Configuration is valid");
            info!(
                "  Generation: {} responses over {} waves (seed {})",
                config.generation.responses, config.generation.waves, config.generation.seed
            );
            info!(
                "  Second coder: {:.0}% base flips, {:.0}% on {}",
                config.reliability.base_flip * 100.0,
                config.reliability.ambiguous_flip * 100.0,
                config.reliability.ambiguous_themes.join(", ")
            );
            info!("  Output: {:?}", config.output.base_dir);
        }

        Commands::Run {
            responses,
            waves,
            seed,
            out,
            no_progress,
        } => {
            let mut config = load_config(cli.config.as_deref())?;

            // CLI flags override the file
            if let Some(responses) = responses {
                config.generation.responses = responses;
            }
            if let Some(waves) = waves {
                config.generation.waves = waves;
            }
            if let Some(seed) = seed {
                config.generation.seed = seed;
            }
            if let Some(out) = out {
                config.output.base_dir = out;
            }

            let pipeline = Pipeline::new(config, Codebook::standard())
                .context("Invalid configuration")?
                .with_progress(!no_progress);
            let stats = pipeline.run().context("Pipeline run failed")?;
            let layout = pipeline.layout();

            println!("\n=== qualmix Run Complete ===");
            println!("Responses:   {}", stats.total_responses);
            println!("Coded:       {}", stats.coded_responses);
            println!("Coverage:    {:.1}%", stats.coverage_rate * 100.0);
            println!("Themes/resp: {:.2}", stats.themes_per_response);
            println!("Pairs:       {}", stats.cooccurring_pairs);
            println!("Exemplars:   {}", stats.exemplars);
            println!("Agreement:   {:.1}%", stats.mean_agreement * 100.0);
            println!("Kappa:       {:.2}", stats.mean_kappa);
            println!("Figures:     {}", stats.figures);
            println!("Runtime:     {:.1}s", stats.runtime_secs);
            println!("Brief:       {:?}", layout.brief());
            println!("Manifest:    {:?}", layout.manifest());
        }
    }

    Ok(())
}
