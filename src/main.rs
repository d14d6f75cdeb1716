//! kitchen-episode: run and replay tomato-cooking episodes.
//!
//! Subcommands:
//!
//! - `run`      -- Run episodes with a baseline policy and record trajectories
//! - `catalog`  -- Load and print the object catalog

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kitchen_episode::agent::{RandomAgent, ScriptedAgent};
use kitchen_episode::catalog::ObjectCatalog;
use kitchen_episode::config::EpisodeConfig;
use kitchen_episode::env::mock::MockKitchen;
use kitchen_episode::env::thor::ThorSimulator;
use kitchen_episode::env::Simulator;
use kitchen_episode::episode::{Action, EpisodeController};
use kitchen_episode::trajectory::{TrajectoryBuffer, TrajectoryCollector};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// kitchen-episode: run and replay tomato-cooking episodes
#[derive(Parser)]
#[command(name = "kitchen-episode", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the in-process mock kitchen instead of the THOR bridge.
    #[arg(long, global = true, default_value_t = true, action = clap::ArgAction::Set)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum PolicyChoice {
    Random,
    Scripted,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes and record their trajectories.
    Run {
        /// Scene to load for every episode.
        #[arg(long, default_value = "FloorPlan1")]
        scene: String,

        /// Number of episodes to run.
        #[arg(long, default_value_t = 1)]
        episodes: usize,

        /// Which baseline policy chooses actions.
        #[arg(long, default_value = "scripted")]
        policy: PolicyChoice,

        /// Comma-separated action names for the scripted policy.
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "RotateRight,LookTomato,RotateRight,LookMicrowave,Done"
        )]
        actions: Vec<String>,

        /// Path to save the recorded trajectories as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Slowly replay the last episode after the run.
        #[arg(long)]
        replay: bool,

        /// Skip loading the object catalog from disk.
        #[arg(long)]
        no_catalog: bool,
    },

    /// Load the object catalog and print it.
    Catalog,
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EpisodeConfig::load_from_file(path)?,
        None => EpisodeConfig::default(),
    };

    match cli.command {
        Commands::Run {
            scene,
            episodes,
            policy,
            actions,
            output,
            replay,
            no_catalog,
        } => {
            let opts = RunOptions {
                scene,
                episodes,
                policy,
                actions,
                output,
                replay,
                no_catalog,
            };
            if cli.mock {
                tracing::info!("Using mock kitchen");
                let kitchen = MockKitchen::new(config.simulator.worker_seed())
                    .with_randomized_objects(config.simulator.randomize_objects);
                cmd_run(kitchen, &config, opts).await
            } else {
                tracing::info!(url = %config.simulator.bridge_url, "Using THOR bridge");
                cmd_run(ThorSimulator::new(&config.simulator), &config, opts).await
            }
        }
        Commands::Catalog => cmd_catalog(&config),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

struct RunOptions {
    scene: String,
    episodes: usize,
    policy: PolicyChoice,
    actions: Vec<String>,
    output: Option<PathBuf>,
    replay: bool,
    no_catalog: bool,
}

async fn cmd_run<S: Simulator>(
    simulator: S,
    config: &EpisodeConfig,
    opts: RunOptions,
) -> Result<()> {
    let catalog = if opts.no_catalog {
        ObjectCatalog::default()
    } else {
        ObjectCatalog::from_config(&config.catalog)?
    };
    let mut controller = EpisodeController::new(simulator, catalog, config);
    let collector = TrajectoryCollector::from_config(&config.run);
    let scenes = vec![opts.scene.clone(); opts.episodes];

    let trajectories = match opts.policy {
        PolicyChoice::Scripted => {
            let script = parse_actions(&opts.actions)?;
            let mut agent = ScriptedAgent::from_actions(controller.action_set(), &script)?;
            collector
                .collect_episodes(&mut controller, &mut agent, &scenes)
                .await?
        }
        PolicyChoice::Random => {
            let mut agent = RandomAgent::new(config.simulator.worker_seed());
            collector
                .collect_episodes(&mut controller, &mut agent, &scenes)
                .await?
        }
    };

    let mut buffer = TrajectoryBuffer::new();
    buffer.extend(trajectories);
    tracing::info!(
        episodes = buffer.len(),
        success_rate = format!("{:.2}%", buffer.success_rate() * 100.0),
        mean_reward = format!("{:.3}", buffer.mean_reward()),
        "Run complete"
    );

    if let Some(output) = &opts.output {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        buffer.save_to_file(output)?;
    }

    if opts.replay && !buffer.is_empty() {
        let delay = Duration::from_millis(config.run.replay_delay_ms);
        controller.slow_replay(delay).await?;
        tracing::info!(success = controller.success(), "Replay finished");
    }

    Ok(())
}

fn cmd_catalog(config: &EpisodeConfig) -> Result<()> {
    let catalog = ObjectCatalog::from_config(&config.catalog)
        .context("Failed to load object catalog")?;

    println!("Object catalog: {} names", catalog.len());
    println!("  Interactable list: {}", config.catalog.int_objects.display());
    println!("  Receptacle list:   {}", config.catalog.rec_objects.display());
    println!();
    for name in catalog.names() {
        println!("  {name}");
    }
    Ok(())
}

fn parse_actions(names: &[String]) -> Result<Vec<Action>> {
    names
        .iter()
        .map(|name| match Action::from_str_loose(name) {
            Some(action) => Ok(action),
            None => bail!("unknown action '{name}'"),
        })
        .collect()
}
