//! hitgraph command line.
//!
//! Processes a hit dataset into k-NN graphs, trains a graph model on it and
//! evaluates checkpoints.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use burn::config::Config;
use clap::{Parser, Subcommand};

use hitgraph_train::logging::init_logger;
use hitgraph_train::training::{find_latest_checkpoint, CHECKPOINT_DIR};
use hitgraph_train::{RunConfig, Session};

#[cfg(feature = "wgpu")]
type Backend = burn::backend::Autodiff<burn::backend::Wgpu>;
#[cfg(not(feature = "wgpu"))]
type Backend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Graph neural network training on detector hit clouds
#[derive(Parser)]
#[command(name = "hitgraph", version, about, long_about = None)]
struct Cli {
    /// Run configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug preset: small dataset, 3 epochs, 7/3 split, forced reprocessing.
    /// Applied over --config; --epochs still takes precedence
    #[arg(long)]
    debug: bool,

    /// Dataset root containing raw/
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Directory for checkpoints and summaries
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Checkpoint to restore (path without extension)
    #[arg(long)]
    load_checkpoint: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the processed graph cache and print the split
    Process,
    /// Train, then evaluate on the validation subset
    Train,
    /// Evaluate a checkpoint (latest in the output directory by default)
    Evaluate,
    /// Write the effective configuration to FILE
    InitConfig {
        /// Output file
        file: PathBuf,
    },
}

fn run_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let dataset = cli.dataset.clone().unwrap_or_else(|| PathBuf::from("data"));
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .map_err(|e| anyhow!("cannot load {}: {}", path.display(), e))?,
        None if cli.debug => RunConfig::debug(&dataset),
        None => RunConfig::production(&dataset),
    };

    if let Some(dataset) = &cli.dataset {
        config.dataset = dataset.clone();
    }
    if cli.debug {
        config = config.into_debug();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(path) = &cli.load_checkpoint {
        config.load_checkpoint = Some(path.clone());
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = run_config(&cli)?;
    init_logger(config.debug);

    log::info!("hitgraph v{}", env!("CARGO_PKG_VERSION"));

    if let Command::InitConfig { file } = &cli.command {
        config
            .save(file)
            .with_context(|| format!("cannot write {}", file.display()))?;
        log::info!("Wrote configuration to {}", file.display());
        return Ok(());
    }

    if matches!(cli.command, Command::Evaluate) && config.load_checkpoint.is_none() {
        let dir = config.output_dir.join(CHECKPOINT_DIR);
        let latest = find_latest_checkpoint(&dir)
            .with_context(|| format!("no checkpoint found in {}", dir.display()))?;
        config.load_checkpoint = Some(latest);
    }

    let mut session = Session::<Backend>::new(config, Default::default())?;

    match cli.command {
        Command::Process => {
            let splits = session.get_dataset()?;
            log::info!(
                "{} graphs: train {:?}, validation {:?}",
                splits.full.len(),
                splits.train.indices(),
                splits.valid.indices()
            );
        }
        Command::Train => {
            let summary = session.train()?;
            if let Some(path) = &summary.last_checkpoint {
                log::info!("Last checkpoint: {}", path.display());
            }
            let eval = session.evaluate()?;
            println!("{}", serde_json::to_string_pretty(&eval)?);
        }
        Command::Evaluate => {
            let eval = session.evaluate()?;
            println!("{}", serde_json::to_string_pretty(&eval)?);
        }
        Command::InitConfig { .. } => {}
    }

    session.finish();
    Ok(())
}
