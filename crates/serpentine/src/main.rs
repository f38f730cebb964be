use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serpentine::{TrainingConfig, TrainingEnv};
use serpentine_core::SpawnRule;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./serpentine.ron
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run headless evolution training
    Train(TrainArgs),
    /// Print the effective configuration as RON
    ShowConfig(TrainArgs),
}

/// Flags layered over the loaded configuration
#[derive(Args, Debug)]
struct TrainArgs {
    /// Number of generations to train
    #[arg(long)]
    generations: Option<usize>,

    /// Population size per generation
    #[arg(long)]
    population: Option<usize>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<i32>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<i32>,

    /// Spawn rule: centered, random
    #[arg(long)]
    spawn: Option<String>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output path for the JSON stats report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print a champion replay every N generations
    #[arg(long)]
    preview: Option<usize>,
}

impl TrainArgs {
    fn apply(&self, config: &mut TrainingConfig) {
        if let Some(generations) = self.generations {
            config.evolution.generations = generations;
        }
        if let Some(population) = self.population {
            config.evolution.population = population;
        }
        if let Some(width) = self.width {
            config.world.width = width;
        }
        if let Some(height) = self.height {
            config.world.height = height;
        }
        if let Some(spawn) = &self.spawn {
            config.world.spawn = spawn.parse().unwrap_or_else(|e| {
                log::warn!("{}, using centered", e);
                SpawnRule::Centered
            });
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
        if self.report.is_some() {
            config.run.report = self.report.clone();
        }
        if let Some(preview) = self.preview {
            config.run.preview_interval = preview;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => TrainingConfig::load_from(Some(path)),
        None => TrainingConfig::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Train(args) => {
            args.apply(&mut config);
            run_training(config)
        }
        Command::ShowConfig(args) => {
            args.apply(&mut config);
            println!("{}", config.to_ron()?);
            Ok(())
        }
    }
}

fn run_training(config: TrainingConfig) -> Result<()> {
    log::info!("Starting headless evolution training");
    log::info!("  Grid: {}x{}", config.world.width, config.world.height);
    log::info!("  Generations: {}", config.evolution.generations);
    log::info!("  Population: {}", config.evolution.population);
    if let Some(report) = &config.run.report {
        log::info!("  Report: {}", report.display());
    }

    let mut env = TrainingEnv::new(config)?;

    // Ctrl-C finishes the current generation and keeps its stats
    let abort = env.abort_handle();
    ctrlc::set_handler(move || {
        log::warn!("Interrupt received, stopping after the current generation");
        abort.store(true, Ordering::Relaxed);
    })
    .context("Failed to install interrupt handler")?;

    let report = env.run()?;
    if report.cancelled {
        log::warn!("Training cancelled; report covers {} generations", report.generations.len());
    }

    match (report.champion_id, report.champion_fitness) {
        (Some(id), Some(fitness)) => {
            log::info!(
                "Training finished after {} generations; champion {} with fitness {:.2}",
                report.generations.len(),
                id,
                fitness
            );
        }
        _ => log::info!("Training finished without evaluating a generation"),
    }

    Ok(())
}
