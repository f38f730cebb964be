//! Training environment for policy evolution
//!
//! Main training loop: evaluate a generation, log its statistics, reproduce.
//! Optionally previews the champion and writes a JSON stats report.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use serpentine_core::{Cohort, DiscardFitness, DisplayMode, PresentationAdapter, SimConfig};
use serpentine_neuro::{FeedForwardPolicy, GenerationStats, Population};

use super::text_renderer::TextRenderer;
use crate::config::TrainingConfig;

/// Everything a finished (or cancelled) run reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub seed: u64,
    pub config: TrainingConfig,
    pub generations: Vec<GenerationStats>,
    pub champion_id: Option<u64>,
    pub champion_fitness: Option<f32>,
    /// True when the run stopped before the configured generation count
    pub cancelled: bool,
}

/// Headless training loop over one population
pub struct TrainingEnv {
    config: TrainingConfig,
    sim: SimConfig,
    seed: u64,
    population: Population,
    history: Vec<GenerationStats>,
    abort: Arc<AtomicBool>,
    adapter: PresentationAdapter,
}

impl TrainingEnv {
    /// Validate the configuration and seed the initial population
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.run.seed.unwrap_or_else(|| rand::rng().random());
        let population = Population::new(config.evolution_config(), seed)
            .context("Failed to create initial population")?;

        Ok(Self {
            sim: config.sim_config(),
            config,
            seed,
            population,
            history: Vec::new(),
            abort: Arc::new(AtomicBool::new(false)),
            adapter: PresentationAdapter::new(DisplayMode::BestOnly),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Flag that cancels the run; the current generation flushes and stops
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Create a progress bar style
    fn progress_style() -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"))
    }

    /// Run the full training loop
    pub fn run(&mut self) -> Result<TrainingReport> {
        let generations = self.config.evolution.generations;
        let preview_interval = self.config.run.preview_interval;

        let pb = ProgressBar::new(generations as u64);
        pb.set_style(Self::progress_style()?);

        log::info!(
            "Starting training: {} generations, {} population, {}x{} grid, seed {}",
            generations,
            self.config.evolution.population,
            self.sim.width,
            self.sim.height,
            self.seed
        );

        for generation_num in 0..generations {
            if self.abort.load(Ordering::Relaxed) {
                break;
            }

            let stats = self
                .population
                .evaluate(&self.sim, &self.abort)
                .with_context(|| format!("Generation {generation_num} failed"))?;

            log::info!(
                "Gen {}: best={:.2}, avg={:.2}, score={}, ticks={}, deaths wall/self/timeout={}/{}/{}, filled={}",
                stats.generation,
                stats.best_fitness,
                stats.mean_fitness,
                stats.best_score,
                stats.ticks,
                stats.deaths_wall,
                stats.deaths_self,
                stats.deaths_timeout,
                stats.filled_grid
            );
            pb.set_message(format!("best={:.2}", stats.best_fitness));
            pb.inc(1);

            let aborted = stats.aborted;
            self.history.push(stats);
            if aborted {
                log::warn!("Training cancelled during generation {}", generation_num);
                break;
            }

            let is_last = generation_num + 1 == generations;
            if preview_interval > 0
                && ((generation_num + 1) % preview_interval == 0 || is_last)
                && let Some(preview) = self.preview_champion()?
            {
                pb.println(preview);
            }

            if !is_last {
                self.population.reproduce();
            }
        }

        pb.finish_with_message("done");

        let report = self.report();
        if let Some(path) = &self.config.run.report {
            write_report(path, &report)?;
            log::info!("Wrote training report to {}", path.display());
        }

        Ok(report)
    }

    /// Snapshot of the run so far
    pub fn report(&self) -> TrainingReport {
        let champion = self.population.champion();
        TrainingReport {
            seed: self.seed,
            config: self.config.clone(),
            generations: self.history.clone(),
            champion_id: champion.map(|c| c.id),
            champion_fitness: champion.map(|c| c.fitness),
            cancelled: self.history.last().is_some_and(|s| s.aborted)
                || self.history.len() < self.config.evolution.generations,
        }
    }

    /// Replay the champion alone and render its last live frame
    pub fn preview_champion(&self) -> Result<Option<String>> {
        let Some(champion) = self.population.champion() else {
            return Ok(None);
        };
        let policy = FeedForwardPolicy::from_genome(champion)
            .context("Failed to build champion policy")?;

        let rng = Xoshiro256StarStar::seed_from_u64(self.seed ^ champion.id);
        let mut cohort = Cohort::new(self.sim.clone(), [(&policy, DiscardFitness)], rng)
            .context("Failed to spawn preview cohort")?;

        let mut renderer = TextRenderer::new(self.sim.width as usize, self.sim.height as usize);
        let mut last_frame = None;
        let outcome = cohort
            .run_observed(&self.abort, |report, frame| {
                let sprites = self.adapter.sprites(frame);
                if !sprites.is_empty() {
                    renderer.render(&sprites);
                    last_frame = Some((report.tick, renderer.to_text()));
                }
            })
            .context("Champion replay failed")?;

        let Some((tick, text)) = last_frame else {
            return Ok(None);
        };
        let removal = outcome.removals.first();
        Ok(Some(format!(
            "Champion {} (fitness {:.2}): score {}, {} at tick {}\n{}",
            champion.id,
            champion.fitness,
            removal.map_or(0, |r| r.score),
            removal.map_or("alive", |r| r.status.name()),
            tick,
            text
        )))
    }
}

/// Write a report as pretty JSON, creating parent directories
pub fn write_report(path: &Path, report: &TrainingReport) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create report directory")?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).context("Failed to write report file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TrainingConfig {
        let mut config = TrainingConfig::default();
        config.world.width = 8;
        config.world.height = 8;
        config.world.idle_ticks = Some(30);
        config.evolution.population = 6;
        config.evolution.generations = 3;
        config.evolution.elitism = 1;
        config.run.seed = Some(1234);
        config
    }

    #[test]
    fn test_run_records_every_generation() {
        let mut env = TrainingEnv::new(small_config()).unwrap();
        let report = env.run().unwrap();

        assert_eq!(report.generations.len(), 3);
        assert_eq!(env.history().len(), 3);
        assert_eq!(report.seed, 1234);
        assert!(!report.cancelled);
        assert!(report.champion_id.is_some());
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let mut config = small_config();
        config.evolution.population = 1;
        assert!(TrainingEnv::new(config).is_err());
    }

    #[test]
    fn test_abort_before_run_cancels() {
        let mut env = TrainingEnv::new(small_config()).unwrap();
        env.abort_handle().store(true, Ordering::Relaxed);

        let report = env.run().unwrap();
        assert!(report.generations.is_empty());
        assert!(report.cancelled);
    }

    #[test]
    fn test_abort_in_final_generation_reports_cancelled() {
        let mut config = small_config();
        config.evolution.generations = 1;
        let mut env = TrainingEnv::new(config).unwrap();

        // The only generation is cut short, yet still lands in the history
        let interrupted = AtomicBool::new(true);
        let stats = env.population.evaluate(&env.sim, &interrupted).unwrap();
        assert!(stats.aborted);
        env.history.push(stats);

        let report = env.report();
        assert_eq!(report.generations.len(), 1);
        assert!(report.cancelled);
    }

    #[test]
    fn test_preview_renders_grid() {
        let mut env = TrainingEnv::new(small_config()).unwrap();
        assert!(env.preview_champion().unwrap().is_none());

        env.run().unwrap();
        let preview = env.preview_champion().unwrap().unwrap();
        let grid: Vec<&str> = preview.lines().skip(1).collect();
        assert_eq!(grid.len(), 8);
        assert!(grid.iter().all(|row| row.chars().count() == 8));
    }
}
