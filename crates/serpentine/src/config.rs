//! Training configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `serpentine.ron` file (if exists)
//! 3. Environment variables prefixed with `SERPENTINE_`
//! 4. Command-line flags, applied by the binary after loading
//!
//! Example environment variable: `SERPENTINE_EVOLUTION__POPULATION=80`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serpentine_core::{FitnessPolicy, IdleTimeout, SimConfig, SpawnRule};
use serpentine_neuro::{EvolutionConfig, MutationConfig};

/// Main training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingConfig {
    #[serde(default)]
    pub world: WorldSection,

    #[serde(default)]
    pub evolution: EvolutionSection,

    #[serde(default)]
    pub fitness: FitnessSection,

    #[serde(default)]
    pub run: RunSection,
}

/// Grid and agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSection {
    pub width: i32,
    pub height: i32,
    pub initial_length: usize,
    pub spawn: SpawnRule,
    /// Fixed idle budget in ticks; when unset the budget scales with area
    #[serde(default)]
    pub idle_ticks: Option<u32>,
    /// Idle budget as a multiple of `width * height`
    pub idle_area_factor: f32,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            initial_length: 3,
            spawn: SpawnRule::Centered,
            idle_ticks: None,
            idle_area_factor: 1.0,
        }
    }
}

/// Population and reproduction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSection {
    pub population: usize,
    pub generations: usize,
    pub hidden_units: usize,
    pub elitism: usize,
    pub tournament_size: usize,
    /// Probability per weight
    pub mutation_rate: f32,
    /// Max perturbation magnitude
    pub mutation_power: f32,
    /// Chance a mutated weight is perturbed rather than replaced
    pub perturb_probability: f32,
}

impl Default for EvolutionSection {
    fn default() -> Self {
        let evolution = EvolutionConfig::default();
        Self {
            population: evolution.population_size,
            generations: 50,
            hidden_units: evolution.hidden_units,
            elitism: evolution.elitism,
            tournament_size: evolution.tournament_size,
            mutation_rate: evolution.mutation.weight_mutation_rate,
            mutation_power: evolution.mutation.weight_mutation_power,
            perturb_probability: evolution.mutation.perturb_probability,
        }
    }
}

/// Fitness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FitnessSection {
    /// Bonus per tick survived; 0 scores resources only
    pub survival_bonus: f32,
}

/// Run-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunSection {
    /// Seed for the population RNG; a fresh one is drawn when unset
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where to write the JSON stats report
    #[serde(default)]
    pub report: Option<PathBuf>,
    /// Print a champion replay every N generations; 0 disables previews
    pub preview_interval: usize,
}

impl TrainingConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `serpentine.ron` file (if exists)
    /// 3. Environment variables prefixed with `SERPENTINE_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`TrainingConfig::load`], reading `path` instead of
    /// `serpentine.ron`. An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("serpentine")
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("world.width", i64::from(defaults.world.width))?
            .set_default("world.height", i64::from(defaults.world.height))?
            .set_default("world.initial_length", defaults.world.initial_length as i64)?
            .set_default("world.spawn", "Centered")?
            .set_default("world.idle_area_factor", f64::from(defaults.world.idle_area_factor))?
            .set_default("evolution.population", defaults.evolution.population as i64)?
            .set_default("evolution.generations", defaults.evolution.generations as i64)?
            .set_default("evolution.hidden_units", defaults.evolution.hidden_units as i64)?
            .set_default("evolution.elitism", defaults.evolution.elitism as i64)?
            .set_default(
                "evolution.tournament_size",
                defaults.evolution.tournament_size as i64,
            )?
            .set_default(
                "evolution.mutation_rate",
                f64::from(defaults.evolution.mutation_rate),
            )?
            .set_default(
                "evolution.mutation_power",
                f64::from(defaults.evolution.mutation_power),
            )?
            .set_default(
                "evolution.perturb_probability",
                f64::from(defaults.evolution.perturb_probability),
            )?
            .set_default("fitness.survival_bonus", 0.0)?
            .set_default("run.preview_interval", 0_i64)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (SERPENTINE_WORLD__WIDTH, etc.)
            .add_source(Environment::with_prefix("SERPENTINE").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Simulation settings for every generation
    pub fn sim_config(&self) -> SimConfig {
        let idle_timeout = match self.world.idle_ticks {
            Some(ticks) => IdleTimeout::Constant(ticks),
            None => IdleTimeout::AreaScaled {
                factor: self.world.idle_area_factor,
            },
        };
        let fitness = if self.fitness.survival_bonus == 0.0 {
            FitnessPolicy::Score
        } else {
            FitnessPolicy::ScoreWithSurvival {
                per_tick: self.fitness.survival_bonus,
            }
        };

        SimConfig {
            width: self.world.width,
            height: self.world.height,
            initial_length: self.world.initial_length,
            spawn: self.world.spawn,
            idle_timeout,
            fitness,
        }
    }

    /// Reproduction settings for the population
    pub fn evolution_config(&self) -> EvolutionConfig {
        EvolutionConfig {
            population_size: self.evolution.population,
            hidden_units: self.evolution.hidden_units,
            elitism: self.evolution.elitism,
            tournament_size: self.evolution.tournament_size,
            mutation: MutationConfig {
                weight_mutation_rate: self.evolution.mutation_rate,
                weight_mutation_power: self.evolution.mutation_power,
                perturb_probability: self.evolution.perturb_probability,
            },
        }
    }

    /// Reject invalid settings before any generation runs
    pub fn validate(&self) -> Result<()> {
        self.sim_config()
            .validate()
            .context("Invalid world configuration")?;
        self.evolution_config()
            .validate()
            .context("Invalid evolution configuration")?;
        Ok(())
    }

    /// Pretty RON rendering of the effective configuration
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")
    }
}
