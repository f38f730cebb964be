use serde::{Deserialize, Serialize};
use serpentine_core::{AgentStatus, GenerationOutcome};

use crate::genome::PolicyGenome;

/// Per-generation statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub best_score: u32,
    /// Ticks until the cohort emptied
    pub ticks: u64,
    pub deaths_wall: usize,
    pub deaths_self: usize,
    pub deaths_timeout: usize,
    /// Members whose body covered the whole grid
    #[serde(default)]
    pub filled_grid: usize,
    /// True when the generation was cancelled
    pub aborted: bool,
}

impl GenerationStats {
    pub fn from_outcome(
        generation: u64,
        genomes: &[PolicyGenome],
        outcome: &GenerationOutcome,
    ) -> Self {
        let best_fitness = genomes
            .iter()
            .map(|g| g.fitness)
            .fold(f32::NEG_INFINITY, f32::max);
        let mean_fitness = if genomes.is_empty() {
            0.0
        } else {
            genomes.iter().map(|g| g.fitness).sum::<f32>() / genomes.len() as f32
        };

        Self {
            generation,
            best_fitness: if genomes.is_empty() { 0.0 } else { best_fitness },
            mean_fitness,
            best_score: outcome.best_score(),
            ticks: outcome.ticks,
            deaths_wall: outcome.deaths(AgentStatus::DiedWall),
            deaths_self: outcome.deaths(AgentStatus::DiedSelf),
            deaths_timeout: outcome.deaths(AgentStatus::DiedTimeout),
            filled_grid: outcome.deaths(AgentStatus::FilledGrid),
            aborted: outcome.aborted,
        }
    }
}
