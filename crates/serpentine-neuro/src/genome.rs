//! Fixed-topology policy genomes
//!
//! A genome is a flat weight vector for a [`NetworkLayout`]. Reproduction
//! only touches weights; the topology never changes within a run.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::neural::NetworkLayout;

/// Initial weights are drawn from this half-open range
pub const INITIAL_WEIGHT_RANGE: f32 = 0.5;

/// Weights are clamped to +/- this after perturbation
pub const WEIGHT_LIMIT: f32 = 4.0;

/// Replacement weights are drawn from +/- this
pub const REPLACE_RANGE: f32 = 2.0;

/// Flat weight genome with the fitness of its last evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyGenome {
    pub id: u64,
    pub layout: NetworkLayout,
    pub weights: Vec<f32>,
    /// Written by the cohort through a `&mut f32` fitness sink
    pub fitness: f32,
}

impl PolicyGenome {
    /// Random genome with weights in [-0.5, 0.5)
    pub fn random<R: Rng + ?Sized>(id: u64, layout: NetworkLayout, rng: &mut R) -> Self {
        let weights = (0..layout.weight_count())
            .map(|_| rng.random_range(-INITIAL_WEIGHT_RANGE..INITIAL_WEIGHT_RANGE))
            .collect();
        Self::from_weights(id, layout, weights)
    }

    pub fn from_weights(id: u64, layout: NetworkLayout, weights: Vec<f32>) -> Self {
        Self {
            id,
            layout,
            weights,
            fitness: 0.0,
        }
    }

    /// Mutate weights in place, returns how many changed
    pub fn mutate<R: Rng + ?Sized>(&mut self, config: &MutationConfig, rng: &mut R) -> usize {
        let mut mutated_count = 0;

        for weight in &mut self.weights {
            if rng.random::<f32>() < config.weight_mutation_rate {
                if rng.random::<f32>() < config.perturb_probability {
                    let perturbation = rng
                        .random_range(-config.weight_mutation_power..config.weight_mutation_power);
                    *weight = (*weight + perturbation).clamp(-WEIGHT_LIMIT, WEIGHT_LIMIT);
                } else {
                    *weight = rng.random_range(-REPLACE_RANGE..REPLACE_RANGE);
                }
                mutated_count += 1;
            }
        }

        mutated_count
    }
}

/// Mutation rates for weight genomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability per weight
    pub weight_mutation_rate: f32,
    /// Max perturbation magnitude
    pub weight_mutation_power: f32,
    /// Chance a selected weight is perturbed rather than replaced
    pub perturb_probability: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            weight_mutation_rate: 0.3,
            weight_mutation_power: 0.5,
            perturb_probability: 0.9,
        }
    }
}

/// Uniform crossover biased toward the fitter parent
///
/// Each weight comes from `parent1` with probability 0.7 when it is fitter,
/// 0.3 when it is less fit and 0.5 on a tie. The child takes `parent1`'s
/// layout and starts with zero fitness.
pub fn crossover_genome<R: Rng + ?Sized>(
    id: u64,
    parent1: &PolicyGenome,
    parent2: &PolicyGenome,
    rng: &mut R,
) -> PolicyGenome {
    let bias = if parent1.fitness > parent2.fitness {
        0.7
    } else if parent2.fitness > parent1.fitness {
        0.3
    } else {
        0.5
    };

    let weights = parent1
        .weights
        .iter()
        .enumerate()
        .map(|(i, &w1)| {
            let w2 = parent2.weights.get(i).copied().unwrap_or(w1);
            if rng.random::<f32>() < bias { w1 } else { w2 }
        })
        .collect();

    PolicyGenome::from_weights(id, parent1.layout, weights)
}
