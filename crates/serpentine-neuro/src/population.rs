//! Generational population driving a cohort per generation
//!
//! Each generation builds one [`FeedForwardPolicy`] per genome, runs them in a
//! single [`Cohort`] with each genome's `fitness` field as the sink, then
//! breeds the next generation: elites copied unchanged, the rest bred by
//! tournament selection, crossover and mutation.

use std::sync::atomic::AtomicBool;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use serpentine_core::{Cohort, CohortFrame, SimConfig, TickReport};

use crate::error::{EvolutionError, EvolutionResult};
use crate::genome::{MutationConfig, PolicyGenome, crossover_genome};
use crate::neural::{FeedForwardPolicy, NetworkLayout};
use crate::stats::GenerationStats;

/// Smallest population that can breed
pub const MIN_POPULATION: usize = 2;

/// Reproduction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub hidden_units: usize,
    /// Top genomes copied unchanged into the next generation
    pub elitism: usize,
    pub tournament_size: usize,
    pub mutation: MutationConfig,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            hidden_units: 8,
            elitism: 2,
            tournament_size: 3,
            mutation: MutationConfig::default(),
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> EvolutionResult<()> {
        if self.population_size < MIN_POPULATION {
            return Err(EvolutionError::PopulationTooSmall {
                min: MIN_POPULATION,
                actual: self.population_size,
            });
        }
        if self.hidden_units == 0 {
            return Err(EvolutionError::InvalidConfig {
                field: "hidden_units",
                reason: "must be at least 1".into(),
            });
        }
        if self.elitism >= self.population_size {
            return Err(EvolutionError::InvalidConfig {
                field: "elitism",
                reason: format!(
                    "{} leaves no room for offspring in a population of {}",
                    self.elitism, self.population_size
                ),
            });
        }
        if self.tournament_size < 2 {
            return Err(EvolutionError::InvalidConfig {
                field: "tournament_size",
                reason: format!("must be at least 2, got {}", self.tournament_size),
            });
        }
        let rates = [
            ("mutation.weight_mutation_rate", self.mutation.weight_mutation_rate),
            ("mutation.perturb_probability", self.mutation.perturb_probability),
        ];
        for (field, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EvolutionError::InvalidConfig {
                    field,
                    reason: format!("{rate} is not a probability"),
                });
            }
        }
        let power = self.mutation.weight_mutation_power;
        if power.is_nan() || power <= 0.0 {
            return Err(EvolutionError::InvalidConfig {
                field: "mutation.weight_mutation_power",
                reason: format!("must be positive, got {power}"),
            });
        }
        Ok(())
    }

    pub fn layout(&self) -> NetworkLayout {
        NetworkLayout::for_sensors(self.hidden_units)
    }
}

/// Genomes of the current generation plus the best genome seen so far
pub struct Population {
    config: EvolutionConfig,
    genomes: Vec<PolicyGenome>,
    generation: u64,
    next_id: u64,
    rng: Xoshiro256StarStar,
    champion: Option<PolicyGenome>,
}

impl Population {
    /// Random initial population, reproducible from `seed`
    pub fn new(config: EvolutionConfig, seed: u64) -> EvolutionResult<Self> {
        config.validate()?;

        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let layout = config.layout();
        let genomes: Vec<PolicyGenome> = (0..config.population_size as u64)
            .map(|id| PolicyGenome::random(id, layout, &mut rng))
            .collect();

        log::debug!(
            "Created population of {} genomes ({} weights each)",
            genomes.len(),
            layout.weight_count()
        );

        Ok(Self {
            next_id: genomes.len() as u64,
            config,
            genomes,
            generation: 0,
            rng,
            champion: None,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn genomes(&self) -> &[PolicyGenome] {
        &self.genomes
    }

    /// Generations evaluated so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Best genome over every evaluated generation
    pub fn champion(&self) -> Option<&PolicyGenome> {
        self.champion.as_ref()
    }

    /// Evaluate the current genomes in one cohort
    pub fn evaluate(&mut self, sim: &SimConfig, abort: &AtomicBool) -> EvolutionResult<GenerationStats> {
        self.evaluate_observed(sim, abort, |_, _| {})
    }

    /// Like [`Population::evaluate`], forwarding each tick to `observer`
    pub fn evaluate_observed(
        &mut self,
        sim: &SimConfig,
        abort: &AtomicBool,
        observer: impl FnMut(&TickReport, &CohortFrame<'_>),
    ) -> EvolutionResult<GenerationStats> {
        let policies = self
            .genomes
            .iter()
            .map(FeedForwardPolicy::from_genome)
            .collect::<EvolutionResult<Vec<_>>>()?;
        let cohort_rng = Xoshiro256StarStar::seed_from_u64(self.rng.random());

        for genome in &mut self.genomes {
            genome.fitness = 0.0;
        }

        let outcome = {
            let entries = policies
                .iter()
                .zip(self.genomes.iter_mut().map(|g| &mut g.fitness));
            let mut cohort = Cohort::new(sim.clone(), entries, cohort_rng)?;
            cohort.run_observed(abort, observer)?
        };

        let stats = GenerationStats::from_outcome(self.generation, &self.genomes, &outcome);
        self.update_champion();
        self.generation += 1;

        log::debug!(
            "Generation {} evaluated: best {:.2}, mean {:.2}, {} ticks",
            stats.generation,
            stats.best_fitness,
            stats.mean_fitness,
            stats.ticks
        );

        Ok(stats)
    }

    /// Replace the current genomes with the next generation
    pub fn reproduce(&mut self) {
        let size = self.config.population_size;
        let mut ranked = self.genomes.clone();
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let mut next: Vec<PolicyGenome> = ranked.iter().take(self.config.elitism).cloned().collect();

        while next.len() < size {
            let parent1 = tournament(&ranked, self.config.tournament_size, &mut self.rng);
            let parent2 = tournament(&ranked, self.config.tournament_size, &mut self.rng);

            let mut child = crossover_genome(self.next_id, parent1, parent2, &mut self.rng);
            self.next_id += 1;
            child.mutate(&self.config.mutation, &mut self.rng);
            next.push(child);
        }

        self.genomes = next;
    }

    fn update_champion(&mut self) {
        let Some(best) = self
            .genomes
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
        else {
            return;
        };

        let improved = self
            .champion
            .as_ref()
            .is_none_or(|champion| best.fitness > champion.fitness);
        if improved {
            log::debug!("New champion genome {} with fitness {:.2}", best.id, best.fitness);
            self.champion = Some(best.clone());
        }
    }
}

/// Tournament selection - pick the fittest of `size` random draws
fn tournament<'a, R: Rng + ?Sized>(
    genomes: &'a [PolicyGenome],
    size: usize,
    rng: &mut R,
) -> &'a PolicyGenome {
    let mut best = &genomes[rng.random_range(0..genomes.len())];
    for _ in 1..size {
        let candidate = &genomes[rng.random_range(0..genomes.len())];
        if candidate.fitness > best.fitness {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 6,
            hidden_units: 4,
            elitism: 1,
            tournament_size: 2,
            mutation: MutationConfig::default(),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(EvolutionConfig::default().validate().is_ok());

        let too_small = EvolutionConfig {
            population_size: 1,
            ..small_config()
        };
        assert!(matches!(
            too_small.validate(),
            Err(EvolutionError::PopulationTooSmall { min: 2, actual: 1 })
        ));

        let all_elite = EvolutionConfig {
            elitism: 6,
            ..small_config()
        };
        assert!(matches!(
            all_elite.validate(),
            Err(EvolutionError::InvalidConfig { field: "elitism", .. })
        ));

        let tiny_tournament = EvolutionConfig {
            tournament_size: 1,
            ..small_config()
        };
        assert!(tiny_tournament.validate().is_err());

        let mut bad_rate = small_config();
        bad_rate.mutation.weight_mutation_rate = 1.5;
        assert!(bad_rate.validate().is_err());
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let layout = NetworkLayout::default();
        let genomes: Vec<PolicyGenome> = (0..2)
            .map(|i| {
                let mut g = PolicyGenome::from_weights(i, layout, Vec::new());
                g.fitness = i as f32;
                g
            })
            .collect();
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);

        // With 64 draws the fitter genome is all but certain to appear
        let winner = tournament(&genomes, 64, &mut rng);
        assert_eq!(winner.id, 1);
    }

    #[test]
    fn test_reproduce_keeps_size_and_elite() {
        let mut population = Population::new(small_config(), 5).unwrap();
        for (i, genome) in population.genomes.iter_mut().enumerate() {
            genome.fitness = i as f32;
        }
        let elite_weights = population.genomes[5].weights.clone();

        population.reproduce();

        assert_eq!(population.genomes().len(), 6);
        assert_eq!(population.genomes()[0].id, 5);
        assert_eq!(population.genomes()[0].weights, elite_weights);
        // Offspring get fresh ids
        assert!(population.genomes()[1..].iter().all(|g| g.id >= 6));
    }

    #[test]
    fn test_evaluate_writes_fitness_and_champion() {
        let mut population = Population::new(small_config(), 9).unwrap();
        let sim = SimConfig::with_grid(8, 8);
        let abort = AtomicBool::new(false);

        let stats = population.evaluate(&sim, &abort).unwrap();

        assert_eq!(stats.generation, 0);
        assert_eq!(population.generation(), 1);
        assert_eq!(
            stats.deaths_wall + stats.deaths_self + stats.deaths_timeout + stats.filled_grid,
            6
        );
        let champion = population.champion().unwrap();
        assert_eq!(champion.fitness, stats.best_fitness);
        assert!(
            population
                .genomes()
                .iter()
                .all(|g| g.fitness >= 0.0 && g.fitness <= stats.best_fitness)
        );
    }

    #[test]
    fn test_aborted_generation_is_reported() {
        let mut population = Population::new(small_config(), 9).unwrap();
        let abort = AtomicBool::new(true);

        let stats = population.evaluate(&SimConfig::default(), &abort).unwrap();

        assert!(stats.aborted);
        assert_eq!(stats.ticks, 0);
        assert_eq!(stats.best_fitness, 0.0);
    }
}
