//! Simulation configuration
//!
//! Fixed for the duration of a generation. [`SimConfig::validate`] runs before
//! the first tick so configuration mistakes never surface mid-run.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, Heading};
use crate::error::{SimError, SimResult};
use crate::rng_trait::GridRng;
use crate::world::{Cell, validate_grid};

/// Shortest body an agent may spawn with
pub const MIN_BODY_LENGTH: usize = 3;

/// Maximum ticks without consuming a resource before starvation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IdleTimeout {
    /// Fixed tick budget
    Constant(u32),
    /// `factor * width * height` ticks, so larger grids grant more exploration time
    AreaScaled { factor: f32 },
}

impl Default for IdleTimeout {
    fn default() -> Self {
        IdleTimeout::AreaScaled { factor: 1.0 }
    }
}

impl IdleTimeout {
    pub fn max_idle(&self, area: usize) -> u32 {
        match *self {
            IdleTimeout::Constant(ticks) => ticks,
            IdleTimeout::AreaScaled { factor } => (factor * area as f32).round().max(0.0) as u32,
        }
    }
}

/// Where and how agents spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpawnRule {
    /// Head on the grid center, heading right, body trailing left
    #[default]
    Centered,
    /// Uniform over headings and head cells that keep the straight body in bounds
    Random,
}

impl std::str::FromStr for SpawnRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "centered" | "center" => Ok(SpawnRule::Centered),
            "random" => Ok(SpawnRule::Random),
            other => Err(format!("Unknown spawn rule '{}'", other)),
        }
    }
}

/// How a member's fitness is derived from its agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum FitnessPolicy {
    /// Resources consumed
    #[default]
    Score,
    /// Resources consumed plus a bonus per tick survived
    ScoreWithSurvival { per_tick: f32 },
}

impl FitnessPolicy {
    pub fn fitness(&self, agent: &Agent) -> f32 {
        match *self {
            FitnessPolicy::Score => agent.score() as f32,
            FitnessPolicy::ScoreWithSurvival { per_tick } => {
                agent.score() as f32 + per_tick * agent.ticks_alive() as f32
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub width: i32,
    pub height: i32,
    pub initial_length: usize,
    #[serde(default)]
    pub spawn: SpawnRule,
    #[serde(default)]
    pub idle_timeout: IdleTimeout,
    #[serde(default)]
    pub fitness: FitnessPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            initial_length: MIN_BODY_LENGTH,
            spawn: SpawnRule::Centered,
            idle_timeout: IdleTimeout::default(),
            fitness: FitnessPolicy::Score,
        }
    }
}

impl SimConfig {
    /// Grid of the given size with default agent settings
    pub fn with_grid(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Check every configuration constraint
    pub fn validate(&self) -> SimResult<()> {
        validate_grid(self.width, self.height)?;

        if self.initial_length < MIN_BODY_LENGTH {
            return Err(SimError::InitialBodyTooShort {
                length: self.initial_length,
                min: MIN_BODY_LENGTH,
            });
        }

        let len = self.initial_length as i32;
        let fits = match self.spawn {
            SpawnRule::Centered => self.width / 2 >= len - 1,
            SpawnRule::Random => len <= self.width || len <= self.height,
        };
        // The resource needs one free cell beside the body
        if !fits || self.initial_length >= self.area() {
            return Err(SimError::InitialBodyDoesNotFit {
                length: self.initial_length,
                width: self.width,
                height: self.height,
            });
        }

        if let IdleTimeout::AreaScaled { factor } = self.idle_timeout
            && (!factor.is_finite() || factor < 0.0)
        {
            return Err(SimError::InvalidIdleTimeout(factor));
        }

        if let FitnessPolicy::ScoreWithSurvival { per_tick } = self.fitness
            && (!per_tick.is_finite() || per_tick < 0.0)
        {
            return Err(SimError::InvalidFitnessPolicy(per_tick));
        }

        Ok(())
    }

    pub fn area(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }

    /// Idle-tick budget for this grid
    pub fn max_idle(&self) -> u32 {
        self.idle_timeout.max_idle(self.area())
    }

    /// Build a freshly spawned agent following the spawn rule
    pub fn spawn_agent(&self, rng: &mut impl GridRng) -> SimResult<Agent> {
        match self.spawn {
            SpawnRule::Centered => {
                let head = Cell::new(self.width / 2, self.height / 2);
                Agent::straight(head, Heading::Right, self.initial_length)
            }
            SpawnRule::Random => {
                let tail_offset = self.initial_length as i32 - 1;
                let candidates: Vec<(Cell, Heading)> = Heading::ALL
                    .iter()
                    .flat_map(|heading| {
                        (0..self.height).flat_map(move |y| {
                            (0..self.width).map(move |x| (Cell::new(x, y), *heading))
                        })
                    })
                    .filter(|(head, heading)| {
                        let tail = *head - heading.delta() * tail_offset;
                        tail.x >= 0 && tail.x < self.width && tail.y >= 0 && tail.y < self.height
                    })
                    .collect();

                if candidates.is_empty() {
                    return Err(SimError::InitialBodyDoesNotFit {
                        length: self.initial_length,
                        width: self.width,
                        height: self.height,
                    });
                }

                let (head, heading) = candidates[rng.pick_index(candidates.len())];
                Agent::straight(head, heading, self.initial_length)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.width, 15);
        assert_eq!(config.height, 15);
        assert_eq!(config.initial_length, 3);
        assert_eq!(config.max_idle(), 225);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_idle_timeout_policies() {
        assert_eq!(IdleTimeout::Constant(40).max_idle(10_000), 40);
        assert_eq!(IdleTimeout::AreaScaled { factor: 2.0 }.max_idle(25), 50);
        assert_eq!(IdleTimeout::AreaScaled { factor: 0.5 }.max_idle(9), 5);
    }

    #[test]
    fn test_rejects_bad_grid() {
        let config = SimConfig::with_grid(0, 10);
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_rejects_short_body() {
        let config = SimConfig {
            initial_length: 0,
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err,
            SimError::InitialBodyTooShort {
                length: 0,
                min: MIN_BODY_LENGTH
            }
        );
    }

    #[test]
    fn test_rejects_body_that_does_not_fit() {
        let config = SimConfig {
            initial_length: 5,
            ..SimConfig::with_grid(6, 6)
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InitialBodyDoesNotFit { .. })
        ));

        // Random spawning only needs one axis long enough
        let config = SimConfig {
            initial_length: 5,
            spawn: SpawnRule::Random,
            ..SimConfig::with_grid(2, 6)
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_survival_bonus() {
        let config = SimConfig {
            fitness: FitnessPolicy::ScoreWithSurvival { per_tick: -0.1 },
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimError::InvalidFitnessPolicy(-0.1))
        );
    }

    #[test]
    fn test_rejects_bad_idle_area_factor() {
        let config = SimConfig {
            idle_timeout: IdleTimeout::AreaScaled { factor: -3.0 },
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err, SimError::InvalidIdleTimeout(-3.0));

        let config = SimConfig {
            idle_timeout: IdleTimeout::AreaScaled { factor: f32::NAN },
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidIdleTimeout(_))
        ));

        // Zero is a legal, if harsh, budget
        let config = SimConfig {
            idle_timeout: IdleTimeout::AreaScaled { factor: 0.0 },
            ..SimConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_centered_spawn_matches_grid_center() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let agent = SimConfig::default().spawn_agent(&mut rng).unwrap();

        assert_eq!(agent.head(), Cell::new(7, 7));
        assert_eq!(agent.heading(), Heading::Right);
        assert_eq!(agent.len(), 3);
        assert_eq!(agent.body()[2], Cell::new(5, 7));
    }

    #[test]
    fn test_random_spawn_stays_in_bounds() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(77);
        let config = SimConfig {
            spawn: SpawnRule::Random,
            initial_length: 4,
            ..SimConfig::with_grid(5, 7)
        };

        for _ in 0..100 {
            let agent = config.spawn_agent(&mut rng).unwrap();
            assert_eq!(agent.len(), 4);
            for cell in agent.body() {
                assert!(cell.x >= 0 && cell.x < 5 && cell.y >= 0 && cell.y < 7);
            }
            assert!(!agent.self_intersects());
        }
    }

    #[test]
    fn test_fitness_policies() {
        let world = crate::world::World::with_resource(10, 10, Cell::new(9, 9)).unwrap();
        let mut agent = Agent::straight(Cell::new(4, 4), Heading::Right, 3).unwrap();
        agent.step(crate::agent::Action::Straight, &world);
        agent.step(crate::agent::Action::Straight, &world);

        assert_eq!(FitnessPolicy::Score.fitness(&agent), 0.0);
        let survival = FitnessPolicy::ScoreWithSurvival { per_tick: 0.1 };
        assert!((survival.fitness(&agent) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_rule_from_str() {
        assert_eq!("random".parse::<SpawnRule>(), Ok(SpawnRule::Random));
        assert_eq!("Centered".parse::<SpawnRule>(), Ok(SpawnRule::Centered));
        assert!("diagonal".parse::<SpawnRule>().is_err());
    }
}
