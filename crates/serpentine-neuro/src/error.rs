use serpentine_core::SimError;
use thiserror::Error;

pub type EvolutionResult<T> = Result<T, EvolutionError>;

#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error(transparent)]
    Simulation(#[from] SimError),

    #[error("population size must be at least {min}, got {actual}")]
    PopulationTooSmall { min: usize, actual: usize },

    #[error("invalid evolution setting `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("genome {id} has {actual} weights, layout needs {expected}")]
    GenomeShape {
        id: u64,
        expected: usize,
        actual: usize,
    },
}
