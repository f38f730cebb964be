//! Error types for the simulation core
//!
//! Two families exist: configuration errors, raised before the first tick,
//! and invariant violations, which abort the running generation.

use thiserror::Error;

use crate::world::Cell;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGrid { width: i32, height: i32 },

    #[error("initial body length {length} is below the minimum of {min}")]
    InitialBodyTooShort { length: usize, min: usize },

    #[error("initial body of length {length} does not fit a {width}x{height} grid")]
    InitialBodyDoesNotFit {
        length: usize,
        width: i32,
        height: i32,
    },

    #[error("policy at slot {slot} expects {actual} inputs, sensors produce {expected}")]
    InputArityMismatch {
        slot: usize,
        expected: usize,
        actual: usize,
    },

    #[error("policy at slot {slot} produces {actual} outputs, expected {expected}")]
    OutputArityMismatch {
        slot: usize,
        expected: usize,
        actual: usize,
    },

    #[error("fitness policy parameter must be finite and non-negative, got {0}")]
    InvalidFitnessPolicy(f32),

    #[error("idle timeout area factor must be finite and non-negative, got {0}")]
    InvalidIdleTimeout(f32),

    #[error("invariant `{invariant}` violated at member slot {slot}: {detail}")]
    InvariantViolation {
        invariant: &'static str,
        slot: usize,
        detail: String,
    },

    #[error("no free cell left for the resource on a {width}x{height} grid")]
    GridFull { width: i32, height: i32 },

    #[error("resource at {cell} lies outside the grid")]
    ResourceOutOfBounds { cell: Cell },
}

impl SimError {
    /// True for errors raised before a generation starts ticking
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimError::InvalidGrid { .. }
                | SimError::InitialBodyTooShort { .. }
                | SimError::InitialBodyDoesNotFit { .. }
                | SimError::InputArityMismatch { .. }
                | SimError::OutputArityMismatch { .. }
                | SimError::InvalidFitnessPolicy(_)
                | SimError::InvalidIdleTimeout(_)
        )
    }

    pub(crate) fn invariant(invariant: &'static str, slot: usize, detail: impl Into<String>) -> Self {
        SimError::InvariantViolation {
            invariant,
            slot,
            detail: detail.into(),
        }
    }
}
