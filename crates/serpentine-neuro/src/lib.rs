//! Reference neuroevolution engine for Serpentine
//!
//! This crate implements:
//! - Flat weight genomes for small feed-forward controllers
//! - Feed-forward policies that plug into the simulation core
//! - Elitist, tournament-based reproduction with crossover and mutation
//!
//! The simulation core knows nothing about this crate; it only sees the
//! [`serpentine_core::Policy`] and [`serpentine_core::FitnessSink`] traits.

pub mod error;
pub mod genome;
pub mod neural;
pub mod population;
pub mod stats;

// Re-export main types for convenience
pub use error::{EvolutionError, EvolutionResult};
pub use genome::{MutationConfig, PolicyGenome, crossover_genome};
pub use neural::{FeedForwardPolicy, NetworkLayout};
pub use population::{EvolutionConfig, Population};
pub use stats::GenerationStats;
