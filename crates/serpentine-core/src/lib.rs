//! Grid-world simulation core for Serpentine
//!
//! This crate implements:
//! - A bounded grid world holding a single resource
//! - Agents with a growing body, heading and idle timer
//! - Heading-relative sensory encoding into a fixed feature vector
//! - Lockstep evaluation of a whole cohort of policies for one generation
//!
//! The neuroevolution engine lives outside this crate and talks to it only
//! through the [`Policy`] and [`FitnessSink`] traits.

pub mod agent;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod presentation;
pub mod rng_trait;
pub mod sensors;
pub mod world;

// Re-export main types for convenience
pub use agent::{Action, Agent, AgentStatus, Heading, TickResult};
pub use config::{FitnessPolicy, IdleTimeout, SimConfig, SpawnRule};
pub use error::{SimError, SimResult};
pub use evaluator::{Cohort, CohortMember, GenerationOutcome, Removal, TickReport};
pub use policy::{DiscardFitness, FitnessSink, Policy};
pub use presentation::{AgentSprite, CohortFrame, DisplayMode, MemberView, PresentationAdapter};
pub use rng_trait::GridRng;
pub use sensors::{FEATURE_COUNT, SensorFrame};
pub use world::{Cell, World};
